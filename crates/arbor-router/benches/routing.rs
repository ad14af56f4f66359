//! Routing benchmarks for the radix-tree router.
//!
//! Run with: cargo bench -p arbor-router

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use arbor_router::{Params, Router};

/// Generate a set of realistic API routes.
fn generate_routes(count: usize) -> Vec<(String, String)> {
    let resources = [
        "users",
        "orders",
        "products",
        "customers",
        "invoices",
        "payments",
    ];
    let methods = ["GET", "POST", "PUT", "DELETE"];

    let mut routes = Vec::new();

    for resource in &resources {
        routes.push((format!("/{}", resource), "GET".to_string()));
        routes.push((format!("/{}", resource), "POST".to_string()));
        routes.push((format!("/{}/:id", resource), "GET".to_string()));
        routes.push((format!("/{}/:id", resource), "PUT".to_string()));
        routes.push((format!("/{}/:id", resource), "DELETE".to_string()));
    }

    // Nested routes share the `:id` parameter name with their parents
    routes.push(("/users/:id/orders".to_string(), "GET".to_string()));
    routes.push(("/users/:id/orders/:order_id".to_string(), "GET".to_string()));
    routes.push(("/products/:id/reviews".to_string(), "GET".to_string()));
    routes.push(("/products/:id/reviews/:review_id".to_string(), "GET".to_string()));
    routes.push(("/static/*filepath".to_string(), "GET".to_string()));

    while routes.len() < count {
        let i = routes.len();
        let resource = resources[i % resources.len()];
        let method = methods[i % methods.len()];
        routes.push((format!("/api/v{}/{}", i, resource), method.to_string()));
    }

    routes.truncate(count);
    routes
}

fn build_router(routes: &[(String, String)]) -> Router<usize> {
    let mut router = Router::new();
    for (i, (path, method)) in routes.iter().enumerate() {
        router.insert(method, path, i).unwrap();
    }
    router
}

fn bench_router_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("router_lookup");

    for route_count in [10, 50, 100, 500, 1000] {
        let routes = generate_routes(route_count);
        let router = build_router(&routes);

        let cases = [
            ("static_path", "/users"),
            ("param_path", "/users/12345"),
            ("nested_param_path", "/users/12345/orders/67890"),
            ("catch_all_path", "/static/css/site/main.css"),
            ("redirect", "/users/"),
            ("not_found", "/nonexistent/path/here"),
        ];

        for (name, path) in cases {
            group.bench_with_input(BenchmarkId::new(name, route_count), &router, |b, router| {
                let mut params = Params::with_capacity(router.max_params());
                b.iter(|| {
                    black_box(router.resolve_into("GET", None, black_box(path), &mut params));
                });
            });
        }
    }

    group.finish();
}

fn bench_router_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("router_insert");

    for route_count in [10, 50, 100, 500] {
        let routes = generate_routes(route_count);

        group.bench_with_input(
            BenchmarkId::new("build_router", route_count),
            &routes,
            |b, routes| {
                b.iter(|| {
                    black_box(build_router(routes));
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_router_lookup, bench_router_insert);
criterion_main!(benches);
