//! Per-method, per-host forest of trees.
//!
//! Every (method, host pattern) pair owns an independent [`Tree`]. A request
//! is resolved against the trees of its method whose host pattern matches,
//! most specific host first.

use std::fmt;

use http::{Method, StatusCode};

use crate::error::{InsertError, RouteError};
use crate::host::{strip_port, HostPattern};
use crate::params::Params;
use crate::pattern::Pattern;
use crate::tree::{Outcome, Tree};

/// Methods registered by [`Router::insert_any`].
pub const ANY_METHODS: [Method; 9] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::HEAD,
    Method::OPTIONS,
    Method::PATCH,
    Method::TRACE,
];

/// Router behaviour switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Answer trailing-slash mismatches with a redirect instead of a 404.
    pub path_correction: bool,
    /// Answer with 405 when the path exists under another method.
    pub method_not_allowed: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            path_correction: true,
            method_not_allowed: false,
        }
    }
}

/// The result of a route lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch<'t, 'p, T> {
    /// Matched a path and method.
    Found { value: &'t T, params: Params<'t, 'p> },
    /// The path only matches with its trailing slash toggled.
    Redirect { location: String, status: StatusCode },
    /// Path matched but method is not allowed.
    MethodNotAllowed { allowed: Vec<String> },
    /// No path matched.
    NotFound,
}

/// [`RouteMatch`] without the parameters, which live in a caller-owned buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<V> {
    Found(V),
    Redirect { location: String, status: StatusCode },
    MethodNotAllowed { allowed: Vec<String> },
    NotFound,
}

#[derive(Debug, Clone)]
struct MethodTree<T> {
    method: Method,
    host: HostPattern,
    tree: Tree<T>,
}

/// The routing forest. Maps methods, hosts and paths to values.
#[derive(Debug, Clone)]
pub struct Router<T> {
    /// Ordered by decreasing host specificity.
    trees: Vec<MethodTree<T>>,
    config: RouterConfig,
    routes: usize,
    max_params: usize,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self::with_config(RouterConfig::default())
    }
}

impl<T> Router<T> {
    /// Create a new empty router.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            trees: Vec::new(),
            config,
            routes: 0,
            max_params: 0,
        }
    }

    pub fn config(&self) -> RouterConfig {
        self.config
    }

    /// Number of registered (method, host, pattern) bindings.
    pub fn len(&self) -> usize {
        self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes == 0
    }

    /// Most parameters any route can capture; sizes a reusable [`Params`].
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    /// Register a route served on every host.
    pub fn insert(&mut self, method: &str, pattern: &str, value: T) -> Result<(), RouteError> {
        self.insert_for_host("", method, pattern, value)
    }

    /// Register a route for a host pattern (see [`HostPattern::parse`]).
    pub fn insert_for_host(
        &mut self,
        host: &str,
        method: &str,
        pattern: &str,
        value: T,
    ) -> Result<(), RouteError> {
        let method = parse_method(method)?;
        let host = HostPattern::parse(host)?;

        let max_params = match self
            .trees
            .iter_mut()
            .find(|entry| entry.method == method && entry.host == host)
        {
            Some(entry) => {
                entry.tree.insert(pattern, value)?;
                entry.tree.max_params()
            }
            None => {
                let mut tree = Tree::new();
                tree.insert(pattern, value)?;
                let max_params = tree.max_params();
                self.trees.push(MethodTree {
                    method: method.clone(),
                    host: host.clone(),
                    tree,
                });
                // exact hosts win ties against wildcards of the same length
                self.trees.sort_by(|a, b| {
                    b.host
                        .specificity()
                        .cmp(&a.host.specificity())
                        .then(b.host.is_exact().cmp(&a.host.is_exact()))
                });
                max_params
            }
        };

        self.routes += 1;
        self.max_params = self.max_params.max(max_params);
        tracing::debug!(method = %method, host = %host, pattern, "route registered");
        Ok(())
    }

    /// Register a route under every method in [`ANY_METHODS`].
    pub fn insert_any(&mut self, pattern: &str, value: T) -> Result<(), RouteError>
    where
        T: Clone,
    {
        self.insert_any_for_host("", pattern, value)
    }

    /// Register a route under every method in [`ANY_METHODS`] for a host
    /// pattern. Either every method is bound or none is.
    pub fn insert_any_for_host(
        &mut self,
        host: &str,
        pattern: &str,
        value: T,
    ) -> Result<(), RouteError>
    where
        T: Clone,
    {
        Pattern::parse(pattern)?;
        HostPattern::parse(host)?;

        let mut staged = self.clone();
        for method in &ANY_METHODS {
            staged.insert_for_host(host, method.as_str(), pattern, value.clone())?;
        }
        *self = staged;
        Ok(())
    }

    /// Register routes under a common path prefix. A prefix without a
    /// leading `/` gets one.
    pub fn group(&mut self, prefix: &str) -> Group<'_, T> {
        Group {
            router: self,
            prefix: nest_prefix("", prefix),
            host: String::new(),
        }
    }

    /// Resolve a request, returning captures in a freshly sized buffer.
    pub fn resolve<'t, 'p>(
        &'t self,
        method: &str,
        host: Option<&str>,
        path: &'p str,
    ) -> RouteMatch<'t, 'p, T> {
        let mut params = Params::with_capacity(self.max_params);
        match self.resolve_into(method, host, path, &mut params) {
            Resolution::Found(value) => RouteMatch::Found { value, params },
            Resolution::Redirect { location, status } => RouteMatch::Redirect { location, status },
            Resolution::MethodNotAllowed { allowed } => RouteMatch::MethodNotAllowed { allowed },
            Resolution::NotFound => RouteMatch::NotFound,
        }
    }

    /// Resolve a request into a caller-owned parameter buffer.
    ///
    /// `host` is the raw `Host` header; a port is ignored. `path` must already
    /// be stripped of its query string.
    pub fn resolve_into<'t, 'p>(
        &'t self,
        method: &str,
        host: Option<&str>,
        path: &'p str,
        params: &mut Params<'t, 'p>,
    ) -> Resolution<&'t T> {
        let host = host.map(strip_port);
        let mut redirect = false;

        for entry in self
            .trees
            .iter()
            .filter(|entry| entry.method.as_str().eq_ignore_ascii_case(method))
            .filter(|entry| entry.host.matches(host))
        {
            match entry.tree.at(path, params) {
                Outcome::Found(value) => return Resolution::Found(value),
                Outcome::Redirect => redirect = true,
                Outcome::NotFound => {}
            }
        }

        if redirect && self.config.path_correction {
            if let Some(status) = redirect_status(method) {
                return Resolution::Redirect {
                    location: toggle_trailing_slash(path),
                    status,
                };
            }
        }

        if self.config.method_not_allowed {
            let allowed = self.allowed_methods(host, path);
            if !allowed.is_empty() {
                return Resolution::MethodNotAllowed { allowed };
            }
        }

        Resolution::NotFound
    }

    /// Methods with a route matching `path` exactly on `host`, sorted.
    pub fn allowed_methods(&self, host: Option<&str>, path: &str) -> Vec<String> {
        let host = host.map(strip_port);
        let mut allowed: Vec<String> = self
            .trees
            .iter()
            .filter(|entry| entry.host.matches(host) && entry.tree.contains(path))
            .map(|entry| entry.method.to_string())
            .collect();
        allowed.sort();
        allowed.dedup();
        allowed
    }
}

impl<T> fmt::Display for Router<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.trees {
            writeln!(f, "{} {}", entry.method, entry.host)?;
            write!(f, "{}", entry.tree)?;
        }
        Ok(())
    }
}

/// Routes registered under a shared prefix and host.
pub struct Group<'r, T> {
    router: &'r mut Router<T>,
    prefix: String,
    host: String,
}

impl<T> Group<'_, T> {
    /// Restrict the group's routes to a host pattern.
    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn insert(&mut self, method: &str, pattern: &str, value: T) -> Result<(), RouteError> {
        let full = join_prefix(&self.prefix, pattern)?;
        self.router.insert_for_host(&self.host, method, &full, value)
    }

    pub fn insert_any(&mut self, pattern: &str, value: T) -> Result<(), RouteError>
    where
        T: Clone,
    {
        let full = join_prefix(&self.prefix, pattern)?;
        self.router.insert_any_for_host(&self.host, &full, value)
    }

    /// A nested group; prefixes are joined with `/` and the host carries over.
    pub fn group(&mut self, prefix: &str) -> Group<'_, T> {
        Group {
            prefix: nest_prefix(&self.prefix, prefix),
            host: self.host.clone(),
            router: &mut *self.router,
        }
    }
}

fn nest_prefix(parent: &str, prefix: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if prefix.is_empty() || prefix.starts_with('/') {
        format!("{}{}", parent, prefix)
    } else {
        format!("{}/{}", parent, prefix)
    }
}

fn join_prefix(prefix: &str, pattern: &str) -> Result<String, InsertError> {
    let prefix = prefix.trim_end_matches('/');
    if pattern.is_empty() {
        return Ok(if prefix.is_empty() { "/" } else { prefix }.to_string());
    }
    if !pattern.starts_with('/') {
        return Err(InsertError::MissingLeadingSlash {
            route: pattern.to_string(),
        });
    }
    Ok(format!("{}{}", prefix, pattern))
}

fn parse_method(raw: &str) -> Result<Method, RouteError> {
    Method::from_bytes(raw.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| RouteError::InvalidMethod(raw.to_string()))
}

/// Status used to redirect a request of `method` to its trailing-slash twin.
///
/// GET and HEAD can be replayed freely and get a permanent redirect; other
/// methods get 307 so clients repeat them with the same method and body.
/// CONNECT is never redirected.
pub fn redirect_status(method: &str) -> Option<StatusCode> {
    if method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD") {
        Some(StatusCode::MOVED_PERMANENTLY)
    } else if method.eq_ignore_ascii_case("CONNECT") {
        None
    } else {
        Some(StatusCode::TEMPORARY_REDIRECT)
    }
}

/// Add a trailing slash to `path`, or remove the one it has.
pub fn toggle_trailing_slash(path: &str) -> String {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed.to_string(),
        Some(_) => "/".to_string(),
        None => format!("{}/", path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(routes: &[(&str, &str)]) -> Router<usize> {
        let mut router = Router::new();
        for (i, (method, path)) in routes.iter().enumerate() {
            router.insert(method, path, i).unwrap();
        }
        router
    }

    fn found_value(result: RouteMatch<'_, '_, usize>) -> Option<usize> {
        match result {
            RouteMatch::Found { value, .. } => Some(*value),
            _ => None,
        }
    }

    // === Method dispatch ===

    #[test]
    fn route_static_path() {
        let router = router(&[("GET", "/health")]);

        match router.resolve("GET", None, "/health") {
            RouteMatch::Found { value, params } => {
                assert_eq!(*value, 0);
                assert!(params.is_empty());
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn route_with_parameters() {
        let router = router(&[("GET", "/users/:user_id/orders/:order_id")]);

        match router.resolve("GET", None, "/users/42/orders/99") {
            RouteMatch::Found { params, .. } => {
                assert_eq!(params.get("user_id"), Some("42"));
                assert_eq!(params.get("order_id"), Some("99"));
                assert_eq!(params.to_string(), "user_id=42,order_id=99");
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn methods_have_independent_trees() {
        let router = router(&[
            ("GET", "/users/:id"),
            ("POST", "/users/new"),
            ("DELETE", "/users/:name"),
        ]);

        assert_eq!(found_value(router.resolve("GET", None, "/users/new")), Some(0));
        assert_eq!(found_value(router.resolve("POST", None, "/users/new")), Some(1));
        assert_eq!(found_value(router.resolve("DELETE", None, "/users/new")), Some(2));
        assert_eq!(router.resolve("PUT", None, "/users/new"), RouteMatch::NotFound);
    }

    #[test]
    fn method_matching_ignores_case() {
        let router = router(&[("get", "/users")]);
        assert_eq!(found_value(router.resolve("GET", None, "/users")), Some(0));
        assert_eq!(found_value(router.resolve("get", None, "/users")), Some(0));
    }

    #[test]
    fn method_not_allowed_is_opt_in() {
        let mut routes = router(&[("GET", "/users"), ("POST", "/users")]);
        assert_eq!(routes.resolve("DELETE", None, "/users"), RouteMatch::NotFound);

        routes.config.method_not_allowed = true;
        match routes.resolve("DELETE", None, "/users") {
            RouteMatch::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec!["GET".to_string(), "POST".to_string()]);
            }
            other => panic!("expected MethodNotAllowed, got {:?}", other),
        }
        assert_eq!(routes.resolve("DELETE", None, "/posts"), RouteMatch::NotFound);
    }

    #[test]
    fn insert_any_is_all_or_nothing() {
        let mut router = Router::new();
        router.insert("CONNECT", "/users/:id", 1).unwrap();

        assert!(matches!(
            router.insert_any("/users/:name", 2),
            Err(RouteError::Insert(InsertError::Conflict { .. }))
        ));
        assert_eq!(router.len(), 1);
        assert_eq!(router.resolve("GET", None, "/users/7"), RouteMatch::NotFound);
        assert_eq!(router.resolve("POST", None, "/users/7"), RouteMatch::NotFound);
        assert_eq!(found_value(router.resolve("CONNECT", None, "/users/7")), Some(1));

        // the same pattern under the existing name is fine
        router.insert_any("/users/:id/posts", 3).unwrap();
        assert_eq!(router.len(), 1 + ANY_METHODS.len());
    }

    #[test]
    fn insert_any_covers_every_method() {
        let mut router = Router::new();
        router.insert_any("/ping", 7).unwrap();

        for method in &ANY_METHODS {
            assert_eq!(found_value(router.resolve(method.as_str(), None, "/ping")), Some(7));
        }
        assert_eq!(router.len(), ANY_METHODS.len());
    }

    #[test]
    fn invalid_registrations_are_rejected() {
        let mut router = Router::new();
        assert!(matches!(
            router.insert("GE T", "/", 0),
            Err(RouteError::InvalidMethod(_))
        ));
        assert!(matches!(
            router.insert_for_host("a.*.com", "GET", "/", 0),
            Err(RouteError::InvalidHost(_))
        ));
        assert!(matches!(
            router.insert("GET", "/users/:", 0),
            Err(RouteError::Insert(InsertError::UnnamedSegment { .. }))
        ));
        assert!(router.is_empty());
        assert_eq!(router.to_string(), "");
    }

    #[test]
    fn conflicts_surface_through_router() {
        let mut router = router(&[("GET", "/users/:id")]);
        assert!(matches!(
            router.insert("GET", "/users/:name", 1),
            Err(RouteError::Insert(InsertError::Conflict { .. }))
        ));
        // another method is another tree
        router.insert("POST", "/users/:name", 1).unwrap();
    }

    // === Redirects ===

    #[test]
    fn redirect_status_depends_on_method() {
        let router = router(&[("GET", "/about/"), ("POST", "/submit"), ("CONNECT", "/tunnel")]);

        assert_eq!(
            router.resolve("GET", None, "/about"),
            RouteMatch::Redirect {
                location: "/about/".to_string(),
                status: StatusCode::MOVED_PERMANENTLY
            }
        );
        assert_eq!(
            router.resolve("POST", None, "/submit/"),
            RouteMatch::Redirect {
                location: "/submit".to_string(),
                status: StatusCode::TEMPORARY_REDIRECT
            }
        );
        assert_eq!(router.resolve("CONNECT", None, "/tunnel/"), RouteMatch::NotFound);
    }

    #[test]
    fn path_correction_can_be_disabled() {
        let mut router = Router::with_config(RouterConfig {
            path_correction: false,
            method_not_allowed: false,
        });
        router.insert("GET", "/about/", 0).unwrap();
        assert_eq!(router.resolve("GET", None, "/about"), RouteMatch::NotFound);
    }

    #[test]
    fn redirect_helpers() {
        assert_eq!(redirect_status("HEAD"), Some(StatusCode::MOVED_PERMANENTLY));
        assert_eq!(redirect_status("PUT"), Some(StatusCode::TEMPORARY_REDIRECT));
        assert_eq!(redirect_status("DELETE"), Some(StatusCode::TEMPORARY_REDIRECT));
        assert_eq!(redirect_status("connect"), None);

        assert_eq!(toggle_trailing_slash("/a"), "/a/");
        assert_eq!(toggle_trailing_slash("/a/"), "/a");
        assert_eq!(toggle_trailing_slash("/"), "/");
    }

    // === Hosts ===

    #[test]
    fn most_specific_host_wins() {
        let mut router = Router::new();
        router.insert("GET", "/", "any").unwrap();
        router.insert_for_host("*.example.com", "GET", "/", "subdomain").unwrap();
        router.insert_for_host("api.example.com", "GET", "/", "exact").unwrap();

        let value = |host: Option<&str>| match router.resolve("GET", host, "/") {
            RouteMatch::Found { value, .. } => *value,
            other => panic!("expected Found, got {:?}", other),
        };

        assert_eq!(value(Some("api.example.com")), "exact");
        assert_eq!(value(Some("API.example.com:8443")), "exact");
        assert_eq!(value(Some("www.example.com")), "subdomain");
        assert_eq!(value(Some("example.com")), "any");
        assert_eq!(value(None), "any");
    }

    #[test]
    fn exact_host_wins_tie_with_wildcard() {
        let mut router = Router::new();
        router.insert_for_host("*.ab.com", "GET", "/", "wildcard").unwrap();
        router.insert_for_host("x.ab.com", "GET", "/", "exact").unwrap();

        match router.resolve("GET", Some("x.ab.com"), "/") {
            RouteMatch::Found { value, .. } => assert_eq!(*value, "exact"),
            other => panic!("expected Found, got {:?}", other),
        }
        match router.resolve("GET", Some("y.ab.com"), "/") {
            RouteMatch::Found { value, .. } => assert_eq!(*value, "wildcard"),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn falls_back_to_less_specific_host() {
        let mut router = Router::new();
        router.insert("GET", "/health", 0).unwrap();
        router.insert_for_host("api.example.com", "GET", "/users", 1).unwrap();

        assert_eq!(found_value(router.resolve("GET", Some("api.example.com"), "/health")), Some(0));
        assert_eq!(found_value(router.resolve("GET", Some("api.example.com"), "/users")), Some(1));
        assert_eq!(router.resolve("GET", Some("www.example.com"), "/users"), RouteMatch::NotFound);
    }

    #[test]
    fn allowed_methods_respects_host() {
        let mut router = Router::new();
        router.insert_for_host("api.example.com", "GET", "/users", 0).unwrap();
        router.insert("PUT", "/users", 1).unwrap();

        assert_eq!(
            router.allowed_methods(Some("api.example.com"), "/users"),
            vec!["GET".to_string(), "PUT".to_string()]
        );
        assert_eq!(router.allowed_methods(None, "/users"), vec!["PUT".to_string()]);
    }

    // === Groups ===

    #[test]
    fn group_prefixes_patterns() {
        let mut router = Router::new();
        {
            let mut api = router.group("/api/");
            api.insert("GET", "/users/:id", 0).unwrap();
            api.insert("GET", "", 1).unwrap();
            let mut v2 = api.group("/v2");
            v2.insert("GET", "/users", 2).unwrap();
        }

        assert_eq!(found_value(router.resolve("GET", None, "/api/users/1")), Some(0));
        assert_eq!(found_value(router.resolve("GET", None, "/api")), Some(1));
        assert_eq!(found_value(router.resolve("GET", None, "/api/v2/users")), Some(2));
    }

    #[test]
    fn group_host_applies_to_routes() {
        let mut router = Router::new();
        router
            .group("/admin")
            .host("admin.example.com")
            .insert("GET", "/", 0)
            .unwrap();

        assert_eq!(
            found_value(router.resolve("GET", Some("admin.example.com"), "/admin/")),
            Some(0)
        );
        assert_eq!(router.resolve("GET", None, "/admin/"), RouteMatch::NotFound);
    }

    #[test]
    fn nested_group_adds_missing_slash() {
        let mut router = Router::new();
        {
            let mut api = router.group("api");
            let mut v2 = api.group("v2");
            v2.insert("GET", "/users", 0).unwrap();
            let mut v3 = api.group("v3/");
            v3.insert("GET", "/users", 1).unwrap();
        }

        assert_eq!(found_value(router.resolve("GET", None, "/api/v2/users")), Some(0));
        assert_eq!(found_value(router.resolve("GET", None, "/api/v3/users")), Some(1));
        assert_eq!(router.resolve("GET", None, "/apiv2/users"), RouteMatch::NotFound);
    }

    #[test]
    fn group_rejects_relative_pattern() {
        let mut router: Router<usize> = Router::new();
        assert!(matches!(
            router.group("/api").insert("GET", "users", 0),
            Err(RouteError::Insert(InsertError::MissingLeadingSlash { .. }))
        ));
    }

    // === Parameter buffer ===

    #[test]
    fn resolve_into_reuses_buffer() {
        let router = router(&[("GET", "/a/:x/:y"), ("GET", "/b/:z")]);
        assert_eq!(router.max_params(), 2);

        let mut params = Params::with_capacity(router.max_params());
        let capacity = params.capacity();

        assert_eq!(router.resolve_into("GET", None, "/a/1/2", &mut params), Resolution::Found(&0));
        assert_eq!(params.len(), 2);
        assert_eq!(router.resolve_into("GET", None, "/b/3", &mut params), Resolution::Found(&1));
        assert_eq!(params.get("z"), Some("3"));
        assert_eq!(router.resolve_into("GET", None, "/c", &mut params), Resolution::NotFound);
        assert!(params.is_empty());
        assert_eq!(params.capacity(), capacity);
    }

    #[test]
    fn display_lists_trees() {
        let router = router(&[("GET", "/a"), ("POST", "/b")]);
        let dump = router.to_string();
        assert!(dump.contains("GET *\n/a [1] *\n"));
        assert!(dump.contains("POST *\n/b [1] *\n"));
    }
}
