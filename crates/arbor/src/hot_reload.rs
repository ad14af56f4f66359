//! Hot reload of the routing forest without blocking lookups.
//!
//! Readers take an `Arc` snapshot of the current router and resolve against
//! it lock-free. Writers serialize on the route table, build a new router off
//! to the side and publish it with a single atomic swap. A rebuild that fails
//! leaves the previous snapshot in place.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use arbor_router::Router;
use parking_lot::Mutex;

use crate::config::{ConfigError, HandlerChain, RouteFile};

/// Result of a reload attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadResult {
    /// A new snapshot was published.
    Applied { generation: u64, routes: usize },
    /// The route table was identical; nothing was rebuilt.
    Unchanged { generation: u64 },
}

/// A router shared between request handlers and a reloading writer.
pub struct SharedRouter {
    current: ArcSwap<Router<HandlerChain>>,
    /// Source of the current snapshot. Held while rebuilding.
    table: Mutex<RouteFile>,
    generation: AtomicU64,
}

impl SharedRouter {
    /// Build the first snapshot from a route table.
    pub fn new(file: RouteFile) -> Result<Self, ConfigError> {
        let router = file.build_router()?;
        arbor_telemetry::log_routes_loaded!(routes = router.len(), "Routes loaded");

        Ok(Self {
            current: ArcSwap::from_pointee(router),
            table: Mutex::new(file),
            generation: AtomicU64::new(1),
        })
    }

    /// Load the first snapshot from a route table file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::new(RouteFile::load(path)?)
    }

    /// The router currently serving requests.
    pub fn snapshot(&self) -> Arc<Router<HandlerChain>> {
        self.current.load_full()
    }

    /// Incremented on every published snapshot, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// A copy of the route table behind the current snapshot.
    pub fn table(&self) -> RouteFile {
        self.table.lock().clone()
    }

    /// Replace the whole route table.
    pub fn reload(&self, file: RouteFile) -> Result<ReloadResult, ConfigError> {
        let mut table = self.table.lock();
        if *table == file {
            return Ok(ReloadResult::Unchanged {
                generation: self.generation(),
            });
        }

        let router = match file.build_router() {
            Ok(router) => router,
            Err(e) => {
                arbor_telemetry::log_reload_failed!(
                    error = %e.detail(),
                    "Route table rejected, keeping current routes"
                );
                return Err(e);
            }
        };
        *table = file;
        Ok(self.publish(router))
    }

    /// Re-read the route table from disk.
    pub fn reload_from(&self, path: &Path) -> Result<ReloadResult, ConfigError> {
        let file = RouteFile::load(path).inspect_err(|e| {
            arbor_telemetry::log_reload_failed!(
                path = %path.display(),
                error = %e.detail(),
                "Route file unreadable, keeping current routes"
            );
        })?;
        self.reload(file)
    }

    /// Switch a route on or off by name and republish.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> Result<ReloadResult, ConfigError> {
        let mut table = self.table.lock();
        let index = table
            .routes
            .iter()
            .position(|route| route.name == name)
            .ok_or_else(|| ConfigError::UnknownRoute(name.to_string()))?;

        if table.routes[index].enabled == enabled {
            return Ok(ReloadResult::Unchanged {
                generation: self.generation(),
            });
        }

        let mut next = table.clone();
        next.routes[index].enabled = enabled;
        let router = next.build_router().inspect_err(|e| {
            arbor_telemetry::log_reload_failed!(
                route = %name,
                enabled,
                error = %e.detail(),
                "Route toggle rejected, keeping current routes"
            );
        })?;
        *table = next;

        arbor_telemetry::log_route_toggled!(route = %name, enabled, "Route toggled");
        Ok(self.publish(router))
    }

    /// Callers must hold the table lock.
    fn publish(&self, router: Router<HandlerChain>) -> ReloadResult {
        let routes = router.len();
        self.current.store(Arc::new(router));
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        arbor_telemetry::log_routes_reloaded!(generation, routes, "Router snapshot published");
        ReloadResult::Applied { generation, routes }
    }
}
