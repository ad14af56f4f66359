//! Route table file.
//!
//! ```yaml
//! settings:
//!   path_correction: true
//!   method_not_allowed: true
//! routes:
//!   - name: show-user
//!     method: GET
//!     path: /users/:id
//!     host: api.example.com
//!     handlers: [auth, show_user]
//! ```
//!
//! Files ending in `.json` are read as JSON, everything else as YAML.

use std::collections::HashSet;
use std::path::Path;

use arbor_router::{RouteError, Router, RouterConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Method name that registers a route under every standard method.
pub const ANY_METHOD: &str = "ANY";

/// Errors produced while loading a route table or building a router from it.
///
/// Wrapped causes are exposed through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML route table")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON route table")]
    Json(#[from] serde_json::Error),

    /// The entry at this position has an empty `name`.
    #[error("route #{0} has an empty name")]
    EmptyName(usize),

    #[error("route `{0}` is defined more than once")]
    DuplicateName(String),

    #[error("route `{0}` has no handlers")]
    NoHandlers(String),

    /// The router refused the route.
    #[error("route `{name}` rejected")]
    Route {
        name: String,
        #[source]
        source: RouteError,
    },

    #[error("unknown route `{0}`")]
    UnknownRoute(String),
}

impl ConfigError {
    /// This error followed by its causes, joined with `: `.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            detail.push_str(": ");
            detail.push_str(&cause.to_string());
            source = cause.source();
        }
        detail
    }
}

/// The value bound to every route: its name and ordered handler names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerChain {
    pub route: String,
    pub handlers: Vec<String>,
}

/// Router switches as they appear in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_true")]
    pub path_correction: bool,
    #[serde(default)]
    pub method_not_allowed: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path_correction: true,
            method_not_allowed: false,
        }
    }
}

impl From<Settings> for RouterConfig {
    fn from(settings: Settings) -> Self {
        RouterConfig {
            path_correction: settings.path_correction,
            method_not_allowed: settings.method_not_allowed,
        }
    }
}

/// One route entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteSpec {
    pub name: String,
    /// An HTTP method, or `ANY`.
    #[serde(default = "default_method")]
    pub method: String,
    pub path: String,
    /// Host pattern; absent means every host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub handlers: Vec<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// A whole route table file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteFile {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

fn default_true() -> bool {
    true
}

fn default_method() -> String {
    "GET".to_string()
}

impl RouteFile {
    /// Read and parse a route table, picking the format by extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Check the constraints the router itself does not know about.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for (index, route) in self.routes.iter().enumerate() {
            if route.name.trim().is_empty() {
                return Err(ConfigError::EmptyName(index));
            }
            if !names.insert(route.name.as_str()) {
                return Err(ConfigError::DuplicateName(route.name.clone()));
            }
            if route.handlers.is_empty() {
                return Err(ConfigError::NoHandlers(route.name.clone()));
            }
        }
        Ok(())
    }

    /// Number of routes that will be registered.
    pub fn enabled_count(&self) -> usize {
        self.routes.iter().filter(|route| route.enabled).count()
    }

    /// Build a fresh router from the enabled routes, in file order.
    pub fn build_router(&self) -> Result<Router<HandlerChain>, ConfigError> {
        self.validate()?;

        let mut router = Router::with_config(self.settings.into());
        for route in self.routes.iter().filter(|route| route.enabled) {
            let chain = HandlerChain {
                route: route.name.clone(),
                handlers: route.handlers.clone(),
            };
            let host = route.host.as_deref().unwrap_or("");

            let result = if route.method.eq_ignore_ascii_case(ANY_METHOD) {
                router.insert_any_for_host(host, &route.path, chain)
            } else {
                router.insert_for_host(host, &route.method, &route.path, chain)
            };
            result.map_err(|source| ConfigError::Route {
                name: route.name.clone(),
                source,
            })?;
        }

        Ok(router)
    }
}
