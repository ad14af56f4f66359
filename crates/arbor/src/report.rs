//! Serializable lookup outcomes for command output.

use std::collections::BTreeMap;

use arbor_router::{RouteMatch, Router};
use serde::Serialize;

use crate::config::HandlerChain;

/// Outcome of resolving one request, as printed by `arbor resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResolveReport {
    Found {
        route: String,
        handlers: Vec<String>,
        params: BTreeMap<String, String>,
    },
    Redirect {
        location: String,
        status: u16,
    },
    MethodNotAllowed {
        allowed: Vec<String>,
    },
    NotFound,
}

impl ResolveReport {
    /// Resolve a request target. Anything after `?` or `#` is ignored for
    /// matching and carried over to a redirect location.
    pub fn resolve(
        router: &Router<HandlerChain>,
        method: &str,
        host: Option<&str>,
        target: &str,
    ) -> Self {
        let (path, suffix) = match target.find(['?', '#']) {
            Some(at) => target.split_at(at),
            None => (target, ""),
        };

        let report = match router.resolve(method, host, path) {
            RouteMatch::Found { value, params } => Self::Found {
                route: value.route.clone(),
                handlers: value.handlers.clone(),
                params: params
                    .iter()
                    .map(|param| (param.key.to_string(), param.value.to_string()))
                    .collect(),
            },
            RouteMatch::Redirect { location, status } => Self::Redirect {
                location: format!("{}{}", location, suffix),
                status: status.as_u16(),
            },
            RouteMatch::MethodNotAllowed { allowed } => Self::MethodNotAllowed { allowed },
            RouteMatch::NotFound => Self::NotFound,
        };

        arbor_telemetry::log_request_resolved!(
            method,
            path,
            outcome = report.label(),
            "Request resolved"
        );
        report
    }

    /// Short outcome name, matching the serialized `outcome` tag.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Found { .. } => "found",
            Self::Redirect { .. } => "redirect",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::NotFound => "not_found",
        }
    }

    /// HTTP status a server would answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Found { .. } => 200,
            Self::Redirect { status, .. } => *status,
            Self::MethodNotAllowed { .. } => 405,
            Self::NotFound => 404,
        }
    }
}
