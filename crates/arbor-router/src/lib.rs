//! Compressed radix-tree HTTP request router.
//!
//! Patterns are made of static bytes, `:name` parameters that capture one
//! path segment and a trailing `*name` catch-all that captures the rest of
//! the path. Each (method, host) pair gets its own [`Tree`]; [`Router`]
//! picks the trees for a request and reports a match, a trailing-slash
//! redirect, a 405 or a 404.
//!
//! ```
//! use arbor_router::{RouteMatch, Router};
//!
//! let mut router = Router::new();
//! router.insert("GET", "/users/:id", "show_user").unwrap();
//!
//! match router.resolve("GET", None, "/users/42") {
//!     RouteMatch::Found { value, params } => {
//!         assert_eq!(*value, "show_user");
//!         assert_eq!(params.get("id"), Some("42"));
//!     }
//!     _ => unreachable!(),
//! }
//! ```

pub mod error;
pub mod host;
pub mod params;
pub mod pattern;
pub mod router;
pub mod tree;

pub use error::{InsertError, RouteError};
pub use host::HostPattern;
pub use params::{OwnedParams, Param, Params, ParamsParseError};
pub use pattern::Pattern;
pub use router::{
    redirect_status, toggle_trailing_slash, Group, Resolution, RouteMatch, Router, RouterConfig,
    ANY_METHODS,
};
pub use tree::{Outcome, PathMatch, Tree};
