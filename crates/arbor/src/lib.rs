//! arbor application library.
//!
//! Route table configuration, the hot-reloadable shared router and the file
//! watcher. The main entry point is the `arbor` binary.

pub mod config;
pub mod hot_reload;
pub mod report;
pub mod watcher;

pub use config::{ConfigError, HandlerChain, RouteFile, RouteSpec, Settings};
pub use hot_reload::{ReloadResult, SharedRouter};
pub use report::ResolveReport;
pub use watcher::RouteWatcher;
