//! Request routing.
//!
//! Paths are split into segments: the first names a controller, the next
//! an action, and the rest are parameters. Paths no controller claims are
//! served from the application root when a matching file exists.

mod manager;
mod path;
mod static_files;

pub use manager::{
    ControllerFactory, DispatchConfig, FallbackHandler, RouteManager, DEFAULT_SESSION_COOKIE,
};
pub use path::{is_reserved, split_action, split_segments, DEFAULT_ACTION, RESERVED_NAMES};
pub use static_files::{application_path, StaticFiles};
