//! HTTP front end.
//!
//! Every request, whatever its method or path, goes through one fallback
//! handler that hands it to the [`RouteManager`](crate::routing::RouteManager).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mvc_dispatch::routing::{DispatchConfig, RouteManager};
//! use mvc_dispatch::server::{Application, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> mvc_dispatch::Result<()> {
//!     let manager = Arc::new(RouteManager::new(DispatchConfig::default()));
//!     Application::new(ServerConfig::new("127.0.0.1", 3000), manager)
//!         .run()
//!         .await
//! }
//! ```

mod app;
mod router;

pub use app::Application;
pub use router::{create_router, create_router_with_limit, ServerConfig, DEFAULT_MAX_BODY_BYTES};
