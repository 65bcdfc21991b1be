//! # mvc-dispatch
//!
//! Controller/action request dispatch with cookie-keyed sessions and a
//! static file fallback.
//!
//! Request paths take the shape `/{controller}/{action}/{p1}/{p2}/...`.
//! The [`RouteManager`] maps the first segment to a registered controller
//! factory, builds a fresh [`Controller`] for the request, attaches the
//! caller's session and runs the controller pipeline (before hook, gate,
//! action, after hook). Paths no controller claims are served from the
//! application root, except the reserved source folders.
//!
//! ## Features
//!
//! - **Controllers as records**: actions and lifecycle hooks are closures
//!   registered on a plain [`Controller`]
//! - **Sessions**: an in-memory [`SessionStore`] with idle expiry
//! - **Static files**: async file serving with traversal protection
//! - **HTTP front end**: an axum router and a ready-to-run [`server::Application`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::http::Method;
//! use mvc_dispatch::{ActionResult, Controller, DispatchConfig, RouteManager};
//! use mvc_dispatch::server::{Application, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> mvc_dispatch::Result<()> {
//!     mvc_dispatch::logging::try_init().ok();
//!
//!     let manager = RouteManager::new(DispatchConfig::default());
//!     manager.register_controller("home", |request| {
//!         let mut controller = Controller::new(request);
//!         controller.register_action(Method::GET, "Index", |_, _| {
//!             Ok(Some(ActionResult::text("Hello")))
//!         });
//!         controller
//!     });
//!     manager.set_default_controller("home");
//!
//!     Application::new(ServerConfig::default(), Arc::new(manager)).run().await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod request;
pub mod result;
pub mod routing;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use controller::{ActionMethod, Controller, PipelineExit, PipelineOutcome, PipelineStage};
pub use error::{DispatchError, Result};
pub use request::Request;
pub use result::{ActionResult, Cookie, ResponseBuffer, ResponseSink};
pub use routing::{DispatchConfig, RouteManager};
pub use session::{Session, SessionId, SessionStore};
