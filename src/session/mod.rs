//! Session management module.
//!
//! Server-side browser sessions keyed by a cookie-carried ID, held in a
//! process-wide [`SessionStore`] and expired after a period of inactivity.

mod id;
mod store;
mod sweeper;

pub use id::{SessionId, SESSION_ID_LEN};
pub use store::{Session, SessionChange, SessionStore, SessionValue, DEFAULT_SESSION_TIMEOUT};
pub use sweeper::{spawn_sweeper, MIN_SWEEP_INTERVAL};
