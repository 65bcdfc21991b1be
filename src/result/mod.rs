//! Action results and the sinks they are written to.
//!
//! An [`ActionResult`] is a finished response description. The dispatcher
//! never inspects how the payload was built; it only asks the result to
//! [`execute`](ActionResult::execute) itself against a [`ResponseSink`].

mod action;
mod cookie;
mod sink;

pub use action::ActionResult;
pub use cookie::{parse_cookie_header, Cookie};
pub use sink::{ResponseBuffer, ResponseSink};
