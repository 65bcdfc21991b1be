//! Action results produced by controller actions and hooks.

use std::borrow::Cow;
use std::collections::HashMap;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::{Cookie, ResponseBuffer, ResponseSink};
use crate::Result;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// The outcome of an action: status, headers, cookies and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    /// HTTP status to write. Defaults to 200.
    pub status_code: StatusCode,
    /// Headers to write, one value per name.
    pub headers: HashMap<String, String>,
    /// Cookies to set, in order.
    pub cookies: Vec<Cookie>,
    /// Raw payload.
    pub body: Vec<u8>,
}

impl ActionResult {
    /// A 200 result carrying the given payload.
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code: StatusCode::OK,
            headers: HashMap::new(),
            cookies: Vec::new(),
            body: body.into(),
        }
    }

    /// A 200 plain-text result.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(body.into()).with_header(header::CONTENT_TYPE.as_str(), TEXT_PLAIN)
    }

    /// A 200 HTML result. The markup is passed through untouched.
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(body.into())
            .with_header(header::CONTENT_TYPE.as_str(), "text/html; charset=utf-8")
    }

    /// A 200 result with the payload encoded as JSON.
    pub fn json<T: Serialize + ?Sized>(payload: &T) -> Result<Self> {
        let data = serde_json::to_vec(payload)?;
        Ok(Self::new(data).with_header(header::CONTENT_TYPE.as_str(), "application/json"))
    }

    /// Built-in 404 result used when no not-found hook produced one.
    pub fn not_found() -> Self {
        Self::text("Not Found").with_status(StatusCode::NOT_FOUND)
    }

    /// Built-in 500 result used when no error hook produced one.
    pub fn internal_error() -> Self {
        Self::text("Internal Server Error").with_status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status_code = status;
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_header(key, value);
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.add_cookie(cookie);
        self
    }

    /// Set a header, replacing any previous value for the same name.
    pub fn add_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    pub fn add_cookie(&mut self, cookie: Cookie) {
        self.cookies.push(cookie);
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Write headers, cookies, status and payload to the sink, in that order.
    pub fn execute(&self, sink: &mut dyn ResponseSink) -> Result<()> {
        for (key, value) in &self.headers {
            sink.set_header(key, value)?;
        }

        for cookie in &self.cookies {
            sink.append_header(header::SET_COOKIE.as_str(), &cookie.to_header_value())?;
        }

        sink.write_status(self.status_code)?;
        sink.write_body(&self.body)
    }
}

impl IntoResponse for ActionResult {
    fn into_response(self) -> Response {
        let mut buffer = ResponseBuffer::new();
        match self.execute(&mut buffer) {
            Ok(()) => buffer.into_response(),
            Err(e) => {
                tracing::error!("Failed to execute action result: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
