//! Output sinks that action results write themselves to.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::error::DispatchError;
use crate::Result;

/// Destination for a single HTTP response.
///
/// The status is committed once; headers may only be written before it.
pub trait ResponseSink: Send {
    /// Replace any existing values of a header.
    fn set_header(&mut self, name: &str, value: &str) -> Result<()>;

    /// Add a header value without replacing existing ones (used for `Set-Cookie`).
    fn append_header(&mut self, name: &str, value: &str) -> Result<()>;

    /// Commit the response status.
    fn write_status(&mut self, status: StatusCode) -> Result<()>;

    /// Append payload bytes.
    fn write_body(&mut self, data: &[u8]) -> Result<()>;
}

/// In-memory response sink, convertible into an axum [`Response`].
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed status, or 200 if none was written.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn is_committed(&self) -> bool {
        self.status.is_some()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if it is valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All `Set-Cookie` values in write order.
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .get_all(axum::http::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
        let name = HeaderName::try_from(name)
            .map_err(|_| DispatchError::InvalidHeader(format!("bad name '{}'", name)))?;
        let value = HeaderValue::try_from(value)
            .map_err(|_| {
                DispatchError::InvalidHeader(format!("bad value for '{}'", name.as_str()))
            })?;
        Ok((name, value))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_committed() {
            return Err(DispatchError::ResponseCommitted);
        }
        Ok(())
    }
}

impl ResponseSink for ResponseBuffer {
    fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        let (name, value) = Self::header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    fn append_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_open()?;
        let (name, value) = Self::header_pair(name, value)?;
        self.headers.append(name, value);
        Ok(())
    }

    fn write_status(&mut self, status: StatusCode) -> Result<()> {
        self.ensure_open()?;
        self.status = Some(status);
        Ok(())
    }

    fn write_body(&mut self, data: &[u8]) -> Result<()> {
        self.body.extend_from_slice(data);
        Ok(())
    }
}

impl IntoResponse for ResponseBuffer {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = self.headers;
        response
    }
}
