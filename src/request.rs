//! Inbound request data handed to controllers.

use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method};

use crate::result::parse_cookie_header;

/// An inbound HTTP request, decoupled from the server that received it.
///
/// The query string and fragment are split off the path on construction,
/// so [`path`](Request::path) is always the bare path.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Request {
    /// Build a request from a method and a URI such as `/a/b?x=1#top`.
    pub fn new(method: Method, uri: &str) -> Self {
        let without_fragment = uri.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (without_fragment, None),
        };

        Self {
            method,
            path: path.to_string(),
            query,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Build a request from axum request parts and an already collected body.
    pub fn from_parts(parts: &Parts, body: Vec<u8>) -> Self {
        Self {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers.clone(),
            body,
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Add a cookie to the request's `Cookie` header.
    ///
    /// Cookies whose text is not a valid header value are skipped.
    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        let pair = format!("{}={}", name, value);
        let joined = match self.headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.is_empty() => format!("{}; {}", existing, pair),
            _ => pair,
        };

        match HeaderValue::from_str(&joined) {
            Ok(value) => {
                self.headers.insert(header::COOKIE, value);
            }
            Err(_) => tracing::warn!("Skipping cookie '{}' with invalid characters", name),
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Look up a cookie by name across all `Cookie` headers.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|raw| parse_cookie_header(raw).remove(name))
            .last()
    }

    /// First raw (undecoded) value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.as_deref()?.split('&').find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key == name).then_some(value)
        })
    }
}
