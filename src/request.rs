//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::method::{Method, UnknownMethod};

/// An incoming HTTP request with its body fully buffered.
///
/// The server builds one per hyper request. Tests build them directly:
///
/// ```rust
/// use userbook::{Method, Request};
///
/// let req = Request::new(Method::Post, "/users")
///     .with_header("authorization", "Bearer demo-token")
///     .with_body(r#"{"name":"Carol","email":"carol@x.com"}"#);
/// assert_eq!(req.header("Authorization"), Some("Bearer demo-token"));
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    // Wire name of an `Extension` method.
    extension: Option<String>,
    path: String,
    headers: Vec<(String, String)>,
    body: Bytes,
    params: HashMap<String, String>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            extension: None,
            path: path.into(),
            headers: Vec::new(),
            body: Bytes::new(),
            params: HashMap::new(),
        }
    }

    /// Builds a request from the method token on the wire. Methods outside
    /// RFC 9110 become [`Method::Extension`] and keep their name.
    pub fn from_wire(method: &str, path: impl Into<String>) -> Self {
        match method.parse::<Method>() {
            Ok(method) => Self::new(method, path),
            Err(UnknownMethod(name)) => Self {
                extension: Some(name),
                ..Self::new(Method::Extension, path)
            },
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }

    /// The method as the client sent it, e.g. `"GET"` or `"PROPFIND"`.
    pub fn method_name(&self) -> &str {
        self.extension.as_deref().unwrap_or(self.method.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Returns the first value when the
    /// header is repeated.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}
