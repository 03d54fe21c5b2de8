//! Transport Port - HTTP Request Execution Interface
//!
//! A request descriptor is a method, a URL, a header mapping and an
//! optional body. Descriptors are built per call and never reused. The
//! transport executes one and returns the status code and body bytes.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::TransportError;

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";
pub const URL_ENCODED: &str = "application/x-www-form-urlencoded";

/// HTTP method of a request descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
}

impl Method {
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Get => "GET",
      Self::Post => "POST",
      Self::Put => "PUT",
      Self::Delete => "DELETE",
    }
  }
}

impl std::fmt::Display for Method {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A fully-formed request descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
  /// HTTP method.
  pub method: Method,
  /// Absolute URL including query string.
  pub url: String,
  /// Header name -> value.
  pub headers: BTreeMap<String, String>,
  /// Request body, if any.
  pub body: Option<String>,
}

impl HttpRequest {
  fn new(method: Method, url: impl Into<String>) -> Self {
    Self {
      method,
      url: url.into(),
      headers: BTreeMap::new(),
      body: None,
    }
  }

  pub fn get(url: impl Into<String>) -> Self {
    Self::new(Method::Get, url)
  }

  pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
    Self::new(Method::Post, url).with_body(body)
  }

  pub fn put(url: impl Into<String>, body: impl Into<String>) -> Self {
    Self::new(Method::Put, url).with_body(body)
  }

  pub fn delete(url: impl Into<String>) -> Self {
    Self::new(Method::Delete, url)
  }

  #[must_use]
  pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.insert(name.into(), value.into());
    self
  }

  #[must_use]
  pub fn with_body(mut self, body: impl Into<String>) -> Self {
    self.body = Some(body.into());
    self
  }

  /// Attach `Authorization: Bearer <token>`.
  #[must_use]
  pub fn bearer(self, token: &str) -> Self {
    self.with_header(AUTHORIZATION, format!("Bearer {token}"))
  }

  /// Mark the body as JSON.
  #[must_use]
  pub fn json(self) -> Self {
    self.with_header(CONTENT_TYPE, APPLICATION_JSON)
  }

  pub fn header(&self, name: &str) -> Option<&str> {
    self.headers.get(name).map(String::as_str)
  }
}

/// Status code and body of an executed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

impl HttpResponse {
  pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
    Self {
      status,
      body: body.into(),
    }
  }

  pub const fn is_ok(&self) -> bool {
    self.status == 200
  }

  pub const fn is_success(&self) -> bool {
    self.status >= 200 && self.status < 300
  }

  /// Body as text, lossy on invalid UTF-8.
  pub fn text(&self) -> String {
    String::from_utf8_lossy(&self.body).into_owned()
  }
}

/// Trait for HTTP transports.
///
/// Implementors hold a long-lived, pooled client. One handle is shared by
/// every service and by concurrent chain fetches, so implementations must
/// be safe to call from many tasks at once without extra locking.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
  /// Execute one request and return its status and body.
  ///
  /// # Errors
  /// Returns error if the request could not be sent or no response arrived
  /// within the transport's own timeout. Non-2xx statuses are NOT errors.
  async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_descriptor_builders() {
    let request = HttpRequest::post("https://example.com/orders", "{}")
      .bearer("abc")
      .json();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.header(AUTHORIZATION), Some("Bearer abc"));
    assert_eq!(request.header(CONTENT_TYPE), Some(APPLICATION_JSON));
    assert_eq!(request.body.as_deref(), Some("{}"));

    let request = HttpRequest::delete("https://example.com/orders/1");
    assert!(request.body.is_none());
    assert_eq!(request.method.to_string(), "DELETE");
  }

  #[test]
  fn test_response_helpers() {
    let response = HttpResponse::new(201, "created");
    assert!(!response.is_ok());
    assert!(response.is_success());
    assert_eq!(response.text(), "created");
  }
}
