//! HTTP transport boundary
//!
//! The client never talks to the network directly. Every call goes through a
//! [`Transport`], which turns a path, query and header set into a status code
//! and a parsed JSON body. [`HttpTransport`] is the production implementation
//! on top of `reqwest`'s blocking client.

use serde_json::Value;
use thiserror::Error;

/// Default base URL of the TVDB JSON API v2.
pub const DEFAULT_BASE_URL: &str = "https://api.thetvdb.com";

/// Errors raised below the API layer: the request never produced a usable
/// response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP request could not be sent or its body could not be read
    #[error("Request failed: {0}")]
    RequestError(String),

    /// The response body was not valid JSON
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// The HTTP status code
    pub status: u16,
    /// The parsed JSON body, `Value::Null` when the body was empty
    pub body: Value,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Request headers as name/value pairs.
pub type Headers = Vec<(&'static str, String)>;

/// Blocking request/response transport used by the client.
///
/// Implementors only move bytes. Status codes are interpreted by the
/// response classifier, never here.
pub trait Transport: Send + Sync {
    /// Performs `GET {path}?{query}`.
    fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, TransportError>;

    /// Performs `POST {path}` with a JSON body.
    fn post(
        &self,
        path: &str,
        body: &Value,
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, TransportError> {
        (**self).get(path, query, headers)
    }

    fn post(
        &self,
        path: &str,
        body: &Value,
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, TransportError> {
        (**self).post(path, body, headers)
    }
}

/// Transport for the live TVDB API.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_headers(
        mut request: reqwest::blocking::RequestBuilder,
        headers: &[(&'static str, String)],
    ) -> reqwest::blocking::RequestBuilder {
        for (name, value) in headers {
            request = request.header(*name, value);
        }
        request
    }

    fn finish(response: reqwest::blocking::Response) -> Result<RawResponse, TransportError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| TransportError::RequestError(e.to_string()))?;
        Ok(RawResponse {
            status,
            body: parse_body(&text)?,
        })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Transport for HttpTransport {
    fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, TransportError> {
        let request = self.client.get(self.url(path)).query(query);
        let response = Self::apply_headers(request, headers)
            .send()
            .map_err(|e| TransportError::RequestError(e.to_string()))?;
        Self::finish(response)
    }

    fn post(
        &self,
        path: &str,
        body: &Value,
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, TransportError> {
        let request = self.client.post(self.url(path)).json(body);
        let response = Self::apply_headers(request, headers)
            .send()
            .map_err(|e| TransportError::RequestError(e.to_string()))?;
        Self::finish(response)
    }
}

/// Parses a response body. Empty bodies are `Null`, anything else must be JSON.
fn parse_body(text: &str) -> Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| TransportError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body("").unwrap(), Value::Null);
        assert_eq!(parse_body("  \n").unwrap(), Value::Null);
        assert_eq!(
            parse_body(r#"{"data": [1, 2]}"#).unwrap(),
            json!({"data": [1, 2]})
        );
        assert!(matches!(
            parse_body("<html>"),
            Err(TransportError::ParseError(_))
        ));
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let transport = HttpTransport::new("https://example.org/");
        assert_eq!(transport.url("/series/1"), "https://example.org/series/1");
    }
}
