//! Canned-response transport for unit tests.

use crate::cache::{Params, lock};
use crate::client::{Client, ClientConfig};
use crate::transport::{RawResponse, Transport, TransportError};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

/// A request seen by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: Params,
    pub language: Option<String>,
    pub authorization: Option<String>,
}

struct Route {
    method: &'static str,
    path: String,
    query: Option<Params>,
    language: Option<String>,
    response: RawResponse,
}

impl Route {
    fn matches(&self, method: &str, path: &str, query: &Params, language: Option<&str>) -> bool {
        self.method == method
            && self.path == path
            && self.query.as_ref().is_none_or(|q| q == query)
            && self
                .language
                .as_deref()
                .is_none_or(|l| Some(l) == language)
    }
}

/// Serves responses registered per path and records every call.
///
/// Routes are matched in registration order, so register the specific ones
/// (with query or language) before the catch-all for a path. Unmatched
/// requests answer 404.
pub(crate) struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    /// A transport that accepts `/login` with token `test-token`.
    pub fn new() -> Arc<Self> {
        let fake = Self::without_login();
        fake.on_post("/login", 200, json!({"token": "test-token"}));
        fake
    }

    pub fn without_login() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn route(&self, route: Route) {
        lock(&self.routes).push(route);
    }

    pub fn on_get(&self, path: &str, status: u16, body: Value) {
        self.route(Route {
            method: "GET",
            path: path.to_string(),
            query: None,
            language: None,
            response: RawResponse::new(status, body),
        });
    }

    pub fn on_get_with(&self, path: &str, query: Params, status: u16, body: Value) {
        self.route(Route {
            method: "GET",
            path: path.to_string(),
            query: Some(query),
            language: None,
            response: RawResponse::new(status, body),
        });
    }

    pub fn on_get_in(&self, path: &str, language: &str, status: u16, body: Value) {
        self.route(Route {
            method: "GET",
            path: path.to_string(),
            query: None,
            language: Some(language.to_string()),
            response: RawResponse::new(status, body),
        });
    }

    pub fn on_post(&self, path: &str, status: u16, body: Value) {
        self.route(Route {
            method: "POST",
            path: path.to_string(),
            query: None,
            language: None,
            response: RawResponse::new(status, body),
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Number of GET requests to `path`.
    pub fn count(&self, path: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method == "GET" && c.path == path)
            .count()
    }

    /// Number of GET requests to `path` made in `language`.
    pub fn count_in(&self, path: &str, language: Option<&str>) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method == "GET" && c.path == path && c.language.as_deref() == language)
            .count()
    }

    fn respond(
        &self,
        method: &'static str,
        path: &str,
        query: Params,
        headers: &[(&'static str, String)],
    ) -> RawResponse {
        let header = |name: &str| {
            headers
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| v.clone())
        };
        let call = Call {
            method,
            path: path.to_string(),
            query,
            language: header("Accept-Language"),
            authorization: header("Authorization"),
        };

        let response = lock(&self.routes)
            .iter()
            .find(|r| r.matches(method, path, &call.query, call.language.as_deref()))
            .map(|r| r.response.clone())
            .unwrap_or_else(|| RawResponse::new(404, json!({"Error": "no route"})));

        lock(&self.calls).push(call);
        response
    }
}

impl Transport for FakeTransport {
    fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, TransportError> {
        let query = query.iter().cloned().collect();
        Ok(self.respond("GET", path, query, headers))
    }

    fn post(
        &self,
        path: &str,
        _body: &Value,
        headers: &[(&'static str, String)],
    ) -> Result<RawResponse, TransportError> {
        Ok(self.respond("POST", path, Params::new(), headers))
    }
}

/// Logs a client in through `fake`.
pub(crate) fn connect(fake: &Arc<FakeTransport>) -> Client {
    Client::connect(Arc::clone(fake), &ClientConfig::new("test-key"))
        .expect("fake login succeeds")
}
