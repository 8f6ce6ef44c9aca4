//! The TVDB client handle
//!
//! A [`Client`] is a cheap, clonable handle: the transport, the bearer token
//! and the request cache are shared between clones, while the active language
//! belongs to each handle. Switching language therefore never affects other
//! call sites holding the same client.

use crate::cache::{Params, RequestCache, RequestKey, lock};
use crate::entity::{Completeness, Entity, EntityKind, EntityType};
use crate::response::{Outcome, classify, error_message};
use crate::transport::{DEFAULT_BASE_URL, Headers, HttpTransport, RawResponse, Transport};
use crate::{Result, TvdbError};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

const IMAGE_BASE_URL: &str = "https://thetvdb.com/banners/";

/// Connection settings for a [`Client`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// TVDB API key used for `/login`
    pub api_key: String,
    /// Language sent as `Accept-Language`, `None` for the API default (English)
    pub language: Option<String>,
    /// API base URL
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            language: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

struct ClientInner {
    transport: Box<dyn Transport>,
    token: Mutex<Option<String>>,
    cache: RequestCache,
}

/// Handle to the TVDB API.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    language: Option<String>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Logs in against the live API described by `config`.
    pub fn login(config: &ClientConfig) -> Result<Self> {
        Self::connect(HttpTransport::new(config.base_url.clone()), config)
    }

    /// Logs in through the given transport.
    ///
    /// # Arguments
    ///
    /// * `transport` - Performs the HTTP calls, e.g. [`HttpTransport`]
    /// * `config` - API key and initial language
    ///
    /// # Errors
    ///
    /// Returns [`TvdbError::Authentication`] when `/login` does not answer 200.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # fn main() -> tvdb2::Result<()> {
    /// use tvdb2::{Client, ClientConfig, HttpTransport};
    ///
    /// let config = ClientConfig::new("API_KEY").with_language("it");
    /// let client = Client::connect(HttpTransport::default(), &config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect<T>(transport: T, config: &ClientConfig) -> Result<Self>
    where
        T: Transport + 'static,
    {
        let client = Self::unauthenticated(transport, config.language.clone());

        // Exchange the API key for a bearer token
        let response = client.inner.transport.post(
            "/login",
            &json!({ "apikey": config.api_key }),
            &client.headers(),
        )?;
        let token = token_from(response)?;

        // Every later request carries the token
        *lock(&client.inner.token) = Some(token);
        debug!("logged in");
        Ok(client)
    }

    /// Creates a client without performing `/login`.
    pub fn unauthenticated<T>(transport: T, language: Option<String>) -> Self
    where
        T: Transport + 'static,
    {
        Self {
            inner: Arc::new(ClientInner {
                transport: Box::new(transport),
                token: Mutex::new(None),
                cache: RequestCache::new(),
            }),
            language,
        }
    }

    /// Requests a fresh token via `GET /refresh_token`. Never memoized.
    pub fn refresh_token(&self) -> Result<String> {
        let response = self
            .inner
            .transport
            .get("/refresh_token", &[], &self.headers())?;
        let token = token_from(response)?;
        *lock(&self.inner.token) = Some(token.clone());
        debug!("token refreshed");
        Ok(token)
    }

    /// The language this handle requests data in.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Changes the language of this handle only.
    pub fn set_language(&mut self, language: Option<String>) {
        self.language = language;
    }

    /// Returns a handle sharing this client's token and cache but requesting
    /// data in `language`.
    pub fn with_language(&self, language: impl Into<String>) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            language: Some(language.into()),
        }
    }

    /// Runs `scope` with a handle set to `language`.
    ///
    /// `self` is never modified, so its language is the same after `scope`
    /// returns, fails or panics.
    pub fn scoped_language<R, F>(&self, language: impl Into<String>, scope: F) -> R
    where
        F: FnOnce(&Client) -> R,
    {
        let scoped = self.with_language(language);
        scope(&scoped)
    }

    /// Drops every memoized response.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Number of memoized responses.
    pub fn cached_requests(&self) -> usize {
        self.inner.cache.len()
    }

    /// Memoized, classified read of the detail record of an entity.
    pub fn fetch_entity(&self, kind: EntityType, id: u64) -> Result<Outcome> {
        self.fetch(&kind.detail_path(id), &Params::new())
    }

    /// Memoized, classified read of a listing hanging off an entity, e.g.
    /// `(EntityType::Series, 121361, "episodes/query")` for
    /// `/series/121361/episodes/query`.
    pub fn fetch_listing(
        &self,
        kind: EntityType,
        parent_id: u64,
        endpoint: &str,
        params: &Params,
    ) -> Result<Outcome> {
        self.fetch(&kind.listing_path(parent_id, endpoint), params)
    }

    /// Memoized `GET` in this handle's language.
    pub(crate) fn fetch(&self, path: &str, params: &Params) -> Result<Outcome> {
        let key = RequestKey::new(path, params, self.language());
        let outcome = self.inner.cache.fetch(&key, || {
            let response = self
                .inner
                .transport
                .get(path, &key.query(), &self.headers())?;
            let outcome = classify(response);
            if let Outcome::Failure { status, message } = &outcome {
                warn!(path, status, message = %message, "request failed");
            }
            Ok(outcome)
        })?;
        Ok(outcome)
    }

    /// Reads a single record. 404 yields `None`.
    pub(crate) fn object_result<T, F>(&self, path: &str, params: &Params, build: F) -> Result<Option<T>>
    where
        F: FnOnce(Value) -> Result<T>,
    {
        match self.fetch(path, params)? {
            Outcome::Success(mut body) => build(take_data(&mut body)).map(Some),
            Outcome::Empty => Ok(None),
            Outcome::Failure { status, message } => Err(TvdbError::Request { status, message }),
        }
    }

    /// Reads a list of records. 404 yields an empty list.
    pub(crate) fn array_result<T, F>(&self, path: &str, params: &Params, build: F) -> Result<Vec<T>>
    where
        F: FnMut(Value) -> Result<T>,
    {
        match self.fetch(path, params)? {
            Outcome::Success(mut body) => {
                let items = match take_data(&mut body) {
                    Value::Null => Vec::new(),
                    data => serde_json::from_value::<Vec<Value>>(data).map_err(|source| {
                        TvdbError::Decode {
                            context: path.to_string(),
                            source,
                        }
                    })?,
                };
                items.into_iter().map(build).collect()
            }
            Outcome::Empty => Ok(Vec::new()),
            Outcome::Failure { status, message } => Err(TvdbError::Request { status, message }),
        }
    }

    /// Builds an entity from a payload fetched in this handle's language.
    pub(crate) fn entity<K: EntityKind>(
        &self,
        data: Value,
        completeness: Completeness,
    ) -> Result<Entity<K>> {
        Entity::from_payload(data, self.language(), completeness)
    }

    fn headers(&self) -> Headers {
        let mut headers: Headers = vec![
            ("Content-Type", "application/json".to_string()),
            ("Accept", "application/json".to_string()),
        ];
        if let Some(language) = self.language() {
            headers.push(("Accept-Language", language.to_string()));
        }
        if let Some(token) = lock(&self.inner.token).as_ref() {
            headers.push(("Authorization", format!("Bearer {}", token)));
        }
        headers
    }
}

/// Moves the `data` member out of a response body.
fn take_data(body: &mut Value) -> Value {
    body.get_mut("data").map(Value::take).unwrap_or(Value::Null)
}

/// Extracts the token from a `/login` or `/refresh_token` response.
fn token_from(response: RawResponse) -> Result<String> {
    if response.status != 200 {
        return Err(TvdbError::Authentication {
            status: response.status,
            message: error_message(response.status, &response.body),
        });
    }
    response
        .body
        .get("token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| TvdbError::Authentication {
            status: response.status,
            message: "Response carried no token".to_string(),
        })
}

/// Full URL of an artwork path relative to the TVDB banner root,
/// e.g. `posters/121361-1.jpg`.
pub fn image_url(path: &str) -> String {
    format!("{}{}", IMAGE_BASE_URL, path.trim_start_matches('/'))
}
