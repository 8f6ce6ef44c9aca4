//! Loosely typed API records.
//!
//! Languages, actors, episode summaries and images are passed through as the
//! JSON objects the API returns, with a few helpers for the common fields.

use crate::client::image_url;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|value| !value.is_null())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// URL of the relative path in `image`
    pub fn image_url(&self) -> Option<String> {
        self.url_of("image")
    }

    /// URL of the relative path in `fileName`
    pub fn file_name_url(&self) -> Option<String> {
        self.url_of("fileName")
    }

    /// URL of the relative path in `thumbnail`
    pub fn thumbnail_url(&self) -> Option<String> {
        self.url_of("thumbnail")
    }

    fn url_of(&self, key: &str) -> Option<String> {
        self.get_str(key)
            .filter(|path| !path.is_empty())
            .map(image_url)
    }
}
