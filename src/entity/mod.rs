//! Lazily completed series and episode records.
//!
//! Listing and search endpoints return a subset of a record's fields (the
//! index fields). The remaining show fields only come from the detail
//! endpoint. An [`Entity`] remembers, per language, whether its full field set
//! has been loaded and performs the detail fetch itself the first time a
//! caller asks for something it does not have yet.

use crate::cache::lock;
use crate::client::Client;
use crate::response::Outcome;
use crate::{Result, TvdbError};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Mutex;
use tracing::debug;

/// Key of the problems the API reports next to a detail record's `data`.
const ERRORS_KEY: &str = "errors";

/// Defines a field enum together with its index/show partition and the JSON
/// keys the API uses for each field.
macro_rules! field_registry {
    (
        $(#[$meta:meta])*
        $name:ident {
            index: { $($index:ident => $index_key:literal),* $(,)? }
            show: { $($show:ident => $show_key:literal),* $(,)? }
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($index,)*
            $($show,)*
        }

        impl $name {
            /// Fields present in listing and search payloads
            pub const INDEX: &'static [$name] = &[$($name::$index),*];
            /// Fields present only in the detail payload
            pub const SHOW: &'static [$name] = &[$($name::$show),*];
        }

        impl $crate::entity::Field for $name {
            fn json_key(self) -> &'static str {
                match self {
                    $($name::$index => $index_key,)*
                    $($name::$show => $show_key,)*
                }
            }

            fn from_json_key(key: &str) -> Option<Self> {
                match key {
                    $($index_key => Some($name::$index),)*
                    $($show_key => Some($name::$show),)*
                    _ => None,
                }
            }

            fn is_index(self) -> bool {
                Self::INDEX.contains(&self)
            }

            fn all() -> impl Iterator<Item = Self> {
                Self::INDEX.iter().chain(Self::SHOW).copied()
            }
        }
    };
}

mod episode;
mod series;

pub use episode::{EpisodeField, EpisodeIndex, EpisodeKind};
pub use series::{SeriesField, SeriesKind};

/// A field of an entity's static registry.
pub trait Field: Copy + Eq + Debug + Send + Sync + 'static {
    /// The key of this field in the API's JSON payloads.
    fn json_key(self) -> &'static str;
    fn from_json_key(key: &str) -> Option<Self>;
    /// Whether listing payloads carry this field.
    fn is_index(self) -> bool;
    /// Every field, index fields first.
    fn all() -> impl Iterator<Item = Self>;
}

/// The two kinds of records that complete themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Series,
    Episode,
}

impl EntityType {
    /// Path of the detail endpoint for `id`.
    pub fn detail_path(self, id: u64) -> String {
        match self {
            EntityType::Series => format!("/series/{}", id),
            EntityType::Episode => format!("/episodes/{}", id),
        }
    }

    /// Path of a listing below the record, e.g. `/series/{id}/actors`.
    pub fn listing_path(self, id: u64, endpoint: &str) -> String {
        format!("{}/{}", self.detail_path(id), endpoint.trim_start_matches('/'))
    }
}

/// Static description of an entity kind.
pub trait EntityKind: Send + Sync + 'static {
    type Field: Field;
    const TYPE: EntityType;
}

/// How much of a record is loaded for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Completeness {
    /// Nothing loaded in this language
    #[default]
    Unknown,
    /// Index fields loaded from a listing
    Partial,
    /// Detail record loaded
    Complete,
}

#[derive(Debug, Clone, Default)]
struct EntityState {
    fields: Map<String, Value>,
    completeness: HashMap<Option<String>, Completeness>,
}

impl EntityState {
    fn completeness(&self, language: Option<&str>) -> Completeness {
        self.completeness
            .get(&language.map(str::to_string))
            .copied()
            .unwrap_or_default()
    }

    fn needs_completion<F: Field>(&self, field: F, language: Option<&str>) -> bool {
        match self.completeness(language) {
            Completeness::Complete => false,
            Completeness::Partial => !field.is_index(),
            Completeness::Unknown => true,
        }
    }

    /// Copies the registry fields present in `data`.
    fn absorb<F: Field>(&mut self, data: &Value) {
        for field in F::all() {
            if let Some(value) = data.get(field.json_key()) {
                self.fields.insert(field.json_key().to_string(), value.clone());
            }
        }
    }

    /// Overwrites every registry field from a detail record.
    fn overwrite<F: Field>(&mut self, data: &Value) {
        for field in F::all() {
            let value = data.get(field.json_key()).cloned().unwrap_or(Value::Null);
            self.fields.insert(field.json_key().to_string(), value);
        }
    }

    /// Takes over the `errors` member of a detail response body.
    fn absorb_errors(&mut self, body: &Value) {
        if let Some(errors) = body.get(ERRORS_KEY).filter(|errors| !errors.is_null()) {
            self.fields.insert(ERRORS_KEY.to_string(), errors.clone());
        }
    }

    fn mark(&mut self, language: Option<&str>, completeness: Completeness) {
        let entry = self
            .completeness
            .entry(language.map(str::to_string))
            .or_default();
        if *entry != Completeness::Complete {
            *entry = completeness;
        }
    }

    fn value<F: Field>(&self, field: F) -> Option<Value> {
        self.fields
            .get(field.json_key())
            .filter(|value| !value.is_null())
            .cloned()
    }
}

#[derive(Deserialize)]
struct Identified {
    id: u64,
}

/// A series or episode record that completes itself on demand.
///
/// Field reads take the [`Client`] whose language they are made in. The
/// field merge and the completeness update happen under one lock, so no
/// reader ever sees a record marked complete with half its fields merged.
pub struct Entity<K: EntityKind> {
    id: u64,
    state: Mutex<EntityState>,
    _kind: PhantomData<K>,
}

/// A TV series.
pub type Series = Entity<SeriesKind>;
/// A single episode of a series.
pub type Episode = Entity<EpisodeKind>;

impl<K: EntityKind> Entity<K> {
    /// Builds an entity from an API payload received in `language`.
    pub fn from_payload(
        data: Value,
        language: Option<&str>,
        completeness: Completeness,
    ) -> Result<Self> {
        let Identified { id } =
            serde_json::from_value(data.clone()).map_err(|source| TvdbError::Decode {
                context: format!("{:?} payload", K::TYPE),
                source,
            })?;

        let mut state = EntityState::default();
        state.absorb::<K::Field>(&data);
        if completeness != Completeness::Unknown {
            state.mark(language, completeness);
        }

        Ok(Self {
            id,
            state: Mutex::new(state),
            _kind: PhantomData,
        })
    }

    /// Builds a complete entity from a detail response body.
    pub(crate) fn from_detail(body: &Value, language: Option<&str>) -> Result<Self> {
        let data = body.get("data").cloned().unwrap_or(Value::Null);
        let entity = Self::from_payload(data, language, Completeness::Complete)?;
        lock(&entity.state).absorb_errors(body);
        Ok(entity)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Completeness of this record in `language`.
    pub fn completeness(&self, language: Option<&str>) -> Completeness {
        lock(&self.state).completeness(language)
    }

    /// Reads a field in the client's language, fetching the detail record
    /// first when this record is not loaded far enough for that field.
    ///
    /// Returns `Ok(None)` when the record has no value for the field.
    ///
    /// # Errors
    ///
    /// Returns [`TvdbError::Request`] when the detail fetch fails. The record's
    /// completeness is left unchanged so a later read retries.
    pub fn get(&self, client: &Client, field: K::Field) -> Result<Option<Value>> {
        let language = client.language();
        let mut state = lock(&self.state);
        if state.needs_completion(field, language) {
            self.complete(client, &mut state)?;
        }
        Ok(state.value(field))
    }

    /// Like [`Entity::get`] with the field named by its JSON key.
    /// Unknown names yield `None` without a fetch.
    pub fn get_by_name(&self, client: &Client, name: &str) -> Result<Option<Value>> {
        match K::Field::from_json_key(name) {
            Some(field) => self.get(client, field),
            None => Ok(None),
        }
    }

    /// Reads a field and deserializes it.
    pub fn get_as<T: DeserializeOwned>(&self, client: &Client, field: K::Field) -> Result<Option<T>> {
        self.get(client, field)?
            .map(|value| {
                serde_json::from_value(value).map_err(|source| TvdbError::Decode {
                    context: field.json_key().to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// The value currently held for `field`, without any fetch.
    pub fn cached_value(&self, field: K::Field) -> Option<Value> {
        lock(&self.state).value(field)
    }

    /// Makes sure the full record is loaded in the client's language.
    pub fn load_full(&self, client: &Client) -> Result<&Self> {
        let language = client.language();
        let mut state = lock(&self.state);
        if state.completeness(language) != Completeness::Complete {
            self.complete(client, &mut state)?;
        }
        Ok(self)
    }

    /// Re-applies the detail record for the client's language, even when
    /// the record is already complete. Served from the request cache unless
    /// the cache was cleared.
    pub fn refresh(&self, client: &Client) -> Result<&Self> {
        let mut state = lock(&self.state);
        self.complete(client, &mut state)?;
        Ok(self)
    }

    fn complete(&self, client: &Client, state: &mut EntityState) -> Result<()> {
        let language = client.language();
        debug!(kind = ?K::TYPE, id = self.id, language = ?language, "completion fetch");
        let outcome = client.fetch_entity(K::TYPE, self.id)?;
        match &outcome {
            Outcome::Success(body) => {
                state.overwrite::<K::Field>(outcome.data().unwrap_or(&Value::Null));
                state.absorb_errors(body);
            }
            // Not found: keep what the listing gave us
            Outcome::Empty => {}
            Outcome::Failure { status, message } => {
                return Err(TvdbError::Request {
                    status: *status,
                    message: message.clone(),
                });
            }
        }
        state.mark(language, Completeness::Complete);
        Ok(())
    }
}

impl<K: EntityKind> Clone for Entity<K> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            state: Mutex::new(lock(&self.state).clone()),
            _kind: PhantomData,
        }
    }
}

impl<K: EntityKind> Debug for Entity<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Entity")
            .field("type", &K::TYPE)
            .field("id", &self.id)
            .field("fields", &state.fields)
            .field("completeness", &state.completeness)
            .finish()
    }
}
