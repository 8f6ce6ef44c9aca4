//! tvdb2 - Client for the TVDB JSON API v2
//!
//! Series and episodes returned from search and listing endpoints only carry
//! a subset of their fields. Instead of making the caller track which records
//! are complete, every [`Entity`] knows, per language, whether its full field
//! set has been loaded and fetches the detail record on the first access to a
//! field it does not have yet. All reads are memoized per client, so a record
//! is never requested twice in the same language.
//!
//! ```no_run
//! use tvdb2::{Client, ClientConfig, SeriesField};
//!
//! let client = Client::login(&ClientConfig::new("API_KEY"))?;
//! if let Some(got) = client.best_search("Game of Thrones")? {
//!     // Served from the search payload
//!     println!("{:?}", got.name(&client)?);
//!     // Triggers one request to /series/{id}
//!     println!("{:?}", got.get(&client, SeriesField::Network)?);
//!
//!     client.scoped_language("it", |it| -> tvdb2::Result<()> {
//!         println!("{:?}", got.episode_at(it, "1x1".parse()?)?.map(|e| e.name(it)));
//!         Ok(())
//!     })?;
//! }
//! # Ok::<(), tvdb2::TvdbError>(())
//! ```

mod api;
mod cache;
mod client;
mod entity;
mod pagination;
mod record;
mod response;
mod search;
mod transport;

#[cfg(test)]
mod test_support;

pub use cache::{Params, RequestKey, params};
pub use client::{Client, ClientConfig, image_url};
pub use entity::{
    Completeness, Entity, EntityKind, EntityType, Episode, EpisodeField, EpisodeIndex,
    EpisodeKind, Field, Series, SeriesField, SeriesKind,
};
pub use pagination::PAGE_SIZE;
pub use record::Record;
pub use response::{Outcome, classify};
pub use search::best_match;
pub use transport::{DEFAULT_BASE_URL, HttpTransport, RawResponse, Transport, TransportError};

use thiserror::Error;

/// Top-level error type for tvdb2 operations
#[derive(Debug, Error)]
pub enum TvdbError {
    /// Login or token refresh was rejected
    #[error("Authentication failed ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// A read returned neither 200 nor 404
    #[error("Request failed ({status}): {message}")]
    Request { status: u16, message: String },

    /// The request never produced a usable response
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A successful payload did not have the expected shape
    #[error("Failed to decode {context}: {source}")]
    Decode {
        context: String,
        source: serde_json::Error,
    },

    /// An episode index was neither a number nor `SxE`
    #[error("Invalid episode index: {0}")]
    InvalidEpisodeIndex(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, TvdbError>;
