//! Read endpoints of the TVDB API v2.
//!
//! Every call is memoized by the client's request cache and classified the
//! same way: a 404 yields `None` or an empty list, any other non-200 status
//! is a [`TvdbError::Request`].

use crate::cache::{Params, params};
use crate::client::Client;
use crate::entity::{Completeness, Entity, EntityKind, EntityType, Episode, Series};
use crate::response::Outcome;
use crate::record::Record;
use crate::search::best_match;
use crate::{Result, TvdbError};
use serde_json::Value;

fn record(path: &str, data: Value) -> Result<Record> {
    serde_json::from_value(data).map_err(|source| TvdbError::Decode {
        context: path.to_string(),
        source,
    })
}

impl Client {
    /// `GET /languages`
    pub fn languages(&self) -> Result<Vec<Record>> {
        self.array_result("/languages", &Params::new(), |data| record("/languages", data))
    }

    /// `GET /languages/{id}`
    pub fn language_by_id(&self, id: u64) -> Result<Option<Record>> {
        let path = format!("/languages/{}", id);
        self.object_result(&path, &Params::new(), |data| record(&path, data))
    }

    /// `GET /search/series` with any of `name`, `imdbId`, `zap2itId`.
    pub fn search(&self, params: &Params) -> Result<Vec<Series>> {
        self.array_result("/search/series", params, |data| {
            self.entity(data, Completeness::Partial)
        })
    }

    /// Searches series by name.
    pub fn search_by_name(&self, name: &str) -> Result<Vec<Series>> {
        self.search(&params([("name", name)]))
    }

    /// The search result that best matches `name`. See [`best_match`].
    pub fn best_search(&self, name: &str) -> Result<Option<Series>> {
        Ok(best_match(self.search_by_name(name)?, name))
    }

    /// `GET /series/{id}`: the complete series record.
    pub fn series(&self, id: u64) -> Result<Option<Series>> {
        self.detail(id)
    }

    /// `GET /series/{id}/episodes/summary`
    pub fn series_summary(&self, id: u64) -> Result<Option<Record>> {
        let path = EntityType::Series.listing_path(id, "episodes/summary");
        self.object_result(&path, &Params::new(), |data| record(&path, data))
    }

    /// One page of episodes: `GET /series/{id}/episodes` without parameters,
    /// `GET /series/{id}/episodes/query` with them.
    ///
    /// Supported parameters are `absoluteNumber`, `airedSeason`,
    /// `airedEpisode`, `dvdSeason`, `dvdEpisode`, `imdbId` and `page`.
    pub fn episodes(&self, id: u64, params: &Params) -> Result<Vec<Episode>> {
        let path = if params.is_empty() {
            EntityType::Series.listing_path(id, "episodes")
        } else {
            EntityType::Series.listing_path(id, "episodes/query")
        };
        self.array_result(&path, params, |data| {
            self.entity(data, Completeness::Partial)
        })
    }

    /// `GET /series/{id}/actors`
    pub fn actors(&self, id: u64) -> Result<Vec<Record>> {
        let path = EntityType::Series.listing_path(id, "actors");
        self.array_result(&path, &Params::new(), |data| record(&path, data))
    }

    /// `GET /episodes/{id}`: the complete episode record.
    pub fn episode(&self, id: u64) -> Result<Option<Episode>> {
        self.detail(id)
    }

    /// `GET /series/{id}/images`
    pub fn images_summary(&self, id: u64) -> Result<Option<Record>> {
        let path = EntityType::Series.listing_path(id, "images");
        self.object_result(&path, &Params::new(), |data| record(&path, data))
    }

    /// `GET /series/{id}/images/query` with `keyType`, `resolution`, `subKey`.
    pub fn images(&self, id: u64, params: &Params) -> Result<Vec<Record>> {
        let path = EntityType::Series.listing_path(id, "images/query");
        self.array_result(&path, params, |data| record(&path, data))
    }

    /// Detail record of an entity, shared with the entity's own completion
    /// fetch through the request cache.
    fn detail<K: EntityKind>(&self, id: u64) -> Result<Option<Entity<K>>> {
        match self.fetch_entity(K::TYPE, id)? {
            Outcome::Success(body) => Entity::from_detail(&body, self.language()).map(Some),
            Outcome::Empty => Ok(None),
            Outcome::Failure { status, message } => Err(TvdbError::Request { status, message }),
        }
    }
}
