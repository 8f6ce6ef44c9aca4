//! Series records and the endpoints hanging off a series.

use super::{EntityKind, EntityType, Episode, EpisodeIndex, Series};
use crate::Result;
use crate::cache::{Params, params};
use crate::client::{Client, image_url};
use crate::record::Record;
use rand::seq::IndexedRandom;

field_registry! {
    /// Fields of a series record.
    SeriesField {
        index: {
            Aliases => "aliases",
            Banner => "banner",
            FirstAired => "firstAired",
            Overview => "overview",
            SeriesName => "seriesName",
            Status => "status",
        }
        show: {
            Added => "added",
            AirsDayOfWeek => "airsDayOfWeek",
            AirsTime => "airsTime",
            Errors => "errors",
            Genre => "genre",
            ImdbId => "imdbId",
            LastUpdated => "lastUpdated",
            Network => "network",
            NetworkId => "networkId",
            Rating => "rating",
            Runtime => "runtime",
            SeriesId => "seriesId",
            SiteRating => "siteRating",
            SiteRatingCount => "siteRatingCount",
            Zap2itId => "zap2itId",
        }
    }
}

/// Marker for [`Series`] entities.
#[derive(Debug, Clone, Copy)]
pub struct SeriesKind;

impl EntityKind for SeriesKind {
    type Field = SeriesField;
    const TYPE: EntityType = EntityType::Series;
}

impl Series {
    pub fn name(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, SeriesField::SeriesName)
    }

    pub fn aliases(&self, client: &Client) -> Result<Vec<String>> {
        Ok(self
            .get_as(client, SeriesField::Aliases)?
            .unwrap_or_default())
    }

    pub fn overview(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, SeriesField::Overview)
    }

    pub fn first_aired(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, SeriesField::FirstAired)
    }

    pub fn status(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, SeriesField::Status)
    }

    pub fn network(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, SeriesField::Network)
    }

    pub fn genre(&self, client: &Client) -> Result<Vec<String>> {
        Ok(self.get_as(client, SeriesField::Genre)?.unwrap_or_default())
    }

    pub fn runtime(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, SeriesField::Runtime)
    }

    pub fn site_rating(&self, client: &Client) -> Result<Option<f64>> {
        self.get_as(client, SeriesField::SiteRating)
    }

    pub fn imdb_id(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, SeriesField::ImdbId)
    }

    /// All episodes, or a single page when `params` names one.
    /// See [`Client::list_episodes`].
    pub fn episodes(&self, client: &Client, params: &Params) -> Result<Vec<Episode>> {
        client.list_episodes(self.id(), params)
    }

    /// Looks up one episode by absolute number or aired season/episode.
    pub fn episode_at(&self, client: &Client, index: EpisodeIndex) -> Result<Option<Episode>> {
        let episodes = self.episodes(client, &Params::new())?;
        Ok(episodes.into_iter().find(|episode| index.matches(episode)))
    }

    pub fn summary(&self, client: &Client) -> Result<Option<Record>> {
        client.series_summary(self.id())
    }

    pub fn actors(&self, client: &Client) -> Result<Vec<Record>> {
        client.actors(self.id())
    }

    pub fn images_summary(&self, client: &Client) -> Result<Option<Record>> {
        client.images_summary(self.id())
    }

    pub fn images(&self, client: &Client, params: &Params) -> Result<Vec<Record>> {
        client.images(self.id(), params)
    }

    pub fn fanarts(&self, client: &Client) -> Result<Vec<Record>> {
        self.images_of_type(client, "fanart")
    }

    pub fn posters(&self, client: &Client) -> Result<Vec<Record>> {
        self.images_of_type(client, "poster")
    }

    pub fn banners(&self, client: &Client) -> Result<Vec<Record>> {
        self.images_of_type(client, "series")
    }

    /// Season images, optionally only those of `season`, ordered by season.
    pub fn season_images(&self, client: &Client, season: Option<u32>) -> Result<Vec<Record>> {
        self.sub_keyed_images(client, "season", season)
    }

    /// Season-wide images, optionally only those of `season`, ordered by season.
    pub fn seasonwide_images(&self, client: &Client, season: Option<u32>) -> Result<Vec<Record>> {
        self.sub_keyed_images(client, "seasonwide", season)
    }

    /// URL of the series banner.
    ///
    /// With `random` set, a banner is picked at random from the series'
    /// banner images instead, which costs an images query.
    pub fn banner_url(&self, client: &Client, random: bool) -> Result<Option<String>> {
        if random {
            let banners = self.banners(client)?;
            return Ok(banners
                .choose(&mut rand::rng())
                .and_then(Record::file_name_url));
        }
        Ok(self
            .get_as::<String>(client, SeriesField::Banner)?
            .filter(|banner| !banner.is_empty())
            .map(|banner| image_url(&banner)))
    }

    /// URL of the first poster, or of a random one with `random` set.
    pub fn poster_url(&self, client: &Client, random: bool) -> Result<Option<String>> {
        let posters = self.posters(client)?;
        let poster = if random {
            posters.choose(&mut rand::rng())
        } else {
            posters.first()
        };
        Ok(poster.and_then(Record::file_name_url))
    }

    /// Problems the API reported with the detail record, such as a missing
    /// translation for the requested language.
    pub fn errors(&self, client: &Client) -> Result<Option<Record>> {
        self.get_as(client, SeriesField::Errors)
    }

    fn images_of_type(&self, client: &Client, key_type: &str) -> Result<Vec<Record>> {
        self.images(client, &params([("keyType", key_type)]))
    }

    fn sub_keyed_images(
        &self,
        client: &Client,
        key_type: &str,
        season: Option<u32>,
    ) -> Result<Vec<Record>> {
        let mut images = self.images_of_type(client, key_type)?;
        if let Some(season) = season {
            let season = season.to_string();
            images.retain(|image| image.get_str("subKey") == Some(season.as_str()));
        }
        images.sort_by(|a, b| a.get_str("subKey").cmp(&b.get_str("subKey")));
        Ok(images)
    }
}
