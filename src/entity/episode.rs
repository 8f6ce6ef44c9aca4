//! Episode records.

use super::{EntityKind, EntityType, Episode};
use crate::client::Client;
use crate::record::Record;
use crate::{Result, TvdbError};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

field_registry! {
    /// Fields of an episode record.
    EpisodeField {
        index: {
            AbsoluteNumber => "absoluteNumber",
            AiredEpisodeNumber => "airedEpisodeNumber",
            AiredSeason => "airedSeason",
            DvdEpisodeNumber => "dvdEpisodeNumber",
            DvdSeason => "dvdSeason",
            EpisodeName => "episodeName",
            FirstAired => "firstAired",
            Overview => "overview",
        }
        show: {
            AirsAfterSeason => "airsAfterSeason",
            AirsBeforeEpisode => "airsBeforeEpisode",
            AirsBeforeSeason => "airsBeforeSeason",
            Director => "director",
            Directors => "directors",
            DvdChapter => "dvdChapter",
            DvdDiscid => "dvdDiscid",
            Errors => "errors",
            Filename => "filename",
            GuestStars => "guestStars",
            ImdbId => "imdbId",
            LastUpdated => "lastUpdated",
            LastUpdatedBy => "lastUpdatedBy",
            ProductionCode => "productionCode",
            SeriesId => "seriesId",
            ShowUrl => "showUrl",
            SiteRating => "siteRating",
            SiteRatingCount => "siteRatingCount",
            ThumbAdded => "thumbAdded",
            ThumbAuthor => "thumbAuthor",
            ThumbHeight => "thumbHeight",
            ThumbWidth => "thumbWidth",
            Writers => "writers",
        }
    }
}

/// Marker for [`Episode`] entities.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeKind;

impl EntityKind for EpisodeKind {
    type Field = EpisodeField;
    const TYPE: EntityType = EntityType::Episode;
}

impl Episode {
    pub fn name(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, EpisodeField::EpisodeName)
    }

    pub fn overview(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, EpisodeField::Overview)
    }

    pub fn first_aired(&self, client: &Client) -> Result<Option<String>> {
        self.get_as(client, EpisodeField::FirstAired)
    }

    /// Aired season number.
    pub fn season_number(&self, client: &Client) -> Result<Option<i64>> {
        self.get_as(client, EpisodeField::AiredSeason)
    }

    /// Aired episode number within the season.
    pub fn episode_number(&self, client: &Client) -> Result<Option<i64>> {
        self.get_as(client, EpisodeField::AiredEpisodeNumber)
    }

    pub fn absolute_number(&self, client: &Client) -> Result<Option<i64>> {
        self.get_as(client, EpisodeField::AbsoluteNumber)
    }

    pub fn directors(&self, client: &Client) -> Result<Vec<String>> {
        Ok(self
            .get_as(client, EpisodeField::Directors)?
            .unwrap_or_default())
    }

    pub fn writers(&self, client: &Client) -> Result<Vec<String>> {
        Ok(self.get_as(client, EpisodeField::Writers)?.unwrap_or_default())
    }

    pub fn guest_stars(&self, client: &Client) -> Result<Vec<String>> {
        Ok(self
            .get_as(client, EpisodeField::GuestStars)?
            .unwrap_or_default())
    }

    pub fn site_rating(&self, client: &Client) -> Result<Option<f64>> {
        self.get_as(client, EpisodeField::SiteRating)
    }

    /// Problems the API reported with the detail record.
    pub fn errors(&self, client: &Client) -> Result<Option<Record>> {
        self.get_as(client, EpisodeField::Errors)
    }

    /// `"{season}x{episode}"`, e.g. `3x9`.
    pub fn x(&self, client: &Client) -> Result<String> {
        let season = self.season_number(client)?;
        let episode = self.episode_number(client)?;
        Ok(format!(
            "{}x{}",
            season.map(|s| s.to_string()).unwrap_or_default(),
            episode.map(|e| e.to_string()).unwrap_or_default()
        ))
    }

    /// Aired `(season, episode)` as held, without any fetch.
    pub(crate) fn aired_position(&self) -> (Option<i64>, Option<i64>) {
        (
            self.cached_value(EpisodeField::AiredSeason)
                .as_ref()
                .and_then(Value::as_i64),
            self.cached_value(EpisodeField::AiredEpisodeNumber)
                .as_ref()
                .and_then(Value::as_i64),
        )
    }
}

/// Position of an episode within its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeIndex {
    /// Absolute episode number across all seasons
    Absolute(i64),
    /// Aired season and episode number
    Aired { season: i64, episode: i64 },
}

impl EpisodeIndex {
    /// Whether `episode` sits at this position, judged from its listing fields.
    pub fn matches(&self, episode: &Episode) -> bool {
        match *self {
            EpisodeIndex::Absolute(number) => {
                episode
                    .cached_value(EpisodeField::AbsoluteNumber)
                    .and_then(|v| v.as_i64())
                    == Some(number)
            }
            EpisodeIndex::Aired { season, episode: number } => {
                episode.aired_position() == (Some(season), Some(number))
            }
        }
    }
}

impl From<i64> for EpisodeIndex {
    fn from(number: i64) -> Self {
        EpisodeIndex::Absolute(number)
    }
}

impl FromStr for EpisodeIndex {
    type Err = TvdbError;

    /// Parses `"29"` as an absolute number and `"3x9"` as season 3, episode 9.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TvdbError::InvalidEpisodeIndex(s.to_string());
        let trimmed = s.trim();
        match trimmed.split_once(['x', 'X']) {
            Some((season, episode)) => Ok(EpisodeIndex::Aired {
                season: season.trim().parse().map_err(|_| invalid())?,
                episode: episode.trim().parse().map_err(|_| invalid())?,
            }),
            None => trimmed
                .parse()
                .map(EpisodeIndex::Absolute)
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for EpisodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpisodeIndex::Absolute(number) => write!(f, "{}", number),
            EpisodeIndex::Aired { season, episode } => write!(f, "{}x{}", season, episode),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Completeness;
    use crate::test_support::{FakeTransport, connect};
    use serde_json::json;

    #[test]
    fn test_parse_episode_index() {
        assert_eq!("29".parse::<EpisodeIndex>().unwrap(), EpisodeIndex::Absolute(29));
        assert_eq!(
            "3x9".parse::<EpisodeIndex>().unwrap(),
            EpisodeIndex::Aired { season: 3, episode: 9 }
        );
        assert_eq!(
            " 10X2 ".parse::<EpisodeIndex>().unwrap(),
            EpisodeIndex::Aired { season: 10, episode: 2 }
        );
        assert!(matches!(
            "3x".parse::<EpisodeIndex>(),
            Err(TvdbError::InvalidEpisodeIndex(_))
        ));
        assert!(matches!(
            "pilot".parse::<EpisodeIndex>(),
            Err(TvdbError::InvalidEpisodeIndex(_))
        ));
        assert_eq!(EpisodeIndex::Aired { season: 3, episode: 9 }.to_string(), "3x9");
    }

    #[test]
    fn test_x_and_show_fields() {
        let fake = FakeTransport::new();
        fake.on_get(
            "/episodes/42",
            200,
            json!({"data": {
                "id": 42,
                "airedSeason": 3,
                "airedEpisodeNumber": 9,
                "episodeName": "The Rains of Castamere",
                "writers": ["David Benioff", "D. B. Weiss"],
            }}),
        );
        let client = connect(&fake);
        let episode: Episode = client
            .entity(
                json!({"id": 42, "airedSeason": 3, "airedEpisodeNumber": 9}),
                Completeness::Partial,
            )
            .unwrap();

        assert_eq!(episode.x(&client).unwrap(), "3x9");
        assert_eq!(fake.count("/episodes/42"), 0);

        assert_eq!(episode.writers(&client).unwrap().len(), 2);
        assert_eq!(
            episode.name(&client).unwrap().as_deref(),
            Some("The Rains of Castamere")
        );
        assert_eq!(fake.count("/episodes/42"), 1);
    }
}
