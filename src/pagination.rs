//! Aggregation of paginated episode listings.
//!
//! The episode listing returns at most [`PAGE_SIZE`] episodes per page and
//! does not say how many pages there are. Pages are therefore requested one
//! after another until a short page (fewer than [`PAGE_SIZE`] items, possibly
//! none) shows that the end was reached. A series with an exact multiple of
//! [`PAGE_SIZE`] episodes costs one extra request answering an empty page.

use crate::Result;
use crate::cache::Params;
use crate::client::Client;
use crate::entity::Episode;
use tracing::debug;

/// Number of episodes the API returns per listing page.
pub const PAGE_SIZE: usize = 100;

const PAGE_PARAM: &str = "page";

impl Client {
    /// Lists the episodes of a series.
    ///
    /// When `params` contains `page`, exactly that page is returned as the
    /// API ordered it. Otherwise every page is fetched and the episodes are
    /// returned sorted by aired season and episode number; episodes without
    /// a number sort first and ties keep their listing order.
    ///
    /// # Arguments
    ///
    /// * `series_id` - TVDB id of the series
    /// * `params` - Listing filters such as `airedSeason`, optionally `page`
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # fn main() -> tvdb2::Result<()> {
    /// use tvdb2::{Client, ClientConfig, params};
    ///
    /// let client = Client::login(&ClientConfig::new("API_KEY"))?;
    /// let season_one = client.list_episodes(121361, &params([("airedSeason", "1")]))?;
    /// println!("{} episodes", season_one.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn list_episodes(&self, series_id: u64, params: &Params) -> Result<Vec<Episode>> {
        // An explicit page means the caller paginates
        if params.contains_key(PAGE_PARAM) {
            return self.episodes(series_id, params);
        }

        // Walk the pages until one comes back short
        let mut episodes = Vec::new();
        let mut page_params = params.clone();
        for page in 1.. {
            page_params.insert(PAGE_PARAM.to_string(), page.to_string());
            let batch = self.episodes(series_id, &page_params)?;
            let count = batch.len();
            debug!(series_id, page, count, "fetched episode page");
            episodes.extend(batch);
            if count < PAGE_SIZE {
                break;
            }
        }

        // Pages come back in API order, callers expect aired order
        sort_episodes(&mut episodes);
        Ok(episodes)
    }
}

/// Stable sort by aired `(season, episode)`.
fn sort_episodes(episodes: &mut [Episode]) {
    episodes.sort_by_key(Episode::aired_position);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::params;
    use crate::entity::EpisodeField;
    use crate::test_support::{FakeTransport, connect};
    use serde_json::{Value, json};

    /// `count` episodes numbered so that later pages sort before earlier ones.
    fn page(page: usize, count: usize) -> Value {
        let episodes: Vec<Value> = (0..count)
            .map(|i| {
                let id = page * 1000 + i;
                json!({
                    "id": id,
                    "airedSeason": 10 - page,
                    "airedEpisodeNumber": count - i,
                })
            })
            .collect();
        json!({ "data": episodes })
    }

    fn serve_pages(fake: &FakeTransport, sizes: &[usize]) {
        for (index, size) in sizes.iter().enumerate() {
            let number = index + 1;
            fake.on_get_with(
                "/series/1/episodes/query",
                params([("page", number)]),
                200,
                page(number, *size),
            );
        }
    }

    fn positions(episodes: &[Episode]) -> Vec<(Option<i64>, Option<i64>)> {
        episodes.iter().map(Episode::aired_position).collect()
    }

    #[test]
    fn test_aggregates_until_short_page() {
        let fake = FakeTransport::new();
        serve_pages(&fake, &[100, 100, 57]);
        let client = connect(&fake);

        let episodes = client.list_episodes(1, &Params::new()).unwrap();

        assert_eq!(episodes.len(), 257);
        assert_eq!(fake.count("/series/1/episodes/query"), 3);
        let positions = positions(&episodes);
        assert!(positions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(positions[0], (Some(7), Some(1)));
        assert_eq!(positions[256], (Some(9), Some(100)));
    }

    #[test]
    fn test_full_last_page_costs_one_empty_request() {
        let fake = FakeTransport::new();
        serve_pages(&fake, &[100, 0]);
        let client = connect(&fake);

        let episodes = client.list_episodes(1, &Params::new()).unwrap();

        assert_eq!(episodes.len(), 100);
        assert_eq!(fake.count("/series/1/episodes/query"), 2);
    }

    #[test]
    fn test_not_found_page_ends_iteration() {
        let fake = FakeTransport::new();
        serve_pages(&fake, &[100]);
        fake.on_get("/series/1/episodes/query", 404, json!({"Error": "No results for your query"}));
        let client = connect(&fake);

        let episodes = client.list_episodes(1, &Params::new()).unwrap();

        assert_eq!(episodes.len(), 100);
        assert_eq!(fake.count("/series/1/episodes/query"), 2);
    }

    #[test]
    fn test_explicit_page_disables_aggregation() {
        let fake = FakeTransport::new();
        serve_pages(&fake, &[100, 100, 57]);
        let client = connect(&fake);

        let episodes = client
            .list_episodes(1, &params([("page", 2)]))
            .unwrap();

        assert_eq!(episodes.len(), 100);
        assert_eq!(fake.count("/series/1/episodes/query"), 1);
        // Served in listing order, not re-sorted.
        assert_eq!(
            episodes[0].cached_value(EpisodeField::AiredEpisodeNumber),
            Some(json!(100))
        );
    }

    #[test]
    fn test_filters_are_kept_on_every_page() {
        let fake = FakeTransport::new();
        fake.on_get("/series/1/episodes/query", 200, page(1, 3));
        let client = connect(&fake);

        client
            .list_episodes(1, &params([("airedSeason", 9)]))
            .unwrap();

        let queries: Vec<_> = fake.calls().into_iter().skip(1).map(|c| c.query).collect();
        assert_eq!(queries, vec![params([("airedSeason", 9), ("page", 1)])]);
    }

    #[test]
    fn test_failure_is_surfaced() {
        let fake = FakeTransport::new();
        serve_pages(&fake, &[100]);
        fake.on_get("/series/1/episodes/query", 500, json!({"Error": "boom"}));
        let client = connect(&fake);

        assert!(client.list_episodes(1, &Params::new()).is_err());
    }

    #[test]
    fn test_sort_is_stable_and_unnumbered_first() {
        let mut episodes: Vec<Episode> = [
            json!({"id": 1, "airedSeason": 1, "airedEpisodeNumber": 2}),
            json!({"id": 2, "airedSeason": 1, "airedEpisodeNumber": 1}),
            json!({"id": 3, "airedSeason": 1, "airedEpisodeNumber": 1}),
            json!({"id": 4}),
            json!({"id": 5, "airedSeason": 0, "airedEpisodeNumber": 3}),
        ]
        .into_iter()
        .map(|data| Episode::from_payload(data, None, crate::Completeness::Partial).unwrap())
        .collect();

        sort_episodes(&mut episodes);

        let ids: Vec<_> = episodes.iter().map(Episode::id).collect();
        assert_eq!(ids, vec![4, 5, 2, 3, 1]);
    }
}
