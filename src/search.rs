//! Best-match selection among search results.

use crate::entity::{Series, SeriesField};
use serde_json::Value;

/// Picks the search result that best matches `name`.
///
/// Precedence, all comparisons case-insensitive and exact:
/// 1. the first result whose name equals `name`
/// 2. the first result with an alias equal to `name`
/// 3. the first result in ranked order
///
/// Only the fields carried by the search payload are consulted, so this never
/// triggers a fetch. Returns `None` for an empty result list.
pub fn best_match(results: Vec<Series>, name: &str) -> Option<Series> {
    let wanted = name.to_lowercase();

    let by_name = results
        .iter()
        .position(|series| display_name(series).is_some_and(|n| n.to_lowercase() == wanted));
    let by_alias = || {
        results
            .iter()
            .position(|series| aliases(series).iter().any(|a| a.to_lowercase() == wanted))
    };

    let index = by_name.or_else(by_alias).unwrap_or(0);
    results.into_iter().nth(index)
}

fn display_name(series: &Series) -> Option<String> {
    match series.cached_value(SeriesField::SeriesName) {
        Some(Value::String(name)) => Some(name),
        _ => None,
    }
}

fn aliases(series: &Series) -> Vec<String> {
    match series.cached_value(SeriesField::Aliases) {
        Some(Value::Array(aliases)) => aliases
            .into_iter()
            .filter_map(|alias| alias.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
