//! Namespace names and storage key helpers.

use super::Namespace;

/// Detailed player/club search.
pub const ADVANCED_SEARCH: &str = "ADVANCED_SEARCH";
/// League table of a competition.
pub const COMPETITION_STANDING_TABLE: &str = "COMPETITION_STANDING_TABLE";
/// Week list of a competition.
pub const COMPETITION_WEEKS: &str = "COMPETITION_WEEKS";
/// All known competitions.
pub const COMPETITIONS_LIST: &str = "COMPETITIONS_LIST";
/// Single match details.
pub const MATCH_INFO: &str = "MATCH_INFO";
/// Matches played on a date.
pub const MATCHES_BY_DATE: &str = "MATCHES_BY_DATE";
/// Matches of a competition week.
pub const MATCHES_BY_WEEKNUMBER: &str = "MATCHES_BY_WEEKNUMBER";
/// Transfer listings.
pub const TRANSFERS: &str = "TRANSFERS";
/// Transfer regions.
pub const TRANSFERS_REGIONS: &str = "TRANSFERS_REGIONS";
/// Quick search.
pub const SEARCH: &str = "SEARCH";

/// Built-in namespaces as `(name, prefix, default extra TTL)`.
///
/// Prefixes are single characters, so storage keys of different namespaces
/// never collide.
pub const BUILTIN_NAMESPACES: [(&str, &str, &str); 10] = [
    (ADVANCED_SEARCH, "0", "24h"),
    (COMPETITION_STANDING_TABLE, "1", "5h"),
    (COMPETITION_WEEKS, "2", "1h"),
    (COMPETITIONS_LIST, "3", "24h"),
    (MATCH_INFO, "4", "1m"),
    (MATCHES_BY_DATE, "5", "2m"),
    (MATCHES_BY_WEEKNUMBER, "6", "2m"),
    (TRANSFERS, "7", "12h"),
    (TRANSFERS_REGIONS, "8", "24h"),
    (SEARCH, "9", "24h"),
];

/// Joins request parameters into a caller key (`["tr", "2024"]` -> `"tr-2024"`).
#[must_use]
pub fn generate_key(params: &[&str]) -> String {
    params.join("-")
}

/// Derives the storage key of `key` inside `namespace`.
#[must_use]
pub fn storage_key(namespace: &Namespace, key: &str) -> String {
    format!("{}{}", namespace.prefix(), key)
}
