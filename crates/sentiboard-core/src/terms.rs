/// Split a comma-separated search-term string into trimmed terms.
///
/// Order is preserved and duplicates are kept; empty fragments are dropped.
#[must_use]
pub fn parse_search_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
