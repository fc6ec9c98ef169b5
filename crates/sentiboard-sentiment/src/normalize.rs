//! Text cleanup applied before classification.

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"http\S+|www\S+").expect("valid url regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[@#]\w+").expect("valid mention/hashtag regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid space regex"));

/// Strip URLs, @-mentions and #-tags, then collapse whitespace.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let text = URL_RE.replace_all(text, "");
    let text = TAG_RE.replace_all(&text, "");
    SPACE_RE.replace_all(&text, " ").trim().to_string()
}
