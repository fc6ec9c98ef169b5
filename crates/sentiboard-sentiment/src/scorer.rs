//! Word-list sentiment scorer with a single negation rule.
//!
//! This is a heuristic: it counts fixed positive and negative words and flips
//! a positive word to negative when a negation token directly precedes it.
//! Negated negative words ("not bad") are left as negative matches.

use sentiboard_core::Sentiment;

/// Lowercase single words counted as positive matches.
pub(crate) const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "awesome", "excellent", "like", "love", "happy", "best", "better", "amazing",
];

/// Lowercase single words counted as negative matches.
pub(crate) const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "worst",
    "terrible",
    "awful",
    "hate",
    "dislike",
    "sad",
    "disappointing",
    "sucks",
    "poor",
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "dont", "don't", "doesn't", "didn't", "isn't", "wasn't", "aren't",
    "can't", "cannot", "won't",
];

/// Positive and negative match counts for one text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexiconCounts {
    pub positive: usize,
    pub negative: usize,
}

impl LexiconCounts {
    /// Majority label; ties (including zero-zero) are neutral.
    #[must_use]
    pub fn label(self) -> Sentiment {
        match self.positive.cmp(&self.negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }
}

/// Count lexicon matches in `text`, case-insensitively.
///
/// Words are split on whitespace and stripped of surrounding punctuation.
#[must_use]
pub fn lexicon_counts(text: &str) -> LexiconCounts {
    let mut counts = LexiconCounts::default();
    let mut prev_negates = false;

    for word in text.split_whitespace() {
        let w = word
            .replace('\u{2019}', "'")
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();

        if POSITIVE_WORDS.contains(&w.as_str()) {
            if prev_negates {
                counts.negative += 1;
            } else {
                counts.positive += 1;
            }
        } else if NEGATIVE_WORDS.contains(&w.as_str()) {
            counts.negative += 1;
        }

        prev_negates = NEGATIONS.contains(&w.as_str());
    }

    counts
}

/// Classify `text` with the lexicon alone.
#[must_use]
pub fn lexicon_sentiment(text: &str) -> Sentiment {
    lexicon_counts(text).label()
}
