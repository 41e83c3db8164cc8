//! Recurring phrase extraction over review bodies.
//!
//! Text is lowercased, every character outside `a-z` becomes whitespace, and
//! tokens shorter than four letters or found in the stopword set are dropped.
//! Unigrams and bigrams of the filtered sequence share one frequency table.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::Review;

static NON_ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z\s]+").expect("static regex"));

/// Ratings that make up the negative sentiment bucket.
pub const NEGATIVE_RATINGS: &[u8] = &[1, 2];
/// Ratings that make up the positive sentiment bucket.
pub const POSITIVE_RATINGS: &[u8] = &[4, 5];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ThemeCount {
    #[schema(example = "payment failed")]
    pub phrase: String,
    pub count: usize,
}

/// Normalize `text` and return the tokens that survive filtering, in order.
pub fn tokenize(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    let lowered = text.to_lowercase();
    NON_ALPHA
        .replace_all(&lowered, " ")
        .split_whitespace()
        .filter(|t| t.len() > 3 && !stopwords.contains(*t))
        .map(str::to_string)
        .collect()
}

/// Frequency table with first-seen order kept for tie-breaking.
#[derive(Debug, Default)]
struct PhraseCounter {
    counts: HashMap<String, (usize, usize)>,
}

impl PhraseCounter {
    fn add(&mut self, phrase: String) {
        let next = self.counts.len();
        self.counts.entry(phrase).or_insert((0, next)).0 += 1;
    }

    fn add_tokens(&mut self, tokens: &[String]) {
        for token in tokens {
            self.add(token.clone());
        }
        for pair in tokens.windows(2) {
            self.add(format!("{} {}", pair[0], pair[1]));
        }
    }

    fn top(self, n: usize) -> Vec<ThemeCount> {
        let mut ranked: Vec<(String, (usize, usize))> = self.counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        ranked
            .into_iter()
            .take(n)
            .map(|(phrase, (count, _))| ThemeCount { phrase, count })
            .collect()
    }
}

/// Top `top_n` phrases among reviews whose rating is in `ratings`.
pub fn extract_phrases(
    reviews: &[Review],
    ratings: &[u8],
    top_n: usize,
    stopwords: &HashSet<String>,
) -> Vec<ThemeCount> {
    let mut counter = PhraseCounter::default();
    for review in reviews.iter().filter(|r| ratings.contains(&r.rating)) {
        if let Some(text) = review.text.as_deref() {
            counter.add_tokens(&tokenize(text, stopwords));
        }
    }
    counter.top(top_n)
}
