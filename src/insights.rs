//! Sentence-level theme attribution.
//!
//! Each review body is split into sentences, each sentence is classified with
//! literal hint words, and the review's helpfulness weight is credited to every
//! configured theme the sentence mentions.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::AnalysisConfig;
use crate::model::Review;

const MIN_SENTENCE_LEN: usize = 20;
const SUMMARY_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceTone {
    Positive,
    Negative,
    Neutral,
}

/// Weighted positive/negative mentions for one theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ThemeTally {
    pub positive: u64,
    pub negative: u64,
}

/// Theme tallies in first-mention order, serialized as an object keyed by theme.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeBreakdown(pub Vec<(String, ThemeTally)>);

impl ThemeBreakdown {
    pub fn get(&self, theme: &str) -> Option<&ThemeTally> {
        self.0.iter().find(|(name, _)| name == theme).map(|(_, t)| t)
    }
}

impl Serialize for ThemeBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, tally) in &self.0 {
            map.serialize_entry(name, tally)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsightSummary {
    pub what_users_like: Vec<String>,
    pub what_users_want_improved: Vec<String>,
    pub summary_text: String,
}

/// Split on `.`, `!` and `?`, keeping trimmed pieces longer than 20 UTF-16
/// code units (an emoji counts as two).
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.encode_utf16().count() > MIN_SENTENCE_LEN)
        .collect()
}

/// Negative hints win over positive ones.
pub fn classify_sentence(sentence: &str, config: &AnalysisConfig) -> SentenceTone {
    let s = sentence.to_lowercase();
    if config.negative_hints.iter().any(|w| s.contains(w.as_str())) {
        SentenceTone::Negative
    } else if config.positive_hints.iter().any(|w| s.contains(w.as_str())) {
        SentenceTone::Positive
    } else {
        SentenceTone::Neutral
    }
}

/// Tally themes over `reviews` (newest first). Themes are emitted in the order
/// they were first mentioned, which drives the summary's "first two".
pub fn build_theme_breakdown(reviews: &[Review], config: &AnalysisConfig) -> ThemeBreakdown {
    let mut tallies: Vec<Option<ThemeTally>> = vec![None; config.themes.len()];
    let mut order: Vec<usize> = Vec::new();

    for review in reviews {
        let Some(text) = review.text.as_deref().filter(|t| !t.is_empty()) else {
            continue;
        };
        let weight = u64::from(review.thumbs_up.max(1));

        for sentence in split_sentences(text) {
            let tone = classify_sentence(sentence, config);
            if tone == SentenceTone::Neutral {
                continue;
            }
            let lowered = sentence.to_lowercase();
            for (idx, theme) in config.themes.iter().enumerate() {
                if !theme.keywords.iter().any(|k| lowered.contains(k.as_str())) {
                    continue;
                }
                if tallies[idx].is_none() {
                    order.push(idx);
                }
                let tally = tallies[idx].get_or_insert_with(ThemeTally::default);
                match tone {
                    SentenceTone::Positive => tally.positive += weight,
                    SentenceTone::Negative => tally.negative += weight,
                    SentenceTone::Neutral => {}
                }
            }
        }
    }

    ThemeBreakdown(
        order
            .into_iter()
            .filter_map(|idx| tallies[idx].take().map(|t| (config.themes[idx].name.clone(), t)))
            .collect(),
    )
}

fn first_two(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.iter().take(2).cloned().collect::<Vec<_>>().join(" and ")
    }
}

pub fn summarize_themes(breakdown: &ThemeBreakdown) -> InsightSummary {
    let likes: Vec<String> = breakdown
        .0
        .iter()
        .filter(|(_, t)| t.positive > t.negative)
        .map(|(name, _)| name.clone())
        .collect();
    let improve: Vec<String> = breakdown
        .0
        .iter()
        .filter(|(_, t)| t.negative > t.positive)
        .map(|(name, _)| name.clone())
        .collect();

    let summary_text = format!(
        "Users appreciate {}, but face issues with {}.",
        first_two(&likes, "some aspects"),
        first_two(&improve, "certain areas")
    );

    InsightSummary {
        what_users_like: likes.into_iter().take(SUMMARY_LIMIT).collect(),
        what_users_want_improved: improve.into_iter().take(SUMMARY_LIMIT).collect(),
        summary_text,
    }
}
