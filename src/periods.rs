//! Rating statistics over trailing day windows plus an all-time bucket.

use chrono::{DateTime, Duration, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::Review;

pub const ALL_TIME_LABEL: &str = "All Time";

/// Per-window rating summary.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBucket {
    #[serde(skip)]
    pub label: String,
    /// Window size in days, `None` for the all-time bucket.
    pub days: Option<u32>,
    #[schema(example = "18 Sep 2026 → 18 Oct 2026")]
    pub date_range: String,
    pub total: usize,
    #[schema(example = 3.75)]
    pub avg: f64,
    #[serde(rename = "5star")]
    pub five_star: usize,
    #[serde(rename = "4star")]
    pub four_star: usize,
    #[serde(rename = "3star")]
    pub three_star: usize,
    #[serde(rename = "2star")]
    pub two_star: usize,
    #[serde(rename = "1star")]
    pub one_star: usize,
}

/// Ordered buckets, serialized as a JSON object keyed by label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeriodBreakdown(pub Vec<PeriodBucket>);

impl PeriodBreakdown {
    pub fn get(&self, label: &str) -> Option<&PeriodBucket> {
        self.0.iter().find(|b| b.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.0.iter().map(|b| b.label.as_str()).collect()
    }
}

impl Serialize for PeriodBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for bucket in &self.0 {
            map.serialize_entry(&bucket.label, bucket)?;
        }
        map.end()
    }
}

/// Star histogram indexed by rating - 1.
fn histogram<'a>(reviews: impl Iterator<Item = &'a Review>) -> [usize; 5] {
    let mut stars = [0usize; 5];
    for review in reviews {
        if (1..=5).contains(&review.rating) {
            stars[review.rating as usize - 1] += 1;
        }
    }
    stars
}

/// Σ(star × count) / total, rounded to two decimals. Callers guarantee total > 0.
fn average(stars: &[usize; 5], total: usize) -> f64 {
    let sum: usize = stars.iter().enumerate().map(|(i, n)| (i + 1) * n).sum();
    (sum as f64 / total as f64 * 100.0).round() / 100.0
}

fn format_day(at: DateTime<Utc>) -> String {
    at.format("%-d %b %Y").to_string()
}

fn bucket(label: String, days: Option<u32>, from: DateTime<Utc>, to: DateTime<Utc>, stars: [usize; 5]) -> Option<PeriodBucket> {
    let total: usize = stars.iter().sum();
    if total == 0 {
        return None;
    }
    Some(PeriodBucket {
        label,
        days,
        date_range: format!("{} → {}", format_day(from), format_day(to)),
        total,
        avg: average(&stars, total),
        five_star: stars[4],
        four_star: stars[3],
        three_star: stars[2],
        two_star: stars[1],
        one_star: stars[0],
    })
}

/// Bucket `reviews` into each trailing window ending at `now`, then all time.
///
/// A review falls in a window when `now - days <= date <= now`. Empty windows
/// are left out, and undated reviews only count toward all time.
pub fn build_period_breakdown(reviews: &[Review], windows: &[u32], now: DateTime<Utc>) -> PeriodBreakdown {
    let mut buckets = Vec::with_capacity(windows.len() + 1);

    for &days in windows {
        let cutoff = now - Duration::days(i64::from(days));
        let in_window = reviews
            .iter()
            .filter(|r| matches!(r.date, Some(d) if d >= cutoff && d <= now));
        if let Some(b) = bucket(format!("Last {} Days", days), Some(days), cutoff, now, histogram(in_window)) {
            buckets.push(b);
        }
    }

    let oldest = reviews.iter().filter_map(|r| r.date).min().unwrap_or(now);
    if let Some(b) = bucket(ALL_TIME_LABEL.to_string(), None, oldest.min(now), now, histogram(reviews.iter())) {
        buckets.push(b);
    }

    PeriodBreakdown(buckets)
}
