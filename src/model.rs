use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Domain types
// ============================================================================

/// A single store review as fetched for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: Option<String>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
    /// Star rating, always within 1..=5.
    pub rating: u8,
    pub text: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub thumbs_up: u32,
    pub version: Option<String>,
    pub reply_text: Option<String>,
    pub reply_date: Option<DateTime<Utc>>,
}

impl Review {
    pub fn is_positive(&self) -> bool {
        self.rating >= 4
    }

    pub fn is_negative(&self) -> bool {
        self.rating <= 2
    }
}

/// App-level metadata from the store listing. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppMetadata {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub score: Option<f64>,
    pub reviews: Option<u64>,
}

/// Review ordering understood by the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    MostRelevant,
    #[default]
    Newest,
    Rating,
}

impl SortOrder {
    /// Map the numeric `sort` query value (1, 2, 3) to an order.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.and_then(|c| c.trim().parse::<u8>().ok()) {
            Some(1) => SortOrder::MostRelevant,
            Some(3) => SortOrder::Rating,
            _ => SortOrder::Newest,
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::MostRelevant => "relevance",
            SortOrder::Newest => "newest",
            SortOrder::Rating => "rating",
        }
    }
}

// ============================================================================
// Gateway wire format
// ============================================================================

/// App listing as returned by the review gateway.
#[derive(Debug, Deserialize)]
pub struct WireApp {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub score: Option<f64>,
    pub reviews: Option<u64>,
}

impl From<WireApp> for AppMetadata {
    fn from(app: WireApp) -> Self {
        AppMetadata {
            title: app.title.filter(|t| !t.trim().is_empty()),
            icon: app.icon.filter(|i| !i.is_empty()),
            score: app.score,
            reviews: app.reviews,
        }
    }
}

/// One page of reviews plus the continuation token for the next page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReviewPage {
    #[serde(default)]
    pub data: Vec<WireReview>,
    pub next_pagination_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReview {
    pub id: Option<String>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub score: i64,
    pub text: Option<String>,
    pub reply_date: Option<DateTime<Utc>>,
    pub reply_text: Option<String>,
    pub version: Option<String>,
    pub thumbs_up: Option<u32>,
}

impl From<WireReview> for Review {
    fn from(r: WireReview) -> Self {
        Review {
            id: r.id,
            user_name: r.user_name,
            user_image: r.user_image,
            rating: r.score.clamp(1, 5) as u8,
            text: r.text,
            date: r.date,
            thumbs_up: r.thumbs_up.unwrap_or(0),
            version: r.version,
            reply_text: r.reply_text,
            reply_date: r.reply_date,
        }
    }
}

// ============================================================================
// Response records
// ============================================================================

/// Review as emitted in the analysis payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRecord {
    #[schema(example = "Priya")]
    pub user_name: String,
    #[schema(example = 4)]
    pub score: u8,
    pub text: String,
    pub date: Option<DateTime<Utc>>,
    pub thumbs_up: u32,
    pub version: String,
    pub reply_text: String,
    pub reply_date: Option<DateTime<Utc>>,
}

impl From<&Review> for ReviewRecord {
    fn from(r: &Review) -> Self {
        ReviewRecord {
            user_name: r
                .user_name
                .clone()
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Anonymous".to_string()),
            score: r.rating,
            text: r.text.clone().unwrap_or_default(),
            date: r.date,
            thumbs_up: r.thumbs_up,
            version: r.version.clone().unwrap_or_default(),
            reply_text: r.reply_text.clone().unwrap_or_default(),
            reply_date: r.reply_date,
        }
    }
}

/// Review as emitted by the raw listing endpoint, closer to the store record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawReviewRecord {
    pub id: Option<String>,
    pub user_name: Option<String>,
    pub user_image: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub score: u8,
    pub text: Option<String>,
    pub reply_date: Option<DateTime<Utc>>,
    pub reply_text: Option<String>,
    pub thumbs_up: u32,
    pub version: Option<String>,
}

impl From<Review> for RawReviewRecord {
    fn from(r: Review) -> Self {
        RawReviewRecord {
            id: r.id,
            user_name: r.user_name,
            user_image: r.user_image,
            date: r.date,
            score: r.rating,
            text: r.text,
            reply_date: r.reply_date,
            reply_text: r.reply_text,
            thumbs_up: r.thumbs_up,
            version: r.version,
        }
    }
}
