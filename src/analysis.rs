//! Assembles the analysis payload from one consistent review set.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::AnalysisConfig;
use crate::error::ApiError;
use crate::fetcher;
use crate::insights::{self, InsightSummary, ThemeBreakdown};
use crate::model::{AppMetadata, Review, ReviewRecord};
use crate::periods::{self, PeriodBreakdown};
use crate::source::ReviewSource;
use crate::themes::{self, ThemeCount, NEGATIVE_RATINGS, POSITIVE_RATINGS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentimentCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let positive = reviews.iter().filter(|r| r.is_positive()).count();
        let negative = reviews.iter().filter(|r| r.is_negative()).count();
        Self { positive, negative, neutral: reviews.len() - positive - negative }
    }

    pub fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }

    /// Share of positive reviews: above 0.6 is positive, below 0.4 negative.
    pub fn label(&self) -> Sentiment {
        let total = self.total();
        if total == 0 {
            return Sentiment::Mixed;
        }
        let share = self.positive as f64 / total as f64;
        if share > 0.6 {
            Sentiment::Positive
        } else if share < 0.4 {
            Sentiment::Negative
        } else {
            Sentiment::Mixed
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[schema(example = "com.cred.club")]
    pub app_id: String,
    pub app_name: String,
    pub app_icon: Option<String>,
    pub app_rating: Option<f64>,
    pub total_reviews: Option<u64>,
    pub analysed: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub sentiment: Sentiment,
    pub insights: InsightSummary,
    #[schema(value_type = Object)]
    pub theme_breakdown: ThemeBreakdown,
    pub top_issues: Vec<ThemeCount>,
    pub top_good: Vec<ThemeCount>,
    #[schema(value_type = Object)]
    pub period_breakdown: PeriodBreakdown,
    pub reviews: Vec<ReviewRecord>,
}

/// Build the payload for `reviews`. Every derived field reads the same slice.
pub fn assemble(
    app_id: &str,
    metadata: AppMetadata,
    reviews: &[Review],
    config: &AnalysisConfig,
    now: DateTime<Utc>,
) -> AnalysisResult {
    let counts = SentimentCounts::from_reviews(reviews);
    let theme_breakdown = insights::build_theme_breakdown(reviews, config);

    AnalysisResult {
        app_id: app_id.to_string(),
        app_name: metadata.title.unwrap_or_else(|| app_id.to_string()),
        app_icon: metadata.icon,
        app_rating: metadata.score,
        total_reviews: metadata.reviews,
        analysed: reviews.len(),
        positive: counts.positive,
        negative: counts.negative,
        neutral: counts.neutral,
        sentiment: counts.label(),
        insights: insights::summarize_themes(&theme_breakdown),
        theme_breakdown,
        top_issues: themes::extract_phrases(reviews, NEGATIVE_RATINGS, config.top_n, &config.stopwords),
        top_good: themes::extract_phrases(reviews, POSITIVE_RATINGS, config.top_n, &config.stopwords),
        period_breakdown: periods::build_period_breakdown(reviews, &config.period_windows, now),
        reviews: reviews.iter().map(ReviewRecord::from).collect(),
    }
}

/// Full request flow: metadata lookup (degrades), paginated fetch (aborts on
/// failure), empty check, then assembly.
pub async fn analyse_app(
    source: &dyn ReviewSource,
    config: &AnalysisConfig,
    app_id: &str,
    count: usize,
) -> Result<AnalysisResult, ApiError> {
    tracing::info!("🔎 Analysing {} (up to {} reviews)", app_id, count);

    let metadata = fetcher::lookup_metadata(source, app_id).await;
    let reviews = fetcher::fetch_reviews(source, app_id, count, config.batch_size).await?;
    if reviews.is_empty() {
        return Err(ApiError::NoReviews(app_id.to_string()));
    }

    let result = assemble(app_id, metadata, &reviews, config, Utc::now());
    tracing::info!(
        "✅ {} analysed: {} reviews, sentiment {:?}",
        app_id,
        result.analysed,
        result.sentiment
    );
    Ok(result)
}
