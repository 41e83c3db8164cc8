use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::analysis::{self, AnalysisResult};
use crate::config::{self, AnalysisConfig};
use crate::error::{ApiError, ErrorBody};
use crate::fetcher;
use crate::model::{RawReviewRecord, SortOrder};
use crate::source::{Cursor, PageRequest, ReviewSource};

const LISTING_DEFAULT_COUNT: usize = 40;
const LISTING_MAX_COUNT: usize = 200;

pub struct AppState {
    pub source: Arc<dyn ReviewSource>,
    pub config: Arc<AnalysisConfig>,
}

// ============================================================================
// Request / Response types
// ============================================================================

/// Query for `/api/analyse`. Values stay raw strings so malformed numbers
/// fall back to defaults instead of rejecting the request.
///
/// Handlers read the query as ordered pairs and build these with
/// `from_pairs`, so a repeated key keeps its first value.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AnalyseQuery {
    /// Store package identifier, e.g. `com.cred.club`
    pub app_id: Option<String>,
    /// Reviews to analyse (default 300, max 1000)
    pub count: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewsQuery {
    pub app_id: Option<String>,
    /// Reviews to return (default 40, max 200)
    pub count: Option<String>,
    /// 0 = all ratings, 1-5 = only that rating
    pub rating: Option<String>,
    /// 1 = most relevant, 2 = newest, 3 = rating
    pub sort: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewListing {
    pub app_id: String,
    pub app_name: String,
    pub app_icon: Option<String>,
    pub app_rating: Option<f64>,
    pub total_reviews: Option<u64>,
    pub fetched_count: usize,
    pub reviews: Vec<RawReviewRecord>,
}

type QueryPairs = Vec<(String, String)>;

fn first_value(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
}

impl AnalyseQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            app_id: first_value(pairs, "appId"),
            count: first_value(pairs, "count"),
        }
    }
}

impl ReviewsQuery {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        Self {
            app_id: first_value(pairs, "appId"),
            count: first_value(pairs, "count"),
            rating: first_value(pairs, "rating"),
            sort: first_value(pairs, "sort"),
        }
    }
}

fn required_app_id(raw: Option<String>) -> Result<String, ApiError> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::MissingAppId)
}

// ============================================================================
// Handlers
// ============================================================================

/// Analyse recent reviews of an app
#[utoipa::path(
    get,
    path = "/api/analyse",
    params(AnalyseQuery),
    responses(
        (status = 200, description = "Analysis summary", body = AnalysisResult),
        (status = 400, description = "appId missing", body = ErrorBody),
        (status = 404, description = "No reviews fetched", body = ErrorBody),
        (status = 500, description = "Review fetch failed", body = ErrorBody)
    ),
    tag = "analysis"
)]
pub async fn analyse(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let query = AnalyseQuery::from_pairs(&pairs);
    let app_id = required_app_id(query.app_id)?;
    let count = state.config.resolve_count(query.count.as_deref());

    let result = analysis::analyse_app(state.source.as_ref(), &state.config, &app_id, count).await?;
    Ok(Json(result))
}

/// List one page of raw reviews
#[utoipa::path(
    get,
    path = "/api/reviews",
    params(ReviewsQuery),
    responses(
        (status = 200, description = "Raw reviews", body = ReviewListing),
        (status = 400, description = "appId missing", body = ErrorBody),
        (status = 404, description = "App not found upstream", body = ErrorBody),
        (status = 429, description = "Upstream rate limit", body = ErrorBody),
        (status = 500, description = "Fetch failed", body = ErrorBody)
    ),
    tag = "reviews"
)]
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<ReviewListing>, ApiError> {
    let query = ReviewsQuery::from_pairs(&pairs);
    let app_id = required_app_id(query.app_id)?;
    let count = config::resolve_count(query.count.as_deref(), LISTING_DEFAULT_COUNT, LISTING_MAX_COUNT);
    let rating = query
        .rating
        .as_deref()
        .and_then(|r| r.trim().parse::<u8>().ok())
        .filter(|r| (1..=5).contains(r));
    let sort = SortOrder::from_code(query.sort.as_deref());

    let metadata = fetcher::lookup_metadata(state.source.as_ref(), &app_id).await;
    let page = state
        .source
        .review_page(PageRequest {
            app_id: &app_id,
            sort,
            batch_size: count,
            rating,
            cursor: &Cursor::Start,
        })
        .await
        .map_err(|e| ApiError::Listing(app_id.clone(), e))?;

    let mut reviews = page.reviews;
    reviews.truncate(count);

    Ok(Json(ReviewListing {
        app_name: metadata.title.unwrap_or_else(|| app_id.clone()),
        app_id,
        app_icon: metadata.icon,
        app_rating: metadata.score,
        total_reviews: metadata.reviews,
        fetched_count: reviews.len(),
        reviews: reviews.into_iter().map(RawReviewRecord::from).collect(),
    }))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Internal server error".to_string()
    };
    tracing::error!("💥 Handler panicked: {}", message);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: message })).into_response()
}

// ============================================================================
// Router
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(analyse, list_reviews),
    components(
        schemas(
            AnalysisResult,
            ReviewListing,
            ErrorBody,
            crate::analysis::Sentiment,
            crate::insights::InsightSummary,
            crate::insights::ThemeTally,
            crate::themes::ThemeCount,
            crate::periods::PeriodBucket,
            crate::model::ReviewRecord,
            crate::model::RawReviewRecord
        )
    ),
    tags(
        (name = "analysis", description = "Review analytics"),
        (name = "reviews", description = "Raw review listing")
    )
)]
pub struct ApiDoc;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/analyse", get(analyse))
        .route("/api/reviews", get(list_reviews))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::model::AppMetadata;
    use crate::source::stub::{review, StubSource};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app(source: StubSource) -> (Router, Arc<StubSource>) {
        let source = Arc::new(source);
        let state = Arc::new(AppState {
            source: source.clone(),
            config: Arc::new(AnalysisConfig::default()),
        });
        (router(state), source)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_app_id_is_rejected_before_fetch() {
        let (router, source) = app(StubSource::new(None));
        let (status, headers, body) = get_json(router, "/api/analyse?appId=%20%20").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, serde_json::json!({ "error": "appId is required" }));
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_fetch_is_not_found() {
        let (router, _) = app(StubSource::new(None));
        let (status, _, body) = get_json(router, "/api/analyse?appId=ghost.app").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No reviews found for ghost.app");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_server_error() {
        let stub = StubSource::new(None)
            .page(vec![review(5, "Quick and reliable service", 1)], Some("t1"))
            .failure(SourceError::Status { status: 503, body: "down".into() });
        let (router, _) = app(stub);
        let (status, _, body) = get_json(router, "/api/analyse?appId=com.example.app&count=500").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Review source returned HTTP 503: down");
    }

    #[tokio::test]
    async fn test_analysis_payload_shape() {
        let stub = StubSource::new(None).page(
            vec![
                review(5, "Cashback rewards arrive instantly", 1),
                review(4, "Cashback rewards are decent", 12),
                review(1, "Payment failed, money deducted", 3),
                review(3, "Average experience", 70),
            ],
            None,
        );
        let (router, source) = app(stub);
        let (status, _, body) = get_json(router, "/api/analyse?appId=com.example.app&count=abc").await;

        assert_eq!(status, StatusCode::OK);
        for field in [
            "appId", "appName", "appIcon", "appRating", "totalReviews", "analysed", "positive", "negative",
            "neutral", "sentiment", "topIssues", "topGood", "periodBreakdown", "reviews", "insights",
            "themeBreakdown",
        ] {
            assert!(body.get(field).is_some(), "missing field {}", field);
        }
        assert_eq!(body["appName"], "com.example.app");
        assert!(body["appIcon"].is_null());
        assert_eq!(body["analysed"], 4);
        assert_eq!(body["positive"], 2);
        assert_eq!(body["negative"], 1);
        assert_eq!(body["neutral"], 1);
        assert_eq!(body["sentiment"], "mixed");
        assert_eq!(body["topGood"][0], serde_json::json!({ "phrase": "cashback", "count": 2 }));
        assert_eq!(body["periodBreakdown"]["Last 7 Days"]["total"], 2);
        assert_eq!(body["periodBreakdown"]["All Time"]["total"], 4);
        assert!(body["periodBreakdown"].get("Last 30 Days").is_some());
        assert_eq!(body["reviews"].as_array().unwrap().len(), 4);

        // invalid count falls back to the default of 300, capped by batch size
        assert_eq!(source.requests.lock().unwrap()[0].0, 200);
    }

    #[tokio::test]
    async fn test_repeated_parameters_keep_first_value() {
        let stub = StubSource::new(None).page(vec![review(5, "Smooth and quick payments", 1)], None);
        let (router, source) = app(stub);
        let (status, _, body) = get_json(router, "/api/analyse?appId=a.b&appId=c.d&count=1&count=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appId"], "a.b");
        assert_eq!(source.requests.lock().unwrap()[0].0, 1);

        let (router, source) = app(StubSource::new(None));
        let (status, headers, body) = get_json(router, "/api/analyse?appId=&appId=c.d").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(body["error"], "appId is required");
        assert_eq!(source.calls(), 0);

        let (router, source) = app(StubSource::new(None).page(vec![review(2, "Slow", 1)], None));
        let (status, _, _) = get_json(router, "/api/reviews?appId=x.y&rating=2&rating=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(source.requests.lock().unwrap()[0].2, Some(2));
    }

    #[tokio::test]
    async fn test_preflight_returns_cors_headers() {
        let (router, source) = app(StubSource::new(None));
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/analyse?appId=com.example.app")
                    .header("origin", "https://dashboard.example")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let methods = response.headers()["access-control-allow-methods"].to_str().unwrap().to_string();
        assert!(methods.contains("GET") && methods.contains("OPTIONS"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_listing_passes_filters_and_caps_count() {
        let stub = StubSource::new(Some(AppMetadata {
            title: Some("Example".to_string()),
            ..AppMetadata::default()
        }))
        .page(vec![review(1, "Crashes on start", 1), review(1, "Keeps crashing", 2)], Some("more"));
        let (router, source) = app(stub);
        let (status, _, body) = get_json(router, "/api/reviews?appId=com.example.app&count=900&rating=1&sort=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appName"], "Example");
        assert_eq!(body["fetchedCount"], 2);
        assert_eq!(body["reviews"][0]["score"], 1);
        assert_eq!(source.requests.lock().unwrap()[0], (200, None, Some(1)));
    }

    #[tokio::test]
    async fn test_listing_maps_upstream_errors() {
        let (router, _) = app(StubSource::new(None).failure(SourceError::RateLimited));
        let (status, _, body) = get_json(router, "/api/reviews?appId=busy.app").await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Google Play rate limit hit. Please wait a moment and try again.");

        let (router, _) = app(StubSource::new(None).failure(SourceError::NotFound("gone.app".into())));
        let (status, _, body) = get_json(router, "/api/reviews?appId=gone.app").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "App \"gone.app\" not found on Google Play.");
    }

    async fn boom() -> &'static str {
        panic!("source exploded")
    }

    #[tokio::test]
    async fn test_panic_becomes_json_error() {
        let router = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(panic_response));
        let (status, _, body) = get_json(router, "/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "source exploded");
    }
}
