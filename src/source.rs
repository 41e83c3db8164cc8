//! Review data source: the app listing lookup and the paginated review feed.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::config::ServiceConfig;
use crate::error::SourceError;
use crate::model::{AppMetadata, Review, SortOrder, WireApp, WireReviewPage};

/// Pagination position exchanged with the data source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    /// No page fetched yet.
    #[default]
    Start,
    /// Opaque continuation token issued by the source.
    Token(String),
    /// The source has no further pages.
    End,
}

impl Cursor {
    /// Interpret a continuation token from the wire. Absent or empty means end of data.
    pub fn from_token(token: Option<String>) -> Self {
        match token {
            Some(t) if !t.trim().is_empty() => Cursor::Token(t),
            _ => Cursor::End,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Cursor::End)
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Cursor::Token(t) => Some(t),
            _ => None,
        }
    }
}

/// One batch request against the review feed.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub app_id: &'a str,
    pub sort: SortOrder,
    pub batch_size: usize,
    /// Restrict to a single star rating.
    pub rating: Option<u8>,
    pub cursor: &'a Cursor,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub next: Cursor,
}

#[async_trait]
pub trait ReviewSource: Send + Sync {
    async fn app_metadata(&self, app_id: &str) -> Result<AppMetadata, SourceError>;

    async fn review_page(&self, request: PageRequest<'_>) -> Result<ReviewPage, SourceError>;
}

/// `ReviewSource` backed by the JSON review gateway.
pub struct HttpReviewSource {
    client: Client,
    base_url: String,
    lang: String,
    country: String,
}

impl HttpReviewSource {
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &ServiceConfig) -> Self {
        Self {
            client,
            base_url: config.source_url.trim_end_matches('/').to_string(),
            lang: config.lang.clone(),
            country: config.country.clone(),
        }
    }

    fn app_url(&self, app_id: &str) -> String {
        format!("{}/apps/{}", self.base_url, urlencoding::encode(app_id))
    }

    async fn check(app_id: &str, response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        match response.status() {
            s if s.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(SourceError::NotFound(app_id.to_string())),
            StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimited),
            s => {
                let body = response.text().await.unwrap_or_default();
                Err(SourceError::Status { status: s.as_u16(), body })
            }
        }
    }
}

#[async_trait]
impl ReviewSource for HttpReviewSource {
    async fn app_metadata(&self, app_id: &str) -> Result<AppMetadata, SourceError> {
        let response = self
            .client
            .get(self.app_url(app_id))
            .query(&[("lang", self.lang.as_str()), ("country", self.country.as_str())])
            .send()
            .await?;

        let app: WireApp = Self::check(app_id, response).await?.json().await?;
        Ok(app.into())
    }

    async fn review_page(&self, request: PageRequest<'_>) -> Result<ReviewPage, SourceError> {
        let mut query: Vec<(&str, String)> = vec![
            ("lang", self.lang.clone()),
            ("country", self.country.clone()),
            ("sort", request.sort.as_param().to_string()),
            ("num", request.batch_size.to_string()),
        ];
        if let Some(rating) = request.rating {
            query.push(("rating", rating.to_string()));
        }
        if let Some(token) = request.cursor.token() {
            query.push(("paginationToken", token.to_string()));
        }

        let response = self
            .client
            .get(format!("{}/reviews", self.app_url(request.app_id)))
            .query(&query)
            .send()
            .await?;

        let page: WireReviewPage = Self::check(request.app_id, response).await?.json().await?;
        Ok(ReviewPage {
            reviews: page.data.into_iter().map(Review::from).collect(),
            next: Cursor::from_token(page.next_pagination_token),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> HttpReviewSource {
        HttpReviewSource::new(&ServiceConfig {
            source_url: server.uri(),
            ..ServiceConfig::default()
        })
    }

    #[test]
    fn test_cursor_from_token() {
        assert_eq!(Cursor::from_token(None), Cursor::End);
        assert_eq!(Cursor::from_token(Some(String::new())), Cursor::End);
        assert_eq!(Cursor::from_token(Some("abc".into())), Cursor::Token("abc".into()));
        assert!(Cursor::Start.token().is_none());
    }

    #[tokio::test]
    async fn test_review_page_parses_batch_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/com.example.app/reviews"))
            .and(query_param("sort", "newest"))
            .and(query_param("num", "2"))
            .and(query_param("paginationToken", "tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"id": "a", "userName": "Ann", "score": 5, "text": "Lovely", "date": "2026-10-01T08:00:00Z", "thumbsUp": 3},
                    {"id": "b", "userName": "Bo", "score": 1, "text": null, "date": "2026-09-01T08:00:00Z"}
                ],
                "nextPaginationToken": "tok-2"
            })))
            .mount(&server)
            .await;

        let cursor = Cursor::Token("tok-1".into());
        let page = source_for(&server)
            .review_page(PageRequest {
                app_id: "com.example.app",
                sort: SortOrder::Newest,
                batch_size: 2,
                rating: None,
                cursor: &cursor,
            })
            .await
            .unwrap();

        assert_eq!(page.reviews.len(), 2);
        assert_eq!(page.reviews[0].thumbs_up, 3);
        assert_eq!(page.reviews[1].text, None);
        assert_eq!(page.next, Cursor::Token("tok-2".into()));
    }

    #[tokio::test]
    async fn test_missing_token_ends_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/com.example.app/reviews"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })))
            .mount(&server)
            .await;

        let page = source_for(&server)
            .review_page(PageRequest {
                app_id: "com.example.app",
                sort: SortOrder::Newest,
                batch_size: 200,
                rating: None,
                cursor: &Cursor::Start,
            })
            .await
            .unwrap();

        assert!(page.reviews.is_empty());
        assert!(page.next.is_end());
    }

    #[tokio::test]
    async fn test_status_codes_map_to_error_kinds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/missing.app"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/apps/busy.app/reviews"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let source = source_for(&server);
        let err = source.app_metadata("missing.app").await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(id) if id == "missing.app"));

        let err = source
            .review_page(PageRequest {
                app_id: "busy.app",
                sort: SortOrder::Newest,
                batch_size: 10,
                rating: Some(1),
                cursor: &Cursor::Start,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::RateLimited));
    }

    #[tokio::test]
    async fn test_app_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/apps/com.example.app"))
            .and(query_param("country", "in"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Example",
                "icon": "https://img/icon.png",
                "score": 4.3,
                "reviews": 12345
            })))
            .mount(&server)
            .await;

        let meta = source_for(&server).app_metadata("com.example.app").await.unwrap();
        assert_eq!(meta.title.as_deref(), Some("Example"));
        assert_eq!(meta.reviews, Some(12345));
    }
}
