//! Sequential, newest-first review pagination.

use crate::error::FetchError;
use crate::model::{AppMetadata, Review, SortOrder};
use crate::source::{Cursor, PageRequest, ReviewSource};

/// Fetch up to `count` newest reviews in batches of at most `batch_size`.
///
/// Stops once `count` reviews are collected, a batch comes back empty, or the
/// source stops issuing continuation tokens. Any failed batch aborts the whole
/// fetch.
pub async fn fetch_reviews(
    source: &dyn ReviewSource,
    app_id: &str,
    count: usize,
    batch_size: usize,
) -> Result<Vec<Review>, FetchError> {
    let batch_size = batch_size.max(1);
    let mut reviews: Vec<Review> = Vec::new();
    let mut cursor = Cursor::Start;
    let mut batch = 0;

    while reviews.len() < count && !cursor.is_end() {
        let wanted = batch_size.min(count - reviews.len());
        tracing::debug!("📥 [{}] batch {} requesting {} reviews", app_id, batch, wanted);

        let page = source
            .review_page(PageRequest {
                app_id,
                sort: SortOrder::Newest,
                batch_size: wanted,
                rating: None,
                cursor: &cursor,
            })
            .await
            .map_err(|err| {
                tracing::warn!("⚠️ [{}] batch {} failed: {}", app_id, batch, err);
                FetchError { batch, source: err }
            })?;

        batch += 1;
        if page.reviews.is_empty() {
            break;
        }

        let mut rows = page.reviews;
        rows.truncate(wanted);
        reviews.extend(rows);
        cursor = page.next;
    }

    tracing::info!("📦 [{}] fetched {} reviews in {} batches", app_id, reviews.len(), batch);
    Ok(reviews)
}

/// Look up app metadata. A failed lookup degrades to empty metadata.
pub async fn lookup_metadata(source: &dyn ReviewSource, app_id: &str) -> AppMetadata {
    match source.app_metadata(app_id).await {
        Ok(meta) => meta,
        Err(e) => {
            tracing::warn!("⚠️ [{}] metadata lookup failed, continuing without it: {}", app_id, e);
            AppMetadata::default()
        }
    }
}
