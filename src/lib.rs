//! Review analytics for app-store listings.
//!
//! Fetches recent reviews through a paginated source, then derives sentiment
//! totals, recurring phrases, sentence-level theme insights and rating trends
//! over trailing day windows.

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod insights;
pub mod model;
pub mod periods;
pub mod source;
pub mod themes;
