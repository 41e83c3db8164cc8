//! Service and analysis configuration.
//!
//! `ServiceConfig` comes from the environment (optionally via `.env`), while
//! `AnalysisConfig` carries the fixed word lists, windows and limits that the
//! analysis components receive explicitly.

use std::collections::HashSet;
use std::env;
use std::net::SocketAddr;

use once_cell::sync::Lazy;
use regex::Regex;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SOURCE_URL: &str = "http://localhost:8080";

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with",
    "is", "it", "its", "this", "that", "was", "are", "be", "been", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "not", "no", "so", "if",
    "i", "my", "me", "we", "you", "your", "they", "them", "app", "use", "get", "just",
    "also", "very", "good", "great", "nice", "bad", "even", "still", "after", "before",
    "when", "than", "more", "all", "some", "one", "time", "way", "make", "now", "new",
    "well", "really", "much", "many", "like", "please", "thank", "thanks",
];

static LEADING_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([+-]?)(\d+)").expect("static regex"));

const PERIOD_WINDOWS: &[u32] = &[7, 30, 60, 90, 120, 180, 270, 365];

const POSITIVE_HINTS: &[&str] = &["easy", "fast", "smooth", "helpful", "love", "great", "excellent"];
const NEGATIVE_HINTS: &[&str] = &["not", "fail", "error", "issue", "problem", "slow", "crash", "bug"];

const THEMES: &[(&str, &[&str])] = &[
    ("performance", &["slow", "fast", "lag", "crash", "loading"]),
    ("login_auth", &["login", "otp", "password", "sign in"]),
    ("payments", &["payment", "upi", "refund", "transaction"]),
    ("support", &["support", "customer", "help"]),
    ("ui_ux", &["ui", "interface", "design", "navigation"]),
    ("features", &["feature", "update", "option"]),
    ("stability", &["bug", "error", "issue", "fail"]),
];

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    /// Base URL of the JSON review gateway.
    pub source_url: String,
    pub lang: String,
    pub country: String,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    tracing::warn!("⚠️ Ignoring BIND_ADDR={:?}: {}", raw, e);
                    None
                }
            })
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)));

        Self {
            bind_addr,
            source_url: env::var("REVIEW_SOURCE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_SOURCE_URL.to_string()),
            lang: env::var("REVIEW_LANG").unwrap_or_else(|_| "en".to_string()),
            country: env::var("REVIEW_COUNTRY").unwrap_or_else(|_| "in".to_string()),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            source_url: DEFAULT_SOURCE_URL.to_string(),
            lang: "en".to_string(),
            country: "in".to_string(),
        }
    }
}

/// A named theme and the literal keywords that signal it.
#[derive(Debug, Clone)]
pub struct ThemeDefinition {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Fixed vocabulary and limits used by the analysis components.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub stopwords: HashSet<String>,
    /// Trailing day windows, ascending.
    pub period_windows: Vec<u32>,
    pub top_n: usize,
    pub batch_size: usize,
    pub max_count: usize,
    pub default_count: usize,
    pub positive_hints: Vec<String>,
    pub negative_hints: Vec<String>,
    pub themes: Vec<ThemeDefinition>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stopwords: STOPWORDS.iter().map(|s| s.to_string()).collect(),
            period_windows: PERIOD_WINDOWS.to_vec(),
            top_n: 10,
            batch_size: 200,
            max_count: 1000,
            default_count: 300,
            positive_hints: POSITIVE_HINTS.iter().map(|s| s.to_string()).collect(),
            negative_hints: NEGATIVE_HINTS.iter().map(|s| s.to_string()).collect(),
            themes: THEMES
                .iter()
                .map(|(name, keywords)| ThemeDefinition {
                    name: name.to_string(),
                    keywords: keywords.iter().map(|k| k.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl AnalysisConfig {
    /// Resolve the `count` query parameter: missing, non-numeric or zero means
    /// the default, anything else is clamped into `1..=max_count`. Only the
    /// leading integer is read, so `"12.5"` is 12.
    pub fn resolve_count(&self, raw: Option<&str>) -> usize {
        resolve_count(raw, self.default_count, self.max_count)
    }
}

/// Shared parsing for count-like query parameters.
pub fn resolve_count(raw: Option<&str>, default: usize, max: usize) -> usize {
    let parsed = raw.and_then(leading_int).unwrap_or(0);
    if parsed == 0 {
        return default.min(max);
    }
    parsed.clamp(1, max as i64) as usize
}

/// Leading signed integer of `raw`, saturating on overflow.
fn leading_int(raw: &str) -> Option<i64> {
    let caps = LEADING_INT.captures(raw)?;
    let negative = &caps[1] == "-";
    let value = caps[2].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}
