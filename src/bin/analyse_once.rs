//! Run a single analysis from the command line and print the payload.
//!
//! Usage: `analyse_once <appId> [count]`

use anyhow::{anyhow, Context, Result};
use dotenv::dotenv;
use review_analyser::analysis;
use review_analyser::config::{AnalysisConfig, ServiceConfig};
use review_analyser::source::HttpReviewSource;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let app_id = args.next().ok_or_else(|| anyhow!("usage: analyse_once <appId> [count]"))?;
    let analysis_config = AnalysisConfig::default();
    let count = analysis_config.resolve_count(args.next().as_deref());

    let config = ServiceConfig::from_env();
    println!("🔎 Analysing {} via {}", app_id, config.source_url);

    let source = HttpReviewSource::new(&config);
    let result = analysis::analyse_app(&source, &analysis_config, &app_id, count)
        .await
        .with_context(|| format!("analysing {}", app_id))?;

    let json = serde_json::to_string_pretty(&result).context("serializing analysis")?;
    println!("{}", json);
    eprintln!(
        "✅ {} reviews, sentiment {:?}, {} period buckets",
        result.analysed,
        result.sentiment,
        result.period_breakdown.0.len()
    );
    Ok(())
}
