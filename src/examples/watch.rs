//! Poll a page through free proxies and announce matching items.
//!
//! ```sh
//! ROOT_URL=https://shop.example/new KEYWORDS="limited edition,collab" \
//!     WEBHOOK_URL=https://hooks.slack.com/services/... RUST_LOG=info \
//!     cargo run --example watch
//! ```

use anyhow::Context;
use reqwest_proxy_crawler::{CrawlerConfig, PollScheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let root_url = std::env::var("ROOT_URL").context("ROOT_URL must be set")?;
    let keywords: Vec<String> = std::env::var("KEYWORDS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    let mut builder = CrawlerConfig::builder().root_url(root_url).keywords(keywords);
    if let Ok(url) = std::env::var("WEBHOOK_URL") {
        builder = builder.notifier_url(url);
    }
    let config = builder.build()?;

    let scheduler = PollScheduler::new(config)?;
    scheduler
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    Ok(())
}
