//! Daily AI brief — binary entrypoint.
//! Loads settings, runs the digest pipeline once, and exits non-zero with a
//! diagnostic on any fatal error. Scheduling lives outside (cron / CI).

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ai_daily_brief::config::Settings;
use ai_daily_brief::ingest::HttpFeedSource;
use ai_daily_brief::notify::wechat::WeChatNotifier;
use ai_daily_brief::pipeline;
use ai_daily_brief::summarize::deepseek::DeepSeekClient;

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op in CI where secrets arrive via env.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let settings = Settings::from_env();
    info!(
        feed = %settings.feed_url,
        card_format = ?settings.card_format,
        summary_mode = ?settings.summary_mode,
        dry_run = settings.dry_run,
        "starting daily brief run"
    );

    let feed = HttpFeedSource::new(settings.feed_url.clone());
    let chat = DeepSeekClient::new(
        settings.deepseek_api_key.clone(),
        settings.deepseek_api_url.clone(),
    );
    let notifier = WeChatNotifier::new(settings.webhook_url.clone());

    match pipeline::run_once(&settings, &feed, &chat, &notifier).await {
        Ok(_) => info!("run completed"),
        Err(e) => {
            error!("run failed: {e}");
            std::process::exit(1);
        }
    }
}
