mod config;
mod diff;
mod fetcher;
mod format;
mod models;
mod notifier;
mod poller;
mod queue;
mod telegram;
mod watermark;

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    fetcher::PageFetcher,
    notifier::Notifier,
    poller::Poller,
    telegram::TelegramBot,
    watermark::{SystemClock, Watermark},
};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Config comes first so DEBUG can pick the log level
    let cfg = config::load()?;

    let default_level = if cfg.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("Donation watcher starting...");
    info!("  Profile: {}/{}", cfg.profile_base_url, cfg.user_id);
    info!("  Interval: {:?}", cfg.interval);
    info!("  Timezone: {}", cfg.timezone);
    info!("  Notify debits: {}", cfg.notify_debits);
    if cfg.debug {
        info!("Config: {:?}", cfg);
    }

    let bot = TelegramBot::new(&cfg.telegram_api_url, &cfg.bot_token)?;
    let me = bot.get_me().await?;
    info!(
        "Authorized on account {} ({})",
        me.username.as_deref().unwrap_or("<no username>"),
        me.id
    );

    let fetcher = PageFetcher::new(&cfg.profile_base_url, &cfg.user_agent, cfg.fetch_timeout)?;

    let (queue, rx) = queue::delivery_queue();

    let notifier_handle = tokio::spawn({
        let notifier = Notifier::new(
            Arc::new(bot),
            cfg.admin_id,
            cfg.group_chat_id,
            cfg.timezone,
            cfg.notify_debits,
        );
        notifier.run(rx)
    });

    queue.notice(format!("Started watching {}", cfg.user_id));

    // Debug mode replays the whole page on the first cycle
    let watermark = if cfg.debug {
        Watermark::from_beginning()
    } else {
        Watermark::starting_at(chrono::Utc::now())
    };

    let poller_handle = tokio::spawn({
        let poller = Poller::new(
            Arc::new(fetcher),
            Arc::new(SystemClock),
            queue,
            cfg.user_id.clone(),
            cfg.timezone,
            cfg.interval,
        );
        poller.run(watermark)
    });

    tokio::select! {
        res = poller_handle => match res {
            Ok(Ok(_)) => info!("Poller exited cleanly"),
            Ok(Err(e)) => error!("Poller error: {:?}", e),
            Err(e) => error!("Poller task panicked: {:?}", e),
        },
        res = notifier_handle => match res {
            Ok(Ok(_)) => info!("Notifier exited cleanly"),
            Ok(Err(e)) => error!("Notifier error: {:?}", e),
            Err(e) => error!("Notifier task panicked: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("Donation watcher stopped.");
    Ok(())
}
