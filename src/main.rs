//! # Juris Mailer
//!
//! Background service that emails deadline reminders to clients and a weekly
//! summary to managers of the legal case system.
//!
//! Usage:
//!   juris-mailer                        # reads .env, then ~/.juris-mailer/config.toml
//!   JURIS_MAILER_CONFIG=./mailer.toml juris-mailer
//!   RUST_LOG=debug JURIS_LOG_FORMAT=json juris-mailer

use std::sync::Arc;

use anyhow::Result;
use juris_core::NotifierConfig;
use juris_jobs::schedule_notifications;
use juris_scheduler::{SchedulePolicy, SchedulerEngine};
use juris_store::SupabaseStore;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str =
    "juris_mailer=info,juris_core=info,juris_store=info,juris_mail=info,juris_scheduler=info,juris_jobs=info";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("JURIS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = NotifierConfig::load()?;
    let provider = juris_mail::build_provider(&config.mail);
    let store = Arc::new(SupabaseStore::new(config.database.clone()));

    tracing::info!("⚖️ Juris Mailer v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "   📧 Provider: {} (deadlines from {}, summaries from {})",
        provider.name(),
        config.mail.deadline_from,
        config.mail.summary_from
    );
    tracing::info!(
        "   ⏰ Deadline check every {}s, summary every {} at {}",
        config.schedule.deadline_interval_secs,
        config.schedule.weekly_day,
        config.schedule.weekly_time
    );
    if config.database.url.trim().is_empty() {
        tracing::warn!("⚠️ SUPABASE_URL is not set: every query will fail until it is");
    }

    let mut engine = SchedulerEngine::with_system_clock(SchedulePolicy::from_config(&config.schedule));
    schedule_notifications(&mut engine, &config, store, provider)?;

    tokio::select! {
        _ = engine.run_forever() => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("👋 Shutting down");
        }
    }

    Ok(())
}
