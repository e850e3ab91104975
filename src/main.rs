//! Release Sentinel — Binary Entrypoint
//! Checks every configured source once (or on an interval), posts webhook
//! notifications for changes, and exits non-zero on hard failures.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use release_sentinel::{
    check::{CheckOutcome, Checker},
    config::{self, WatchConfig},
    fetch::HttpSource,
    notify::{ChangeNotification, Notifier, WebhookNotifier},
    store::FileStore,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("release_sentinel=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op where the vars come from the real env.
    let _ = dotenvy::dotenv();
    init_tracing();

    let dry_run = std::env::args().any(|a| a == "--dry-run")
        || std::env::var("DRY_RUN").is_ok_and(|v| v == "1");
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/sources.toml".to_string());

    let mut cfg = config::load_from(Path::new(&config_path))
        .with_context(|| format!("loading {config_path}"))?;
    // Env wins over the config file for the webhook, so secrets can stay
    // out of the checked-in config.
    if let Ok(url) = std::env::var("WEBHOOK_URL") {
        cfg.webhook_url = Some(url);
    }

    let checker = Arc::new(Checker::new(
        Arc::new(HttpSource::new()),
        Arc::new(FileStore::new(&cfg.state_dir)),
    ));
    let notifier: Option<Arc<dyn Notifier>> = cfg
        .webhook_url
        .clone()
        .map(|url| Arc::new(WebhookNotifier::new(url)) as Arc<dyn Notifier>);

    let interval_secs: Option<u64> = std::env::var("WATCH_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok());

    match interval_secs {
        Some(secs) => {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs));
            loop {
                ticker.tick().await;
                run_cycle(&checker, &cfg, notifier.clone(), dry_run).await;
            }
        }
        None => {
            let hard_failures = run_cycle(&checker, &cfg, notifier, dry_run).await;
            if hard_failures > 0 {
                tracing::error!(count = hard_failures, "hard failures this run");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

/// Check all sources concurrently; they share no mutable state beyond their
/// own watermark files. Returns the number of non-transient failures.
async fn run_cycle(
    checker: &Arc<Checker>,
    cfg: &WatchConfig,
    notifier: Option<Arc<dyn Notifier>>,
    dry_run: bool,
) -> usize {
    let mut set = JoinSet::new();
    for src in cfg.sources.clone() {
        let checker = Arc::clone(checker);
        let notifier = notifier.clone();
        set.spawn(async move {
            let outcome = checker.check(&src, dry_run).await;
            match &outcome {
                CheckOutcome::Unchanged => {
                    tracing::info!(source = %src.id, "no new content");
                }
                CheckOutcome::Changed {
                    version_label,
                    summary,
                    ..
                } => {
                    tracing::info!(source = %src.id, version = %version_label, "change detected");
                    if dry_run {
                        tracing::info!(source = %src.id, "dry run, skipping notification");
                    } else if let Some(notifier) = notifier {
                        let note = ChangeNotification {
                            source_name: src.name.clone(),
                            version_label: version_label.clone(),
                            summary: summary.clone(),
                            display_url: src.display_url().to_string(),
                        };
                        if let Err(e) = notifier.send(&note).await {
                            tracing::error!(source = %src.id, error = ?e, "notification failed");
                        }
                    }
                }
                CheckOutcome::Failed { message, transient } => {
                    if *transient {
                        tracing::warn!(source = %src.id, reason = %message, "transient failure, will retry next cycle");
                    } else {
                        tracing::error!(source = %src.id, reason = %message, "check failed");
                    }
                }
            }
            matches!(outcome, CheckOutcome::Failed { transient: false, .. })
        });
    }

    let mut hard_failures = 0;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(true) => hard_failures += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::error!(error = ?e, "check task panicked");
                hard_failures += 1;
            }
        }
    }
    hard_failures
}
