use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use pizza_tracker::config::Settings;
use pizza_tracker::poll::PollingLoop;
use pizza_tracker::source::TrackerClient;
use pizza_tracker::types::OrderSnapshot;

fn print_update(snap: &OrderSnapshot) {
    println!();
    println!("{snap}");
    println!();
}

async fn maybe_write_jsonl(path: Option<String>, line: String) {
    if let Some(p) = path.as_ref().map(|x| x.trim().to_string()).filter(|x| !x.is_empty()) {
        if let Ok(mut f) = tokio::fs::OpenOptions::new().create(true).append(true).open(&p).await {
            use tokio::io::AsyncWriteExt;
            let _ = f.write_all(line.as_bytes()).await;
            let _ = f.write_all(b"\n").await;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let s = Settings::from_env()?;
    let client = Arc::new(TrackerClient::new(s.tracker_host.clone()));

    tracing::info!(
        store_id = %s.store_id,
        order_key = %s.order_key,
        poll_secs = s.poll_secs,
        "starting order tracker"
    );

    let jsonl_path = s.snapshot_jsonl_path.clone();
    let tracker = PollingLoop::start(
        client,
        s.store_id.clone(),
        s.order_key.clone(),
        Duration::from_secs(s.poll_secs),
        Arc::new(move |snap| {
            print_update(snap);
            // Keep the scheduler task off the disk: the append runs on its own task.
            let line = serde_json::to_string(snap).unwrap_or_default();
            tokio::spawn(maybe_write_jsonl(jsonl_path.clone(), line));
        }),
    )
    .await?;

    tokio::signal::ctrl_c().await?;
    tracker.stop();

    let stats = tracker.stats();
    tracing::info!(
        cycles = stats.cycles,
        fetch_failures = stats.fetch_failures,
        "tracker stopped"
    );

    Ok(())
}
