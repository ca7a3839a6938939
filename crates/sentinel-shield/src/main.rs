//! Sentinel Shield: request interception and URL verification core.
//!
//! Runs as a native-messaging-style host: one JSON command per line on
//! stdin, one JSON response per line on stdout. Outbound notifications
//! (new request, threat detected, script alert) are written to stdout as
//! they happen. Diagnostics go to stderr so the protocol channel stays
//! clean.

use anyhow::Result;
use sentinel_settings::SettingsManager;
use sentinel_shield::{Command, Response, Shield};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

// Use mimalloc as the global allocator for reduced memory fragmentation
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("Sentinel Shield starting...");

    let settings = match SettingsManager::default_path() {
        Some(path) => Arc::new(SettingsManager::load(path)),
        None => Arc::new(SettingsManager::with_defaults()),
    };
    let shield = Shield::with_defaults(settings);

    // Single writer owns stdout; responses and notifications both go
    // through it so lines never interleave.
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            if stdout.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if stdout.write_all(b"\n").await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    // Forward notifications as they happen.
    let mut notifications = shield.subscribe();
    let notify_out = out_tx.clone();
    let notifier = tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => match serde_json::to_string(&notification) {
                    Ok(json) => {
                        if notify_out.send(json).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("failed to encode notification: {}", e),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("notification stream lagged, {} dropped", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    info!("shield ready, reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Command>(&line) {
            Ok(command) => shield.dispatch(command).await,
            Err(e) => {
                warn!("invalid command: {}", e);
                Response::error(format!("invalid command: {}", e))
            }
        };

        match serde_json::to_string(&response) {
            Ok(json) => {
                if out_tx.send(json).is_err() {
                    break;
                }
            }
            Err(e) => warn!("failed to encode response: {}", e),
        }
    }

    // Stop the notifier first so the writer sees the channel close.
    notifier.abort();
    drop(out_tx);
    let _ = writer.await;
    info!("Sentinel Shield shutting down");
    Ok(())
}
