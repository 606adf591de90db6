//! Weather dashboard - Polls a few sources and prints every update
//!
//! Run with: cargo run --example weather -- [manifest.json]
//!
//! This example demonstrates:
//! - Registering a URL source that decodes JSON
//! - Registering a local generated source with `source_fn`
//! - Loading more URL sources from a manifest file (`fundament.json` by default)
//! - Listening to updates and reading the cache
//! - Spotting stalled sources through `source_stats`
//!
//! # Manifest
//!
//! ```text
//! {
//!   "motd":  { "format": "string", "url": "https://example.com/motd.txt" },
//!   "badge": { "format": "image",  "url": "https://example.com/badge.png" }
//! }
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fundament::{source_fn, Fundament, FundamentConfig, Payload, ResponseFormat};
use url::Url;

const FORECAST_URL: &str =
    "https://api.open-meteo.com/v1/forecast?latitude=59.91&longitude=10.75&current=temperature_2m";

fn describe(payload: &Payload) -> String {
    match payload {
        Payload::Json(value) => match value.pointer("/current/temperature_2m") {
            Some(temp) => format!("{temp}°C"),
            None => value.to_string(),
        },
        Payload::Text(text) => text.lines().next().unwrap_or_default().to_string(),
        Payload::Data(bytes) => format!("{} bytes", bytes.len()),
        Payload::Plist(value) => format!("{value:?}"),
        Payload::Image(image) => format!("{}x{} image", image.width(), image.height()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fundament=info".parse()?)
                .add_directive("weather=info".parse()?),
        )
        .init();

    let manifest = std::env::args()
        .nth(1)
        .unwrap_or_else(|| fundament::url::DEFAULT_MANIFEST_FILE.to_string());

    let config = FundamentConfig::default()
        .default_update_interval(Duration::from_secs(300))
        .descriptive_listener_ids(true)
        .fetch_timeout(Duration::from_secs(20))
        .fire_immediately(true)
        .manifest_path(&manifest);
    let engine: Fundament = Fundament::open(config)?;

    engine.add_url_data_source(
        "forecast",
        Url::parse(FORECAST_URL)?,
        ResponseFormat::Json,
        Some(Duration::from_secs(600)),
    )?;

    engine.add_data_source_with_interval(
        "uptime",
        source_fn(|| async {
            let secs = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
            Some(Payload::Text(format!("epoch {secs}")))
        }),
        Duration::from_secs(15),
    )?;

    println!("Fundament weather dashboard");
    println!("===========================");
    println!("Manifest:  {manifest}");
    println!("Sources:   {}", engine.data_source_keys().join(", "));
    println!();
    println!("Press Ctrl+C to stop...");
    println!();

    for key in engine.data_source_keys() {
        let label = key.clone();
        let id = engine.add_listener(&key, move |payload: &Payload| {
            println!("[{label}] {}", describe(payload));
        })?;
        tracing::debug!(key = %key, listener = %id, "Listening");
    }

    let mut report = tokio::time::interval(Duration::from_secs(60));
    report.tick().await;

    loop {
        tokio::select! {
            _ = report.tick() => {
                let stats = engine.stats();
                println!(
                    "-- {} sources, {} busy, {} cached, {} updates",
                    stats.source_count,
                    stats.busy_sources,
                    stats.cached_values,
                    stats.updates_delivered
                );
                for key in engine.data_source_keys() {
                    if let Some(source) = engine.source_stats(&key) {
                        if source.is_stalled(Duration::from_secs(30)) {
                            tracing::warn!(
                                key = %key,
                                busy_for = ?source.busy_for,
                                "Source stalled"
                            );
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }
    }

    engine.shutdown();
    if let Some(last) = engine.get("forecast") {
        println!("Last forecast: {}", describe(&last));
    }

    Ok(())
}
