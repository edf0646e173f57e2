//! rest-filter — run the filter over newline-delimited events
//!
//! Reads one event per line from stdin (a JSON object, or plain text which
//! becomes `{"message": line}`), filters it and writes it to stdout as a
//! JSON line. Logs go to stderr.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rest_filter::config;
use rest_filter::{Event, Outcome, RestFilter};

const TIMESTAMP_FIELD: &str = "@timestamp";

#[tokio::main]
async fn main() -> Result<()> {
    let path = config::config_path(std::env::args().nth(1));
    let app = config::load_config(&path)
        .with_context(|| format!("Invalid filter config at {}", path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&app.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .init();

    let filter = RestFilter::from_config(app.filter).context("Failed to build rest filter")?;
    info!(
        "rest-filter ready (config {}), target [{}]",
        path.display(),
        filter.target()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut processed: u64 = 0;
    let mut unmerged: u64 = 0;

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read event from stdin")?
    {
        if line.trim().is_empty() {
            continue;
        }

        let mut event = parse_event(&line);
        if filter.filter(&mut event).await != Outcome::Merged {
            unmerged += 1;
        }
        processed += 1;

        let mut out = serde_json::to_vec(&event).context("Failed to serialize event")?;
        out.push(b'\n');
        stdout
            .write_all(&out)
            .await
            .context("Failed to write event to stdout")?;
    }
    stdout.flush().await.context("Failed to flush stdout")?;

    info!("Processed {processed} events, {unmerged} without response data");
    Ok(())
}

/// Decode one input line into an event and stamp it if needed.
fn parse_event(line: &str) -> Event {
    let mut event = serde_json::from_str::<Value>(line)
        .ok()
        .and_then(Event::from_value)
        .unwrap_or_else(|| {
            let mut event = Event::new();
            event.set("message", Value::String(line.to_string()));
            event
        });

    if !event.contains(TIMESTAMP_FIELD) {
        event.set(
            TIMESTAMP_FIELD,
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
    event
}
