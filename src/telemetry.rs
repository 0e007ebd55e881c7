use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::{EnvFilter, filter::Targets, fmt, prelude::*};

/// Installs the global subscriber.
///
/// Console output honours `RUST_LOG` (default `info`) and is JSON in
/// production. When `audit_log_path` is given, events with the `audit`
/// target are also appended to that file regardless of `RUST_LOG`.
pub fn init_tracing(production: bool, audit_log_path: Option<&str>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = if production {
        fmt::layer()
            .json()
            .with_target(false)
            .flatten_event(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let audit = match audit_log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open audit log {path}"))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(Targets::new().with_target("audit", Level::INFO)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console.with_filter(env_filter))
        .with(audit)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}
