//! Logging for the session layer.
//!
//! [`init_tracing`] installs an `EnvFilter`-driven fmt subscriber writing to stdout and,
//! when `LOG_FILE` is set, to that file too. [`mask_payload`] is what every crate here uses
//! before a Telegram init-data or `_auth` payload reaches a log line: the payload is a bearer
//! credential for the account service.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::BoxMakeWriter, writer::MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Installs the global subscriber. Level comes from `RUST_LOG`, default `info`.
/// Load `.env` (dotenvy) before calling, otherwise `RUST_LOG` from the file is ignored.
pub fn init_tracing(log_file_path: Option<&str>) -> anyhow::Result<()> {
    let writer = match log_file_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            BoxMakeWriter::new(io::stdout.and(Arc::new(file)))
        }
        None => BoxMakeWriter::new(io::stdout),
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_file(false)
        .with_line_number(false);

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

/// Masks an auth payload for logs: first 8 chars, `***`, and the total length.
/// Payloads of 16 chars or fewer are fully masked.
pub fn mask_payload(payload: &str) -> String {
    let len = payload.chars().count();
    if len <= 16 {
        return "***".to_string();
    }
    let head: String = payload.chars().take(8).collect();
    format!("{}***({} chars)", head, len)
}
