// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup: a non-blocking rolling-never file writer plus a stderr
//! layer, filtered by `logging.level` (or `RUST_LOG` when set).

use crate::config::LoggingConfig;
use anyhow::Context;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Guard returned by [`init`]; dropping it flushes the non-blocking file
/// writer, so the caller must keep it alive for the process lifetime.
pub struct LoggingGuard {
    _file_guard: tracing_appender::non_blocking::WorkerGuard,
}

pub fn init(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&config.log_dir, "atmd.log");
    let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("installing global tracing subscriber")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
