// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use anyhow::Context;
use atm_daemon::cli::{self, Mode, ParsedArgs, WorkerKind};
use atm_daemon::{config::Config, lock::InstanceLock, logging, routes, AppState};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = cli::parse(&args).map_err(|e| {
        eprintln!("atmd: {e}\n\n{}", cli::USAGE);
        anyhow::anyhow!(e)
    })?;

    let cli = match parsed {
        ParsedArgs::Help => {
            println!("{}", cli::USAGE);
            return Ok(());
        }
        ParsedArgs::Version => {
            println!("atmd {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        ParsedArgs::Run(cli) => cli,
    };

    let mut config = Config::load(&cli.config_path).context("loading configuration")?;
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if cli.print_config {
        let rendered = toml::to_string_pretty(&config).context("rendering configuration")?;
        println!("{rendered}");
        return Ok(());
    }

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(run(cli.mode, config))
}

async fn run(mode: Mode, config: Config) -> anyhow::Result<()> {
    let _logging_guard = logging::init(&config.logging).context("initializing logging")?;
    tracing::info!(?mode, "starting atmd");

    let worker_types: Vec<String> = match &mode {
        Mode::Worker(WorkerKind::Env) => vec!["env".to_string()],
        Mode::Worker(WorkerKind::Reward) => vec!["reward".to_string()],
        Mode::Worker(WorkerKind::Proxy) => vec!["proxy".to_string()],
        Mode::Coordinator | Mode::Api | Mode::Demo => config.workers.worker_types.clone(),
    };

    // Standalone `worker <kind>` processes are expected to run alongside each
    // other (and alongside a coordinator); only the full-daemon modes claim
    // exclusive ownership of the shared claim/snapshot directories.
    let _instance_lock = match mode {
        Mode::Coordinator | Mode::Api | Mode::Demo => {
            Some(InstanceLock::acquire(&config.logging.log_dir).context("acquiring single-instance lock")?)
        }
        Mode::Worker(_) => None,
    };

    let state = AppState::build(&config, &worker_types)
        .await
        .context("building application state")?;

    match mode {
        Mode::Coordinator | Mode::Worker(_) => {
            tracing::info!("coordinator running with no HTTP server; waiting for shutdown signal");
            wait_for_shutdown_signal().await;
        }
        Mode::Api | Mode::Demo => {
            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding HTTP listener on {addr}"))?;
            tracing::info!(%addr, "HTTP API listening");
            if matches!(mode, Mode::Demo) {
                println!("atmd demo server listening on http://{addr}");
            }

            let app = routes::router(state.clone());
            axum::serve(listener, app)
                .with_graceful_shutdown(wait_for_shutdown_signal())
                .await
                .context("running HTTP server")?;
        }
    }

    tracing::info!("shutting down");
    state.shutdown().await;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
