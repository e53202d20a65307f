// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ocd: the Opticell inspection-cell controller daemon.

use oc_daemon::{lifecycle, run_cell, Paths};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let paths = match Paths::load() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("ocd: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = std::fs::create_dir_all(&paths.log_dir) {
        eprintln!("ocd: cannot create log directory {}: {e}", paths.log_dir.display());
        return ExitCode::FAILURE;
    }
    let file_appender = tracing_appender::rolling::never(&paths.log_dir, "ocd.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    let _lock = match lifecycle::acquire_lock(&paths.lock_path) {
        Ok(lock) => lock,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let config = match oc_daemon::env::load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            lifecycle::cleanup(&paths);
            return ExitCode::FAILURE;
        }
    };
    info!(
        camera = %config.camera_addr,
        lines = config.trigger_lines.count(),
        max_attempts = config.max_attempts,
        cycle_size = config.cycle_size,
        "starting cell controller"
    );

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to start runtime");
            lifecycle::cleanup(&paths);
            return ExitCode::FAILURE;
        }
    };

    let exit = runtime.block_on(async {
        let shutdown = CancellationToken::new();
        {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutdown requested");
                    shutdown.cancel();
                }
            });
        }
        match run_cell(&paths, config, shutdown).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{e}");
                ExitCode::FAILURE
            }
        }
    });

    lifecycle::cleanup(&paths);
    exit
}
