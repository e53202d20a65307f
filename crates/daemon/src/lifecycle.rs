// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, the session loop, shutdown.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use oc_core::{CellConfig, ConfigError, Session, SystemClock};
use oc_engine::{JobRunner, RunnerDeps, SessionEnd, TriggerCoordinator};
use oc_link::{CameraLink, ConnectError, Tokens};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::accounting::FileAccounting;
use crate::actuator::LedActuator;
use crate::binding::{EdgeBinding, ResetHub};
use crate::env;

/// Filesystem layout under the state directory.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root state directory (e.g. ~/.local/state/opticell)
    pub state_dir: PathBuf,
    /// Unix socket the GPIO bridge connects to
    pub socket_path: PathBuf,
    /// Lock/PID file
    pub lock_path: PathBuf,
    /// Daemon log directory (tracing file appender)
    pub log_dir: PathBuf,
    /// Accounting log (job/cycle/session lines)
    pub accounting_path: PathBuf,
}

impl Paths {
    /// Resolve fixed paths under the state directory. One daemon drives
    /// one cell.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("edges.sock"),
            lock_path: state_dir.join("ocd.pid"),
            log_dir: state_dir.join("logs"),
            accounting_path: state_dir.join("job_pass_log.txt"),
            state_dir,
        })
    }
}

/// Take the single-instance lock, writing our PID into it.
pub fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file =
        std::fs::OpenOptions::new().create(true).write(true).truncate(false).open(path)?;
    file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

/// Operator identity: environment override, else an interactive prompt.
pub async fn acquire_operator() -> String {
    if let Some(name) = env::operator() {
        return name;
    }
    let prompted = tokio::task::spawn_blocking(|| {
        print!("Enter operator name: ");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(n) if n > 0 => Some(line.trim().to_string()),
            _ => None,
        }
    })
    .await
    .ok()
    .flatten()
    .filter(|name| !name.is_empty());
    prompted.unwrap_or_else(|| "operator".to_string())
}

/// Run sessions until shutdown.
///
/// The first camera connect failure is fatal — sensors are never armed
/// without a link. After that, a link fault or an operator reset tears the
/// session down and this loop reconnects and re-arms from job 1.
pub async fn run_cell(
    paths: &Paths,
    config: CellConfig,
    shutdown: CancellationToken,
) -> Result<(), LifecycleError> {
    let clock = SystemClock;
    let accounting = FileAccounting::new(paths.accounting_path.clone());
    let actuator = LedActuator::from_env();
    let coordinator = Arc::new(TriggerCoordinator::new(config.trigger_lines, clock));
    let resets = Arc::new(ResetHub::new());
    let mut binding_task = None;

    let result = loop {
        if shutdown.is_cancelled() {
            break Ok(());
        }
        let operator = acquire_operator().await;
        let session = Session::new(operator, &clock);
        let reset = resets.renew();

        let tokens = Tokens::new(&config.pass_token, &config.fail_token);
        let connected = CameraLink::connect(
            &config.camera_addr,
            config.connect_timeout(),
            tokens,
            clock,
        )
        .await;
        let (link, reader) = match connected {
            Ok(pair) => pair,
            Err(e) if binding_task.is_none() => break Err(e.into()),
            Err(e) => {
                error!(error = %e, "camera reconnect failed, retrying");
                tokio::select! {
                    _ = tokio::time::sleep(env::reconnect_delay()) => continue,
                    _ = shutdown.cancelled() => break Ok(()),
                }
            }
        };

        // arm the sensors only once a camera link exists
        if binding_task.is_none() {
            let _ = std::fs::remove_file(&paths.socket_path);
            let listener = UnixListener::bind(&paths.socket_path)
                .map_err(|e| LifecycleError::BindFailed(paths.socket_path.clone(), e))?;
            let binding = Arc::new(EdgeBinding::new(
                Arc::clone(&coordinator),
                Arc::clone(&resets),
                config.debounce(),
                clock,
            ));
            binding_task = Some(tokio::spawn(binding.serve(listener, shutdown.clone())));
        }

        let closed = link.closed();
        let reader_task = tokio::spawn(reader.run());
        let runner = JobRunner::new(
            RunnerDeps { link, accounting: accounting.clone(), actuator: actuator.clone() },
            Arc::clone(&coordinator),
            session,
            config.clone(),
            clock,
            reset.clone(),
        );

        let end = tokio::select! {
            end = runner.run() => end,
            _ = shutdown.cancelled() => {
                closed.cancel();
                let _ = reader_task.await;
                break Ok(());
            }
        };
        closed.cancel();
        let _ = reader_task.await;

        match end {
            SessionEnd::Reset => {
                info!("reset: starting a new session from job 1");
                coordinator.reset();
            }
            SessionEnd::Link(e) => {
                error!(error = %e, "camera link fault, reconnecting");
            }
        }
    };

    if let Some(task) = binding_task {
        task.abort();
    }
    let _ = std::fs::remove_file(&paths.socket_path);
    result
}

/// Remove the lock and socket files on shutdown.
pub fn cleanup(paths: &Paths) {
    for path in [&paths.lock_path, &paths.socket_path] {
        if path.exists() {
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "failed to remove state file");
            }
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,

    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("failed to bind edge socket at {0}: {1}")]
    BindFailed(PathBuf, #[source] std::io::Error),

    #[error("failed to read config file {0}: {1}")]
    ConfigFile(PathBuf, #[source] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("camera connect failed: {0}")]
    Connect(#[from] ConnectError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
