// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wraps an external reverse-proxy daemon (nginx or compatible) the way the
//! Proxy Worker needs it: config render, PID-file lifecycle, and a
//! SIGQUIT -> SIGTERM -> SIGKILL stop escalation. A missing binary on `PATH`
//! is a normal startup outcome, not an error: the worker registers but stays
//! `stopped`.

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::sleep;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error("proxy executable not found on PATH")]
    ExecutableNotFound,
    #[error("failed to write proxy config at {path}: {source}")]
    ConfigWrite { path: String, source: String },
    #[error("failed to spawn proxy process: {0}")]
    SpawnFailed(String),
    #[error("proxy process exited immediately (no PID file at {0})")]
    StartupFailed(String),
    #[error("proxy process not running")]
    NotRunning,
}

/// Render parameters for the proxy's config file.
#[derive(Debug, Clone)]
pub struct ProxyHandle {
    pub worker_id: String,
    pub listen_port: u16,
    pub target_host: String,
    pub target_port: u16,
    pub work_dir: PathBuf,
}

impl ProxyHandle {
    pub fn config_path(&self) -> PathBuf {
        self.work_dir.join(format!("proxy_worker_{}.conf", self.worker_id))
    }

    pub fn pid_path(&self) -> PathBuf {
        self.work_dir.join(format!("proxy_worker_{}.pid", self.worker_id))
    }

    pub fn access_log_path(&self) -> PathBuf {
        self.work_dir.join(format!("proxy_worker_{}_access.log", self.worker_id))
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.work_dir.join(format!("proxy_worker_{}_error.log", self.worker_id))
    }

    fn render_config(&self) -> String {
        format!(
            "worker_processes 1;\ndaemon off;\npid {pid};\nerror_log {error_log};\n\n\
             events {{\n    worker_connections 1024;\n}}\n\n\
             http {{\n    access_log {access_log};\n\n    \
             upstream backend {{\n        server {host}:{target_port};\n    }}\n\n    \
             server {{\n        listen {listen_port};\n\n        \
             location / {{\n            proxy_pass http://backend;\n            \
             proxy_set_header Host $host;\n            \
             proxy_set_header X-Real-IP $remote_addr;\n        }}\n    }}\n}}\n",
            pid = self.pid_path().display(),
            error_log = self.error_log_path().display(),
            access_log = self.access_log_path().display(),
            host = self.target_host,
            target_port = self.target_port,
            listen_port = self.listen_port,
        )
    }
}

/// Proxy-process lifecycle, abstracted so the Proxy Worker can be tested
/// without a real nginx binary.
#[async_trait]
pub trait ProxyProcess: Send + Sync + 'static {
    async fn start(&self, handle: &ProxyHandle) -> Result<(), ProxyError>;
    async fn stop(&self, handle: &ProxyHandle) -> Result<(), ProxyError>;
    async fn reload(&self, handle: &ProxyHandle) -> Result<(), ProxyError>;
    async fn is_running(&self, handle: &ProxyHandle) -> bool;
}

/// Real adapter: shells out to the `nginx` binary located on `PATH`.
#[derive(Debug, Clone)]
pub struct RealProxyProcess {
    executable: Option<String>,
}

impl RealProxyProcess {
    pub fn discover() -> Self {
        Self {
            executable: which("nginx"),
        }
    }

    pub fn is_available(&self) -> bool {
        self.executable.is_some()
    }

    fn read_pid(&self, handle: &ProxyHandle) -> Option<i32> {
        std::fs::read_to_string(handle.pid_path())
            .ok()?
            .trim()
            .parse()
            .ok()
    }

    fn pid_alive(&self, pid: i32) -> bool {
        signal::kill(Pid::from_raw(pid), None).is_ok()
    }
}

#[async_trait]
impl ProxyProcess for RealProxyProcess {
    async fn start(&self, handle: &ProxyHandle) -> Result<(), ProxyError> {
        let exe = self.executable.as_ref().ok_or(ProxyError::ExecutableNotFound)?;

        std::fs::write(handle.config_path(), handle.render_config()).map_err(|e| ProxyError::ConfigWrite {
            path: handle.config_path().display().to_string(),
            source: e.to_string(),
        })?;

        if handle.pid_path().exists() {
            let alive = self.read_pid(handle).map(|pid| self.pid_alive(pid)).unwrap_or(false);
            if !alive {
                let _ = std::fs::remove_file(handle.pid_path());
            }
        }

        let mut cmd = Command::new(exe);
        cmd.args(["-c"]).arg(handle.config_path());
        cmd.spawn().map_err(|e| ProxyError::SpawnFailed(e.to_string()))?;

        sleep(Duration::from_millis(500)).await;

        match self.read_pid(handle) {
            Some(pid) if self.pid_alive(pid) => Ok(()),
            _ => Err(ProxyError::StartupFailed(handle.pid_path().display().to_string())),
        }
    }

    async fn stop(&self, handle: &ProxyHandle) -> Result<(), ProxyError> {
        let Some(pid) = self.read_pid(handle) else {
            return Ok(());
        };
        if !self.pid_alive(pid) {
            cleanup_files(handle);
            return Ok(());
        }

        for (sig, wait) in [(Signal::SIGQUIT, 2), (Signal::SIGTERM, 2), (Signal::SIGKILL, 0)] {
            let _ = signal::kill(Pid::from_raw(pid), sig);
            if wait > 0 {
                sleep(Duration::from_secs(wait)).await;
            }
            if !self.pid_alive(pid) {
                break;
            }
        }

        cleanup_files(handle);
        Ok(())
    }

    async fn reload(&self, handle: &ProxyHandle) -> Result<(), ProxyError> {
        std::fs::write(handle.config_path(), handle.render_config()).map_err(|e| ProxyError::ConfigWrite {
            path: handle.config_path().display().to_string(),
            source: e.to_string(),
        })?;
        let pid = self.read_pid(handle).ok_or(ProxyError::NotRunning)?;
        if !self.pid_alive(pid) {
            return Err(ProxyError::NotRunning);
        }
        let _ = signal::kill(Pid::from_raw(pid), Signal::SIGHUP);
        Ok(())
    }

    async fn is_running(&self, handle: &ProxyHandle) -> bool {
        self.read_pid(handle).map(|pid| self.pid_alive(pid)).unwrap_or(false)
    }
}

fn cleanup_files(handle: &ProxyHandle) {
    for path in [
        handle.config_path(),
        handle.pid_path(),
        handle.access_log_path(),
        handle.error_log_path(),
    ] {
        let _ = std::fs::remove_file(path);
    }
}

fn which(binary: &str) -> Option<String> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
        .map(|candidate| candidate.display().to_string())
}

/// Deterministic stand-in for tests: never shells out, tracks running state
/// in memory.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct FakeProxyProcess {
    running: parking_lot::Mutex<std::collections::HashSet<String>>,
    available: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeProxyProcess {
    pub fn new() -> Self {
        Self {
            running: parking_lot::Mutex::new(std::collections::HashSet::new()),
            available: std::sync::atomic::AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ProxyProcess for FakeProxyProcess {
    async fn start(&self, handle: &ProxyHandle) -> Result<(), ProxyError> {
        if !self.available.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(ProxyError::ExecutableNotFound);
        }
        self.running.lock().insert(handle.worker_id.clone());
        Ok(())
    }

    async fn stop(&self, handle: &ProxyHandle) -> Result<(), ProxyError> {
        self.running.lock().remove(&handle.worker_id);
        Ok(())
    }

    async fn reload(&self, handle: &ProxyHandle) -> Result<(), ProxyError> {
        if self.running.lock().contains(&handle.worker_id) {
            Ok(())
        } else {
            Err(ProxyError::NotRunning)
        }
    }

    async fn is_running(&self, handle: &ProxyHandle) -> bool {
        self.running.lock().contains(&handle.worker_id)
    }
}

#[cfg(test)]
#[path = "proxy_process_tests.rs"]
mod tests;
