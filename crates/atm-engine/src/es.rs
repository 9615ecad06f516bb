// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Emulator Supervisor: brings a fresh emulator online under a given AVD on
//! a specific console port, waits for boot-completed, unlocks the screen,
//! and manages the baseline snapshot.

use crate::error::EngineError;
use atm_adapters::DeviceBridge;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, Default)]
pub struct EmulatorOptions {
    pub wipe_data: bool,
    pub read_only: bool,
    pub no_window: bool,
    pub no_audio: bool,
    pub no_boot_anim: bool,
    pub no_snapshot: bool,
    pub accel: Option<bool>,
}

impl EmulatorOptions {
    pub fn defaults() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }
}

pub const DEFAULT_BOOT_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const BASELINE_SNAPSHOT: &str = "baseline_clean";

/// Builds the `emulator` launch flag list in the order §6 specifies.
pub fn launch_args(
    avd_name: &str,
    console_port: u16,
    options: &EmulatorOptions,
    load_snapshot: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "-avd".to_string(),
        avd_name.to_string(),
        "-port".to_string(),
        console_port.to_string(),
        "-grpc".to_string(),
        (console_port as u32 + 1000).to_string(),
    ];

    if options.no_window {
        args.push("-no-window".to_string());
    }
    if options.no_audio {
        args.push("-no-audio".to_string());
    }
    if options.no_boot_anim {
        args.push("-no-boot-anim".to_string());
    }
    if options.wipe_data {
        args.push("-wipe-data".to_string());
    }
    if options.read_only {
        args.push("-read-only".to_string());
    }
    if options.no_snapshot {
        args.push("-no-snapshot".to_string());
    }
    if let Some(accel) = options.accel {
        args.push("-accel".to_string());
        args.push(if accel { "on" } else { "off" }.to_string());
    }
    if let Some(name) = load_snapshot {
        args.push("-snapshot".to_string());
        args.push(name.to_string());
        args.push("-snapshot-load".to_string());
    }

    args
}

/// An owned emulator process plus the device id it's serving once boot
/// completes. Lives in the engine's live-handle table, never inside a
/// serializable `DeviceBinding`.
pub struct SpawnedEmulator {
    pub device_id: String,
    pub child: Child,
}

/// Spawns the emulator binary with the given flags, redirecting its output
/// to `log_path`.
pub fn spawn(
    emulator_path: &str,
    args: &[String],
    log_path: &std::path::Path,
) -> Result<Child, EngineError> {
    let log_file = std::fs::File::create(log_path)
        .map_err(|e| EngineError::Internal(format!("failed to open emulator log {log_path:?}: {e}")))?;
    let log_file_err = log_file
        .try_clone()
        .map_err(|e| EngineError::Internal(format!("failed to dup emulator log handle: {e}")))?;

    let mut cmd = Command::new(emulator_path);
    cmd.args(args);
    cmd.stdout(log_file);
    cmd.stderr(log_file_err);
    cmd.spawn()
        .map_err(|e| EngineError::Internal(format!("failed to spawn emulator: {e}")))
}

/// Polls `list_devices()` and `getprop sys.boot_completed` until the device
/// is `device` state AND boot_completed=1, or `timeout` elapses.
pub async fn wait_for_boot(
    bridge: &impl DeviceBridge,
    device_id: &str,
    timeout: Duration,
) -> Result<(), EngineError> {
    let deadline = Instant::now() + timeout;

    loop {
        let devices = bridge.list_devices().await.unwrap_or_default();
        let is_listed_as_device = devices.iter().any(|d| d.device_id == device_id && d.state == "device");

        if is_listed_as_device {
            let prop = bridge
                .exec(Some(device_id), &["shell", "getprop", "sys.boot_completed"], Some(POLL_INTERVAL), false)
                .await;
            if let Ok(out) = prop {
                if out.stdout.trim() == "1" {
                    return Ok(());
                }
            }
        }

        if Instant::now() >= deadline {
            return Err(EngineError::BootTimeout(timeout));
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Terminates `child` gracefully (TERM), escalating to KILL after `grace`.
pub async fn terminate(mut child: Child, grace: Duration) {
    if let Some(pid) = child.id() {
        let _ = nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), nix::sys::signal::Signal::SIGTERM);
    }
    if tokio::time::timeout(grace, child.wait()).await.is_err() {
        let _ = child.kill().await;
    }
}

/// Wakes the device and swipes once from 2/3 to 1/3 screen height, ignoring
/// any failure (best-effort).
pub async fn unlock_screen(bridge: &impl DeviceBridge, device_id: &str) {
    let _ = bridge
        .exec(Some(device_id), &["shell", "input", "keyevent", "KEYCODE_WAKEUP"], None, false)
        .await;

    if let Ok(size) = bridge
        .exec(Some(device_id), &["shell", "wm", "size"], None, false)
        .await
    {
        if let Some((w, h)) = parse_wm_size(&size.stdout) {
            let x = (w / 2) as i32;
            let y_from = (h as i32 * 2) / 3;
            let y_to = h as i32 / 3;
            let _ = bridge
                .exec(
                    Some(device_id),
                    &[
                        "shell", "input", "swipe",
                        &x.to_string(), &y_from.to_string(), &x.to_string(), &y_to.to_string(), "300",
                    ],
                    None,
                    false,
                )
                .await;
        }
    }
}

fn parse_wm_size(raw: &str) -> Option<(u32, u32)> {
    let line = raw.lines().find(|l| l.contains('x'))?;
    let dims = line.rsplit(' ').next()?;
    let (w, h) = dims.split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

/// Attempts `snapshot load baseline_clean`; on absence, saves it instead.
/// Any failure here is non-fatal and only logged.
pub async fn ensure_baseline_snapshot(bridge: &impl DeviceBridge, device_id: &str) {
    let load = bridge
        .exec(
            Some(device_id),
            &["emu", "avd", "snapshot", "load", BASELINE_SNAPSHOT],
            None,
            false,
        )
        .await;

    let needs_save = match load {
        Ok(out) => out.stdout.to_ascii_uppercase().contains("KO"),
        Err(_) => true,
    };

    if needs_save {
        if let Err(e) = bridge
            .exec(Some(device_id), &["emu", "avd", "snapshot", "save", BASELINE_SNAPSHOT], None, true)
            .await
        {
            tracing::warn!(device_id, error = %e, "failed to create baseline snapshot");
        }
    }
}

#[cfg(test)]
#[path = "es_tests.rs"]
mod tests;
