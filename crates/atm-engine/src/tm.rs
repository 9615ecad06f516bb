// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trajectory Manager: the central registry of `trajectory_id -> device
//! binding`. Owns the only path that mutates that table; every other
//! component (AT, OB, ES, PCA) is a stateless collaborator TM calls into.
//!
//! Concurrency discipline (§5): a single `parking_lot::Mutex` guards both the
//! serializable binding table and the live, non-serializable process-handle
//! and claim tables. Every method copies what it needs under the lock,
//! releases it, performs I/O, then re-locks to write the result back — no
//! `.await` point is ever reached while the lock is held.

use crate::at::{self, ActionInput};
use crate::error::EngineError;
use crate::es::{self, EmulatorOptions};
use crate::ob;
use crate::pca::Pca;
use async_trait::async_trait;
use atm_adapters::DeviceBridge;
use atm_core::{BindingStatus, Clock, DeviceBinding, IdGen, Observation, ShortId, SnapshotMeta, TrajectoryId};
use atm_storage::{Claim, SnapshotStore};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Child;

const EMU_KILL_TIMEOUT: Duration = Duration::from_secs(5);
const TERMINATE_GRACE: Duration = Duration::from_secs(5);
const SAVE_TIMEOUT: Duration = Duration::from_secs(30);
const HOME_KEY_TIMEOUT: Duration = Duration::from_secs(10);

/// Static configuration a `TrajectoryManager` needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct TmConfig {
    pub avd_name: String,
    pub emulator_path: String,
    pub log_dir: PathBuf,
    pub boot_timeout: Duration,
}

impl Default for TmConfig {
    fn default() -> Self {
        Self {
            avd_name: "Pixel6_API33".to_string(),
            emulator_path: "emulator".to_string(),
            log_dir: PathBuf::from("."),
            boot_timeout: es::DEFAULT_BOOT_TIMEOUT,
        }
    }
}

/// An owned emulator process handle, abstracted so tests never have to spawn
/// a real `emulator` binary (mirrors the `ProxyProcess` idiom in `atm-adapters`).
#[async_trait]
pub trait EmulatorProcess: Send + Sync {
    async fn terminate(&mut self, grace: Duration);
}

pub struct RealEmulatorProcess(Option<Child>);

#[async_trait]
impl EmulatorProcess for RealEmulatorProcess {
    async fn terminate(&mut self, grace: Duration) {
        if let Some(child) = self.0.take() {
            es::terminate(child, grace).await;
        }
    }
}

/// Spawns the real `emulator` binary. The one place in TM that touches an
/// actual OS process.
#[async_trait]
pub trait EmulatorLauncher: Send + Sync {
    async fn launch(
        &self,
        emulator_path: &str,
        args: &[String],
        log_path: &std::path::Path,
    ) -> Result<Box<dyn EmulatorProcess>, EngineError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealEmulatorLauncher;

#[async_trait]
impl EmulatorLauncher for RealEmulatorLauncher {
    async fn launch(
        &self,
        emulator_path: &str,
        args: &[String],
        log_path: &std::path::Path,
    ) -> Result<Box<dyn EmulatorProcess>, EngineError> {
        let child = es::spawn(emulator_path, args, log_path)?;
        Ok(Box::new(RealEmulatorProcess(Some(child))))
    }
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct FakeEmulatorProcess {
    pub terminated: bool,
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl EmulatorProcess for FakeEmulatorProcess {
    async fn terminate(&mut self, _grace: Duration) {
        self.terminated = true;
    }
}

/// Test-support launcher: records the args it would have launched with and
/// hands back a no-op process handle instead of spawning anything.
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct FakeEmulatorLauncher {
    pub launched: Mutex<Vec<Vec<String>>>,
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl EmulatorLauncher for FakeEmulatorLauncher {
    async fn launch(
        &self,
        _emulator_path: &str,
        args: &[String],
        _log_path: &std::path::Path,
    ) -> Result<Box<dyn EmulatorProcess>, EngineError> {
        self.launched.lock().push(args.to_vec());
        Ok(Box::new(FakeEmulatorProcess::default()))
    }
}

pub struct CreateResult {
    pub trajectory_id: TrajectoryId,
    pub device_id: String,
}

#[derive(Default)]
struct Inner {
    bindings: HashMap<String, DeviceBinding>,
    handles: HashMap<String, Box<dyn EmulatorProcess>>,
    claims: HashMap<String, Claim>,
}

pub struct TrajectoryManager<B, L, C, G> {
    bridge: B,
    launcher: L,
    clock: C,
    id_gen: G,
    pca: Pca,
    snapshots: SnapshotStore,
    config: TmConfig,
    inner: Mutex<Inner>,
}

impl<B, L, C, G> TrajectoryManager<B, L, C, G>
where
    B: DeviceBridge,
    L: EmulatorLauncher,
    C: Clock,
    G: IdGen,
{
    pub fn new(bridge: B, launcher: L, clock: C, id_gen: G, pca: Pca, snapshots: SnapshotStore, config: TmConfig) -> Self {
        Self {
            bridge,
            launcher,
            clock,
            id_gen,
            pca,
            snapshots,
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Number of trajectories currently tracked, live in any state.
    pub fn trajectory_count(&self) -> usize {
        self.inner.lock().bindings.len()
    }

    /// Snapshot of trajectories that have been idle longer than `max_idle_secs`
    /// (used by the Environment Worker's idle sweep; see §4.7).
    pub fn idle_trajectories(&self, max_idle_secs: i64) -> Vec<String> {
        let now = self.clock.now_secs();
        let inner = self.inner.lock();
        inner
            .bindings
            .iter()
            .filter(|(_, b)| b.idle_secs(now).is_some_and(|idle| idle > max_idle_secs))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub async fn create(&self) -> Result<CreateResult, EngineError> {
        if let Some(result) = self.try_attach_existing().await? {
            return Ok(result);
        }

        let trajectory_id = self.id_gen.next();
        let ports = {
            let inner = self.inner.lock();
            self.in_process_console_ports(&inner)
        };
        let alloc = self.pca.allocate(&self.bridge, &ports).await?;

        let now = self.clock.now_secs();
        let snapshot_name = format!("sandbox_{}", trajectory_id.short(8));
        let placeholder = DeviceBinding {
            trajectory_id: TrajectoryId::new(trajectory_id.clone()),
            device_id: alloc.device_id.clone(),
            console_port: alloc.console_port,
            bridge_port: alloc.bridge_port,
            has_process_handle: true,
            snapshot_name,
            status: BindingStatus::Starting,
            created_at_epoch_secs: now,
            last_action_at_epoch_secs: None,
        };
        {
            let mut inner = self.inner.lock();
            inner.claims.insert(alloc.device_id.clone(), alloc.claim.clone());
            inner.bindings.insert(trajectory_id.clone(), placeholder);
        }

        match self.start_emulator(&alloc.device_id, alloc.console_port, &trajectory_id, None).await {
            Ok(process) => {
                let mut inner = self.inner.lock();
                inner.handles.insert(alloc.device_id.clone(), process);
                if let Some(b) = inner.bindings.get_mut(&trajectory_id) {
                    b.status = BindingStatus::Running;
                    b.last_action_at_epoch_secs = Some(now);
                }
                Ok(CreateResult {
                    trajectory_id: TrajectoryId::new(trajectory_id),
                    device_id: alloc.device_id,
                })
            }
            Err(e) => {
                let claim = {
                    let mut inner = self.inner.lock();
                    inner.bindings.remove(&trajectory_id);
                    inner.claims.remove(&alloc.device_id)
                };
                if let Some(claim) = claim {
                    let _ = self.pca.release(&claim);
                }
                Err(e)
            }
        }
    }

    async fn try_attach_existing(&self) -> Result<Option<CreateResult>, EngineError> {
        let devices = self.bridge.list_devices().await?;
        let already_bound: HashSet<String> = {
            let inner = self.inner.lock();
            inner.bindings.values().map(|b| b.device_id.clone()).collect()
        };

        let Some(candidate) = devices
            .into_iter()
            .find(|d| d.state == "device" && d.device_id.starts_with("emulator-") && !already_bound.contains(&d.device_id))
        else {
            return Ok(None);
        };

        let claim = match self.pca.claim_existing(&candidate.device_id) {
            Ok(claim) => claim,
            Err(_) => return Ok(None),
        };

        let bridge_port = parse_bridge_port(&candidate.device_id).unwrap_or(0);
        let console_port = bridge_port.saturating_sub(1);
        let trajectory_id = self.id_gen.next();
        let now = self.clock.now_secs();
        let binding = DeviceBinding {
            trajectory_id: TrajectoryId::new(trajectory_id.clone()),
            device_id: candidate.device_id.clone(),
            console_port,
            bridge_port,
            has_process_handle: false,
            snapshot_name: format!("sandbox_{}", trajectory_id.short(8)),
            status: BindingStatus::Running,
            created_at_epoch_secs: now,
            last_action_at_epoch_secs: Some(now),
        };
        {
            let mut inner = self.inner.lock();
            inner.claims.insert(candidate.device_id.clone(), claim);
            inner.bindings.insert(trajectory_id.clone(), binding);
        }

        Ok(Some(CreateResult {
            trajectory_id: TrajectoryId::new(trajectory_id),
            device_id: candidate.device_id,
        }))
    }

    /// Launches the emulator and carries it through boot/unlock/baseline. On
    /// boot failure the partially-started process is torn down before the
    /// error is returned.
    async fn start_emulator(
        &self,
        device_id: &str,
        console_port: u16,
        trajectory_id: &str,
        load_snapshot: Option<&str>,
    ) -> Result<Box<dyn EmulatorProcess>, EngineError> {
        let options = EmulatorOptions::defaults();
        let args = es::launch_args(&self.config.avd_name, console_port, &options, load_snapshot);
        let log_path = self.config.log_dir.join(format!("{trajectory_id}.log"));

        let mut process = self.launcher.launch(&self.config.emulator_path, &args, &log_path).await?;
        if let Err(e) = es::wait_for_boot(&self.bridge, device_id, self.config.boot_timeout).await {
            process.terminate(TERMINATE_GRACE).await;
            return Err(e);
        }

        es::unlock_screen(&self.bridge, device_id).await;
        if load_snapshot.is_none() {
            es::ensure_baseline_snapshot(&self.bridge, device_id).await;
        }
        Ok(process)
    }

    pub async fn step(&self, trajectory_id: &str, input: ActionInput) -> Result<Observation, EngineError> {
        let binding = self.ensure_running_binding(trajectory_id).await?;
        let action = at::translate(input)?;
        let exec_result = at::execute(&self.bridge, &binding.device_id, &action).await?;

        let now = self.clock.now_secs();
        {
            let mut inner = self.inner.lock();
            if let Some(b) = inner.bindings.get_mut(trajectory_id) {
                b.touch(now);
            }
        }

        let mut observation = Observation::for_action(action.kind_name());
        observation.action_echo = exec_result.echo;
        observation.image_base64 = exec_result.screenshot_base64;

        if action.mutates_device() {
            let result = ob::gather(&self.bridge, &binding.device_id).await;
            observation.current_activity = result.current_activity;
            observation.screen_size = result.screen_size;
            observation.ui_elements = result.ui_elements;
        }

        Ok(observation)
    }

    async fn ensure_running_binding(&self, trajectory_id: &str) -> Result<DeviceBinding, EngineError> {
        let existing = self.binding(trajectory_id);
        match existing {
            Some(b) if b.status == BindingStatus::Running => Ok(b),
            Some(_) => {
                self.load(trajectory_id).await?;
                self.require_binding(trajectory_id)
            }
            None if self.snapshots.exists(trajectory_id) => {
                self.load(trajectory_id).await?;
                self.require_binding(trajectory_id)
            }
            None => Err(EngineError::UnknownTrajectory(trajectory_id.to_string())),
        }
    }

    fn binding(&self, trajectory_id: &str) -> Option<DeviceBinding> {
        self.inner.lock().bindings.get(trajectory_id).cloned()
    }

    fn require_binding(&self, trajectory_id: &str) -> Result<DeviceBinding, EngineError> {
        self.binding(trajectory_id)
            .ok_or_else(|| EngineError::UnknownTrajectory(trajectory_id.to_string()))
    }

    pub async fn save(&self, trajectory_id: &str) -> Result<(), EngineError> {
        let binding = self.require_binding(trajectory_id)?;

        self.bridge
            .exec(
                Some(&binding.device_id),
                &["emu", "avd", "snapshot", "save", binding.snapshot_name.as_str()],
                Some(SAVE_TIMEOUT),
                true,
            )
            .await?;

        let meta = SnapshotMeta {
            trajectory_id: trajectory_id.to_string(),
            device_id: binding.device_id.clone(),
            port: binding.console_port,
            snapshot_name: binding.snapshot_name.clone(),
            timestamp: self.clock.now_secs() as f64,
        };
        self.snapshots.save(&meta).map_err(|e| EngineError::Internal(e.to_string()))?;

        let mut inner = self.inner.lock();
        if let Some(b) = inner.bindings.get_mut(trajectory_id) {
            b.status = BindingStatus::Saved;
        }
        Ok(())
    }

    pub async fn load(&self, trajectory_id: &str) -> Result<(), EngineError> {
        let meta = self
            .snapshots
            .load(trajectory_id)
            .map_err(|e| EngineError::Internal(e.to_string()))?
            .ok_or_else(|| EngineError::SnapshotMissing(trajectory_id.to_string()))?;

        let existing = self.binding(trajectory_id);
        if let Some(b) = &existing {
            if b.status == BindingStatus::Running {
                self.stop_process(trajectory_id, b).await;
            }
        }

        let (console_port, bridge_port, device_id) = match &existing {
            Some(b) => (b.console_port, b.bridge_port, b.device_id.clone()),
            None => {
                let ports = {
                    let inner = self.inner.lock();
                    self.in_process_console_ports(&inner)
                };
                let alloc = self.pca.allocate(&self.bridge, &ports).await?;
                let mut inner = self.inner.lock();
                inner.claims.insert(alloc.device_id.clone(), alloc.claim.clone());
                (alloc.console_port, alloc.bridge_port, alloc.device_id)
            }
        };

        let now = self.clock.now_secs();
        let binding = DeviceBinding {
            trajectory_id: TrajectoryId::new(trajectory_id.to_string()),
            device_id: device_id.clone(),
            console_port,
            bridge_port,
            has_process_handle: true,
            snapshot_name: meta.snapshot_name.clone(),
            status: BindingStatus::Starting,
            created_at_epoch_secs: existing.as_ref().map_or(now, |b| b.created_at_epoch_secs),
            last_action_at_epoch_secs: Some(now),
        };
        {
            let mut inner = self.inner.lock();
            inner.bindings.insert(trajectory_id.to_string(), binding);
        }

        match self
            .start_emulator(&device_id, console_port, trajectory_id, Some(&meta.snapshot_name))
            .await
        {
            Ok(process) => {
                let mut inner = self.inner.lock();
                inner.handles.insert(device_id, process);
                if let Some(b) = inner.bindings.get_mut(trajectory_id) {
                    b.status = BindingStatus::Running;
                }
                Ok(())
            }
            Err(e) => {
                let mut inner = self.inner.lock();
                if let Some(b) = inner.bindings.get_mut(trajectory_id) {
                    b.status = BindingStatus::Error;
                }
                Err(e)
            }
        }
    }

    /// Stops the owned emulator process (if any) without touching the claim
    /// or binding entry's port — used before a reload and before removal.
    async fn stop_process(&self, trajectory_id: &str, binding: &DeviceBinding) {
        let _ = self
            .bridge
            .exec(Some(&binding.device_id), &["emu", "kill"], Some(EMU_KILL_TIMEOUT), false)
            .await;

        let handle = {
            let mut inner = self.inner.lock();
            inner.handles.remove(&binding.device_id)
        };
        if let Some(mut process) = handle {
            if binding.has_process_handle {
                process.terminate(TERMINATE_GRACE).await;
            }
        }

        let mut inner = self.inner.lock();
        if let Some(b) = inner.bindings.get_mut(trajectory_id) {
            b.status = BindingStatus::Stopped;
        }
    }

    pub async fn remove(&self, trajectory_id: &str) -> Result<(), EngineError> {
        let binding = self.binding(trajectory_id);
        let meta_exists = self.snapshots.exists(trajectory_id);

        if binding.is_none() && !meta_exists {
            return Err(EngineError::UnknownTrajectory(trajectory_id.to_string()));
        }

        if let Some(b) = &binding {
            if matches!(b.status, BindingStatus::Running | BindingStatus::Saved | BindingStatus::Starting) {
                self.stop_process(trajectory_id, b).await;
            }
            let claim = {
                let mut inner = self.inner.lock();
                inner.claims.remove(&b.device_id)
            };
            if let Some(claim) = claim {
                let _ = self.pca.release(&claim);
            }
        }

        {
            let mut inner = self.inner.lock();
            inner.bindings.remove(trajectory_id);
        }

        if meta_exists {
            self.snapshots.remove(trajectory_id).map_err(|e| EngineError::Internal(e.to_string()))?;
        }

        Ok(())
    }

    pub async fn reset(&self, trajectory_id: &str) -> Result<(), EngineError> {
        let binding = self.require_binding(trajectory_id)?;
        let result = self
            .bridge
            .exec(
                Some(&binding.device_id),
                &["emu", "avd", "snapshot", "load", "baseline_clean"],
                Some(SAVE_TIMEOUT),
                false,
            )
            .await;

        let needs_fallback = match &result {
            Ok(out) => out.stdout.to_ascii_uppercase().contains("KO"),
            Err(_) => true,
        };

        if needs_fallback {
            for keycode in ["KEYCODE_HOME", "KEYCODE_APP_SWITCH", "KEYCODE_HOME"] {
                let _ = self
                    .bridge
                    .exec(Some(&binding.device_id), &["shell", "input", "keyevent", keycode], Some(HOME_KEY_TIMEOUT), false)
                    .await;
            }
        }

        Ok(())
    }

    fn in_process_console_ports(&self, inner: &Inner) -> HashSet<u16> {
        inner.bindings.values().map(|b| b.console_port).collect()
    }
}

/// `emulator-N` lists the adb/bridge port, not the console port (the console
/// port is always one below it).
fn parse_bridge_port(device_id: &str) -> Option<u16> {
    device_id.strip_prefix("emulator-")?.parse().ok()
}

#[cfg(test)]
#[path = "tm_tests.rs"]
mod tests;
