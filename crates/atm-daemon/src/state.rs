// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application state: wires a [`Config`] into a concrete [`TrajectoryManager`],
//! builds and registers the standard worker set, and owns the [`Coordinator`].

use crate::config::Config;
use atm_adapters::{AdbBridge, ProxyHandle, RealProxyProcess};
use atm_core::{SystemClock, UuidIdGen, WorkerId, WorkerKind};
use atm_engine::{Pca, RealEmulatorLauncher, TmConfig, TrajectoryManager};
use atm_storage::{ClaimStore, SnapshotStore};
use atm_workers::{Coordinator, EnvironmentWorker, ProxyWorker, RewardWorker, Worker};
use std::sync::Arc;
use std::time::Duration;

pub type AndroidTm = TrajectoryManager<AdbBridge, RealEmulatorLauncher, SystemClock, UuidIdGen>;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator<SystemClock>>,
    pub snapshot_dir: std::path::PathBuf,
}

impl AppState {
    /// Builds the Trajectory Manager plus whichever of env/reward/proxy is
    /// named in `worker_types` and registers them with a fresh Coordinator.
    /// Callers pass `&config.workers.worker_types` for the normal
    /// coordinator/api/demo modes, or a single-element slice for `worker
    /// <kind>` mode.
    pub async fn build(config: &Config, worker_types: &[String]) -> anyhow::Result<Self> {
        let android = &config.environment.android;
        std::fs::create_dir_all(&android.snapshot_dir)?;
        std::fs::create_dir_all(&android.claim_dir)?;

        let claims = ClaimStore::new(android.claim_dir.clone());
        let pca = Pca::new(claims, android.base_port);
        let snapshots = SnapshotStore::new(android.snapshot_dir.clone());
        let tm_config = TmConfig {
            avd_name: android.avd_name.clone(),
            emulator_path: android.emulator_path.clone(),
            log_dir: android.snapshot_dir.clone(),
            boot_timeout: Duration::from_secs(android.boot_timeout_secs),
        };

        let tm = Arc::new(TrajectoryManager::new(
            AdbBridge::new(android.adb_path.clone()),
            RealEmulatorLauncher,
            SystemClock,
            UuidIdGen,
            pca,
            snapshots,
            tm_config,
        ));

        let coordinator = Arc::new(Coordinator::new(SystemClock));

        if worker_types.iter().any(|t| t == "env") {
            let env_worker: Arc<dyn Worker> = Arc::new(EnvironmentWorker::with_config(
                tm.clone(),
                SystemClock,
                android.max_idle_secs,
                Duration::from_secs(android.idle_sweep_secs),
            ));
            coordinator
                .register(WorkerId::new("env-0"), WorkerKind::Environment, env_worker)
                .await;
        }

        if worker_types.iter().any(|t| t == "reward") {
            let reward_worker: Arc<dyn Worker> = Arc::new(RewardWorker::new(SystemClock));
            coordinator
                .register(WorkerId::new("reward-0"), WorkerKind::Reward, reward_worker)
                .await;
        }

        if worker_types.iter().any(|t| t == "proxy") {
            let handle = ProxyHandle {
                worker_id: "proxy-0".to_string(),
                listen_port: config.server.port + 1,
                target_host: config.server.host.clone(),
                target_port: config.server.port,
                work_dir: config.logging.log_dir.clone(),
            };
            let proxy_worker: Arc<dyn Worker> =
                Arc::new(ProxyWorker::new(RealProxyProcess::discover(), handle, SystemClock));
            coordinator
                .register(WorkerId::new("proxy-0"), WorkerKind::Proxy, proxy_worker)
                .await;
        }

        coordinator.start_monitor();

        Ok(Self {
            coordinator,
            snapshot_dir: android.snapshot_dir.clone(),
        })
    }

    pub async fn shutdown(&self) {
        self.coordinator.stop_monitor().await;
        let statuses = self.coordinator.all_statuses();
        for record in statuses {
            self.coordinator.unregister(&record.id).await;
        }
    }
}
