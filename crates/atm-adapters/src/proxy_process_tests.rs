// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn handle(dir: &std::path::Path) -> ProxyHandle {
    ProxyHandle {
        worker_id: "w1".into(),
        listen_port: 8080,
        target_host: "localhost".into(),
        target_port: 5000,
        work_dir: dir.to_path_buf(),
    }
}

#[test]
fn render_config_includes_upstream_and_listen_port() {
    let dir = tempdir().unwrap();
    let h = handle(dir.path());
    let rendered = h.render_config();
    assert!(rendered.contains("listen 8080;"));
    assert!(rendered.contains("server localhost:5000;"));
}

#[tokio::test]
async fn fake_proxy_process_tracks_running_state() {
    let dir = tempdir().unwrap();
    let h = handle(dir.path());
    let proxy = FakeProxyProcess::new();

    assert!(!proxy.is_running(&h).await);
    proxy.start(&h).await.unwrap();
    assert!(proxy.is_running(&h).await);
    proxy.stop(&h).await.unwrap();
    assert!(!proxy.is_running(&h).await);
}

#[tokio::test]
async fn fake_proxy_process_start_fails_when_unavailable() {
    let dir = tempdir().unwrap();
    let h = handle(dir.path());
    let proxy = FakeProxyProcess::new();
    proxy.set_available(false);

    let result = proxy.start(&h).await;
    assert!(matches!(result, Err(ProxyError::ExecutableNotFound)));
}

#[tokio::test]
async fn fake_proxy_process_reload_requires_running() {
    let dir = tempdir().unwrap();
    let h = handle(dir.path());
    let proxy = FakeProxyProcess::new();

    assert!(matches!(proxy.reload(&h).await, Err(ProxyError::NotRunning)));
    proxy.start(&h).await.unwrap();
    assert!(proxy.reload(&h).await.is_ok());
}

#[test]
fn real_proxy_process_reports_unavailable_without_nginx_on_path() {
    // SAFETY: single-threaded test process; restored immediately after the call.
    let original = std::env::var_os("PATH");
    unsafe { std::env::set_var("PATH", "") };
    let proxy = RealProxyProcess::discover();
    if let Some(path) = original {
        unsafe { std::env::set_var("PATH", path) };
    }
    assert!(!proxy.is_available());
}
