// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use atm_adapters::{ExecOutput, FakeBridge};

fn ok(stdout: &str) -> Result<ExecOutput, atm_adapters::BridgeError> {
    Ok(ExecOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: 0,
    })
}

#[test]
fn parse_bounds_reads_all_four_numbers() {
    assert_eq!(parse_bounds("[10,20][300,400]"), Some([10, 20, 300, 400]));
}

#[test]
fn parse_bounds_rejects_malformed_input() {
    assert_eq!(parse_bounds("[10,20]"), None);
}

#[test]
fn extract_package_activity_parses_current_focus_line() {
    let line = "  mCurrentFocus=Window{abc u0 com.example.app/com.example.app.MainActivity}";
    assert_eq!(
        extract_package_activity(line),
        Some("com.example.app/com.example.app.MainActivity".to_string())
    );
}

#[test]
fn parse_ui_dump_extracts_nodes() {
    let xml = r#"<hierarchy><node text="Hi" resource-id="id/x" class="android.widget.Button" bounds="[0,0][100,50]" /></hierarchy>"#;
    let elements = parse_ui_dump(xml);
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].text, "Hi");
    assert_eq!(elements[0].bounds, [0, 0, 100, 50]);
}

#[tokio::test]
async fn gather_fills_all_fields_when_everything_succeeds() {
    let bridge = FakeBridge::new();
    bridge.on("shell dumpsys window windows", ok("mCurrentFocus=Window{a u0 com.a/com.a.Main}"));
    bridge.on("shell wm size", ok("Physical size: 1080x1920"));
    bridge.on("shell uiautomator dump /sdcard/window_dump.xml", ok(""));
    bridge.on(
        "shell cat /sdcard/window_dump.xml",
        ok(r#"<hierarchy><node text="Hi" resource-id="id/x" class="c" bounds="[0,0][1,1]" /></hierarchy>"#),
    );

    let result = gather(&bridge, "emulator-5554").await;
    assert_eq!(result.current_activity.as_deref(), Some("com.a/com.a.Main"));
    assert_eq!(result.screen_size, Some((1080, 1920)));
    assert_eq!(result.ui_elements.unwrap().len(), 1);
}

#[tokio::test]
async fn gather_falls_back_to_dumpsys_top_when_dump_file_missing() {
    let bridge = FakeBridge::new();
    bridge.on("shell uiautomator dump /sdcard/window_dump.xml", ok(""));
    bridge.on("shell cat /sdcard/window_dump.xml", ok(""));
    bridge.on("shell dumpsys activity top", ok("ACTIVITY com.a.Main"));

    let result = gather(&bridge, "emulator-5554").await;
    let elements = result.ui_elements.unwrap();
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].class, "activity_info");
}

#[tokio::test]
async fn gather_omits_fields_whose_bridge_call_errors() {
    let bridge = FakeBridge::new();
    bridge.set_bridge_available(false);
    // exec isn't gated on bridge_available in FakeBridge; force an error via a
    // canned Err response instead.
    bridge.on(
        "shell wm size",
        Err(atm_adapters::BridgeError::CommandFailed { exit_code: 1, stderr: "boom".into() }),
    );

    let result = gather(&bridge, "emulator-5554").await;
    assert!(result.screen_size.is_none());
}
