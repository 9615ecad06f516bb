// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use atm_adapters::{ExecOutput, FakeBridge};
use atm_core::Direction;
use yare::parameterized;

#[parameterized(
    right = {"click 100 200", Action::Click { x: 100, y: 200 }},
    double = {"text hello world", Action::InputText { text: "hello world".into() }},
    quoted_text = {"text \"hi there\"", Action::InputText { text: "hi there".into() }},
    back = {"key back", Action::NavigateBack},
    home = {"key home", Action::NavigateHome},
    enter = {"key enter", Action::KeyboardEnter},
    other_key = {"key volume_up", Action::Keycode { code: "KEYCODE_VOLUME_UP".into() }},
    shot = {"screenshot", Action::Screenshot},
)]
fn dsl_translates_to_expected_action(input: &str, expected: Action) {
    assert_eq!(translate(ActionInput::Text(input.to_string())).unwrap(), expected);
}

#[test]
fn braces_string_is_parsed_as_json() {
    let action = translate(ActionInput::Text(r#"{"kind":"click","x":1,"y":2}"#.to_string())).unwrap();
    assert_eq!(action, Action::Click { x: 1, y: 2 });
}

#[test]
fn action_type_key_is_accepted_as_alias_for_kind() {
    let value = serde_json::json!({"action_type": "open_app", "app_name": "chrome"});
    let action = translate(ActionInput::Json(value)).unwrap();
    assert_eq!(action, Action::OpenApp { app_name: "chrome".into() });
}

#[test]
fn already_normalized_action_passes_through() {
    let action = translate(ActionInput::Action(Action::Screenshot)).unwrap();
    assert_eq!(action, Action::Screenshot);
}

#[test]
fn missing_fields_reject_before_any_device_command() {
    let result = translate(ActionInput::Json(serde_json::json!({"kind": "click"})));
    assert!(result.is_err());
}

#[parameterized(
    right = {100, 200, 300, 400, Direction::Down},
    down = {100, 200, 100, 400, Direction::Down},
    up_on_vertical_majority = {100, 200, 50, 50, Direction::Up},
    clean_right = {0, 0, 100, 10, Direction::Right},
    clean_left = {0, 0, -100, 10, Direction::Left},
)]
fn swipe_direction_matches_original_tie_rule(x1: i32, y1: i32, x2: i32, y2: i32, expected: Direction) {
    assert_eq!(swipe_direction(x1, y1, x2, y2), expected);
}

#[tokio::test]
async fn executing_click_issues_input_tap() {
    let bridge = FakeBridge::new();
    execute(&bridge, "emulator-5554", &Action::Click { x: 10, y: 20 }).await.unwrap();
    let calls = bridge.calls();
    assert_eq!(calls[0].args, vec!["shell", "input", "tap", "10", "20"]);
}

#[tokio::test]
async fn executing_open_app_uses_am_start_for_a_known_activity() {
    let bridge = FakeBridge::new();
    let result = execute(&bridge, "emulator-5554", &Action::OpenApp { app_name: "chrome".into() })
        .await
        .unwrap();
    assert_eq!(result.echo["app_name"], "chrome");
    assert!(result.echo["activity"].as_str().unwrap().starts_with("com.android.chrome/"));
    let calls = bridge.calls();
    assert_eq!(calls[0].args[0], "shell");
    assert_eq!(calls[0].args[1], "am");
    assert_eq!(calls[0].args[2], "start");
}

#[tokio::test]
async fn executing_open_app_falls_back_to_monkey_for_an_unknown_app() {
    let bridge = FakeBridge::new();
    let result = execute(&bridge, "emulator-5554", &Action::OpenApp { app_name: "com.example.unlisted".into() })
        .await
        .unwrap();
    assert_eq!(result.echo["app_name"], "com.example.unlisted");
    assert!(result.echo["activity"].is_null());
    let calls = bridge.calls();
    assert_eq!(calls[0].args, vec!["shell", "monkey", "-p", "com.example.unlisted", "1"]);
}

#[tokio::test]
async fn executing_swipe_queries_screen_size_and_echoes_direction() {
    let bridge = FakeBridge::new();
    bridge.on(
        "shell wm size",
        Ok(ExecOutput {
            stdout: "Physical size: 1080x1920\n".into(),
            stderr: String::new(),
            exit_code: 0,
        }),
    );
    let result = execute(&bridge, "emulator-5554", &Action::Swipe { direction: Direction::Up })
        .await
        .unwrap();
    assert_eq!(result.echo["direction"], "up");
    let swipe_call = bridge.calls().into_iter().find(|c| c.args.contains(&"swipe".to_string())).unwrap();
    assert_eq!(swipe_call.args[1], "swipe");
}

#[tokio::test]
async fn command_failure_surfaces_as_command_failed() {
    let bridge = FakeBridge::new();
    bridge.on(
        "shell input tap 10 20",
        Ok(ExecOutput {
            stdout: String::new(),
            stderr: "no device".into(),
            exit_code: 1,
        }),
    );
    let result = execute(&bridge, "emulator-5554", &Action::Click { x: 10, y: 20 }).await;
    assert!(matches!(result, Err(EngineError::CommandFailed { .. })));
}
