// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action Translator: normalizes caller input (record / JSON object / JSON
//! string / terse DSL) into an [`Action`], then executes it as a sequence of
//! device-bridge commands.

use crate::error::EngineError;
use atm_adapters::DeviceBridge;
use atm_core::{Action, Direction};
use serde_json::Value;
use std::time::Duration;

/// Whatever a caller handed the step endpoint: an already-normalized action,
/// a JSON value (object or string), or a raw DSL string.
#[derive(Debug, Clone)]
pub enum ActionInput {
    Action(Action),
    Json(Value),
    Text(String),
}

impl From<Action> for ActionInput {
    fn from(a: Action) -> Self {
        ActionInput::Action(a)
    }
}

impl From<Value> for ActionInput {
    fn from(v: Value) -> Self {
        ActionInput::Json(v)
    }
}

impl From<String> for ActionInput {
    fn from(s: String) -> Self {
        ActionInput::Text(s)
    }
}

/// Friendly app name -> launchable activity component, for the primary
/// `open_app` branch (§4.4). Apps not listed here fall back to `monkey -p`.
fn lookup_activity(app_name: &str) -> Option<&'static str> {
    match app_name.to_ascii_lowercase().as_str() {
        "chrome" => Some("com.android.chrome/com.google.android.apps.chrome.Main"),
        "settings" => Some("com.android.settings/.Settings"),
        "camera" => Some("com.android.camera2/com.android.camera.CameraLauncher"),
        "contacts" => Some("com.android.contacts/.activities.PeopleActivity"),
        "gmail" => Some("com.google.android.gm/.ConversationListActivityGmail"),
        "maps" => Some("com.google.android.apps.maps/com.google.android.maps.MapsActivity"),
        "calculator" => Some("com.android.calculator2/.Calculator"),
        _ => None,
    }
}

/// Case-insensitive key-name -> keycode map (§6). Unknown names pass through
/// verbatim, upper-cased with a `KEYCODE_` prefix is NOT assumed — the raw
/// name is returned as-is so callers can pass a fully-qualified code directly.
fn map_keycode(name: &str) -> String {
    match name.to_ascii_lowercase().as_str() {
        "back" => "KEYCODE_BACK".to_string(),
        "home" => "KEYCODE_HOME".to_string(),
        "menu" => "KEYCODE_MENU".to_string(),
        "power" => "KEYCODE_POWER".to_string(),
        "enter" => "KEYCODE_ENTER".to_string(),
        "delete" => "KEYCODE_DEL".to_string(),
        "recents" => "KEYCODE_APP_SWITCH".to_string(),
        "volume_up" => "KEYCODE_VOLUME_UP".to_string(),
        "volume_down" => "KEYCODE_VOLUME_DOWN".to_string(),
        _ => name.to_string(),
    }
}

/// Translates raw caller input into a normalized [`Action`].
pub fn translate(input: ActionInput) -> Result<Action, EngineError> {
    match input {
        ActionInput::Action(a) => Ok(a),
        ActionInput::Json(v) => translate_value(v),
        ActionInput::Text(s) => translate_text(&s),
    }
}

fn translate_value(mut v: Value) -> Result<Action, EngineError> {
    if let Value::Object(ref mut map) = v {
        if !map.contains_key("kind") {
            if let Some(action_type) = map.remove("action_type") {
                map.insert("kind".to_string(), action_type);
            }
        }
    }
    serde_json::from_value(v).map_err(|e| EngineError::InvalidAction(e.to_string()))
}

fn translate_text(raw: &str) -> Result<Action, EngineError> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| EngineError::InvalidAction(e.to_string()))?;
        return translate_value(value);
    }

    let mut parts = trimmed.split_whitespace();
    let head = parts
        .next()
        .ok_or_else(|| EngineError::InvalidAction("empty action command".into()))?
        .to_ascii_lowercase();
    let rest: Vec<&str> = parts.collect();

    match head.as_str() {
        "click" => {
            let (x, y) = two_ints(&rest)?;
            Ok(Action::Click { x, y })
        }
        "text" => {
            let joined = rest.join(" ");
            let text = joined
                .strip_prefix('"')
                .and_then(|s| s.strip_suffix('"'))
                .unwrap_or(&joined)
                .to_string();
            Ok(Action::InputText { text })
        }
        "swipe" => {
            if rest.len() < 4 {
                return Err(EngineError::InvalidAction(format!(
                    "swipe requires 4 coordinates: {raw}"
                )));
            }
            let nums: Result<Vec<i32>, _> = rest[..4].iter().map(|s| s.parse::<i32>()).collect();
            let nums = nums.map_err(|e| EngineError::InvalidAction(e.to_string()))?;
            let (x1, y1, x2, y2) = (nums[0], nums[1], nums[2], nums[3]);
            Ok(Action::Swipe {
                direction: swipe_direction(x1, y1, x2, y2),
            })
        }
        "key" => {
            let name = rest
                .first()
                .ok_or_else(|| EngineError::InvalidAction("key requires a name".into()))?
                .to_ascii_lowercase();
            match name.as_str() {
                "back" => Ok(Action::NavigateBack),
                "home" => Ok(Action::NavigateHome),
                "enter" => Ok(Action::KeyboardEnter),
                other => Ok(Action::Keycode {
                    code: map_keycode(other),
                }),
            }
        }
        "screenshot" => Ok(Action::Screenshot),
        other => Err(EngineError::InvalidAction(format!(
            "unrecognized DSL command: {other}"
        ))),
    }
}

fn two_ints(rest: &[&str]) -> Result<(i32, i32), EngineError> {
    if rest.len() < 2 {
        return Err(EngineError::InvalidAction("expected x y".into()));
    }
    let x = rest[0]
        .parse::<i32>()
        .map_err(|e| EngineError::InvalidAction(e.to_string()))?;
    let y = rest[1]
        .parse::<i32>()
        .map_err(|e| EngineError::InvalidAction(e.to_string()))?;
    Ok((x, y))
}

/// Derives a swipe direction from endpoint coordinates. Horizontal wins only
/// on a strict magnitude majority; ties and vertical majorities fall through
/// to up/down.
pub fn swipe_direction(x1: i32, y1: i32, x2: i32, y2: i32) -> Direction {
    let dx = x2 - x1;
    let dy = y2 - y1;
    if dx.abs() > dy.abs() {
        if dx > 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy > 0 {
        Direction::Down
    } else {
        Direction::Up
    }
}

/// Result of executing an action: the observation action-echo fields the
/// caller should see (direction, app_name, …) plus raw screenshot bytes when
/// the action was `Screenshot`.
#[derive(Debug, Default)]
pub struct ExecResult {
    pub echo: serde_json::Map<String, Value>,
    pub screenshot_base64: Option<String>,
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Executes `action` against `device_id` via `bridge`, returning echo fields
/// for the observation. Device-control command failures are surfaced;
/// Non-goal: OB enrichment is the caller's job, not this function's.
pub async fn execute(
    bridge: &impl DeviceBridge,
    device_id: &str,
    action: &Action,
) -> Result<ExecResult, EngineError> {
    let mut result = ExecResult::default();

    match action {
        Action::Click { x, y } => {
            tap(bridge, device_id, *x, *y).await?;
        }
        Action::DoubleTap { x, y } => {
            tap(bridge, device_id, *x, *y).await?;
            tokio::time::sleep(Duration::from_millis(50)).await;
            tap(bridge, device_id, *x, *y).await?;
        }
        Action::LongPress { x, y } => {
            shell(
                bridge,
                device_id,
                &["input", "swipe", &x.to_string(), &y.to_string(), &x.to_string(), &y.to_string(), "800"],
            )
            .await?;
        }
        Action::InputText { text } => {
            let escaped = text.replace(' ', "%s");
            shell(bridge, device_id, &["input", "text", &escaped]).await?;
        }
        Action::NavigateBack => keyevent(bridge, device_id, "KEYCODE_BACK").await?,
        Action::NavigateHome => keyevent(bridge, device_id, "KEYCODE_HOME").await?,
        Action::KeyboardEnter => keyevent(bridge, device_id, "KEYCODE_ENTER").await?,
        Action::Scroll { direction } | Action::Swipe { direction } => {
            let (w, h) = screen_size(bridge, device_id).await?;
            let (x1, y1, x2, y2) = directional_swipe_coords(*direction, w, h);
            shell(
                bridge,
                device_id,
                &[
                    "input", "swipe",
                    &x1.to_string(), &y1.to_string(), &x2.to_string(), &y2.to_string(), "300",
                ],
            )
            .await?;
            result.echo.insert("direction".into(), direction.as_str().into());
        }
        Action::SwipeRaw { x1, y1, x2, y2, duration_ms } => {
            shell(
                bridge,
                device_id,
                &[
                    "input", "swipe",
                    &x1.to_string(), &y1.to_string(), &x2.to_string(), &y2.to_string(),
                    &duration_ms.to_string(),
                ],
            )
            .await?;
        }
        Action::OpenApp { app_name } => {
            let activity = lookup_activity(app_name);
            match activity {
                Some(activity) => {
                    shell(bridge, device_id, &["am", "start", "-n", activity]).await?;
                }
                None => {
                    shell(bridge, device_id, &["monkey", "-p", app_name, "1"]).await?;
                }
            }
            result.echo.insert("app_name".into(), app_name.clone().into());
            result.echo.insert("activity".into(), activity.into());
        }
        Action::Answer => keyevent(bridge, device_id, "KEYCODE_CALL").await?,
        Action::Wait { duration_secs } => {
            tokio::time::sleep(Duration::from_secs_f64((*duration_secs).max(0.0))).await;
        }
        Action::Keycode { code } => keyevent(bridge, device_id, code).await?,
        Action::Screenshot => {
            wake_and_nudge(bridge, device_id).await;
            let out = bridge
                .exec_bytes(Some(device_id), &["exec-out", "screencap", "-p"], Some(DEFAULT_TIMEOUT))
                .await?;
            use base64::Engine;
            result.screenshot_base64 = Some(base64::engine::general_purpose::STANDARD.encode(out.stdout));
        }
    }

    Ok(result)
}

async fn tap(bridge: &impl DeviceBridge, device_id: &str, x: i32, y: i32) -> Result<(), EngineError> {
    shell(bridge, device_id, &["input", "tap", &x.to_string(), &y.to_string()]).await
}

async fn keyevent(bridge: &impl DeviceBridge, device_id: &str, code: &str) -> Result<(), EngineError> {
    shell(bridge, device_id, &["input", "keyevent", code]).await
}

async fn shell(bridge: &impl DeviceBridge, device_id: &str, args: &[&str]) -> Result<(), EngineError> {
    let mut full = vec!["shell"];
    full.extend_from_slice(args);
    bridge
        .exec(Some(device_id), &full, Some(DEFAULT_TIMEOUT), true)
        .await?;
    Ok(())
}

async fn screen_size(bridge: &impl DeviceBridge, device_id: &str) -> Result<(u32, u32), EngineError> {
    let out = bridge
        .exec(Some(device_id), &["shell", "wm", "size"], Some(DEFAULT_TIMEOUT), true)
        .await?;
    parse_wm_size(&out.stdout).ok_or_else(|| EngineError::Internal("could not parse wm size output".into()))
}

fn parse_wm_size(raw: &str) -> Option<(u32, u32)> {
    let line = raw.lines().find(|l| l.contains("x"))?;
    let dims = line.rsplit(' ').next()?;
    let (w, h) = dims.split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

fn directional_swipe_coords(direction: Direction, width: u32, height: u32) -> (i32, i32, i32, i32) {
    let (w, h) = (width as i32, height as i32);
    match direction {
        Direction::Up => (w / 2, h * 3 / 4, w / 2, h / 4),
        Direction::Down => (w / 2, h / 4, w / 2, h * 3 / 4),
        Direction::Left => (w * 3 / 4, h / 2, w / 4, h / 2),
        Direction::Right => (w / 4, h / 2, w * 3 / 4, h / 2),
    }
}

async fn wake_and_nudge(bridge: &impl DeviceBridge, device_id: &str) {
    let _ = keyevent(bridge, device_id, "KEYCODE_WAKEUP").await;
    if let Ok((w, h)) = screen_size(bridge, device_id).await {
        let _ = shell(
            bridge,
            device_id,
            &[
                "input", "swipe",
                &(w as i32 / 2).to_string(), &(h as i32 * 2 / 3).to_string(),
                &(w as i32 / 2).to_string(), &(h as i32 / 3).to_string(),
                "300",
            ],
        )
        .await;
    }
}

#[cfg(test)]
#[path = "at_tests.rs"]
mod tests;
