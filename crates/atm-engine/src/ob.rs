// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observation Builder: best-effort device-state readouts. Every sub-call
//! may fail independently; a failure is logged and the corresponding field
//! is simply absent from the returned observation, never propagated.

use atm_adapters::DeviceBridge;
use atm_core::UiElement;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default)]
pub struct ObResult {
    pub current_activity: Option<String>,
    pub screen_size: Option<(u32, u32)>,
    pub ui_elements: Option<Vec<UiElement>>,
}

/// Gathers best-effort observation fields for `device_id`. Never fails: any
/// sub-step error is logged at WARNING and its field left `None`.
pub async fn gather(bridge: &impl DeviceBridge, device_id: &str) -> ObResult {
    ObResult {
        current_activity: current_activity(bridge, device_id).await,
        screen_size: screen_size(bridge, device_id).await,
        ui_elements: ui_elements(bridge, device_id).await,
    }
}

async fn current_activity(bridge: &impl DeviceBridge, device_id: &str) -> Option<String> {
    let out = match bridge
        .exec(Some(device_id), &["shell", "dumpsys", "window", "windows"], Some(TIMEOUT), false)
        .await
    {
        Ok(out) => out,
        Err(e) => {
            tracing::warn!(device_id, error = %e, "failed to read current activity");
            return None;
        }
    };

    let activity = out
        .stdout
        .lines()
        .find(|l| l.contains("mCurrentFocus") || l.contains("mFocusedApp"))
        .and_then(extract_package_activity);

    if activity.is_none() {
        tracing::warn!(device_id, "dumpsys window windows had no focus line");
    }
    activity
}

fn extract_package_activity(line: &str) -> Option<String> {
    // Lines look like: `mCurrentFocus=Window{... u0 com.pkg/com.pkg.Activity}`
    let token = line.split_whitespace().last()?;
    let token = token.trim_end_matches('}');
    if token.contains('/') {
        Some(token.to_string())
    } else {
        None
    }
}

async fn screen_size(bridge: &impl DeviceBridge, device_id: &str) -> Option<(u32, u32)> {
    let out = match bridge
        .exec(Some(device_id), &["shell", "wm", "size"], Some(TIMEOUT), false)
        .await
    {
        Ok(out) => out,
        Err(e) => {
            tracing::warn!(device_id, error = %e, "failed to read screen size");
            return None;
        }
    };
    let parsed = parse_wm_size(&out.stdout);
    if parsed.is_none() {
        tracing::warn!(device_id, "wm size output did not parse: {:?}", out.stdout);
    }
    parsed
}

fn parse_wm_size(raw: &str) -> Option<(u32, u32)> {
    let line = raw.lines().find(|l| l.contains('x'))?;
    let dims = line.rsplit(' ').next()?;
    let (w, h) = dims.split_once('x')?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

const UI_DUMP_PATH: &str = "/sdcard/window_dump.xml";

async fn ui_elements(bridge: &impl DeviceBridge, device_id: &str) -> Option<Vec<UiElement>> {
    if let Err(e) = bridge
        .exec(Some(device_id), &["shell", "uiautomator", "dump", UI_DUMP_PATH], Some(TIMEOUT), false)
        .await
    {
        tracing::warn!(device_id, error = %e, "uiautomator dump failed, falling back to dumpsys activity top");
        return dumpsys_activity_fallback(bridge, device_id).await;
    }

    tokio::time::sleep(Duration::from_millis(500)).await;

    let cat = bridge
        .exec(Some(device_id), &["shell", "cat", UI_DUMP_PATH], Some(TIMEOUT), false)
        .await;
    let _ = bridge
        .exec(Some(device_id), &["shell", "rm", "-f", UI_DUMP_PATH], Some(TIMEOUT), false)
        .await;

    match cat {
        Ok(out) if !out.stdout.trim().is_empty() => Some(parse_ui_dump(&out.stdout)),
        _ => {
            tracing::warn!(device_id, "window_dump.xml missing after uiautomator dump");
            dumpsys_activity_fallback(bridge, device_id).await
        }
    }
}

async fn dumpsys_activity_fallback(bridge: &impl DeviceBridge, device_id: &str) -> Option<Vec<UiElement>> {
    let out = bridge
        .exec(Some(device_id), &["shell", "dumpsys", "activity", "top"], Some(TIMEOUT), false)
        .await
        .ok()?;
    Some(vec![UiElement {
        bounds: [0, 0, 0, 0],
        text: out.stdout,
        resource_id: String::new(),
        class: "activity_info".to_string(),
    }])
}

/// Parses a `uiautomator dump` XML tree into an ordered list of elements.
fn parse_ui_dump(xml: &str) -> Vec<UiElement> {
    use quick_xml::events::Event;
    use quick_xml::reader::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut elements = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"node" => {
                let mut text = String::new();
                let mut resource_id = String::new();
                let mut class = String::new();
                let mut bounds = [0, 0, 0, 0];

                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().unwrap_or_default().to_string();
                    match attr.key.as_ref() {
                        b"text" => text = value,
                        b"resource-id" => resource_id = value,
                        b"class" => class = value,
                        b"bounds" => bounds = parse_bounds(&value).unwrap_or([0, 0, 0, 0]),
                        _ => {}
                    }
                }

                elements.push(UiElement { bounds, text, resource_id, class });
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    elements
}

/// Parses `"[x1,y1][x2,y2]"` into `[x1, y1, x2, y2]`.
fn parse_bounds(raw: &str) -> Option<[i32; 4]> {
    let nums: Vec<i32> = raw
        .split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    if nums.len() == 4 {
        Some([nums[0], nums[1], nums[2], nums[3]])
    } else {
        None
    }
}

#[cfg(test)]
#[path = "ob_tests.rs"]
mod tests;
