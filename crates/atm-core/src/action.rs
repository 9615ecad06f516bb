// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The normalized Action: a tagged sum with one variant per action kind.
//!
//! Callers may submit an already-normalized `Action`, a JSON object with the same
//! shape, a JSON string, or a terse DSL string (`"click 100 200"`). Parsing all of
//! those into this type is the Action Translator's job (see the `atm-engine`
//! crate); this module only owns the target representation and its constraints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A parsed direction for scroll/swipe gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Normalized action record. Serializes as `{"kind": "...", ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Click { x: i32, y: i32 },
    DoubleTap { x: i32, y: i32 },
    LongPress { x: i32, y: i32 },
    InputText { text: String },
    NavigateBack,
    NavigateHome,
    KeyboardEnter,
    Scroll { direction: Direction },
    Swipe { direction: Direction },
    /// Coordinate-preserving swipe. Only reachable via structured input (record
    /// or JSON); the terse DSL only ever produces `Swipe`.
    SwipeRaw {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        duration_ms: u32,
    },
    OpenApp { app_name: String },
    Answer,
    Wait { duration_secs: f64 },
    Keycode { code: String },
    Screenshot,
}

impl Action {
    /// Short tag used in tracing spans and the observation's `action` echo.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Action::Click { .. } => "click",
            Action::DoubleTap { .. } => "double_tap",
            Action::LongPress { .. } => "long_press",
            Action::InputText { .. } => "input_text",
            Action::NavigateBack => "navigate_back",
            Action::NavigateHome => "navigate_home",
            Action::KeyboardEnter => "keyboard_enter",
            Action::Scroll { .. } => "scroll",
            Action::Swipe { .. } => "swipe",
            Action::SwipeRaw { .. } => "swipe_raw",
            Action::OpenApp { .. } => "open_app",
            Action::Answer => "answer",
            Action::Wait { .. } => "wait",
            Action::Keycode { .. } => "keycode",
            Action::Screenshot => "screenshot",
        }
    }

    /// Whether this action mutates on-device state (as opposed to pure readout),
    /// used to decide whether the Observation Builder runs after executing it.
    pub fn mutates_device(&self) -> bool {
        !matches!(self, Action::Screenshot)
    }
}

/// Errors from translating caller input into a normalized [`Action`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("invalid action: {0}")]
    Invalid(String),
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
