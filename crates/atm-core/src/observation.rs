// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Observation`: the structured result of a step, combining the action echo
//! with best-effort device state readouts gathered by the Observation Builder.

use serde::{Deserialize, Serialize};

/// One element parsed out of a `uiautomator dump` XML tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    pub bounds: [i32; 4],
    pub text: String,
    pub resource_id: String,
    pub class: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observation {
    /// Kind of the action just executed (e.g. `"click"`), always present.
    pub action: String,

    /// Extra echo fields specific to the action kind (e.g. `direction`,
    /// `app_name`), flattened alongside `action` in the JSON response.
    #[serde(flatten)]
    pub action_echo: serde_json::Map<String, serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ui_elements: Option<Vec<UiElement>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_activity: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_size: Option<(u32, u32)>,
}

impl Observation {
    pub fn for_action(kind: &str) -> Self {
        Self {
            action: kind.to_string(),
            ..Default::default()
        }
    }

    pub fn with_echo(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.action_echo.insert(key.to_string(), value.into());
        self
    }
}
