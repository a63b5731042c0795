use crate::core::builtin_presets::load_builtin_presets;
use crate::core::config::Config;
use crate::core::message::Message;
use serde::{Deserialize, Serialize};

/// A named, fixed system instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPromptPreset {
    pub label: String,
    pub instructions: String,
}

/// Read-only preset table plus the session's current selection.
#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    presets: Vec<SystemPromptPreset>,
    active: Option<usize>,
}

impl PresetCatalog {
    /// Built-ins first (unless disabled), then config presets. A config preset
    /// with the same label as a built-in replaces it in place.
    pub fn from_config(config: &Config) -> Self {
        let mut presets = if config.builtin_presets.unwrap_or(true) {
            load_builtin_presets()
        } else {
            Vec::new()
        };

        for preset in &config.presets {
            if preset.label.trim().is_empty() {
                tracing::warn!("ignoring preset without a label");
                continue;
            }
            match presets
                .iter_mut()
                .find(|existing| existing.label.eq_ignore_ascii_case(&preset.label))
            {
                Some(existing) => *existing = preset.clone(),
                None => presets.push(preset.clone()),
            }
        }

        Self::new(presets)
    }

    pub fn new(presets: Vec<SystemPromptPreset>) -> Self {
        Self {
            presets,
            active: None,
        }
    }

    pub fn list(&self) -> &[SystemPromptPreset] {
        &self.presets
    }

    pub fn find(&self, label: &str) -> Option<&SystemPromptPreset> {
        self.position(label).map(|index| &self.presets[index])
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.presets
            .iter()
            .position(|preset| preset.label.eq_ignore_ascii_case(label.trim()))
    }

    pub fn set_active(&mut self, label: &str) -> Result<(), String> {
        match self.position(label) {
            Some(index) => {
                self.active = Some(index);
                Ok(())
            }
            None => {
                let available: Vec<&str> = self.presets.iter().map(|p| p.label.as_str()).collect();
                Err(format!(
                    "Preset '{}' not found. Available presets: {}",
                    label,
                    available.join(", ")
                ))
            }
        }
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<&SystemPromptPreset> {
        self.active.and_then(|index| self.presets.get(index))
    }

    pub fn active_label(&self) -> &str {
        self.active().map(|p| p.label.as_str()).unwrap_or("None")
    }

    /// Step through `None, preset 0, preset 1, ...` with wrap-around.
    pub fn cycle(&mut self, delta: i32) {
        let slots = self.presets.len() as i64 + 1;
        let current = self.active.map(|index| index as i64 + 1).unwrap_or(0);
        let next = (current + delta as i64).rem_euclid(slots);
        self.active = if next == 0 {
            None
        } else {
            Some(next as usize - 1)
        };
    }

    /// The system message to prefix requests with, if a preset is active.
    pub fn system_message(&self) -> Option<Message> {
        let instructions = self.active()?.instructions.trim();
        if instructions.is_empty() {
            None
        } else {
            Some(Message::system(instructions))
        }
    }
}
