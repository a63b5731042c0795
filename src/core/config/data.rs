use crate::core::params::SamplingSettings;
use crate::core::preset::SystemPromptPreset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A selectable model: `label` is shown in the sidebar, `id` goes on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ModelChoice {
    pub label: String,
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Base URL of the OpenAI-compatible endpoint (e.g., "https://host/v1")
    pub base_url: Option<String>,
    /// Model id (or label) selected at startup
    pub default_model: Option<String>,
    /// Models offered in the selector; the built-in model is used when empty
    #[serde(default)]
    pub models: Vec<ModelChoice>,
    /// Initial slider positions
    #[serde(default)]
    pub parameters: SamplingSettings,
    /// Send `top_k` with requests (not every server accepts it)
    pub send_top_k: Option<bool>,
    /// Include built-in presets shipped with the binary
    pub builtin_presets: Option<bool>,
    /// User-defined system-prompt presets
    #[serde(default)]
    pub presets: Vec<SystemPromptPreset>,
    /// UI theme name ("dark" or "light")
    pub theme: Option<String>,
    /// Whole-request timeout in seconds, streaming included
    pub request_timeout_secs: Option<u64>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
