//! Preset listing functionality

use crate::core::config::Config;
use crate::core::preset::PresetCatalog;

/// One line per preset: label, then the first line of its instructions.
pub fn format_presets(catalog: &PresetCatalog) -> Vec<String> {
    catalog
        .list()
        .iter()
        .map(|preset| {
            let summary = preset.instructions.lines().next().unwrap_or_default().trim();
            format!("  {:<16} {}", preset.label, summary)
        })
        .collect()
}

pub fn list_presets(config: &Config) {
    let catalog = PresetCatalog::from_config(config);
    println!("🎭 System-prompt presets");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    if catalog.list().is_empty() {
        println!("  (none configured)");
        return;
    }
    for line in format_presets(&catalog) {
        println!("{line}");
    }
    println!();
    println!("Use with: multiplyr say --preset <LABEL> <prompt>");
}
