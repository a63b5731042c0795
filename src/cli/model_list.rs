//! Model listing functionality

use crate::core::config::Config;
use crate::core::models::ModelCatalog;

pub fn format_models(catalog: &ModelCatalog) -> Vec<String> {
    let selected = catalog.selected_id();
    catalog
        .choices()
        .iter()
        .map(|choice| {
            let marker = if choice.id == selected { "*" } else { " " };
            format!("{marker} {:<32} {}", choice.label, choice.id)
        })
        .collect()
}

pub fn list_models(config: &Config, preferred: Option<&str>) {
    let catalog = ModelCatalog::new(
        config.model_choices(),
        preferred.or(config.default_model.as_deref()),
    );
    println!("🤖 Available models ({})", config.base_url());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for line in format_models(&catalog) {
        println!("{line}");
    }
}
