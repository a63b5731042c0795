use crate::core::config::ModelChoice;

/// The model selector: a fixed list with one current entry.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    choices: Vec<ModelChoice>,
    selected: usize,
}

impl ModelCatalog {
    /// `choices` must be non-empty; `Config::model_choices` guarantees it.
    ///
    /// A `preferred` name that matches no configured choice is taken as a raw
    /// model id and appended, so overrides reach the server unchanged.
    pub fn new(choices: Vec<ModelChoice>, preferred: Option<&str>) -> Self {
        let mut catalog = Self {
            choices,
            selected: 0,
        };
        if let Some(preferred) = preferred.map(str::trim).filter(|p| !p.is_empty()) {
            if catalog.select(preferred).is_err() {
                tracing::debug!("model '{preferred}' is not configured; adding it as a raw id");
                catalog.choices.push(ModelChoice {
                    label: preferred.to_string(),
                    id: preferred.to_string(),
                });
                catalog.selected = catalog.choices.len() - 1;
            }
        }
        catalog
    }

    pub fn choices(&self) -> &[ModelChoice] {
        &self.choices
    }

    pub fn selected(&self) -> Option<&ModelChoice> {
        self.choices.get(self.selected)
    }

    pub fn selected_id(&self) -> &str {
        self.selected().map(|c| c.id.as_str()).unwrap_or_default()
    }

    pub fn selected_label(&self) -> &str {
        self.selected().map(|c| c.label.as_str()).unwrap_or_default()
    }

    /// Select by id or label.
    pub fn select(&mut self, name: &str) -> Result<(), String> {
        let name = name.trim();
        match self
            .choices
            .iter()
            .position(|c| c.id == name || c.label.eq_ignore_ascii_case(name))
        {
            Some(index) => {
                self.selected = index;
                Ok(())
            }
            None => Err(format!("Model '{name}' is not available")),
        }
    }

    pub fn cycle(&mut self, delta: i32) {
        if self.choices.is_empty() {
            return;
        }
        let len = self.choices.len() as i64;
        self.selected = (self.selected as i64 + delta as i64).rem_euclid(len) as usize;
    }
}
