use crate::core::config::data::{Config, ModelChoice};

/// Endpoint of the hosted deployment.
pub const DEFAULT_BASE_URL: &str = "http://38.99.105.121:20186/v1";
pub const DEFAULT_MODEL_LABEL: &str = "Meta-Llama-3.1-70B-Instruct";
pub const DEFAULT_MODEL_ID: &str = "neuralmagic/Meta-Llama-3.1-70B-Instruct-FP8";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn model_choices(&self) -> Vec<ModelChoice> {
        if self.models.is_empty() {
            vec![ModelChoice {
                label: DEFAULT_MODEL_LABEL.to_string(),
                id: DEFAULT_MODEL_ID.to_string(),
            }]
        } else {
            self.models.clone()
        }
    }

    pub fn send_top_k(&self) -> bool {
        self.send_top_k.unwrap_or(false)
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }

    pub fn theme_name(&self) -> &str {
        self.theme.as_deref().unwrap_or("dark")
    }
}
