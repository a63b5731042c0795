use std::sync::Arc;
use std::time::Duration;

use crate::core::chat_stream::{CompletionBackend, HttpCompletionClient};
use crate::core::config::Config;
use crate::ui::theme::Theme;
use crate::utils::url::validate_base_url;

pub mod actions;
pub mod conversation;
pub mod session;
pub mod ui_state;

pub use actions::{apply_action, apply_actions, AppAction, AppCommand};
pub use conversation::{ConversationController, SubmitRejection};
pub use session::{PendingResponse, SessionContext, TurnState};
pub use ui_state::{Screen, SidebarRow, UiFocus, UiState};

/// Configuration parameters for initializing an App
#[derive(Debug, Clone, Default)]
pub struct AppInitConfig {
    pub config: Config,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Key to prefill the key gate with (e.g. from the environment)
    pub api_key: Option<String>,
}

impl AppInitConfig {
    /// The endpoint to talk to: CLI override, then config, then the default.
    pub fn resolved_base_url(&self) -> Result<String, String> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.config.base_url());
        validate_base_url(raw)
    }
}

pub struct App {
    pub session: SessionContext,
    pub ui: UiState,
}

impl App {
    /// Build an app talking to the configured HTTP endpoint.
    pub fn new(init: AppInitConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let base_url = init.resolved_base_url()?;
        let timeout = Duration::from_secs(init.config.request_timeout_secs());
        let client = HttpCompletionClient::build_http_client(timeout)?;
        let backend = Arc::new(HttpCompletionClient::new(
            client,
            base_url.clone(),
            init.config.send_top_k(),
        ));
        Ok(Self::with_backend(init, base_url, backend))
    }

    pub fn with_backend(
        init: AppInitConfig,
        base_url: String,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        let session = SessionContext::new(&init.config, base_url, init.model.as_deref(), backend);
        let mut ui = UiState::new(Theme::from_name(init.config.theme_name()));
        if let Some(key) = init.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
            ui.set_key_text(key);
        }
        Self { session, ui }
    }

    pub fn conversation(&mut self) -> ConversationController<'_> {
        ConversationController::new(&mut self.session)
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.session
            .pending
            .as_ref()
            .is_some_and(|pending| pending.stream_id == stream_id)
    }
}
