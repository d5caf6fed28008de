use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SwitchboardError};
use crate::types::Variant;

/// Top-level configuration for the Switchboard service.
///
/// Loaded from `~/.switchboard/config.toml` by default. Each section
/// corresponds to one crate of the workspace. Credentials live here and are
/// handed to constructors; nothing writes them back into the process
/// environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwitchboardConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl SwitchboardConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SwitchboardConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject settings that would make a run unbounded or meaningless.
    pub fn validate(&self) -> Result<()> {
        let c = &self.coordinator;
        if c.max_steps == 0 {
            return Err(SwitchboardError::Config(
                "coordinator.max_steps must be at least 1".to_string(),
            ));
        }
        if c.rejection_policy == RejectionPolicy::Reroute && c.max_reroutes == 0 {
            return Err(SwitchboardError::Config(
                "coordinator.max_reroutes must be at least 1 with the reroute policy".to_string(),
            ));
        }
        let required = required_steps(c.rejection_policy, c.max_reroutes);
        if c.max_steps < required {
            return Err(SwitchboardError::Config(format!(
                "coordinator.max_steps is {} but the {:?} policy with max_reroutes = {} needs at least {}",
                c.max_steps, c.rejection_policy, c.max_reroutes, required
            )));
        }
        if c.apology_text.trim().is_empty() {
            return Err(SwitchboardError::Config(
                "coordinator.apology_text must not be empty".to_string(),
            ));
        }
        if self.chat.run_timeout_secs == 0 {
            return Err(SwitchboardError::Config(
                "chat.run_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite history store and the API token.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Which role set the coordinator dispatches to.
    pub variant: Variant,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.switchboard/data".to_string(),
            log_level: "info".to_string(),
            variant: Variant::Support,
        }
    }
}

/// What happens when the reviewer rejects a candidate answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionPolicy {
    /// Emit the apology text and stop.
    #[default]
    Apology,
    /// Fold the rejection into history and classify again, up to
    /// `max_reroutes` consecutive rejections.
    Reroute,
}

/// Which part of the history the classifier sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierView {
    /// Original request plus everything except coordinator bookkeeping.
    #[default]
    Filtered,
    /// Every message in order.
    Full,
}

/// Transitions in one route, role, review cycle.
pub const STEPS_PER_CYCLE: u32 = 3;

/// Transitions the longest possible run takes under `policy`. Every rejected
/// cycle ends back at route, except the last, which ends at final.
pub fn required_steps(policy: RejectionPolicy, max_reroutes: u32) -> u32 {
    let cycles = match policy {
        RejectionPolicy::Apology => 1,
        RejectionPolicy::Reroute => max_reroutes.max(1),
    };
    cycles.saturating_mul(STEPS_PER_CYCLE)
}

/// Dispatch loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub rejection_policy: RejectionPolicy,
    /// Consecutive rejections tolerated under the reroute policy.
    pub max_reroutes: u32,
    /// Hard ceiling on state transitions per run.
    pub max_steps: u32,
    pub classifier_view: ClassifierView,
    /// Terminal text when the reviewer rejects and the run gives up.
    pub apology_text: String,
    /// Text shown to users when a run fails.
    pub failure_text: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            rejection_policy: RejectionPolicy::Apology,
            max_reroutes: 2,
            max_steps: 16,
            classifier_view: ClassifierView::Filtered,
            apology_text: "I'm sorry, I couldn't put together a reliable answer to your question. \
                           Please rephrase it or contact a support representative."
                .to_string(),
            failure_text: "Something went wrong while processing your request. Please try again later."
                .to_string(),
        }
    }
}

/// Chat service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of prior messages folded into each run.
    pub history_window: usize,
    /// Proceed with empty history when the store is unavailable.
    pub degrade_on_history_failure: bool,
    /// Upper bound on a whole run, in seconds.
    pub run_timeout_secs: u64,
    /// Maximum question length in characters.
    pub max_question_length: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: 6,
            degrade_on_history_failure: false,
            run_timeout_secs: 120,
            max_question_length: 4000,
        }
    }
}

/// Language-model endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub endpoint: String,
    pub model: String,
    /// API key. Left empty, the binary reads `OPENAI_API_KEY` once at startup.
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.1,
            top_p: 0.1,
            max_tokens: 1024,
            timeout_secs: 60,
        }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub port: u16,
    pub bind_address: String,
    /// Bearer token. Empty means generate one and persist it in `data_dir`.
    pub api_token: String,
    pub rate_limit_per_sec: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 7888,
            bind_address: "127.0.0.1".to_string(),
            api_token: String::new(),
            rate_limit_per_sec: 50,
        }
    }
}
