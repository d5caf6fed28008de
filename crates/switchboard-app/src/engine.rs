//! Builds the chat engine for the configured variant.
//!
//! The role alphabet is chosen here, once, and everything below this point
//! is generic over it.

use std::sync::Arc;

use switchboard_chat::{ChatEngine, ChatService};
use switchboard_core::config::{LlmConfig, SwitchboardConfig};
use switchboard_core::error::SwitchboardError;
use switchboard_core::types::Variant;
use switchboard_dispatch::mock::{ApprovingReviewer, StaticClassifier, StaticRole};
use switchboard_dispatch::{
    Classifier, Coordinator, CoordinatorSettings, ReviewAgent, Role, RoleAgent, RoleRegistry,
    SupportRole, TravelRole,
};
use switchboard_llm::{ChatBackend, LlmClassifier, LlmReviewAgent, LlmRoleAgent, OpenAiBackend};
use switchboard_storage::HistoryStore;

/// Where the capabilities come from.
pub enum Capabilities {
    /// An OpenAI-compatible endpoint with a resolved API key.
    Llm(LlmConfig),
    /// Deterministic stubs: route to the first role, echo a canned answer,
    /// approve everything.
    Mock,
}

impl Capabilities {
    /// Pick the capability source. The API key comes from the config file,
    /// or from `env_key` (read once by the caller) when the file has none.
    pub fn resolve(config: &LlmConfig, mock: bool, env_key: Option<String>) -> Self {
        if mock {
            return Capabilities::Mock;
        }
        let mut llm = config.clone();
        if llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            llm.api_key = env_key.filter(|k| !k.trim().is_empty());
        }
        if llm.api_key.is_none() {
            tracing::warn!("No LLM API key configured; requests will be sent unauthenticated");
        }
        Capabilities::Llm(llm)
    }
}

type Parts<R> = (Arc<dyn Classifier>, RoleRegistry<R>, Arc<dyn ReviewAgent>);

fn mock_parts<R: Role>() -> Result<Parts<R>, SwitchboardError> {
    let first = R::all()
        .first()
        .ok_or_else(|| SwitchboardError::Config("role alphabet is empty".to_string()))?;
    let registry = RoleRegistry::<R>::complete(|role| {
        Arc::new(StaticRole::new(format!(
            "This is the {} desk. Mock mode is on, so no real answer is available.",
            role.id()
        ))) as Arc<dyn RoleAgent>
    });
    Ok((
        Arc::new(StaticClassifier::new(first.id())),
        registry,
        Arc::new(ApprovingReviewer),
    ))
}

fn llm_parts<R: Role>(config: LlmConfig) -> Result<Parts<R>, SwitchboardError> {
    let model = config.model.clone();
    let backend: Arc<dyn ChatBackend> = Arc::new(
        OpenAiBackend::new(config).map_err(|e| SwitchboardError::Config(e.to_string()))?,
    );
    let registry = RoleRegistry::<R>::complete(|role| {
        Arc::new(LlmRoleAgent::new(role, Arc::clone(&backend))) as Arc<dyn RoleAgent>
    });
    tracing::info!(model = %model, domain = R::domain(), "LLM capabilities ready");
    Ok((
        Arc::new(LlmClassifier::<R>::new(Arc::clone(&backend))),
        registry,
        Arc::new(LlmReviewAgent::for_roles::<R>(backend)),
    ))
}

fn build_for<R: Role>(
    config: &SwitchboardConfig,
    capabilities: Capabilities,
    store: Arc<dyn HistoryStore>,
) -> Result<Arc<dyn ChatEngine>, SwitchboardError> {
    let (classifier, registry, reviewer) = match capabilities {
        Capabilities::Mock => mock_parts::<R>()?,
        Capabilities::Llm(llm) => llm_parts::<R>(llm)?,
    };
    registry
        .ensure_complete()
        .map_err(|e| SwitchboardError::Config(e.to_string()))?;

    let coordinator = Coordinator::new(
        classifier,
        registry,
        reviewer,
        CoordinatorSettings::from(&config.coordinator),
    )
    .map_err(|e| SwitchboardError::Config(e.to_string()))?;

    Ok(Arc::new(ChatService::new(coordinator, store, config.chat.clone())))
}

/// Build the chat engine for `config.general.variant`.
pub fn build_engine(
    config: &SwitchboardConfig,
    capabilities: Capabilities,
    store: Arc<dyn HistoryStore>,
) -> Result<Arc<dyn ChatEngine>, SwitchboardError> {
    match config.general.variant {
        Variant::Support => build_for::<SupportRole>(config, capabilities, store),
        Variant::Travel => build_for::<TravelRole>(config, capabilities, store),
    }
}
