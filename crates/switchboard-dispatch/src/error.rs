//! Error types for the dispatch engine.

use switchboard_core::error::SwitchboardError;

/// Errors returned by an external capability call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("timed out after {0} seconds")]
    Timeout(u64),
    #[error("upstream rejected the request: {0}")]
    Upstream(String),
    #[error("malformed output: {0}")]
    Malformed(String),
}

/// Errors that abort a coordinator run.
///
/// None of these leave a partial answer behind: the caller gets the error
/// and nothing else.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("contract violation by {component}: {detail}")]
    ContractViolation {
        component: &'static str,
        detail: String,
    },
    #[error("{component} call failed: {source}")]
    CapabilityFailure {
        component: &'static str,
        #[source]
        source: CapabilityError,
    },
    #[error("invalid state transition: {0} -> {1}")]
    InvalidTransition(String, String),
    #[error("run did not terminate within {0} steps")]
    StepLimit(u32),
    #[error("request must not be empty")]
    EmptyRequest,
    #[error("coordinator misconfigured: {0}")]
    Configuration(String),
}

impl RunError {
    /// Classify a failed capability call. Malformed structured output is a
    /// contract violation; everything else is a capability failure.
    pub fn from_capability(component: &'static str, err: CapabilityError) -> Self {
        match err {
            CapabilityError::Malformed(detail) => RunError::ContractViolation { component, detail },
            source => RunError::CapabilityFailure { component, source },
        }
    }

    pub fn contract(component: &'static str, detail: impl Into<String>) -> Self {
        RunError::ContractViolation {
            component,
            detail: detail.into(),
        }
    }

    pub fn is_contract_violation(&self) -> bool {
        matches!(self, RunError::ContractViolation { .. })
    }

    pub fn is_capability_failure(&self) -> bool {
        matches!(self, RunError::CapabilityFailure { .. })
    }
}

impl From<RunError> for SwitchboardError {
    fn from(err: RunError) -> Self {
        SwitchboardError::Capability(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_error_display() {
        assert_eq!(
            CapabilityError::Transport("connection reset".into()).to_string(),
            "transport error: connection reset"
        );
        assert_eq!(CapabilityError::Timeout(30).to_string(), "timed out after 30 seconds");
        assert_eq!(
            CapabilityError::Malformed("missing field `next`".into()).to_string(),
            "malformed output: missing field `next`"
        );
    }

    #[test]
    fn test_malformed_maps_to_contract_violation() {
        let err = RunError::from_capability(
            "classifier",
            CapabilityError::Malformed("not json".into()),
        );
        assert!(err.is_contract_violation());
        assert_eq!(err.to_string(), "contract violation by classifier: not json");
    }

    #[test]
    fn test_transport_maps_to_capability_failure() {
        let err = RunError::from_capability("reviewer", CapabilityError::Timeout(5));
        assert!(err.is_capability_failure());
        assert_eq!(err.to_string(), "reviewer call failed: timed out after 5 seconds");

        let err = RunError::from_capability("billing", CapabilityError::Upstream("429".into()));
        assert!(err.is_capability_failure());
    }

    #[test]
    fn test_run_error_display() {
        assert_eq!(
            RunError::InvalidTransition("review".into(), "role(billing)".into()).to_string(),
            "invalid state transition: review -> role(billing)"
        );
        assert_eq!(
            RunError::StepLimit(16).to_string(),
            "run did not terminate within 16 steps"
        );
        assert_eq!(RunError::EmptyRequest.to_string(), "request must not be empty");
    }

    #[test]
    fn test_into_switchboard_error() {
        let err: SwitchboardError = RunError::contract("classifier", "unknown role `sales`").into();
        assert!(matches!(err, SwitchboardError::Capability(_)));
        assert!(err.to_string().contains("sales"));
    }
}
