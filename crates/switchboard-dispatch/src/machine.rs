//! Coordinator state machine with validated transitions.
//!
//! Route -> Role(x) -> Review -> Final, with Route -> Final when the
//! classifier ends the conversation and Review -> Route when a rejection
//! is folded back into history.

use std::fmt;

use crate::error::RunError;
use crate::role::Role;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage<R> {
    Route,
    Role(R),
    Review,
    Final,
}

impl<R: Role> Stage<R> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Final)
    }
}

impl<R: Role> fmt::Display for Stage<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Route => write!(f, "route"),
            Stage::Role(role) => write!(f, "role({})", role.id()),
            Stage::Review => write!(f, "review"),
            Stage::Final => write!(f, "final"),
        }
    }
}

/// Validate that a stage transition is allowed.
///
/// Valid transitions:
/// - Route -> Role(any)
/// - Route -> Final (classifier signalled completion)
/// - Role(any) -> Review
/// - Review -> Final
/// - Review -> Route (rejection under the reroute policy)
pub fn validate_transition<R: Role>(from: Stage<R>, to: Stage<R>) -> Result<(), RunError> {
    let valid = matches!(
        (from, to),
        (Stage::Route, Stage::Role(_))
            | (Stage::Route, Stage::Final)
            | (Stage::Role(_), Stage::Review)
            | (Stage::Review, Stage::Final)
            | (Stage::Review, Stage::Route)
    );

    if valid {
        Ok(())
    } else {
        Err(RunError::InvalidTransition(from.to_string(), to.to_string()))
    }
}
