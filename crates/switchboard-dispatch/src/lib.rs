//! Dispatch engine for Switchboard.
//!
//! Classifies a conversation into a role, dispatches to that role's agent,
//! sends the candidate answer to a reviewer, and either terminates or
//! routes again, all under a validated transition table.

pub mod capability;
pub mod coordinator;
pub mod error;
pub mod machine;
pub mod mock;
pub mod registry;
pub mod role;
pub mod state;

pub use capability::{
    Classifier, Directive, ReviewAgent, ReviewDecision, RoleAgent, Route, RoutingDecision,
    Verdict, TERMINAL_SENTINEL,
};
pub use coordinator::{Coordinator, CoordinatorSettings, RunOutcome, Termination};
pub use error::{CapabilityError, RunError};
pub use machine::{validate_transition, Stage};
pub use registry::RoleRegistry;
pub use role::{Role, SupportRole, TravelRole};
pub use state::{ConversationState, Target};
