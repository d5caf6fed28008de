//! Role registry: the fixed mapping from role to agent.
//!
//! Built once at startup and immutable during a run. Its key set is the
//! legal alphabet for classifier targets.

use std::collections::HashMap;
use std::sync::Arc;

use crate::capability::RoleAgent;
use crate::error::RunError;
use crate::role::Role;

/// Registry of role agents keyed by role.
pub struct RoleRegistry<R: Role> {
    agents: HashMap<R, Arc<dyn RoleAgent>>,
}

impl<R: Role> RoleRegistry<R> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    /// Build a registry covering every role of the alphabet.
    pub fn complete(mut factory: impl FnMut(R) -> Arc<dyn RoleAgent>) -> Self {
        let mut registry = Self::new();
        for role in R::all() {
            registry.register(*role, factory(*role));
        }
        registry
    }

    /// Register an agent, returning the one it replaced.
    pub fn register(&mut self, role: R, agent: Arc<dyn RoleAgent>) -> Option<Arc<dyn RoleAgent>> {
        self.agents.insert(role, agent)
    }

    pub fn get(&self, role: R) -> Option<&Arc<dyn RoleAgent>> {
        self.agents.get(&role)
    }

    pub fn contains(&self, role: R) -> bool {
        self.agents.contains_key(&role)
    }

    /// Registered roles, in alphabet order.
    pub fn roles(&self) -> Vec<R> {
        R::all()
            .iter()
            .copied()
            .filter(|role| self.agents.contains_key(role))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Check that every role of the alphabet has an agent.
    pub fn ensure_complete(&self) -> Result<(), RunError> {
        let missing: Vec<&str> = R::all()
            .iter()
            .filter(|role| !self.agents.contains_key(role))
            .map(|role| role.id())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RunError::Configuration(format!(
                "no agent registered for: {}",
                missing.join(", ")
            )))
        }
    }

    /// Resolve a classifier target to a registered role.
    ///
    /// Unknown identifiers and known-but-unregistered roles are both
    /// contract violations; there is no fallback role.
    pub fn resolve(&self, target: &str) -> Result<R, RunError> {
        let role = R::parse(target).ok_or_else(|| {
            RunError::contract("classifier", format!("unknown role `{}`", target))
        })?;
        if !self.contains(role) {
            return Err(RunError::contract(
                "classifier",
                format!("role `{}` is not registered", role),
            ));
        }
        Ok(role)
    }
}

impl<R: Role> Default for RoleRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}
