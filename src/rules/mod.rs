//! Rule administration.
//!
//! Rules live on the server. The client creates them, lists them and
//! replaces the active set, each through its own short-lived channel.

mod error;

pub use error::RuleError;

use std::time::Duration;

use crate::exchange::{exchange, fire_and_forget};
use crate::protocol::{
    ClientMessage, NewRule, Opcode, RuleDescriptor, RuleListing, ServerMessage, MAX_ACTIVE_RULES,
};
use crate::transport::Connector;

/// Client for the rule administration messages.
#[derive(Debug, Clone)]
pub struct RuleAdmin<C: Connector> {
    connector: C,
    timeout: Option<Duration>,
}

impl<C: Connector> RuleAdmin<C> {
    /// Responses are awaited without a time limit.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create a rule under a random id. Returns the id the server reports.
    ///
    /// Ids are drawn uniformly over the whole `u64` range; collisions are
    /// not checked.
    pub async fn create_rule(
        &self,
        descriptor: RuleDescriptor,
        label: impl Into<String>,
    ) -> Result<u64, RuleError> {
        self.create_rule_with_id(rand::random(), descriptor, label)
            .await
    }

    pub async fn create_rule_with_id(
        &self,
        id: u64,
        descriptor: RuleDescriptor,
        label: impl Into<String>,
    ) -> Result<u64, RuleError> {
        let rule = NewRule {
            id,
            descriptor,
            label: label.into(),
        };
        tracing::debug!(id, label = %rule.label, pattern = %rule.descriptor.pattern_lossy(), "Creating rule");

        match exchange(
            &self.connector,
            &ClientMessage::CreateRule(rule),
            Opcode::CreateRule,
            self.timeout,
        )
        .await?
        {
            ServerMessage::RuleCreated { id: created } => {
                if created != id {
                    tracing::warn!(requested = id, created, "Server assigned a different rule id");
                }
                tracing::info!(id = created, "Rule created");
                Ok(created)
            }
            other => Err(RuleError::UnexpectedResponse(other.opcode().as_u8())),
        }
    }

    pub async fn list_rules(&self) -> Result<Vec<RuleListing>, RuleError> {
        match exchange(&self.connector, &ClientMessage::GetRules, Opcode::GetRules, self.timeout).await? {
            ServerMessage::Rules(rules) => {
                tracing::debug!(count = rules.len(), "Rules listed");
                Ok(rules)
            }
            other => Err(RuleError::UnexpectedResponse(other.opcode().as_u8())),
        }
    }

    /// Replace the server's active set with `ids`.
    ///
    /// The server does not acknowledge this message, so success only means
    /// the request was sent.
    pub async fn set_active_rules(&self, ids: &[u64]) -> Result<(), RuleError> {
        if ids.len() > MAX_ACTIVE_RULES {
            return Err(RuleError::TooManyRules {
                count: ids.len(),
                max: MAX_ACTIVE_RULES,
            });
        }

        fire_and_forget(&self.connector, &ClientMessage::SetActiveRules(ids.to_vec())).await?;
        tracing::info!(count = ids.len(), "Active rule set sent");
        Ok(())
    }
}
