//! Declarative navigation rules.
//!
//! # Responsibilities
//! - Model where a rule was declared (operation, type, module)
//! - Decide whether a rule accepts an outcome event
//!
//! # Design Decisions
//! - Acceptance is three independent checks: outcome, from-action, fault
//! - `on = ["*"]` accepts every outcome; `on = []` accepts the owning
//!   operation's own name, or any outcome when the rule filters on a fault
//! - A rule without a fault filter never matches a faulted event

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::navigation::outcome::OutcomeEvent;
use crate::routing::catalog::OperationId;

/// Sentinel outcome accepting anything.
pub const ANY_OUTCOME: &str = "*";

/// Declaration level of a rule; also its search priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationScope {
    Method,
    Type,
    Module,
}

impl NavigationScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigationScope::Method => "method",
            NavigationScope::Type => "type",
            NavigationScope::Module => "module",
        }
    }
}

impl fmt::Display for NavigationScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The owner a rule is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleOwner {
    Operation(OperationId),
    Type(Arc<str>),
    Module(Arc<str>),
}

impl RuleOwner {
    pub fn scope(&self) -> NavigationScope {
        match self {
            RuleOwner::Operation(_) => NavigationScope::Method,
            RuleOwner::Type(_) => NavigationScope::Type,
            RuleOwner::Module(_) => NavigationScope::Module,
        }
    }

    pub fn operation(&self) -> Option<&OperationId> {
        match self {
            RuleOwner::Operation(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for RuleOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOwner::Operation(id) => write!(f, "{}", id),
            RuleOwner::Type(name) | RuleOwner::Module(name) => write!(f, "{}", name),
        }
    }
}

/// Outcome names a rule accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptedOutcomes {
    Any,
    Named(Vec<String>),
    /// Declared empty: the owning operation's name is the outcome.
    OwnerName,
}

impl AcceptedOutcomes {
    pub fn from_declared<I, S>(on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = on.into_iter().map(Into::into).collect();
        if names.is_empty() {
            AcceptedOutcomes::OwnerName
        } else if names.iter().any(|name| name == ANY_OUTCOME) {
            AcceptedOutcomes::Any
        } else {
            AcceptedOutcomes::Named(names)
        }
    }
}

/// A single condition-to-destination mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRule {
    pub accepted: AcceptedOutcomes,
    /// Exact action reference required, if any.
    pub from_action: Option<String>,
    /// Fault type required somewhere in the event's cause chain, if any.
    pub fault: Option<String>,
    /// Literal destination; the fallback when a computed one yields nothing.
    pub to: Option<String>,
    pub popup: bool,
    pub fragments: Vec<String>,
}

impl NavigationRule {
    pub fn on<I, S>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted: AcceptedOutcomes::from_declared(outcomes),
            from_action: None,
            fault: None,
            to: None,
            popup: false,
            fragments: Vec::new(),
        }
    }

    pub fn on_any() -> Self {
        Self::on([ANY_OUTCOME])
    }

    /// Accept outcomes named after the owning operation.
    pub fn on_owner_name() -> Self {
        Self::on(Vec::<String>::new())
    }

    pub fn on_fault(kind: impl Into<String>) -> Self {
        Self::on_owner_name().with_fault(kind)
    }

    pub fn with_fault(mut self, kind: impl Into<String>) -> Self {
        self.fault = Some(kind.into());
        self
    }

    pub fn from_action(mut self, action: impl Into<String>) -> Self {
        self.from_action = Some(action.into());
        self
    }

    pub fn to(mut self, destination: impl Into<String>) -> Self {
        self.to = Some(destination.into());
        self
    }

    pub fn popup(mut self, popup: bool) -> Self {
        self.popup = popup;
        self
    }

    pub fn fragments<I, S>(mut self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fragments = fragments.into_iter().map(Into::into).collect();
        self
    }

    /// True when the rule's `on` list was left empty outside method scope
    /// without a fault filter, so it can never accept anything.
    pub fn is_unreachable_at(&self, scope: NavigationScope) -> bool {
        self.accepted == AcceptedOutcomes::OwnerName
            && self.fault.is_none()
            && scope != NavigationScope::Method
    }

    /// Evaluate all three acceptance checks against `event`.
    pub fn accepts(&self, owner: &RuleOwner, event: &OutcomeEvent) -> bool {
        self.accepts_outcome(owner, event.outcome.as_deref())
            && self.accepts_action(event.from_action.as_deref())
            && self.accepts_fault(event)
    }

    fn accepts_outcome(&self, owner: &RuleOwner, outcome: Option<&str>) -> bool {
        match &self.accepted {
            AcceptedOutcomes::Any => true,
            AcceptedOutcomes::Named(names) => {
                outcome.is_some_and(|outcome| names.iter().any(|name| name == outcome))
            }
            AcceptedOutcomes::OwnerName if self.fault.is_some() => true,
            AcceptedOutcomes::OwnerName => match (owner, outcome) {
                (RuleOwner::Operation(id), Some(outcome)) => id.name() == outcome,
                _ => false,
            },
        }
    }

    fn accepts_action(&self, from_action: Option<&str>) -> bool {
        match &self.from_action {
            None => true,
            Some(required) => from_action == Some(required.as_str()),
        }
    }

    fn accepts_fault(&self, event: &OutcomeEvent) -> bool {
        match (&self.fault, &event.fault) {
            (None, None) => true,
            (Some(filter), Some(fault)) => fault.find_in_chain(filter).is_some(),
            _ => false,
        }
    }
}
