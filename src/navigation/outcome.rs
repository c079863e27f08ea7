//! Outcome events, faults and resolved destinations.

use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A fault raised while executing an operation.
///
/// `kind` names the fault type; `supertypes` lists the broader types it also
/// counts as when a fault filter is matched. Causes are owned, so a chain is
/// always finite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Fault {
    pub kind: String,
    #[serde(default)]
    pub supertypes: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cause: Option<Box<Fault>>,
}

impl Fault {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            supertypes: Vec::new(),
            message: None,
            cause: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_supertype(mut self, kind: impl Into<String>) -> Self {
        self.supertypes.push(kind.into());
        self
    }

    pub fn caused_by(mut self, cause: Fault) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// True if this fault itself is of type `kind`.
    pub fn is_a(&self, kind: &str) -> bool {
        self.kind == kind || self.supertypes.iter().any(|s| s == kind)
    }

    /// This fault followed by each of its causes.
    pub fn chain(&self) -> FaultChain<'_> {
        FaultChain { next: Some(self) }
    }

    /// First fault in the cause chain of type `kind`.
    pub fn find_in_chain(&self, kind: &str) -> Option<&Fault> {
        self.chain().find(|fault| fault.is_a(kind))
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {}", self.kind, message),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl Error for Fault {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn Error + 'static))
    }
}

/// Iterator over a fault and its causes.
#[derive(Debug, Clone)]
pub struct FaultChain<'a> {
    next: Option<&'a Fault>,
}

impl<'a> Iterator for FaultChain<'a> {
    type Item = &'a Fault;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.cause.as_deref();
        Some(current)
    }
}

/// What happened after an operation ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutcomeEvent {
    /// Reference of the action that triggered the outcome.
    pub from_action: Option<String>,
    pub outcome: Option<String>,
    pub fault: Option<Fault>,
}

impl OutcomeEvent {
    pub fn outcome(outcome: impl Into<String>) -> Self {
        Self {
            outcome: Some(outcome.into()),
            ..Self::default()
        }
    }

    pub fn fault(fault: Fault) -> Self {
        Self {
            fault: Some(fault),
            ..Self::default()
        }
    }

    pub fn with_from_action(mut self, action: impl Into<String>) -> Self {
        self.from_action = Some(action.into());
        self
    }

    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = Some(fault);
        self
    }
}

/// Where navigation leads.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Destination {
    /// Location string, returned verbatim.
    pub location: String,
    pub popup: bool,
    /// Fragment identifiers for a partial render, if any.
    pub fragments: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapped() -> Fault {
        Fault::new("RuntimeException")
            .with_message("wrapper")
            .caused_by(Fault::new("IllegalStateException").with_message("bad state"))
    }

    #[test]
    fn test_cause_chain_walk() {
        let fault = wrapped();
        assert_eq!(fault.chain().count(), 2);
        assert_eq!(
            fault.find_in_chain("IllegalStateException").map(|f| f.to_string()),
            Some("IllegalStateException: bad state".to_string())
        );
        assert!(Fault::new("RuntimeException")
            .find_in_chain("IllegalStateException")
            .is_none());
    }

    #[test]
    fn test_supertypes_match() {
        let fault = Fault::new("IllegalStateException").with_supertype("RuntimeException");
        assert!(fault.is_a("RuntimeException"));
        assert!(!Fault::new("RuntimeException").is_a("IllegalStateException"));
    }

    #[test]
    fn test_error_source_follows_cause() {
        let fault = wrapped();
        let source = fault.source().map(|s| s.to_string());
        assert_eq!(source, Some("IllegalStateException: bad state".to_string()));
    }

    #[test]
    fn test_event_from_json() {
        let event: OutcomeEvent = serde_json::from_str(
            r#"{"outcome":"save","fault":{"kind":"RuntimeException","cause":{"kind":"IOException"}}}"#,
        )
        .unwrap();
        assert_eq!(event.outcome.as_deref(), Some("save"));
        assert!(event.from_action.is_none());
        assert!(event.fault.unwrap().find_in_chain("IOException").is_some());
    }
}
