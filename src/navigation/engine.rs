//! Navigation rule evaluation.
//!
//! # Responsibilities
//! - Walk a catalog's rules in priority order and pick the first match
//! - Turn the winning rule into a destination, invoking the owning
//!   operation when the destination is computed
//!
//! # Design Decisions
//! - First match wins; there is no best-match scoring
//! - Invoker failures propagate unchanged and are never retried
//! - A computed destination that yields nothing falls back to the literal
//!   destination, and otherwise lets the search continue

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::navigation::catalog::{NavigationCatalog, NavigationEntry};
use crate::navigation::outcome::{Destination, OutcomeEvent};
use crate::navigation::rule::NavigationRule;
use crate::observability::metrics;
use crate::routing::catalog::OperationId;

/// Failure raised by a navigation invoker.
///
/// Display and source are the wrapped error's own; `into_inner` returns it.
#[derive(Debug)]
pub struct InvocationError {
    inner: Box<dyn Error + Send + Sync + 'static>,
}

impl InvocationError {
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self { inner: error.into() }
    }

    pub fn get_ref(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    pub fn into_inner(self) -> Box<dyn Error + Send + Sync + 'static> {
        self.inner
    }
}

impl fmt::Display for InvocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl Error for InvocationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }
}

/// Errors raised while resolving navigation.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error(
        "navigation rule on {operation} declares no destination, but the operation is also \
         request-mapped; declare a literal destination or move the rule to a navigation-only operation"
    )]
    ConflictingNavigationTarget { operation: OperationId },

    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

/// Argument kinds a computed-destination operation may declare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentKind {
    Outcome,
    Event,
    Rule,
    /// Anything else, by declared type name.
    Other(String),
}

/// A resolved argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationArgument<'a> {
    Outcome(Option<&'a str>),
    Event(&'a OutcomeEvent),
    Rule(&'a NavigationRule),
    Value(Option<serde_json::Value>),
}

/// Generic argument resolution for kinds the engine does not know.
pub trait ArgumentResolver {
    fn resolve(
        &self,
        type_name: &str,
        context: &InvocationContext<'_>,
    ) -> Result<Option<serde_json::Value>, InvocationError>;
}

/// Everything an invoker may need to call a computed-destination operation.
#[derive(Debug, Clone, Copy)]
pub struct InvocationContext<'a> {
    /// Handler type owning the operation (the target instance).
    pub handler: &'a str,
    pub operation: &'a OperationId,
    pub event: &'a OutcomeEvent,
    pub rule: &'a NavigationRule,
}

impl<'a> InvocationContext<'a> {
    pub fn outcome(&self) -> Option<&'a str> {
        self.event.outcome.as_deref()
    }

    /// Resolve one declared argument by kind.
    pub fn resolve_argument(
        &self,
        kind: &ArgumentKind,
        fallback: &dyn ArgumentResolver,
    ) -> Result<NavigationArgument<'a>, InvocationError> {
        Ok(match kind {
            ArgumentKind::Outcome => NavigationArgument::Outcome(self.outcome()),
            ArgumentKind::Event => NavigationArgument::Event(self.event),
            ArgumentKind::Rule => NavigationArgument::Rule(self.rule),
            ArgumentKind::Other(type_name) => NavigationArgument::Value(fallback.resolve(type_name, self)?),
        })
    }
}

/// Invokes operations that compute navigation destinations.
pub trait NavigationInvoker {
    /// Returns the destination, or `None` when the operation produced none.
    fn invoke(&self, context: &InvocationContext<'_>) -> Result<Option<String>, InvocationError>;
}

/// Invoker that never produces a destination, so literal fallbacks apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunInvoker;

impl NavigationInvoker for DryRunInvoker {
    fn invoke(&self, context: &InvocationContext<'_>) -> Result<Option<String>, InvocationError> {
        tracing::debug!(operation = %context.operation, "Skipping computed destination (dry run)");
        Ok(None)
    }
}

type ContextFn =
    Box<dyn Fn(&InvocationContext<'_>) -> Result<Option<String>, InvocationError> + Send + Sync>;
type ArgumentsFn =
    Box<dyn for<'a> Fn(&[NavigationArgument<'a>]) -> Result<Option<String>, InvocationError> + Send + Sync>;

enum Registered {
    Context(ContextFn),
    Arguments { kinds: Vec<ArgumentKind>, f: ArgumentsFn },
}

/// Rejects every argument kind it is asked for.
struct Unresolved;

impl ArgumentResolver for Unresolved {
    fn resolve(
        &self,
        type_name: &str,
        context: &InvocationContext<'_>,
    ) -> Result<Option<serde_json::Value>, InvocationError> {
        Err(InvocationError::new(format!(
            "no argument resolver for '{type_name}' declared by {}",
            context.operation
        )))
    }
}

/// Closure-backed invoker keyed by operation identity.
#[derive(Default)]
pub struct OperationTable {
    operations: HashMap<OperationId, Registered>,
    arguments: Option<Arc<dyn ArgumentResolver + Send + Sync>>,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation that reads the invocation context directly.
    pub fn register<F>(mut self, operation: OperationId, f: F) -> Self
    where
        F: Fn(&InvocationContext<'_>) -> Result<Option<String>, InvocationError> + Send + Sync + 'static,
    {
        self.operations.insert(operation, Registered::Context(Box::new(f)));
        self
    }

    /// Register an operation with declared parameters, resolved by kind on
    /// each call and passed in declaration order.
    pub fn register_with_arguments<F>(mut self, operation: OperationId, kinds: Vec<ArgumentKind>, f: F) -> Self
    where
        F: for<'a> Fn(&[NavigationArgument<'a>]) -> Result<Option<String>, InvocationError>
            + Send
            + Sync
            + 'static,
    {
        self.operations
            .insert(operation, Registered::Arguments { kinds, f: Box::new(f) });
        self
    }

    /// Resolver for `ArgumentKind::Other` parameters.
    pub fn with_argument_resolver(mut self, resolver: Arc<dyn ArgumentResolver + Send + Sync>) -> Self {
        self.arguments = Some(resolver);
        self
    }
}

impl fmt::Debug for OperationTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationTable")
            .field("operations", &self.operations.keys().collect::<Vec<_>>())
            .field("argument_resolver", &self.arguments.is_some())
            .finish()
    }
}

impl NavigationInvoker for OperationTable {
    fn invoke(&self, context: &InvocationContext<'_>) -> Result<Option<String>, InvocationError> {
        match self.operations.get(context.operation) {
            Some(Registered::Context(f)) => f(context),
            Some(Registered::Arguments { kinds, f }) => {
                let fallback: &dyn ArgumentResolver = match &self.arguments {
                    Some(resolver) => resolver.as_ref(),
                    None => &Unresolved,
                };
                let arguments = kinds
                    .iter()
                    .map(|kind| context.resolve_argument(kind, fallback))
                    .collect::<Result<Vec<_>, _>>()?;
                f(&arguments)
            }
            None => Err(InvocationError::new(format!(
                "no implementation registered for {}",
                context.operation
            ))),
        }
    }
}

/// Stateless navigation rule engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct NavigationEngine;

impl NavigationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `event` to a destination, or `None` for "no navigation".
    ///
    /// `request_order` is the route resolver's ordering of operations for the
    /// current request.
    pub fn resolve(
        &self,
        catalog: &NavigationCatalog,
        request_order: &[OperationId],
        event: &OutcomeEvent,
        invoker: &dyn NavigationInvoker,
    ) -> Result<Option<Destination>, NavigationError> {
        for entry in catalog.rules_in_priority_order(request_order) {
            if !entry.rule.accepts(&entry.owner, event) {
                continue;
            }
            if let Some(destination) = self.destination(catalog, entry, event, invoker)? {
                tracing::debug!(
                    handler = %catalog.handler(),
                    scope = %entry.scope(),
                    owner = %entry.owner,
                    location = %destination.location,
                    "Navigation rule matched"
                );
                metrics::record_navigation(entry.scope().as_str());
                return Ok(Some(destination));
            }
        }

        tracing::debug!(
            handler = %catalog.handler(),
            outcome = ?event.outcome,
            "No navigation rule matched"
        );
        metrics::record_navigation("none");
        Ok(None)
    }

    fn destination(
        &self,
        catalog: &NavigationCatalog,
        entry: &NavigationEntry,
        event: &OutcomeEvent,
        invoker: &dyn NavigationInvoker,
    ) -> Result<Option<Destination>, NavigationError> {
        let rule = entry.rule.as_ref();
        if let Some(operation) = entry.owner.operation() {
            if catalog.is_routable(operation) && rule.to.is_none() {
                tracing::warn!(operation = %operation, "Conflicting navigation target");
                metrics::record_navigation_conflict();
                return Err(NavigationError::ConflictingNavigationTarget {
                    operation: operation.clone(),
                });
            }
        }

        let location = match &entry.computed_via {
            Some(operation) => {
                let context = InvocationContext {
                    handler: catalog.handler(),
                    operation,
                    event,
                    rule,
                };
                match invoker.invoke(&context)? {
                    Some(computed) => Some(computed),
                    None => rule.to.clone(),
                }
            }
            None => rule.to.clone(),
        };

        Ok(location.map(|location| Destination {
            location,
            popup: rule.popup,
            fragments: rule.fragments.clone(),
        }))
    }
}
