//! Navigation subsystem.
//!
//! # Data Flow
//! ```text
//! Outcome event (outcome name, from-action, fault)
//!     → catalog.rs (rules in priority order for the current request:
//!                   matched operations → navigation-only operations
//!                   → handler type → enclosing module)
//!     → rule.rs (outcome / from-action / fault acceptance)
//!     → engine.rs (first accepted rule → literal or computed destination)
//!     → Return: Destination or "no navigation"
//! ```
//!
//! # Design Decisions
//! - Catalogs are built once per handler type and never mutated
//! - First match wins, scanning scopes from narrowest to widest
//! - Declaration mistakes fail fast instead of invoking routed operations

pub mod catalog;
pub mod engine;
pub mod outcome;
pub mod rule;

pub use catalog::{NavigationCatalog, NavigationEntry};
pub use engine::{
    ArgumentKind, ArgumentResolver, DryRunInvoker, InvocationContext, InvocationError,
    NavigationArgument, NavigationEngine, NavigationError, NavigationInvoker, OperationTable,
};
pub use outcome::{Destination, Fault, OutcomeEvent};
pub use rule::{AcceptedOutcomes, NavigationRule, NavigationScope, RuleOwner, ANY_OUTCOME};
