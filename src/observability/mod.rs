//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Resolvers and catalog builders produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters by outcome, scope, catalog kind)
//!
//! Consumers:
//!     → stdout (tracing-subscriber fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Resolution paths only emit debug-level events; warnings are reserved
//!   for declaration mistakes (ambiguity, conflicting navigation targets)
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
