//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, verb, parameters)
//!     → request.rs (RequestDescriptor)
//!     → resolver.rs (test each routable operation of the catalog)
//!         → matcher.rs (Ant-style path patterns)
//!         → params.rs (presence / absence / value predicates)
//!     → Return: ordered RouteResolution or AmbiguousMapping
//!
//! Catalog compilation (once per handler type):
//!     HandlerDeclaration
//!     → catalog.rs (classify operations, effective mapping keys)
//!     → Freeze as immutable OperationCatalog
//! ```
//!
//! # Design Decisions
//! - Catalogs are immutable; resolution is a pure read
//! - Deterministic: same input always yields the same ordering
//! - Most specific match first; the full list stays available to callers

pub mod catalog;
pub mod matcher;
pub mod params;
pub mod request;
pub mod resolver;

pub use catalog::{OperationCatalog, OperationId, OperationKind, OperationSpec, TypeLevelDefaults};
pub use matcher::PathMatcher;
pub use params::ParamPredicate;
pub use request::{RequestDescriptor, RequestParams};
pub use resolver::{
    OperationNameResolver, ParameterNameResolver, PathTailNameResolver, RouteMatch, RouteResolution,
    RouteResolver, RoutingError,
};
