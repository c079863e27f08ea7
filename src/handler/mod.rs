//! Handler declarations and the catalog registry.
//!
//! # Data Flow
//! ```text
//! HandlerDeclaration ──build──► OperationCatalog ──► RouteResolver
//!        │                             │
//!        └──────────build──────► NavigationCatalog ──► NavigationEngine
//!                                      ▲
//! ModuleDeclaration ───────────────────┘
//! ```
//!
//! `HandlerRegistry` owns the declarations and caches each catalog after
//! its first build.

pub mod declaration;
pub mod registry;

pub use declaration::{
    DeclarationError, HandlerDeclaration, Mapping, ModuleDeclaration, OperationDeclaration,
};
pub use registry::{HandlerRegistry, NavigationConflict, RegistryError};
