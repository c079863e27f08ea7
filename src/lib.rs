//! Outcome Router Library
//!
//! Resolves requests to handler operations and outcomes to navigation
//! destinations, from explicit handler declarations.

pub mod config;
pub mod handler;
pub mod http;
pub mod navigation;
pub mod observability;
pub mod routing;

pub use config::schema::AppConfig;
pub use handler::{HandlerDeclaration, HandlerRegistry, ModuleDeclaration, OperationDeclaration};
pub use http::InspectorServer;
pub use navigation::{Destination, NavigationEngine, NavigationRule, OutcomeEvent};
pub use routing::{RequestDescriptor, RouteResolution, RouteResolver};
