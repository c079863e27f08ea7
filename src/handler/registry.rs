//! Handler registry and catalog cache.
//!
//! # Responsibilities
//! - Own handler and module declarations
//! - Build operation and navigation catalogs on first use, once per handler
//! - Front the route resolver and navigation engine per handler name
//!
//! # Design Decisions
//! - The cache is an explicit object owned by whoever bootstraps the
//!   application, never process-global state
//! - Fill-once: racing first callers may build twice, but only one fully
//!   built `Arc` is ever published per handler
//! - Registration invalidates any catalog already cached for that handler

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::handler::declaration::{DeclarationError, HandlerDeclaration, ModuleDeclaration};
use crate::navigation::catalog::{NavigationCatalog, NavigationEntry};
use crate::navigation::engine::{NavigationEngine, NavigationError, NavigationInvoker};
use crate::navigation::outcome::{Destination, OutcomeEvent};
use crate::observability::metrics;
use crate::routing::catalog::{OperationCatalog, OperationId};
use crate::routing::request::RequestDescriptor;
use crate::routing::resolver::{RouteResolution, RouteResolver, RoutingError};

/// Errors surfaced by registry lookups.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown handler '{0}'")]
    UnknownHandler(String),

    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// A declaration mistake detected while building navigation catalogs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConflict {
    pub handler: String,
    pub operation: OperationId,
}

/// Declarations plus their lazily built catalogs.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerDeclaration>,
    modules: HashMap<String, ModuleDeclaration>,
    resolver: RouteResolver,
    engine: NavigationEngine,
    operation_catalogs: DashMap<String, Arc<OperationCatalog>>,
    navigation_catalogs: DashMap<String, Arc<NavigationCatalog>>,
}

impl HandlerRegistry {
    pub fn new(resolver: RouteResolver) -> Self {
        Self {
            resolver,
            ..Self::default()
        }
    }

    pub fn with_handler(mut self, handler: HandlerDeclaration) -> Self {
        self.register(handler);
        self
    }

    pub fn with_module(mut self, module: ModuleDeclaration) -> Self {
        self.register_module(module);
        self
    }

    /// Add or replace a handler declaration.
    pub fn register(&mut self, handler: HandlerDeclaration) {
        self.operation_catalogs.remove(&handler.name);
        self.navigation_catalogs.remove(&handler.name);
        self.handlers.insert(handler.name.clone(), handler);
    }

    /// Add or replace a module; handlers in it rebuild their navigation.
    pub fn register_module(&mut self, module: ModuleDeclaration) {
        let affected: Vec<String> = self
            .handlers
            .values()
            .filter(|handler| handler.module.as_deref() == Some(module.name.as_str()))
            .map(|handler| handler.name.clone())
            .collect();
        for name in affected {
            self.navigation_catalogs.remove(&name);
        }
        self.modules.insert(module.name.clone(), module);
    }

    pub fn resolver(&self) -> &RouteResolver {
        &self.resolver
    }

    pub fn handler(&self, name: &str) -> Option<&HandlerDeclaration> {
        self.handlers.get(name)
    }

    /// Handler names in sorted order.
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn operation_catalog(&self, name: &str) -> Result<Arc<OperationCatalog>, RegistryError> {
        if let Some(cached) = self.operation_catalogs.get(name) {
            return Ok(cached.value().clone());
        }
        let handler = self.declaration(name)?;
        let built = Arc::new(handler.build_operation_catalog()?);
        tracing::info!(
            handler = %name,
            operations = built.operations().len(),
            routable = built.routes().len(),
            "Built operation catalog"
        );
        metrics::record_catalog_build("operation");
        Ok(self
            .operation_catalogs
            .entry(name.to_string())
            .or_insert(built)
            .value()
            .clone())
    }

    pub fn navigation_catalog(&self, name: &str) -> Result<Arc<NavigationCatalog>, RegistryError> {
        if let Some(cached) = self.navigation_catalogs.get(name) {
            return Ok(cached.value().clone());
        }
        let handler = self.declaration(name)?;
        let operations = self.operation_catalog(name)?;
        let module = handler.module.as_deref().and_then(|module| self.modules.get(module));
        let built = Arc::new(handler.build_navigation_catalog(&operations, module)?);
        for conflict in built.conflicts() {
            tracing::warn!(
                handler = %name,
                owner = %conflict.owner,
                "Navigation rule on a request-mapped operation has no destination"
            );
        }
        tracing::info!(handler = %name, rules = built.len(), "Built navigation catalog");
        metrics::record_catalog_build("navigation");
        Ok(self
            .navigation_catalogs
            .entry(name.to_string())
            .or_insert(built)
            .value()
            .clone())
    }

    /// Build every catalog up front, failing on the first bad declaration.
    pub fn warm(&self) -> Result<(), RegistryError> {
        for name in self.handler_names() {
            self.navigation_catalog(name)?;
        }
        Ok(())
    }

    /// Navigation rules that would raise a conflicting-target error.
    pub fn navigation_conflicts(&self) -> Result<Vec<NavigationConflict>, RegistryError> {
        let mut conflicts = Vec::new();
        for name in self.handler_names() {
            let catalog = self.navigation_catalog(name)?;
            conflicts.extend(
                catalog
                    .conflicts()
                    .into_iter()
                    .filter_map(|entry: &NavigationEntry| entry.owner.operation().cloned())
                    .map(|operation| NavigationConflict {
                        handler: name.to_string(),
                        operation,
                    }),
            );
        }
        Ok(conflicts)
    }

    pub fn resolve_route(
        &self,
        handler: &str,
        request: &RequestDescriptor,
    ) -> Result<RouteResolution, RegistryError> {
        let catalog = self.operation_catalog(handler)?;
        Ok(self.resolver.resolve(&catalog, request)?)
    }

    /// Resolve navigation given the current request's route ordering.
    pub fn navigate(
        &self,
        handler: &str,
        request_order: &[OperationId],
        event: &OutcomeEvent,
        invoker: &dyn NavigationInvoker,
    ) -> Result<Option<Destination>, RegistryError> {
        let catalog = self.navigation_catalog(handler)?;
        Ok(self.engine.resolve(&catalog, request_order, event, invoker)?)
    }

    /// Resolve the request's route, then navigate with that ordering.
    pub fn navigate_request(
        &self,
        handler: &str,
        request: &RequestDescriptor,
        event: &OutcomeEvent,
        invoker: &dyn NavigationInvoker,
    ) -> Result<Option<Destination>, RegistryError> {
        let resolution = self.resolve_route(handler, request)?;
        self.navigate(handler, &resolution.operation_ids(), event, invoker)
    }

    fn declaration(&self, name: &str) -> Result<&HandlerDeclaration, RegistryError> {
        self.handlers
            .get(name)
            .ok_or_else(|| RegistryError::UnknownHandler(name.to_string()))
    }
}
