//! Explicit handler declarations.
//!
//! Handlers enumerate their operations, routing constraints and navigation
//! rules through these builders; catalogs are compiled from them.

use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::navigation::catalog::NavigationCatalog;
use crate::navigation::rule::{NavigationRule, NavigationScope};
use crate::routing::catalog::{OperationCatalog, OperationId, OperationKind, OperationSpec, TypeLevelDefaults};
use crate::routing::matcher::{validate_pattern, PatternError};
use crate::routing::params::{parse_predicates, ParamError};

/// Errors raised when compiling declarations into catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    #[error("invalid path on {owner}: {source}")]
    Pattern {
        owner: String,
        #[source]
        source: PatternError,
    },

    #[error("invalid parameter predicate on {owner}: {source}")]
    Param {
        owner: String,
        #[source]
        source: ParamError,
    },

    #[error("navigation rule on {owner} ({scope} scope) has an empty 'on' list and no fault filter")]
    UnreachableRule { owner: String, scope: NavigationScope },
}

/// Routing constraints shared by one element (type or operation).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    pub paths: Vec<String>,
    pub methods: Vec<Method>,
    pub params: Vec<String>,
}

impl Mapping {
    fn compile(&self, owner: &str) -> Result<TypeLevelDefaults, DeclarationError> {
        for path in &self.paths {
            validate_pattern(path).map_err(|source| DeclarationError::Pattern {
                owner: owner.to_string(),
                source,
            })?;
        }
        let params = parse_predicates(&self.params).map_err(|source| DeclarationError::Param {
            owner: owner.to_string(),
            source,
        })?;
        Ok(TypeLevelDefaults {
            paths: self.paths.clone(),
            methods: self.methods.clone(),
            params,
        })
    }
}

/// One operation of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDeclaration {
    pub name: String,
    pub kind: OperationKind,
    pub mapping: Mapping,
    pub navigation: Vec<NavigationRule>,
}

impl OperationDeclaration {
    pub fn new(name: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            name: name.into(),
            kind,
            mapping: Mapping::default(),
            navigation: Vec::new(),
        }
    }

    pub fn route(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Route)
    }

    pub fn pre_bind(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::PreBind)
    }

    pub fn model_producer(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::ModelProducer)
    }

    pub fn navigation_only(name: impl Into<String>) -> Self {
        Self::new(name, OperationKind::Navigation)
    }

    pub fn path(mut self, pattern: impl Into<String>) -> Self {
        self.mapping.paths.push(pattern.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.mapping.methods.push(method);
        self
    }

    pub fn param(mut self, predicate: impl Into<String>) -> Self {
        self.mapping.params.push(predicate.into());
        self
    }

    pub fn rule(mut self, rule: NavigationRule) -> Self {
        self.navigation.push(rule);
        self
    }
}

/// A handler type with its operations and type-level declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerDeclaration {
    pub name: String,
    pub module: Option<String>,
    pub mapping: Mapping,
    pub navigation: Vec<NavigationRule>,
    pub operations: Vec<OperationDeclaration>,
}

impl HandlerDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            mapping: Mapping::default(),
            navigation: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn type_mapping(mut self, mapping: Mapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn rule(mut self, rule: NavigationRule) -> Self {
        self.navigation.push(rule);
        self
    }

    pub fn operation(mut self, operation: OperationDeclaration) -> Self {
        self.operations.push(operation);
        self
    }

    /// Identity of the operation at declaration index `ordinal`.
    pub fn operation_id(&self, ordinal: usize) -> Option<OperationId> {
        self.operations
            .get(ordinal)
            .map(|operation| OperationId::new(self.name.as_str(), operation.name.as_str(), ordinal))
    }

    /// Identities of every operation declared under `name`.
    pub fn operation_ids_named(&self, name: &str) -> Vec<OperationId> {
        self.operations
            .iter()
            .enumerate()
            .filter(|(_, operation)| operation.name == name)
            .map(|(ordinal, operation)| OperationId::new(self.name.as_str(), operation.name.as_str(), ordinal))
            .collect()
    }

    pub fn build_operation_catalog(&self) -> Result<OperationCatalog, DeclarationError> {
        let handler: Arc<str> = Arc::from(self.name.as_str());
        let defaults = self.mapping.compile(&self.name)?;
        let mut specs = Vec::with_capacity(self.operations.len());
        for (ordinal, operation) in self.operations.iter().enumerate() {
            let id = OperationId::new(handler.clone(), operation.name.as_str(), ordinal);
            let compiled = operation.mapping.compile(&id.to_string())?;
            specs.push(OperationSpec {
                id,
                kind: operation.kind,
                paths: compiled.paths,
                methods: compiled.methods,
                params: compiled.params,
            });
        }
        Ok(OperationCatalog::new(handler, defaults, specs))
    }

    pub fn build_navigation_catalog(
        &self,
        operations: &OperationCatalog,
        module: Option<&ModuleDeclaration>,
    ) -> Result<NavigationCatalog, DeclarationError> {
        check_reachable(&self.name, NavigationScope::Type, &self.navigation)?;
        if let Some(module) = module {
            check_reachable(&module.name, NavigationScope::Module, &module.navigation)?;
        }

        let operation_rules = self
            .operations
            .iter()
            .enumerate()
            .map(|(ordinal, operation)| {
                (
                    OperationId::new(self.name.as_str(), operation.name.as_str(), ordinal),
                    operation.navigation.clone(),
                )
            })
            .collect();
        let module_rules =
            module.map(|module| (Arc::from(module.name.as_str()), module.navigation.clone()));

        Ok(NavigationCatalog::new(
            operations,
            operation_rules,
            self.navigation.clone(),
            module_rules,
        ))
    }
}

fn check_reachable(
    owner: &str,
    scope: NavigationScope,
    rules: &[NavigationRule],
) -> Result<(), DeclarationError> {
    match rules.iter().find(|rule| rule.is_unreachable_at(scope)) {
        Some(_) => Err(DeclarationError::UnreachableRule {
            owner: owner.to_string(),
            scope,
        }),
        None => Ok(()),
    }
}

/// Module-level navigation rules shared by every handler in the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDeclaration {
    pub name: String,
    pub navigation: Vec<NavigationRule>,
}

impl ModuleDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            navigation: Vec::new(),
        }
    }

    pub fn rule(mut self, rule: NavigationRule) -> Self {
        self.navigation.push(rule);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_catalog_from_declaration() {
        let handler = HandlerDeclaration::new("Orders")
            .type_mapping(Mapping {
                paths: vec!["/orders/**".into()],
                methods: vec![Method::GET],
                params: vec![],
            })
            .operation(OperationDeclaration::route("list").path("/orders/list").param("page"))
            .operation(OperationDeclaration::pre_bind("initBinder"))
            .operation(OperationDeclaration::model_producer("categories"));

        let catalog = handler.build_operation_catalog().unwrap();
        assert_eq!(catalog.routable_operations().count(), 1);
        assert_eq!(catalog.type_level_defaults().methods, vec![Method::GET]);
        assert_eq!(
            catalog.operation(&handler.operation_id(0).unwrap()).unwrap().params[0].to_string(),
            "page"
        );
    }

    #[test]
    fn test_invalid_predicate_names_owner() {
        let handler = HandlerDeclaration::new("Orders")
            .operation(OperationDeclaration::route("list").param("!"));
        let err = handler.build_operation_catalog().unwrap_err();
        assert!(err.to_string().contains("Orders::list#0"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let handler = HandlerDeclaration::new("Orders")
            .operation(OperationDeclaration::route("list").path("/a/**x"));
        assert!(matches!(
            handler.build_operation_catalog(),
            Err(DeclarationError::Pattern { .. })
        ));
    }

    #[test]
    fn test_unreachable_type_rule_rejected() {
        let handler = HandlerDeclaration::new("Orders").rule(NavigationRule::on_owner_name().to("/x"));
        let operations = handler.build_operation_catalog().unwrap();
        let err = handler.build_navigation_catalog(&operations, None).unwrap_err();
        assert_eq!(
            err,
            DeclarationError::UnreachableRule {
                owner: "Orders".into(),
                scope: NavigationScope::Type
            }
        );
    }

    #[test]
    fn test_overload_ids() {
        let handler = HandlerDeclaration::new("Orders")
            .operation(OperationDeclaration::route("handle").param("p"))
            .operation(OperationDeclaration::route("handle").param("p"));
        let ids = handler.operation_ids_named("handle");
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }
}
