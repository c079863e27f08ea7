//! Per-handler operation catalog.
//!
//! # Responsibilities
//! - Hold every declared operation of one handler type
//! - Classify operations (route, pre-bind hook, model producer, navigation)
//! - Precompute each routable operation's effective mapping key
//!
//! # Design Decisions
//! - Immutable after construction; shared as `Arc<OperationCatalog>`
//! - Verb and predicate sets equal to the type-level ones are dropped from the
//!   effective key, since the outer dispatcher already enforced them

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::routing::params::ParamPredicate;

/// Opaque operation identity.
///
/// The ordinal keeps overloads that share a name distinct; only `name` takes
/// part in convention-based naming and outcome matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId {
    handler: Arc<str>,
    name: Arc<str>,
    ordinal: usize,
}

impl OperationId {
    pub fn new(handler: impl Into<Arc<str>>, name: impl Into<Arc<str>>, ordinal: usize) -> Self {
        Self {
            handler: handler.into(),
            name: name.into(),
            ordinal,
        }
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}#{}", self.handler, self.name, self.ordinal)
    }
}

/// How an operation participates in request handling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Request-mapped; considered by the route resolver.
    #[default]
    Route,
    /// Invoked before argument binding.
    PreBind,
    /// Seeds values consulted during argument resolution.
    ModelProducer,
    /// Carries navigation rules only.
    Navigation,
}

/// One declared operation and its routing constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSpec {
    pub id: OperationId,
    pub kind: OperationKind,
    /// Empty means any path.
    pub paths: Vec<String>,
    /// Empty means any verb.
    pub methods: Vec<Method>,
    pub params: Vec<ParamPredicate>,
}

/// Constraints declared on the handler type itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeLevelDefaults {
    pub paths: Vec<String>,
    pub methods: Vec<Method>,
    pub params: Vec<ParamPredicate>,
}

impl TypeLevelDefaults {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.methods.is_empty() && self.params.is_empty()
    }
}

/// Effective constraint set of a routable operation.
///
/// Two operations with equal keys compete for the same slot during
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingKey {
    pub paths: Vec<String>,
    pub methods: Vec<Method>,
    pub params: Vec<ParamPredicate>,
}

impl MappingKey {
    fn effective(spec: &OperationSpec, defaults: &TypeLevelDefaults) -> Self {
        let mut methods = normalize_methods(&spec.methods);
        if !defaults.methods.is_empty() && methods == normalize_methods(&defaults.methods) {
            methods.clear();
        }
        let mut params = normalize_params(&spec.params);
        if !defaults.params.is_empty() && params == normalize_params(&defaults.params) {
            params.clear();
        }
        Self {
            paths: spec.paths.clone(),
            methods,
            params,
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        self.paths.is_empty() && self.methods.is_empty() && self.params.is_empty()
    }
}

fn normalize_methods(methods: &[Method]) -> Vec<Method> {
    let mut normalized = methods.to_vec();
    normalized.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    normalized.dedup();
    normalized
}

fn normalize_params(params: &[ParamPredicate]) -> Vec<ParamPredicate> {
    let mut normalized = params.to_vec();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// A routable operation paired with its effective key.
#[derive(Debug, Clone)]
pub struct RoutableOperation {
    pub spec: Arc<OperationSpec>,
    pub key: MappingKey,
}

/// All operations of one handler type.
#[derive(Debug)]
pub struct OperationCatalog {
    handler: Arc<str>,
    defaults: TypeLevelDefaults,
    operations: Vec<Arc<OperationSpec>>,
    routes: Vec<RoutableOperation>,
    routable_ids: HashSet<OperationId>,
}

impl OperationCatalog {
    /// Build from operations in declaration order.
    pub fn new(
        handler: impl Into<Arc<str>>,
        defaults: TypeLevelDefaults,
        operations: Vec<OperationSpec>,
    ) -> Self {
        let operations: Vec<Arc<OperationSpec>> = operations.into_iter().map(Arc::new).collect();
        let routes: Vec<RoutableOperation> = operations
            .iter()
            .filter(|spec| spec.kind == OperationKind::Route)
            .map(|spec| RoutableOperation {
                key: MappingKey::effective(spec, &defaults),
                spec: spec.clone(),
            })
            .collect();
        let routable_ids = routes.iter().map(|route| route.spec.id.clone()).collect();

        Self {
            handler: handler.into(),
            defaults,
            operations,
            routes,
            routable_ids,
        }
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn type_level_defaults(&self) -> &TypeLevelDefaults {
        &self.defaults
    }

    pub fn routable_operations(&self) -> impl Iterator<Item = &Arc<OperationSpec>> {
        self.routes.iter().map(|route| &route.spec)
    }

    /// Routable operations with their effective keys, in declaration order.
    pub fn routes(&self) -> &[RoutableOperation] {
        &self.routes
    }

    pub fn pre_bind_operations(&self) -> impl Iterator<Item = &Arc<OperationSpec>> {
        self.of_kind(OperationKind::PreBind)
    }

    pub fn model_producers(&self) -> impl Iterator<Item = &Arc<OperationSpec>> {
        self.of_kind(OperationKind::ModelProducer)
    }

    pub fn operations(&self) -> &[Arc<OperationSpec>] {
        &self.operations
    }

    pub fn operation(&self, id: &OperationId) -> Option<&Arc<OperationSpec>> {
        self.operations.iter().find(|spec| &spec.id == id)
    }

    pub fn is_routable(&self, id: &OperationId) -> bool {
        self.routable_ids.contains(id)
    }

    fn of_kind(&self, kind: OperationKind) -> impl Iterator<Item = &Arc<OperationSpec>> {
        self.operations.iter().filter(move |spec| spec.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, ordinal: usize, kind: OperationKind) -> OperationSpec {
        OperationSpec {
            id: OperationId::new("Orders", name, ordinal),
            kind,
            paths: Vec::new(),
            methods: Vec::new(),
            params: Vec::new(),
        }
    }

    #[test]
    fn test_classification() {
        let catalog = OperationCatalog::new(
            "Orders",
            TypeLevelDefaults::default(),
            vec![
                spec("list", 0, OperationKind::Route),
                spec("initBinder", 1, OperationKind::PreBind),
                spec("categories", 2, OperationKind::ModelProducer),
                spec("onCancel", 3, OperationKind::Navigation),
            ],
        );
        assert_eq!(catalog.routable_operations().count(), 1);
        assert_eq!(catalog.pre_bind_operations().count(), 1);
        assert_eq!(catalog.model_producers().count(), 1);
        assert!(catalog.is_routable(&OperationId::new("Orders", "list", 0)));
        assert!(!catalog.is_routable(&OperationId::new("Orders", "onCancel", 3)));
    }

    #[test]
    fn test_type_level_constraints_suppressed() {
        let defaults = TypeLevelDefaults {
            paths: vec!["/orders/**".into()],
            methods: vec![Method::POST, Method::GET],
            params: vec![ParamPredicate::Present("p".into())],
        };
        let mut same = spec("same", 0, OperationKind::Route);
        same.methods = vec![Method::GET, Method::POST];
        same.params = vec![ParamPredicate::Present("p".into())];
        let mut narrower = spec("narrower", 1, OperationKind::Route);
        narrower.methods = vec![Method::GET];

        let catalog = OperationCatalog::new("Orders", defaults, vec![same, narrower]);
        let routes = catalog.routes();
        assert!(routes[0].key.methods.is_empty());
        assert!(routes[0].key.params.is_empty());
        assert_eq!(routes[1].key.methods, vec![Method::GET]);
    }

    #[test]
    fn test_overloads_keep_distinct_identity() {
        let first = OperationId::new("Orders", "handle", 0);
        let second = OperationId::new("Orders", "handle", 1);
        assert_ne!(first, second);
        assert_eq!(first.name(), second.name());
        assert_eq!(first.to_string(), "Orders::handle#0");
    }
}
