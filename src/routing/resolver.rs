//! Route resolution.
//!
//! # Responsibilities
//! - Gate the request on the handler's type-level constraints
//! - Test every routable operation of a catalog against one request
//! - Collapse operations competing for the same mapping slot
//! - Rank survivors by specificity, most specific first
//!
//! # Design Decisions
//! - Ambiguity is an error, never a silent pick
//! - The convention name is derived at most once per request, on demand
//! - Stable sort: ties keep catalog declaration order
//! - No match is an empty resolution, not an error

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use thiserror::Error;

use crate::observability::metrics;
use crate::routing::catalog::{
    MappingKey, OperationCatalog, OperationId, OperationSpec, RoutableOperation, TypeLevelDefaults,
};
use crate::routing::matcher::{compare_specificity, PathMatcher};
use crate::routing::request::RequestDescriptor;

/// Errors raised by route resolution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error(
        "ambiguous operations mapped for path '{path}': {{{first}, {second}}}; \
         map them to distinct paths or constraints"
    )]
    AmbiguousMapping {
        path: String,
        first: OperationId,
        second: OperationId,
    },
}

/// Derives the conventional operation name for a request.
pub trait OperationNameResolver: Send + Sync + fmt::Debug {
    fn operation_name(&self, request: &RequestDescriptor) -> Option<String>;
}

/// Uses the last path segment with its extension stripped.
#[derive(Debug, Clone, Default)]
pub struct PathTailNameResolver {
    prefix: String,
    suffix: String,
}

impl PathTailNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_affixes(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl OperationNameResolver for PathTailNameResolver {
    fn operation_name(&self, request: &RequestDescriptor) -> Option<String> {
        let tail = request.lookup_path().rsplit('/').next().unwrap_or_default();
        let stem = tail.rsplit_once('.').map_or(tail, |(stem, _)| stem);
        if stem.is_empty() {
            return None;
        }
        Some(format!("{}{}{}", self.prefix, stem, self.suffix))
    }
}

/// Uses the value of a request parameter.
#[derive(Debug, Clone)]
pub struct ParameterNameResolver {
    param: String,
}

impl ParameterNameResolver {
    pub fn new(param: impl Into<String>) -> Self {
        Self { param: param.into() }
    }
}

impl OperationNameResolver for ParameterNameResolver {
    fn operation_name(&self, request: &RequestDescriptor) -> Option<String> {
        request
            .params()
            .first(&self.param)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// One eligible operation and the declared paths that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub operation: Arc<OperationSpec>,
    /// Most specific first; empty only when the operation declares no paths.
    pub matched_paths: Vec<String>,
    pub key: MappingKey,
}

impl RouteMatch {
    pub fn id(&self) -> &OperationId {
        &self.operation.id
    }

    pub fn best_path(&self) -> Option<&str> {
        self.matched_paths.first().map(String::as_str)
    }
}

/// Ordered result of resolving one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteResolution {
    matches: Vec<RouteMatch>,
    allowed_methods: Vec<Method>,
}

impl RouteResolution {
    /// The operation a single-dispatch caller should execute.
    pub fn first(&self) -> Option<&RouteMatch> {
        self.matches.first()
    }

    pub fn matches(&self) -> &[RouteMatch] {
        &self.matches
    }

    pub fn into_matches(self) -> Vec<RouteMatch> {
        self.matches
    }

    pub fn operation_ids(&self) -> Vec<OperationId> {
        self.matches.iter().map(|m| m.id().clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Verbs of operations whose path matched but whose verb did not.
    pub fn allowed_methods(&self) -> &[Method] {
        &self.allowed_methods
    }
}

/// Resolves requests against operation catalogs.
#[derive(Debug, Clone)]
pub struct RouteResolver {
    matcher: Arc<PathMatcher>,
    name_resolver: Option<Arc<dyn OperationNameResolver>>,
}

impl Default for RouteResolver {
    fn default() -> Self {
        Self::new(Arc::new(PathMatcher::new()))
    }
}

impl RouteResolver {
    pub fn new(matcher: Arc<PathMatcher>) -> Self {
        Self {
            matcher,
            name_resolver: None,
        }
    }

    pub fn with_name_resolver(mut self, resolver: Arc<dyn OperationNameResolver>) -> Self {
        self.name_resolver = Some(resolver);
        self
    }

    pub fn matcher(&self) -> &Arc<PathMatcher> {
        &self.matcher
    }

    /// Resolve the ordered set of operations eligible for `request`.
    pub fn resolve(
        &self,
        catalog: &OperationCatalog,
        request: &RequestDescriptor,
    ) -> Result<RouteResolution, RoutingError> {
        if let Some(rejected) = self.reject_by_type(catalog.type_level_defaults(), request) {
            tracing::debug!(
                handler = %catalog.handler(),
                path = %request.lookup_path(),
                method = %request.method(),
                "Request outside type-level mapping"
            );
            metrics::record_route_resolution("empty");
            return Ok(rejected);
        }

        let expected_name = OnceCell::new();
        let mut slots: Vec<RouteMatch> = Vec::new();
        let mut allowed_methods: Vec<Method> = Vec::new();

        for route in catalog.routes() {
            let Some(candidate) = self.eligible(route, request, &expected_name, &mut allowed_methods)
            else {
                continue;
            };
            match slots.iter().position(|slot| slot.key == candidate.key) {
                None => slots.push(candidate),
                Some(index) => {
                    let incumbent = &slots[index];
                    if incumbent.id() != candidate.id() {
                        slots[index] = self.break_tie(incumbent, candidate, request, &expected_name)?;
                    }
                }
            }
        }

        let lookup_path = request.lookup_path();
        slots.sort_by(|a, b| compare_matches(a, b, lookup_path));

        tracing::debug!(
            handler = %catalog.handler(),
            path = %lookup_path,
            method = %request.method(),
            matches = slots.len(),
            "Resolved route candidates"
        );
        metrics::record_route_resolution(if slots.is_empty() { "empty" } else { "matched" });

        Ok(RouteResolution {
            matches: slots,
            allowed_methods,
        })
    }

    /// Empty resolution when the request fails the handler's own mapping.
    ///
    /// Only a verb mismatch reports allowed methods, and only once the paths
    /// and predicates already hold.
    fn reject_by_type(
        &self,
        defaults: &TypeLevelDefaults,
        request: &RequestDescriptor,
    ) -> Option<RouteResolution> {
        let path_ok = defaults.paths.is_empty()
            || defaults
                .paths
                .iter()
                .any(|pattern| self.matcher.matches(pattern, request.lookup_path()));
        let params_ok = defaults.params.iter().all(|p| p.is_satisfied_by(request.params()));
        if !(path_ok && params_ok) {
            return Some(RouteResolution::default());
        }
        if defaults.methods.is_empty() || defaults.methods.contains(request.method()) {
            return None;
        }
        Some(RouteResolution {
            matches: Vec::new(),
            allowed_methods: defaults.methods.clone(),
        })
    }

    fn expected<'a>(
        &self,
        request: &RequestDescriptor,
        cell: &'a OnceCell<Option<String>>,
    ) -> Option<&'a str> {
        let resolver = self.name_resolver.as_ref()?;
        cell.get_or_init(|| resolver.operation_name(request)).as_deref()
    }

    fn eligible(
        &self,
        route: &RoutableOperation,
        request: &RequestDescriptor,
        expected_name: &OnceCell<Option<String>>,
        allowed_methods: &mut Vec<Method>,
    ) -> Option<RouteMatch> {
        let key = &route.key;
        let verb_ok = key.methods.is_empty() || key.methods.contains(request.method());
        let params_ok = key.params.iter().all(|p| p.is_satisfied_by(request.params()));

        let matched_paths = if key.paths.is_empty() {
            if !(verb_ok && params_ok) {
                return None;
            }
            // A catch-all operation only answers to its conventional name.
            if key.is_unconstrained()
                && self.name_resolver.is_some()
                && self.expected(request, expected_name) != Some(route.spec.id.name())
            {
                return None;
            }
            Vec::new()
        } else {
            let lookup_path = request.lookup_path();
            let mut matched: Vec<String> = key
                .paths
                .iter()
                .filter(|pattern| self.matcher.matches(pattern, lookup_path))
                .cloned()
                .collect();
            if matched.is_empty() || !params_ok {
                return None;
            }
            if !verb_ok {
                for method in &key.methods {
                    if !allowed_methods.contains(method) {
                        allowed_methods.push(method.clone());
                    }
                }
                return None;
            }
            matched.sort_by(|a, b| compare_specificity(a, b, lookup_path));
            matched
        };

        Some(RouteMatch {
            operation: route.spec.clone(),
            matched_paths,
            key: key.clone(),
        })
    }

    fn break_tie(
        &self,
        incumbent: &RouteMatch,
        challenger: RouteMatch,
        request: &RequestDescriptor,
        expected_name: &OnceCell<Option<String>>,
    ) -> Result<RouteMatch, RoutingError> {
        let keep = self
            .expected(request, expected_name)
            .map(|expected| (incumbent.id().name() == expected, challenger.id().name() == expected));
        match keep {
            Some((true, false)) => Ok(incumbent.clone()),
            Some((false, true)) => Ok(challenger),
            _ => {
                tracing::warn!(
                    path = %request.lookup_path(),
                    first = %incumbent.id(),
                    second = %challenger.id(),
                    "Ambiguous operation mapping"
                );
                metrics::record_route_resolution("ambiguous");
                Err(RoutingError::AmbiguousMapping {
                    path: request.lookup_path().to_string(),
                    first: incumbent.id().clone(),
                    second: challenger.id().clone(),
                })
            }
        }
    }
}

/// Total specificity order over matches, most specific first.
fn compare_matches(a: &RouteMatch, b: &RouteMatch, lookup_path: &str) -> Ordering {
    let by_path = match (a.best_path(), b.best_path()) {
        (Some(left), Some(right)) => compare_specificity(left, right, lookup_path),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_path
        .then_with(|| (!b.key.methods.is_empty()).cmp(&!a.key.methods.is_empty()))
        .then_with(|| b.key.params.len().cmp(&a.key.params.len()))
}
