//! Per-handler navigation catalog.
//!
//! # Responsibilities
//! - Collect rules declared on operations, on the handler type, and on its
//!   enclosing module
//! - Produce the search order for one request
//! - Report declaration conflicts at build time
//!
//! # Design Decisions
//! - Operation rules of routable operations only apply when the operation is
//!   a candidate for the current request, in route-resolution order
//! - Navigation-only operations are global and ordered by identity
//! - Only rules of non-routable operations compute their destination by
//!   invoking the owner

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::navigation::rule::{NavigationRule, NavigationScope, RuleOwner};
use crate::routing::catalog::{OperationCatalog, OperationId};

/// A rule together with where it was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEntry {
    pub owner: RuleOwner,
    pub rule: Arc<NavigationRule>,
    /// Operation to invoke for a computed destination.
    pub computed_via: Option<OperationId>,
}

impl NavigationEntry {
    pub fn scope(&self) -> NavigationScope {
        self.owner.scope()
    }
}

/// All navigation rules that apply to one handler type.
#[derive(Debug)]
pub struct NavigationCatalog {
    handler: Arc<str>,
    routed: HashMap<OperationId, Vec<NavigationEntry>>,
    global: Vec<NavigationEntry>,
    type_rules: Vec<NavigationEntry>,
    module_rules: Vec<NavigationEntry>,
    routable: HashSet<OperationId>,
}

impl NavigationCatalog {
    /// Build from operation-level rules (in declaration order), type-level
    /// rules, and the enclosing module's rules.
    pub fn new(
        operations: &OperationCatalog,
        operation_rules: Vec<(OperationId, Vec<NavigationRule>)>,
        type_rules: Vec<NavigationRule>,
        module: Option<(Arc<str>, Vec<NavigationRule>)>,
    ) -> Self {
        let handler: Arc<str> = Arc::from(operations.handler());
        let routable: HashSet<OperationId> = operations
            .routable_operations()
            .map(|spec| spec.id.clone())
            .collect();

        let mut routed: HashMap<OperationId, Vec<NavigationEntry>> = HashMap::new();
        let mut global: Vec<(OperationId, Vec<NavigationEntry>)> = Vec::new();
        for (id, rules) in operation_rules {
            if rules.is_empty() {
                continue;
            }
            let is_routable = routable.contains(&id);
            let entries: Vec<NavigationEntry> = rules
                .into_iter()
                .map(|rule| NavigationEntry {
                    owner: RuleOwner::Operation(id.clone()),
                    rule: Arc::new(rule),
                    computed_via: (!is_routable).then(|| id.clone()),
                })
                .collect();
            if is_routable {
                routed.entry(id).or_default().extend(entries);
            } else {
                global.push((id, entries));
            }
        }
        global.sort_by(|a, b| a.0.cmp(&b.0));

        let type_rules = type_rules
            .into_iter()
            .map(|rule| NavigationEntry {
                owner: RuleOwner::Type(handler.clone()),
                rule: Arc::new(rule),
                computed_via: None,
            })
            .collect();
        let module_rules = module
            .map(|(name, rules)| {
                rules
                    .into_iter()
                    .map(|rule| NavigationEntry {
                        owner: RuleOwner::Module(name.clone()),
                        rule: Arc::new(rule),
                        computed_via: None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            handler,
            routed,
            global: global.into_iter().flat_map(|(_, entries)| entries).collect(),
            type_rules,
            module_rules,
            routable,
        }
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn is_routable(&self, id: &OperationId) -> bool {
        self.routable.contains(id)
    }

    /// Rules in search order for a request whose route candidates are
    /// `request_order` (most specific first).
    pub fn rules_in_priority_order(&self, request_order: &[OperationId]) -> Vec<&NavigationEntry> {
        let mut seen: HashSet<&OperationId> = HashSet::new();
        let routed = request_order
            .iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.routed.get(id))
            .flatten();

        routed
            .chain(&self.global)
            .chain(&self.type_rules)
            .chain(&self.module_rules)
            .collect()
    }

    /// Number of rules across all scopes.
    pub fn len(&self) -> usize {
        self.routed.values().map(Vec::len).sum::<usize>()
            + self.global.len()
            + self.type_rules.len()
            + self.module_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rules on routable operations that lack a literal destination.
    pub fn conflicts(&self) -> Vec<&NavigationEntry> {
        let mut conflicts: Vec<&NavigationEntry> = self
            .routed
            .values()
            .flatten()
            .filter(|entry| entry.rule.to.is_none())
            .collect();
        conflicts.sort_by(|a, b| a.owner.operation().cmp(&b.owner.operation()));
        conflicts
    }
}
