//! Configuration schema definitions.
//!
//! This module defines the declaration file structure: server settings,
//! route resolution options, and the handler and module declarations that
//! become catalogs. All types derive Serde traits for deserialization.

use std::sync::Arc;

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::config::loader::ConfigError;
use crate::handler::{HandlerDeclaration, HandlerRegistry, Mapping, ModuleDeclaration, OperationDeclaration};
use crate::navigation::rule::NavigationRule;
use crate::routing::catalog::OperationKind;
use crate::routing::matcher::PathMatcher;
use crate::routing::resolver::{ParameterNameResolver, PathTailNameResolver, RouteResolver};

/// Request verbs accepted in declarations.
static KNOWN_METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
    Method::TRACE,
    Method::CONNECT,
];

/// Parse a declared verb, case-insensitively.
pub fn parse_method(verb: &str) -> Option<Method> {
    let verb = verb.trim();
    KNOWN_METHODS
        .iter()
        .find(|method| method.as_str().eq_ignore_ascii_case(verb))
        .cloned()
}

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Inspector service settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Route resolution options.
    pub routing: RoutingConfig,

    /// Modules and their shared navigation rules.
    pub modules: Vec<ModuleConfig>,

    /// Handler declarations.
    pub handlers: Vec<HandlerConfig>,
}

/// Inspector service configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Reload declarations when the file changes.
    pub watch: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            watch: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Convention used to break ties between operations in one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameResolverKind {
    /// Ties are always ambiguous.
    #[default]
    None,
    /// Last path segment without its extension.
    Path,
    /// Value of the `name_param` request parameter.
    Param,
}

/// Route resolution configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RoutingConfig {
    pub name_resolver: NameResolverKind,

    /// Parameter consulted by the `param` resolver.
    pub name_param: Option<String>,

    /// Added around the derived name by the `path` resolver.
    pub prefix: String,
    pub suffix: String,
}

impl RoutingConfig {
    pub fn build_resolver(&self) -> RouteResolver {
        let resolver = RouteResolver::new(Arc::new(PathMatcher::new()));
        match (self.name_resolver, &self.name_param) {
            (NameResolverKind::None, _) => resolver,
            (NameResolverKind::Path, _) => resolver.with_name_resolver(Arc::new(
                PathTailNameResolver::with_affixes(self.prefix.as_str(), self.suffix.as_str()),
            )),
            (NameResolverKind::Param, Some(param)) => {
                resolver.with_name_resolver(Arc::new(ParameterNameResolver::new(param.as_str())))
            }
            (NameResolverKind::Param, None) => resolver,
        }
    }
}

/// A navigation rule as declared in the file.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RuleConfig {
    /// Accepted outcomes; `["*"]` for any, empty for the owner's own name.
    pub on: Vec<String>,

    /// Required action reference.
    pub from_action: Option<String>,

    /// Required fault type anywhere in the cause chain.
    pub fault: Option<String>,

    /// Literal destination.
    pub to: Option<String>,

    pub popup: bool,

    pub fragments: Vec<String>,
}

impl RuleConfig {
    pub fn to_rule(&self) -> NavigationRule {
        let mut rule = NavigationRule::on(self.on.iter().map(String::as_str))
            .popup(self.popup)
            .fragments(self.fragments.iter().map(String::as_str));
        rule.from_action = self.from_action.clone();
        rule.fault = self.fault.clone();
        rule.to = self.to.clone();
        rule
    }
}

/// A module grouping handlers.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModuleConfig {
    pub name: String,

    #[serde(default)]
    pub navigation: Vec<RuleConfig>,
}

/// One operation of a handler.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OperationConfig {
    pub name: String,

    #[serde(default)]
    pub kind: OperationKind,

    /// Path patterns; empty means any path.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Verbs; empty means any verb.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Parameter predicates (`name`, `!name`, `name=value`).
    #[serde(default)]
    pub params: Vec<String>,

    #[serde(default)]
    pub navigation: Vec<RuleConfig>,
}

/// A handler type declaration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct HandlerConfig {
    pub name: String,

    /// Enclosing module, if any.
    #[serde(default)]
    pub module: Option<String>,

    /// Type-level paths.
    #[serde(default)]
    pub paths: Vec<String>,

    /// Type-level verbs.
    #[serde(default)]
    pub methods: Vec<String>,

    /// Type-level parameter predicates.
    #[serde(default)]
    pub params: Vec<String>,

    /// Type-level navigation rules.
    #[serde(default)]
    pub navigation: Vec<RuleConfig>,

    #[serde(default)]
    pub operations: Vec<OperationConfig>,
}

impl HandlerConfig {
    pub fn to_declaration(&self) -> Result<HandlerDeclaration, ConfigError> {
        let mut handler = HandlerDeclaration::new(self.name.as_str()).type_mapping(Mapping {
            paths: self.paths.clone(),
            methods: parse_methods(&self.name, &self.methods)?,
            params: self.params.clone(),
        });
        handler.module = self.module.clone();
        handler.navigation = self.navigation.iter().map(RuleConfig::to_rule).collect();

        for operation in &self.operations {
            let owner = format!("{}::{}", self.name, operation.name);
            let mut declared = OperationDeclaration::new(operation.name.as_str(), operation.kind);
            declared.mapping = Mapping {
                paths: operation.paths.clone(),
                methods: parse_methods(&owner, &operation.methods)?,
                params: operation.params.clone(),
            };
            declared.navigation = operation.navigation.iter().map(RuleConfig::to_rule).collect();
            handler = handler.operation(declared);
        }
        Ok(handler)
    }
}

fn parse_methods(owner: &str, verbs: &[String]) -> Result<Vec<Method>, ConfigError> {
    verbs
        .iter()
        .map(|verb| {
            parse_method(verb).ok_or_else(|| ConfigError::InvalidMethod {
                owner: owner.to_string(),
                verb: verb.clone(),
            })
        })
        .collect()
}

impl AppConfig {
    /// Turn validated declarations into a registry.
    pub fn build_registry(&self) -> Result<HandlerRegistry, ConfigError> {
        let mut registry = HandlerRegistry::new(self.routing.build_resolver());
        for module in &self.modules {
            registry.register_module(ModuleDeclaration {
                name: module.name.clone(),
                navigation: module.navigation.iter().map(RuleConfig::to_rule).collect(),
            });
        }
        for handler in &self.handlers {
            registry.register(handler.to_declaration()?);
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_file() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
        assert_eq!(config.routing.name_resolver, NameResolverKind::None);
        assert!(config.handlers.is_empty());
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get"), Some(Method::GET));
        assert_eq!(parse_method(" Delete "), Some(Method::DELETE));
        assert_eq!(parse_method("FETCH"), None);
    }

    #[test]
    fn test_handler_section() {
        let config: AppConfig = toml::from_str(
            r#"
            [routing]
            name_resolver = "path"

            [[handlers]]
            name = "Orders"
            module = "shop"
            paths = ["/orders/**"]

            [[handlers.operations]]
            name = "list"
            methods = ["get"]
            params = ["page"]

            [[handlers.operations.navigation]]
            on = ["save"]
            to = "/orders"
            popup = true

            [[handlers.operations]]
            name = "onCancel"
            kind = "navigation"
            "#,
        )
        .unwrap();

        let handler = config.handlers[0].to_declaration().unwrap();
        assert_eq!(handler.module.as_deref(), Some("shop"));
        assert_eq!(handler.operations.len(), 2);
        assert_eq!(handler.operations[0].mapping.methods, vec![Method::GET]);
        assert_eq!(handler.operations[0].navigation[0].to.as_deref(), Some("/orders"));
        assert!(handler.operations[0].navigation[0].popup);
        assert_eq!(handler.operations[1].kind, OperationKind::Navigation);
    }

    #[test]
    fn test_bad_verb_rejected_on_build() {
        let mut config = AppConfig::default();
        config.handlers.push(HandlerConfig {
            name: "Orders".into(),
            module: None,
            paths: vec![],
            methods: vec!["FETCH".into()],
            params: vec![],
            navigation: vec![],
            operations: vec![],
        });
        assert!(matches!(
            config.build_registry(),
            Err(ConfigError::InvalidMethod { ref verb, .. }) if verb == "FETCH"
        ));
    }
}
