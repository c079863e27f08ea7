//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (handlers reference existing modules)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Reject declarations that could never resolve (bad patterns, bad
//!   predicates, unreachable rules, routed rules without a destination)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{parse_method, AppConfig, NameResolverKind, RuleConfig};
use crate::navigation::rule::NavigationScope;
use crate::routing::catalog::OperationKind;
use crate::routing::matcher::{validate_pattern, PatternError};
use crate::routing::params::{ParamError, ParamPredicate};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid address for {field}: '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,

    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),

    #[error("name_resolver = \"param\" requires name_param")]
    MissingNameParam,

    #[error("{0} declared with an empty name")]
    EmptyName(&'static str),

    #[error("duplicate handler '{0}'")]
    DuplicateHandler(String),

    #[error("duplicate module '{0}'")]
    DuplicateModule(String),

    #[error("handler '{handler}' references unknown module '{module}'")]
    UnknownModule { handler: String, module: String },

    #[error("unknown verb '{verb}' on {owner}")]
    InvalidMethod { owner: String, verb: String },

    #[error("invalid path '{pattern}' on {owner}: {source}")]
    InvalidPattern {
        owner: String,
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("invalid parameter predicate '{predicate}' on {owner}: {source}")]
    InvalidParam {
        owner: String,
        predicate: String,
        #[source]
        source: ParamError,
    },

    #[error("navigation rule on {owner} ({scope} scope) has an empty 'on' list and no fault filter")]
    UnreachableRule { owner: String, scope: NavigationScope },

    #[error("navigation rule on request-mapped operation {owner} declares no destination")]
    MissingDestination { owner: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_server(config, &mut errors);
    validate_modules(config, &mut errors);
    validate_handlers(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_server(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: observability.metrics_address.clone(),
        });
    }

    if config.routing.name_resolver == NameResolverKind::Param
        && config.routing.name_param.as_deref().map_or(true, str::is_empty)
    {
        errors.push(ValidationError::MissingNameParam);
    }
}

fn validate_modules(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for module in &config.modules {
        if module.name.is_empty() {
            errors.push(ValidationError::EmptyName("module"));
        } else if !seen.insert(module.name.as_str()) {
            errors.push(ValidationError::DuplicateModule(module.name.clone()));
        }
        validate_rules(&module.name, NavigationScope::Module, &module.navigation, errors);
    }
}

fn validate_handlers(config: &AppConfig, errors: &mut Vec<ValidationError>) {
    let modules: HashSet<&str> = config.modules.iter().map(|m| m.name.as_str()).collect();
    let mut seen = HashSet::new();

    for handler in &config.handlers {
        if handler.name.is_empty() {
            errors.push(ValidationError::EmptyName("handler"));
        } else if !seen.insert(handler.name.as_str()) {
            errors.push(ValidationError::DuplicateHandler(handler.name.clone()));
        }
        if let Some(module) = &handler.module {
            if !modules.contains(module.as_str()) {
                errors.push(ValidationError::UnknownModule {
                    handler: handler.name.clone(),
                    module: module.clone(),
                });
            }
        }

        validate_mapping(&handler.name, &handler.paths, &handler.methods, &handler.params, errors);
        validate_rules(&handler.name, NavigationScope::Type, &handler.navigation, errors);

        for (ordinal, operation) in handler.operations.iter().enumerate() {
            let owner = format!("{}::{}#{}", handler.name, operation.name, ordinal);
            if operation.name.is_empty() {
                errors.push(ValidationError::EmptyName("operation"));
            }
            validate_mapping(&owner, &operation.paths, &operation.methods, &operation.params, errors);
            validate_rules(&owner, NavigationScope::Method, &operation.navigation, errors);

            if operation.kind == OperationKind::Route
                && operation.navigation.iter().any(|rule| rule.to.is_none())
            {
                errors.push(ValidationError::MissingDestination { owner });
            }
        }
    }
}

fn validate_mapping(
    owner: &str,
    paths: &[String],
    methods: &[String],
    params: &[String],
    errors: &mut Vec<ValidationError>,
) {
    for pattern in paths {
        if let Err(source) = validate_pattern(pattern) {
            errors.push(ValidationError::InvalidPattern {
                owner: owner.to_string(),
                pattern: pattern.clone(),
                source,
            });
        }
    }
    for verb in methods {
        if parse_method(verb).is_none() {
            errors.push(ValidationError::InvalidMethod {
                owner: owner.to_string(),
                verb: verb.clone(),
            });
        }
    }
    for predicate in params {
        if let Err(source) = predicate.parse::<ParamPredicate>() {
            errors.push(ValidationError::InvalidParam {
                owner: owner.to_string(),
                predicate: predicate.clone(),
                source,
            });
        }
    }
}

fn validate_rules(
    owner: &str,
    scope: NavigationScope,
    rules: &[RuleConfig],
    errors: &mut Vec<ValidationError>,
) {
    for rule in rules {
        let unreachable = rule.on.is_empty() && rule.fault.is_none() && scope != NavigationScope::Method;
        if unreachable {
            errors.push(ValidationError::UnreachableRule {
                owner: owner.to_string(),
                scope,
            });
        }
        if rule.on.iter().any(String::is_empty) {
            errors.push(ValidationError::EmptyName("navigation outcome"));
        }
    }
}
