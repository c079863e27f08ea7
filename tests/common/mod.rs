//! Shared fixtures for integration tests.

#![allow(dead_code)]

use axum::http::{Method, Uri};

use outcome_router::handler::{HandlerDeclaration, HandlerRegistry, ModuleDeclaration, OperationDeclaration};
use outcome_router::navigation::NavigationRule;
use outcome_router::routing::{PathTailNameResolver, RequestDescriptor, RouteResolver};

/// Declaration file exercising every section.
pub const DECLARATIONS: &str = r#"
[server]
bind_address = "127.0.0.1:0"
request_timeout_secs = 5

[routing]
name_resolver = "path"

[[modules]]
name = "shop"

[[modules.navigation]]
on = ["logout"]
to = "/login"

[[handlers]]
name = "Orders"
module = "shop"

[[handlers.navigation]]
on = ["mon2"]
to = "cto2"

[[handlers.navigation]]
fault = "IllegalStateException"
to = "ceto1"

[[handlers.operations]]
name = "exact"
paths = ["/a/b/go.do"]

[[handlers.operations.navigation]]
on = ["mon1"]
to = "mto1"

[[handlers.operations.navigation]]
on = ["mon2"]
to = "mto2"

[[handlers.operations]]
name = "wildcard"
paths = ["/a/**"]

[[handlers.operations]]
name = "paramOnly"
params = ["p=v"]

[[handlers.operations]]
name = "save"
paths = ["/orders/save"]
methods = ["POST"]

[[handlers.operations]]
name = "onCancel"
kind = "navigation"

[[handlers.operations.navigation]]
on = ["cancel"]
to = "/orders"
popup = true
fragments = ["list"]
"#;

/// Build a descriptor from a path with an optional query string.
pub fn request(method: Method, target: &str) -> RequestDescriptor {
    let uri: Uri = target.parse().unwrap();
    RequestDescriptor::from_uri(method, &uri)
}

pub fn get(target: &str) -> RequestDescriptor {
    request(Method::GET, target)
}

/// Handler with an exact, a wildcard and a parameter-only operation.
pub fn dispatch_handler() -> HandlerDeclaration {
    HandlerDeclaration::new("Dispatch")
        .operation(OperationDeclaration::route("paramOnly").param("p=v"))
        .operation(OperationDeclaration::route("wildcard").path("/a/**"))
        .operation(OperationDeclaration::route("exact").path("/a/b/go.do"))
}

/// Handler whose two operations share the same parameter-only slot.
pub fn overloaded_handler() -> HandlerDeclaration {
    HandlerDeclaration::new("Overloaded")
        .operation(OperationDeclaration::route("first").param("p"))
        .operation(OperationDeclaration::route("second").param("p"))
}

/// Handler carrying method, type and module navigation rules.
pub fn navigation_handler() -> HandlerDeclaration {
    HandlerDeclaration::new("Wizard")
        .module("flows")
        .operation(
            OperationDeclaration::route("step")
                .path("/wizard/step")
                .rule(NavigationRule::on(["mon1"]).to("mto1"))
                .rule(NavigationRule::on(["mon2"]).to("mto2")),
        )
        .rule(NavigationRule::on(["mon2"]).to("cto2"))
        .rule(NavigationRule::on_fault("IllegalStateException").to("ceto1"))
}

pub fn flows_module() -> ModuleDeclaration {
    ModuleDeclaration::new("flows").rule(NavigationRule::on_any().to("/home"))
}

pub fn registry() -> HandlerRegistry {
    HandlerRegistry::new(RouteResolver::default().with_name_resolver(std::sync::Arc::new(PathTailNameResolver::new())))
        .with_handler(dispatch_handler())
        .with_handler(overloaded_handler())
        .with_handler(navigation_handler())
        .with_module(flows_module())
}
