//! Declaration files end to end: parse, validate, build, resolve.

use std::time::Duration;

use outcome_router::config::{load_config, parse_config, ConfigError, ConfigWatcher, NameResolverKind};
use outcome_router::navigation::{DryRunInvoker, Fault, OutcomeEvent};

mod common;

fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("outcome-router-{}-{}.toml", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_declarations_parse_and_build() {
    let config = parse_config(common::DECLARATIONS).unwrap();
    assert_eq!(config.routing.name_resolver, NameResolverKind::Path);
    assert_eq!(config.handlers[0].operations.len(), 5);

    let registry = config.build_registry().unwrap();
    registry.warm().unwrap();

    let resolution = registry
        .resolve_route("Orders", &common::get("/a/b/go.do?p=v&q=w2"))
        .unwrap();
    let names: Vec<&str> = resolution.matches().iter().map(|m| m.id().name()).collect();
    assert_eq!(names, vec!["exact", "wildcard", "paramOnly"]);
}

#[test]
fn test_declared_navigation_scopes() {
    let registry = parse_config(common::DECLARATIONS).unwrap().build_registry().unwrap();
    let on_exact = common::get("/a/b/go.do");

    let mto2 = registry
        .navigate_request("Orders", &on_exact, &OutcomeEvent::outcome("mon2"), &DryRunInvoker)
        .unwrap()
        .unwrap();
    assert_eq!(mto2.location, "mto2");

    let cto2 = registry
        .navigate("Orders", &[], &OutcomeEvent::outcome("mon2"), &DryRunInvoker)
        .unwrap()
        .unwrap();
    assert_eq!(cto2.location, "cto2");

    let cancel = registry
        .navigate("Orders", &[], &OutcomeEvent::outcome("cancel"), &DryRunInvoker)
        .unwrap()
        .unwrap();
    assert_eq!(cancel.location, "/orders");
    assert!(cancel.popup);
    assert_eq!(cancel.fragments, vec!["list"]);

    let logout = registry
        .navigate("Orders", &[], &OutcomeEvent::outcome("logout"), &DryRunInvoker)
        .unwrap()
        .unwrap();
    assert_eq!(logout.location, "/login");

    let faulted = OutcomeEvent::fault(Fault::new("RuntimeException").caused_by(Fault::new("IllegalStateException")));
    let ceto1 = registry.navigate("Orders", &[], &faulted, &DryRunInvoker).unwrap().unwrap();
    assert_eq!(ceto1.location, "ceto1");
}

#[test]
fn test_load_from_file() {
    let path = temp_file("load", common::DECLARATIONS);
    let config = load_config(&path).unwrap();
    assert_eq!(config.modules[0].name, "shop");
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_config(std::path::Path::new("/nonexistent/outcome-router.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_syntax_error_is_parse_error() {
    let err = parse_config("[[handlers]\nname = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_validation_lists_every_problem() {
    let err = parse_config(
        r#"
        [[handlers]]
        name = "H"
        methods = ["YEET"]

        [[handlers.operations]]
        name = "list"
        paths = ["/ok", "/bad/**x"]
        "#,
    )
    .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Validation failed: "));
    assert!(message.contains("unknown verb 'YEET' on H"));
    assert!(message.contains("'/bad/**x'"));
}

#[tokio::test]
async fn test_watcher_publishes_reloaded_config() {
    let path = temp_file("watch", "");
    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _guard = watcher.run().unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(&path, common::DECLARATIONS).unwrap();

    let reloaded = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match updates.recv().await {
                Some(config) if !config.handlers.is_empty() => return Some(config),
                Some(_) => continue,
                None => return None,
            }
        }
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(reloaded.handlers[0].name, "Orders");
    std::fs::remove_file(&path).unwrap();
}
