use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use outcome_router::config::{load_config, schema::parse_method, ConfigError};
use outcome_router::handler::HandlerRegistry;
use outcome_router::navigation::{DryRunInvoker, Fault, OutcomeEvent};
use outcome_router::routing::RequestDescriptor;

#[derive(Parser)]
#[command(name = "route-cli")]
#[command(about = "Check declarations and dry-run route resolution and navigation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a declaration file and build every catalog
    Check { file: PathBuf },
    /// Resolve a request path against a handler
    Routes {
        file: PathBuf,
        handler: String,
        path: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
        /// Request parameter as name=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,
    },
    /// Resolve an outcome to a destination
    Navigate {
        file: PathBuf,
        handler: String,
        #[arg(long)]
        outcome: Option<String>,
        #[arg(long)]
        from_action: Option<String>,
        /// Fault kind, outermost first; repeat to build a cause chain
        #[arg(long = "fault")]
        faults: Vec<String>,
        /// Request path whose matched operations contribute their rules
        #[arg(long)]
        path: Option<String>,
        #[arg(short, long, default_value = "GET")]
        method: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Check { file } => {
            let registry = registry(&file)?;
            registry.warm()?;
            println!("{} handler(s) OK", registry.handler_names().len());
        }
        Commands::Routes {
            file,
            handler,
            path,
            method,
            params,
        } => {
            let registry = registry(&file)?;
            let request = descriptor(path, &method, &params)?;
            let resolution = registry.resolve_route(&handler, &request)?;
            let operations: Vec<_> = resolution
                .matches()
                .iter()
                .map(|candidate| json!({ "operation": candidate.id().to_string(), "matched_paths": candidate.matched_paths }))
                .collect();
            let allowed: Vec<String> = resolution.allowed_methods().iter().map(ToString::to_string).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "operations": operations, "allowed_methods": allowed }))?
            );
        }
        Commands::Navigate {
            file,
            handler,
            outcome,
            from_action,
            faults,
            path,
            method,
        } => {
            let registry = registry(&file)?;
            let event = OutcomeEvent {
                from_action,
                outcome,
                fault: fault_chain(&faults),
            };
            let destination = match path {
                Some(path) => {
                    let request = descriptor(path, &method, &[])?;
                    registry.navigate_request(&handler, &request, &event, &DryRunInvoker)?
                }
                None => registry.navigate(&handler, &[], &event, &DryRunInvoker)?,
            };
            println!("{}", serde_json::to_string_pretty(&destination)?);
        }
    }
    Ok(())
}

fn registry(file: &Path) -> Result<HandlerRegistry, ConfigError> {
    load_config(file)?.build_registry()
}

fn descriptor(path: String, method: &str, params: &[String]) -> Result<RequestDescriptor, String> {
    let method = parse_method(method).ok_or_else(|| format!("unknown verb '{method}'"))?;
    let mut request = RequestDescriptor::new(path, method);
    for param in params {
        let (name, value) = param.split_once('=').unwrap_or((param.as_str(), ""));
        request = request.with_param(name, value);
    }
    Ok(request)
}

fn fault_chain(kinds: &[String]) -> Option<Fault> {
    kinds
        .iter()
        .rev()
        .fold(None, |cause: Option<Fault>, kind| {
            let fault = Fault::new(kind.as_str());
            Some(match cause {
                Some(cause) => fault.caused_by(cause),
                None => fault,
            })
        })
}
