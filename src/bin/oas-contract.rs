//! OpenAPI contract CLI
//!
//! Command-line interface for checking recorded exchanges against an
//! OpenAPI document and linting documents ahead of deployment.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use oas_contract::{
    lint_source, load_spec_auto, ContractValidator, ExchangeResult, HandlerError, HandlerResponse,
    OperationStatus, RawRequest, Severity, ValidatorConfig,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oas-contract")]
#[command(about = "Validate HTTP exchanges against an OpenAPI v3 contract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recorded exchange through the validation pipeline
    Check {
        /// Spec source: file path or URL (http:// or https://)
        spec: String,

        /// Exchange file: {"request": {...}, "response": {"body": ..., "statusCode": ...}}
        exchange: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Compile every operation and report problems (broken refs, bad styles, shadowed paths)
    Lint {
        /// Spec source: file path or URL
        spec: String,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// Validator configuration file (camelCase JSON keys)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Validate requests (default: true)
    #[arg(long, action = clap::ArgAction::Set)]
    validate_requests: Option<bool>,

    /// Validate handler responses (default: false)
    #[arg(long, action = clap::ArgAction::Set)]
    validate_responses: Option<bool>,

    /// Strip request properties the contract does not declare
    #[arg(long, action = clap::ArgAction::Set)]
    remove_additional_request_properties: Option<bool>,

    /// Strip response properties the contract does not declare
    #[arg(long, action = clap::ArgAction::Set)]
    remove_additional_response_properties: Option<bool>,

    /// Coerce string values to declared scalar types (default: true)
    #[arg(long, action = clap::ArgAction::Set)]
    coerce_types: Option<bool>,

    /// Fill absent properties from schema defaults
    #[arg(long, action = clap::ArgAction::Set)]
    use_defaults: Option<bool>,

    /// Media type to validate bodies for (default: application/json)
    #[arg(long)]
    content_type: Option<String>,
}

impl ConfigArgs {
    /// Load the config file (if any) and apply flag overrides.
    fn resolve(&self) -> Result<ValidatorConfig, String> {
        let mut config = match &self.config {
            Some(path) => read_json::<ValidatorConfig>(path)?,
            None => ValidatorConfig::default(),
        };
        if let Some(v) = self.validate_requests {
            config = config.validate_requests(v);
        }
        if let Some(v) = self.validate_responses {
            config = config.validate_responses(v);
        }
        if let Some(v) = self.remove_additional_request_properties {
            config = config.remove_additional_request_properties(v);
        }
        if let Some(v) = self.remove_additional_response_properties {
            config = config.remove_additional_response_properties(v);
        }
        if let Some(v) = self.coerce_types {
            config = config.coerce_types(v);
        }
        if let Some(v) = self.use_defaults {
            config = config.use_defaults(v);
        }
        if let Some(content_type) = &self.content_type {
            config = config.content_type(content_type.clone());
        }
        Ok(config)
    }
}

/// A recorded exchange: the request and, optionally, what the handler returned.
#[derive(Deserialize)]
struct Exchange {
    request: RawRequest,
    #[serde(default)]
    response: Option<Value>,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            spec,
            exchange,
            config,
            json,
            pretty,
        } => run_check(&spec, &exchange, &config, json, pretty),

        Commands::Lint {
            spec,
            config,
            format,
            strict,
            quiet,
        } => run_lint(&spec, &config, &format, strict, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_check(
    spec_source: &str,
    exchange_path: &Path,
    config: &ConfigArgs,
    json_output: bool,
    pretty: bool,
) -> Result<(), u8> {
    let config = config.resolve().map_err(|e| {
        report_error(json_output, &e);
        2u8
    })?;

    let spec = load_spec_auto(spec_source).map_err(|e| {
        report_error(json_output, &format!("loading spec: {}", e));
        e.exit_code() as u8
    })?;

    let exchange: Exchange = read_json(exchange_path).map_err(|e| {
        report_error(json_output, &e);
        2u8
    })?;

    let validator = ContractValidator::new(spec, config).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let result = match exchange.response {
        None => check_request(&validator, exchange.request),
        Some(recorded) => match HandlerResponse::from_value(recorded) {
            Ok(recorded) => replay(&validator, exchange.request, recorded)?,
            Err(violation) => ExchangeResult::from_violation(violation),
        },
    };

    let output = json!({
        "valid": !result.is_violation(),
        "statusCode": result.status_code,
        "body": result.body,
    });

    if json_output {
        print_json(&output, pretty)?;
    } else if let Some(violation) = &result.violation {
        eprintln!("Contract violation ({}):", violation.status_code());
        eprintln!("  {}", violation);
    } else {
        println!("Valid ({})", result.status_code);
        print_json(&result.body, true)?;
    }

    if result.is_violation() {
        Err(1)
    } else {
        Ok(())
    }
}

/// Request phase only: the result body is the normalized request.
fn check_request(validator: &ContractValidator, request: RawRequest) -> ExchangeResult {
    match validator.validate_request(request) {
        Ok(validated) => {
            for diagnostic in &validated.diagnostics {
                tracing::warn!(path = %diagnostic.path, "{}", diagnostic.message);
            }
            let body = serde_json::to_value(&validated.request).unwrap_or(Value::Null);
            ExchangeResult::new(200, body)
        }
        Err(violation) => ExchangeResult::from_violation(violation),
    }
}

/// Full pipeline with a handler that replays the recorded response.
fn replay(validator: &ContractValidator, request: RawRequest, recorded: HandlerResponse) -> Result<ExchangeResult, u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| {
            eprintln!("Error: starting runtime: {}", e);
            3u8
        })?;

    let handler = |_request: RawRequest| {
        let recorded = recorded.clone();
        async move { Ok::<_, HandlerError>(recorded) }
    };
    Ok(runtime.block_on(validator.handle_exchange(request, &handler)))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("reading {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("parsing {}: {}", path.display(), e))
}

fn print_json(value: &Value, pretty: bool) -> Result<(), u8> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", text);
    Ok(())
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(spec: &str, config: &ConfigArgs, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    let config = config.resolve().map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    let result = lint_source(spec, &config, strict);

    if format == "json" {
        let text = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", text);
    } else {
        if !quiet {
            println!("Linting {} ...\n", spec);
        }

        for diag in &result.document {
            print_diagnostic(diag, quiet);
        }

        for op_result in &result.results {
            let status_icon = match op_result.status {
                OperationStatus::Ok => "\x1b[32m✓\x1b[0m",
                OperationStatus::Warning => "\x1b[33m⚠\x1b[0m",
                OperationStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || op_result.status != OperationStatus::Ok {
                println!("  {} {}", status_icon, op_result.operation);
            }

            for diag in &op_result.diagnostics {
                print_diagnostic(diag, quiet);
            }
        }

        println!();
        if result.is_ok() && (!strict || result.warnings == 0) {
            println!(
                "\x1b[32m✓ {} operations checked, all passed\x1b[0m",
                result.operations_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} operations checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.operations_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.is_ok() && (!strict || result.warnings == 0) {
        Ok(())
    } else {
        Err(1)
    }
}

fn print_diagnostic(diag: &oas_contract::Diagnostic, quiet: bool) {
    if quiet && diag.severity != Severity::Error {
        return;
    }
    let (color, label) = match diag.severity {
        Severity::Error => ("\x1b[31m", "error"),
        Severity::Warning => ("\x1b[33m", "warning"),
    };
    println!(
        "    {}{}[{}]\x1b[0m: {} - {}",
        color, label, diag.code, diag.path, diag.message
    );
}
