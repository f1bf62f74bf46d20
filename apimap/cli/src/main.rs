//! Command-line client for apimap endpoint tables.
//!
//! ## Usage
//!
//! ```bash
//! # List the built-in user endpoints
//! apimap list
//!
//! # Call an endpoint
//! apimap --base-url https://api.example.com call getUser -p id=1
//!
//! # Use a definitions file and pass parameters as JSON
//! apimap --definitions api.yaml call createUser --params '{"name":"Ann","email":"ann@example.com"}'
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use apimap_lib::definitions::user_registry;
use apimap_lib::{ClientConfig, Dispatcher, ParamSet, Registry};
use clap::{Parser, Subcommand, ValueHint};
use owo_colors::{OwoColorize, Stream};
use serde_json::Value;
use tracing_subscriber::{filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Call named endpoints of a JSON REST API
#[derive(Parser)]
#[command(name = "apimap", version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    log_verbosity: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Client configuration file (TOML, YAML or JSON)
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, global = true)]
    config: Option<PathBuf>,

    /// Base URL every endpoint path is appended to
    #[arg(long, value_name = "URL", env = "APIMAP_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Endpoint definitions file [default: built-in user API]
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath, global = true)]
    definitions: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the endpoints in the active table
    List {
        /// Output as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Call an endpoint and print its validated result
    Call {
        /// Endpoint key, e.g. getUser
        #[arg(value_name = "KEY")]
        key: String,

        /// Parameter as name=value; the value is parsed as JSON when possible
        #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_param)]
        params: Vec<(String, Value)>,

        /// Parameters as a JSON object; -p values override its keys
        #[arg(long = "params", value_name = "JSON")]
        params_json: Option<String>,
    },
}

/// Parses `name=value`, reading the value as JSON and falling back to a string.
fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    if name.is_empty() {
        return Err(format!("empty parameter name in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn init_tracing(verbose: u8, json: bool) {
    let base_filter = match std::env::var("RUST_LOG") {
        Ok(filter) => filter,
        Err(_) => match verbose {
            0 => "warn".to_string(),
            1 => "warn,apimap_lib=info".to_string(),
            2 => "warn,apimap_lib=debug".to_string(),
            _ => "debug".to_string(),
        },
    };

    let filter = EnvFilter::try_new(&base_filter).unwrap_or_else(|_| EnvFilter::new("warn"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(verbose >= 2)
                    .with_file(verbose >= 3)
                    .with_line_number(verbose >= 3)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    }
}

fn load_registry(definitions: Option<&PathBuf>) -> CliResult<Registry> {
    Ok(match definitions {
        Some(path) => Registry::from_definitions_file(path)?,
        None => user_registry()?,
    })
}

fn load_config(cli: &Cli) -> CliResult<ClientConfig> {
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    let mut config = config.apply_env()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    Ok(config)
}

fn list(registry: &Registry, json: bool) -> CliResult<()> {
    if json {
        let rows: Vec<Value> = registry
            .iter()
            .map(|spec| {
                serde_json::json!({
                    "key": spec.key().as_str(),
                    "method": spec.method().to_string(),
                    "path": spec.path(),
                    "description": spec.description(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let width = registry.keys().map(|k| k.as_str().len()).max().unwrap_or(0);
    for spec in registry.iter() {
        let key = format!("{:<width$}", spec.key().as_str());
        let method = format!("{:<6}", spec.method().to_string());
        print!(
            "{}  {}  {}",
            key.if_supports_color(Stream::Stdout, |t| t.bold()),
            method,
            spec.path()
        );
        if let Some(description) = spec.description() {
            print!("  {}", description.if_supports_color(Stream::Stdout, |t| t.dimmed()));
        }
        println!();
    }
    Ok(())
}

fn collect_params(params_json: Option<&str>, pairs: Vec<(String, Value)>) -> CliResult<ParamSet> {
    let mut params = match params_json {
        Some(text) => match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => map,
            _ => return Err("--params must be a JSON object".into()),
        },
        None => ParamSet::new(),
    };
    params.extend(pairs);
    Ok(params)
}

async fn call(cli: &Cli, registry: Registry, key: &str, params: ParamSet) -> CliResult<()> {
    let config = load_config(cli)?;
    let dispatcher = Dispatcher::from_config(Arc::new(registry), &config)?;
    let result = dispatcher.dispatch(key, params).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn run(cli: Cli) -> CliResult<()> {
    let registry = load_registry(cli.definitions.as_ref())?;

    match &cli.command {
        Commands::List { json } => list(&registry, *json),
        Commands::Call {
            key,
            params,
            params_json,
        } => {
            let params = collect_params(params_json.as_deref(), params.clone())?;
            call(&cli, registry, key, params).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_verbosity, cli.json_logs);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{} {e}",
                "error:".if_supports_color(Stream::Stderr, |t| t.red())
            );
            ExitCode::FAILURE
        }
    }
}
