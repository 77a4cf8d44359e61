use anyhow::Result;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, AppConfigProvider, CliArgs};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use modkit::{ModuleEntry, RunOptions, ShutdownOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CorvoEvents Server - event catalog and registration API
#[derive(Parser)]
#[command(name = "corvo-server")]
#[command(about = "CorvoEvents Server - event catalog and registration API")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

/// Fills `modules.api_ingress.bind_addr` from `server.host:port`.
///
/// An explicit `--port` always wins; otherwise a bind address already set in
/// the module section is kept.
fn apply_bind_addr(config: &mut AppConfig, port_override: bool) {
    let bind_addr = config.server.bind_addr();
    let section = config
        .modules
        .entry(api_ingress::MODULE_NAME.to_string())
        .or_insert_with(|| serde_json::json!({}));

    if let Some(obj) = section.as_object_mut() {
        if port_override || !obj.contains_key("bind_addr") {
            obj.insert("bind_addr".to_string(), serde_json::Value::String(bind_addr));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
    };

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    apply_bind_addr(&mut config, args.port.is_some());

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("CorvoEvents Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

fn module_entries() -> Vec<ModuleEntry> {
    let ingress = Arc::new(api_ingress::ApiIngress::default());
    let events = Arc::new(events::EventsModule::new());

    vec![
        ModuleEntry::new(api_ingress::MODULE_NAME, ingress.clone())
            .with_rest_host(ingress.clone())
            .with_stateful(ingress),
        ModuleEntry::new(events::MODULE_NAME, events.clone()).with_rest(events),
    ]
}

async fn run_server(config: AppConfig) -> Result<()> {
    config.validate()?;
    tracing::info!("Initializing modules...");

    let run_options = RunOptions {
        modules_cfg: Arc::new(AppConfigProvider::new(config)),
        shutdown: ShutdownOptions::Signals,
        modules: module_entries(),
    };

    modkit::run(run_options).await
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    config.validate()?;

    if let Some(raw) = config.modules.get(api_ingress::MODULE_NAME) {
        serde_json::from_value::<api_ingress::ApiIngressConfig>(raw.clone())
            .map_err(|e| anyhow::anyhow!("invalid {} config: {e}", api_ingress::MODULE_NAME))?;
    }
    if let Some(raw) = config.modules.get(events::MODULE_NAME) {
        serde_json::from_value::<events::config::EventsConfig>(raw.clone())
            .map_err(|e| anyhow::anyhow!("invalid {} config: {e}", events::MODULE_NAME))?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
