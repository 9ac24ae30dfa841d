//! CertGate CLI
//!
//! Command-line device authorization resolver for certificate enrollment
//! workflows. The `validate` subcommand implements the enrollment gateway
//! contract: one pipe-delimited line on stdout, exit 0 for authorized,
//! 1 for denied, 2 for usage errors. All diagnostics go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod sources;

use cg_observability::{AuditLog, LoggingConfig};
use cg_sources::SourceHealth;
use config::AppConfig;

#[derive(Parser)]
#[command(name = "certgate")]
#[command(version)]
#[command(about = "Device authorization resolver for certificate management", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a hostname to an authorization decision
    Validate {
        /// Hostname to resolve (matched case-sensitively)
        hostname: String,

        /// Requester identifier, recorded in the audit trail only
        requester: Option<String>,
    },

    /// Inspect the configured inventory sources
    Sources {
        #[command(subcommand)]
        action: SourceCommands,
    },

    /// Show current configuration
    Config {
        /// Show secrets (redacted by default)
        #[arg(long)]
        show_secrets: bool,
    },
}

#[derive(Subcommand)]
enum SourceCommands {
    /// List the five sources and whether each is configured
    List,

    /// Health-check every configured source
    Test,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    cg_observability::init_logging_with_config(LoggingConfig {
        level: log_level,
        json_format: cli.format == OutputFormat::Json,
        ..Default::default()
    });

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = AppConfig::load(&config_path).unwrap_or_else(|_| {
        if cli.verbose {
            eprintln!("Using default configuration (no config file found)");
        }
        AppConfig::from_env()
    });

    match cli.command {
        Commands::Validate {
            hostname,
            requester,
        } => cmd_validate(config, &hostname, requester.as_deref(), cli.format).await,
        Commands::Sources { action } => match action {
            SourceCommands::List => cmd_sources_list(config, cli.format),
            SourceCommands::Test => cmd_sources_test(config, cli.format).await,
        },
        Commands::Config { show_secrets } => cmd_config(config, show_secrets, cli.format),
    }
}

fn default_config_path() -> PathBuf {
    if let Some(dirs) = directories::ProjectDirs::from("com", "certgate", "certgate") {
        dirs.config_dir().join("config.yaml")
    } else {
        PathBuf::from("config/default.yaml")
    }
}

async fn cmd_validate(
    config: AppConfig,
    hostname: &str,
    requester: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let audit_log = Arc::new(AuditLog::new(config.audit_max_entries));
    let cascade = sources::build_cascade(&config, audit_log).await;

    let outcome = cascade.resolve(hostname, requester).await;

    // The contract line (or its JSON equivalent) is the only stdout output.
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        println!("{}", outcome.output_line());
    }

    std::process::exit(outcome.exit_code());
}

fn cmd_sources_list(config: AppConfig, format: OutputFormat) -> Result<()> {
    let rows = [
        ("cmdb", sources::CMDB_SOURCE_NAME, config.cmdb.is_configured()),
        (
            "relational",
            sources::DATABASE_SOURCE_NAME,
            config.database.is_configured(),
        ),
        (
            "cloud_inventory",
            sources::CLOUD_SOURCE_NAME,
            config.cloud.is_configured(),
        ),
        (
            "cluster_metadata",
            sources::CLUSTER_SOURCE_NAME,
            config.cluster.enabled,
        ),
        (
            "flat_file",
            sources::FLAT_FILE_SOURCE_NAME,
            config.flat_file.is_configured(),
        ),
    ];

    if format == OutputFormat::Json {
        let json: Vec<_> = rows
            .iter()
            .map(|(kind, name, configured)| {
                serde_json::json!({ "kind": kind, "name": name, "configured": configured })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("{}", "Inventory Sources (cascade order)".bold());
        println!("─────────────────────────────────");
        for (kind, name, configured) in rows {
            let status = if configured {
                "configured".green()
            } else {
                "unconfigured".yellow()
            };
            println!("  {} ({}) - {}", name.cyan(), kind, status);
        }
    }

    Ok(())
}

async fn cmd_sources_test(config: AppConfig, format: OutputFormat) -> Result<()> {
    let audit_log = Arc::new(AuditLog::new(config.audit_max_entries));
    let cascade = sources::build_cascade(&config, audit_log).await;

    let statuses = cascade.check_sources().await;

    if format == OutputFormat::Json {
        let json: Vec<_> = statuses
            .iter()
            .map(|s| {
                serde_json::json!({
                    "name": s.name,
                    "kind": s.kind.to_string(),
                    "health": s.health,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("{}", "Source Health".bold());
    println!("─────────────");
    if statuses.is_empty() {
        println!("  No sources configured");
    }
    for status in &statuses {
        let health = match &status.health {
            SourceHealth::Healthy => "healthy".green().to_string(),
            SourceHealth::Degraded(msg) => format!("{} ({})", "degraded".yellow(), msg),
            SourceHealth::Unhealthy(msg) => format!("{} ({})", "unhealthy".red(), msg),
            SourceHealth::Unconfigured => "unconfigured".yellow().to_string(),
        };
        println!("  {} [{}] - {}", status.name.cyan(), status.kind, health);
    }

    Ok(())
}

fn cmd_config(config: AppConfig, show_secrets: bool, format: OutputFormat) -> Result<()> {
    let display_config = if show_secrets {
        config
    } else {
        config.redact_secrets()
    };

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&display_config)?);
    } else {
        println!("{}", "Current Configuration".bold());
        println!("─────────────────────");
        println!("Owner domain: {}", display_config.owner_domain);
        println!(
            "CMDB: {} ({})",
            display_config.cmdb.instance,
            configured_label(display_config.cmdb.is_configured())
        );
        println!(
            "Database: {}/{} ({})",
            display_config.database.host,
            display_config.database.name,
            configured_label(display_config.database.is_configured())
        );
        println!(
            "Cloud: subscription {} ({})",
            if display_config.cloud.subscription_id.is_empty() {
                "<unset>"
            } else {
                &display_config.cloud.subscription_id
            },
            configured_label(display_config.cloud.is_configured())
        );
        println!(
            "Cluster: {}",
            configured_label(display_config.cluster.enabled)
        );
        println!(
            "Flat file: {} ({})",
            display_config.flat_file.csv_path,
            configured_label(display_config.flat_file.is_configured())
        );
    }

    Ok(())
}

fn configured_label(configured: bool) -> colored::ColoredString {
    if configured {
        "configured".green()
    } else {
        "unconfigured".yellow()
    }
}
