//! dtest - upgrade harness CLI
//!
//! Inspect upgrade-path resolution and poke node JMX from the command line

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use dtest_core::config::{
    HarnessConfig, ENV_CASSANDRA_GITREF, ENV_CASSANDRA_VERSION, ENV_RUN_STATIC_UPGRADE_MATRIX,
    ENV_UPGRADE_OVERRIDE_MANIFEST,
};
use dtest_core::jmx::{JolokiaAgent, MetricsProbe, DEFAULT_JOLOKIA_PORT};
use dtest_core::logging::{init_logging, LogConfig, LogFormat};
use dtest_core::suite::SuiteRegistry;
use dtest_core::upgrade::{version_family, BuildSummary, PathBuilder, UpgradePath};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dtest")]
#[command(version)]
#[command(about = "Upgrade test harness", long_about = None)]
struct Cli {
    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the upgrade paths for this run
    Paths {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Output format (table, json, yaml)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Print the release family of a version string
    Family {
        /// Version, e.g. 3.0.5 or git:cassandra-3.0
        version: String,
    },
    /// List the suites generated for a test family
    Suites {
        #[command(flatten)]
        resolve: ResolveArgs,
        /// Base test family name
        #[arg(long)]
        base: String,
        #[arg(long, default_value_t = 1)]
        nodes: usize,
        /// Replication factor
        #[arg(long, default_value_t = 1)]
        rf: usize,
        /// Output format (table, json, yaml)
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Query a node over the Jolokia bridge
    Jmx {
        #[command(subcommand)]
        command: JmxCommands,
    },
}

/// Overrides applied on top of the environment
#[derive(Args)]
struct ResolveArgs {
    /// Test the full static upgrade matrix
    #[arg(long)]
    full_matrix: bool,
    /// Version of the code under test
    #[arg(long)]
    local_version: Option<String>,
    /// Source reference of the code under test (e.g. git:<sha>)
    #[arg(long)]
    local_ref: Option<String>,
    /// YAML override manifest
    #[arg(long = "override")]
    override_manifest: Option<PathBuf>,
}

#[derive(Subcommand)]
enum JmxCommands {
    /// Read an MBean attribute
    Read {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = DEFAULT_JOLOKIA_PORT)]
        port: u16,
        #[arg(long)]
        mbean: String,
        #[arg(long)]
        attribute: String,
        /// Inner path into a composite attribute
        #[arg(long)]
        path: Option<String>,
    },
    /// Invoke an MBean operation
    Exec {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = DEFAULT_JOLOKIA_PORT)]
        port: u16,
        #[arg(long)]
        mbean: String,
        #[arg(long)]
        operation: String,
        /// Operation arguments; JSON literals are passed through, anything else as a string
        arguments: Vec<String>,
    },
}

/// Environment configuration with command-line flags taking precedence
fn load_config(args: &ResolveArgs) -> anyhow::Result<HarnessConfig> {
    let mut overrides: HashMap<&str, String> = HashMap::new();
    if args.full_matrix {
        overrides.insert(ENV_RUN_STATIC_UPGRADE_MATRIX, "true".to_string());
    }
    if let Some(version) = &args.local_version {
        overrides.insert(ENV_CASSANDRA_VERSION, version.clone());
    }
    if let Some(local_ref) = &args.local_ref {
        overrides.insert(ENV_CASSANDRA_GITREF, local_ref.clone());
    }
    if let Some(path) = &args.override_manifest {
        overrides.insert(ENV_UPGRADE_OVERRIDE_MANIFEST, path.to_string_lossy().to_string());
    }

    let config = HarnessConfig::from_env_with(|key| overrides.get(key).cloned())
        .context("reading harness environment")?;
    config.validate()?;
    Ok(config)
}

fn resolve(config: &HarnessConfig) -> anyhow::Result<(Vec<UpgradePath>, BuildSummary)> {
    let options = config.resolver_options()?;
    let builder = PathBuilder::with_builtin(options)?;
    Ok(builder.build_with_summary()?)
}

fn print_structured<T: Serialize>(value: &T, format: &str) -> anyhow::Result<bool> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(value)?),
        "yaml" => print!("{}", serde_yaml::to_string(value)?),
        "table" => return Ok(false),
        other => bail!("Unknown format '{}'. Use: table, json, or yaml", other),
    }
    Ok(true)
}

fn parse_argument(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&LogConfig {
        level: cli.log_level.clone(),
        format: if cli.log_json { LogFormat::Json } else { LogFormat::Pretty },
    })?;

    match cli.command {
        Commands::Paths { resolve: args, format } => {
            let config = load_config(&args)?;
            let (paths, summary) = resolve(&config)?;

            if print_structured(&paths, &format)? {
                return Ok(());
            }

            if paths.is_empty() {
                println!("No upgrade paths for family '{}'", config.local_family());
                return Ok(());
            }

            println!("{:<48} {:<20} {:<20}", "PATH", "FROM", "TO");
            for path in &paths {
                println!("{:<48} {:<20} {:<20}", path.name, path.starting_version, path.upgrade_version);
            }
            println!(
                "\nTotal: {} of {} candidate(s) (undefined {}, untargeted {}, protocol {})",
                summary.emitted, summary.candidates, summary.undefined, summary.untargeted, summary.protocol_mismatch
            );
        }

        Commands::Family { version } => {
            println!("{}", version_family(&version));
        }

        Commands::Suites {
            resolve: args,
            base,
            nodes,
            rf,
            format,
        } => {
            let config = load_config(&args)?;
            let (paths, _) = resolve(&config)?;

            let mut registry = SuiteRegistry::new();
            let suites = registry.generate(&base, nodes, rf, &paths, config.upgrade_test_run)?;

            if print_structured(&suites, &format)? {
                return Ok(());
            }

            println!("{:<80} {:<8}", "SUITE", "ENABLED");
            for suite in &suites {
                println!("{:<80} {:<8}", suite.name, suite.enabled);
            }
            println!("\nTotal: {} suite(s)", suites.len());
        }

        Commands::Jmx { command } => match command {
            JmxCommands::Read {
                host,
                port,
                mbean,
                attribute,
                path,
            } => {
                let agent = JolokiaAgent::new(&host).with_port(port);
                let value = agent.read_attribute(&mbean, &attribute, path.as_deref()).await?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
            JmxCommands::Exec {
                host,
                port,
                mbean,
                operation,
                arguments,
            } => {
                let agent = JolokiaAgent::new(&host).with_port(port);
                let arguments = arguments.iter().map(|a| parse_argument(a)).collect();
                let value = agent.execute_method(&mbean, &operation, arguments).await?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            }
        },
    }

    Ok(())
}
