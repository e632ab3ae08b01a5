//! SMI-S Topology Discovery CLI
//!
//! Runs one discovery against a captured CIM snapshot and prints the
//! normalized topology, or its CMDB relationship graph, to stdout.

use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use smis_topology::{
    discover_topology, CimClient, GraphReporter, NamespaceFactory, RegistryConfig, Result,
    SnapshotClient, SnapshotConfig, Topology, TopologyReporter,
};

// =============================================================================
// CLI Arguments
// =============================================================================

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

/// SMI-S storage topology discovery
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CIM snapshot file (JSON or YAML)
    #[arg(long, env = "SMIS_SNAPSHOT", required_unless_present = "schema")]
    snapshot: Option<PathBuf>,

    /// Vendor binding; inferred from the namespace when omitted
    #[arg(long, env = "SMIS_VENDOR")]
    vendor: Option<String>,

    /// CIM namespace; defaults to the snapshot's namespace
    #[arg(long, env = "SMIS_NAMESPACE")]
    namespace: Option<String>,

    /// Query profile areas concurrently
    #[arg(long, env = "SMIS_CONCURRENT")]
    concurrent: bool,

    /// Answer classes missing from the snapshot with zero instances
    #[arg(long, env = "SMIS_MISSING_AS_EMPTY")]
    missing_as_empty: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Print the relationship graph instead of the topology
    #[arg(long)]
    graph: bool,

    /// Print the topology JSON schema and exit
    #[arg(long)]
    schema: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    if args.schema {
        let schema = schemars::schema_for!(Topology);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let Some(path) = args.snapshot.as_deref() else {
        return Err(smis_topology::Error::Configuration("--snapshot is required".into()));
    };

    info!("Starting SMI-S topology discovery");
    info!("  Version: {}", smis_topology::VERSION);
    info!("  Snapshot: {}", path.display());
    info!("  Concurrent: {}", args.concurrent);

    let config = SnapshotConfig {
        missing_class_as_empty: args.missing_as_empty,
    };
    let client = SnapshotClient::from_path(path, config)?;

    let namespace_name = args
        .namespace
        .clone()
        .unwrap_or_else(|| client.namespace().to_string());
    let namespace = match args.vendor.as_deref() {
        Some(vendor) => NamespaceFactory::for_vendor(vendor, Some(&namespace_name))?,
        None => NamespaceFactory::for_namespace(&namespace_name)?,
    };

    let registry_config = RegistryConfig {
        concurrent: args.concurrent,
    };
    let (topology, report) = discover_topology(namespace.as_ref(), &client, registry_config).await?;

    info!(
        "Discovered {} objects across {} fields",
        report.discovered_count(),
        report.outcomes.len()
    );
    for outcome in report.failed() {
        warn!("Field {} left empty: {:?}", outcome.field, outcome.status);
    }

    if args.graph {
        let graph = GraphReporter::new().report(&topology)?;
        info!(
            "Graph has {} nodes and {} relationships",
            graph.nodes.len(),
            graph.relationships.len()
        );
        print_output(&graph, args.format)?;
    } else {
        print_output(&topology, args.format)?;
    }

    Ok(())
}

fn print_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Yaml => serde_yaml::to_string(value)?,
    };
    println!("{}", rendered);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only the rendered output
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
