//! assetdb CLI - inspect and edit an asset graph database

mod commands;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "assetdb")]
#[command(version)]
#[command(about = "Typed asset graph store - security-relevant entities and their relations")]
#[command(long_about = r#"
assetdb stores typed assets (domains, IP addresses, certificates, people, ...)
and the directed, timestamped relations between them.

Example usage:
  assetdb create --type FQDN --content '{"name":"example.com"}'
  assetdb create --type IPAddress --content '{"address":"93.184.216.34","type":"IPv4"}' --from 1 --relation resolves_to
  assetdb relations --id 1
  assetdb find --type FQDN --since 2024-01-01T00:00:00Z
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON instead of human-readable output
    #[arg(long, global = true)]
    json: bool,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default assetdb.toml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// List the supported asset type tags
    Types,

    /// Create an asset (or find the existing one) and optionally link it
    Create {
        /// Asset type tag (FQDN, IPAddress, ...)
        #[arg(short = 't', long = "type")]
        asset_type: String,

        /// JSON content of the asset
        #[arg(long)]
        content: String,

        /// Source asset ID to link from
        #[arg(long)]
        from: Option<u64>,

        /// Relation type for the link from the source
        #[arg(short, long)]
        relation: Option<String>,
    },

    /// Link two existing assets
    Link {
        #[arg(long)]
        from: u64,

        #[arg(short, long)]
        relation: String,

        #[arg(long)]
        to: u64,
    },

    /// Update the last seen time of an asset (or relation)
    Touch {
        #[arg(long)]
        id: u64,

        /// Touch a relation instead of an asset
        #[arg(long)]
        relation: bool,
    },

    /// Delete an asset and its relations
    DeleteAsset {
        #[arg(long)]
        id: u64,
    },

    DeleteRelation {
        #[arg(long)]
        id: u64,
    },

    /// Show an asset by ID
    Get {
        #[arg(long)]
        id: u64,

        /// Only if last seen at or after this RFC 3339 time
        #[arg(long)]
        since: Option<String>,
    },

    /// Find assets by type, optionally matching content
    Find {
        #[arg(short = 't', long = "type")]
        asset_type: String,

        /// JSON content to match on its content key
        #[arg(long)]
        content: Option<String>,

        /// Only assets last seen at or after this RFC 3339 time
        #[arg(long)]
        since: Option<String>,
    },

    /// List relations of an asset
    Relations {
        #[arg(long)]
        id: u64,

        /// Show incoming instead of outgoing relations
        #[arg(long)]
        incoming: bool,

        /// Relation types to include (repeatable; default all)
        #[arg(short = 't', long = "type")]
        types: Vec<String>,

        /// Only relations last seen at or after this RFC 3339 time
        #[arg(long)]
        since: Option<String>,
    },

    /// Query assets or relations with SQL constraints (`WHERE ...`)
    Query {
        constraints: String,

        /// Query the assets table (default)
        #[arg(long, conflicts_with = "relations")]
        assets: bool,

        /// Query the relations table instead of assets
        #[arg(long)]
        relations: bool,
    },

    /// Run a raw SQL query
    Sql { query: String },

    /// Show database statistics
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

/// Print a JSON envelope for a successful command
pub fn emit_success(output_mode: OutputMode, command: &str, data: impl Serialize) -> anyhow::Result<()> {
    debug_assert!(!output_mode.is_human());
    let envelope = serde_json::json!({
        "ok": true,
        "command": command,
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides the verbosity flag
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let ctx = commands::Context {
        output: if cli.json { OutputMode::Json } else { OutputMode::Human },
        database: cli.database,
        config: cli.config,
    };

    let result = match cli.command {
        Commands::Init { force } => commands::run_init(&ctx, force),
        Commands::Types => commands::run_types(&ctx),
        Commands::Create { asset_type, content, from, relation } => {
            commands::run_create(&ctx, &asset_type, &content, from, relation.as_deref())
        }
        Commands::Link { from, relation, to } => commands::run_link(&ctx, from, &relation, to),
        Commands::Touch { id, relation } => commands::run_touch(&ctx, id, relation),
        Commands::DeleteAsset { id } => commands::run_delete_asset(&ctx, id),
        Commands::DeleteRelation { id } => commands::run_delete_relation(&ctx, id),
        Commands::Get { id, since } => commands::run_get(&ctx, id, since.as_deref()),
        Commands::Find { asset_type, content, since } => {
            commands::run_find(&ctx, &asset_type, content.as_deref(), since.as_deref())
        }
        Commands::Relations { id, incoming, types, since } => {
            commands::run_relations(&ctx, id, incoming, &types, since.as_deref())
        }
        Commands::Query { constraints, relations, .. } => commands::run_query(&ctx, &constraints, relations),
        Commands::Sql { query } => commands::run_sql(&ctx, &query),
        Commands::Stats => commands::run_stats(&ctx),
    };

    if let Err(e) = &result {
        if ctx.output.is_human() {
            assetdb::ui::error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
    result
}
