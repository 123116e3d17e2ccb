// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use zonekeeper::{
    config::EngineConfig,
    constants::DEFAULT_CONFIG_PATH,
    daemon::{DaemonControl, NsdControl},
    engine::ZoneEngine,
    metrics,
    model::{NewDomain, RecordInput, RecordType},
    source::MemoryZoneSource,
    store::{atomic, ZoneStore},
    validation::{validate_content, validate_domain_name, validate_name},
};

/// Zone synthesis and NSD synchronization
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a record name and content without touching anything
    Validate {
        /// Zone the record belongs to
        #[arg(long)]
        zone: String,
        /// Record type (A, AAAA, NS, CNAME, MX, TXT, SOA, SRV, PTR)
        #[arg(long = "type")]
        record_type: RecordType,
        /// Record name (`@` for the apex)
        #[arg(long)]
        name: String,
        /// Record content
        #[arg(long)]
        content: String,
    },
    /// Print the zone file for the current inventory state (no serial bump)
    Render {
        /// Inventory file
        #[arg(long)]
        inventory: PathBuf,
        /// Zone to render
        #[arg(long)]
        zone: String,
    },
    /// Bump, commit and reload one zone or every zone
    Sync {
        /// Inventory file
        #[arg(long)]
        inventory: PathBuf,
        /// Only this zone
        #[arg(long)]
        zone: Option<String>,
        /// Write Prometheus metrics to this file afterwards
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },
    /// Provision a new domain
    AddDomain {
        /// Inventory file
        #[arg(long)]
        inventory: PathBuf,
        /// Zone name
        #[arg(long)]
        zone: String,
        /// Administrator email (defaults to admin@<zone>)
        #[arg(long)]
        soa_email: Option<String>,
        /// Address for an apex A (or AAAA) record
        #[arg(long)]
        apex_ip: Option<String>,
    },
    /// Add a record to a zone
    AddRecord {
        /// Inventory file
        #[arg(long)]
        inventory: PathBuf,
        /// Zone name
        #[arg(long)]
        zone: String,
        /// Record type
        #[arg(long = "type")]
        record_type: RecordType,
        /// Record name (`@` for the apex)
        #[arg(long)]
        name: String,
        /// Record content
        #[arg(long)]
        content: String,
        /// Preference for MX and SRV records
        #[arg(long, default_value_t = 0)]
        priority: u16,
        /// Record TTL (defaults to the zone TTL)
        #[arg(long)]
        ttl: Option<u32>,
    },
    /// Delete a record by id
    DeleteRecord {
        /// Inventory file
        #[arg(long)]
        inventory: PathBuf,
        /// Record id
        #[arg(long)]
        id: i64,
    },
    /// Delete a zone file, its zone list entry and its inventory entry
    Remove {
        /// Inventory file
        #[arg(long)]
        inventory: PathBuf,
        /// Zone to remove
        #[arg(long)]
        zone: String,
    },
    /// Report daemon liveness and permissions as JSON
    Status,
    /// List zone files as JSON
    List,
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("zonekeeper")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    init_tracing();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "zonekeeper", &mut std::io::stdout());
        return Ok(());
    }

    let config = EngineConfig::load(&cli.config)?;
    debug!(zone_dir = %config.zone_dir.display(), "Configuration loaded");

    match cli.command {
        Commands::Validate {
            zone,
            record_type,
            name,
            content,
        } => validate(&zone, record_type, &name, &content),
        Commands::Render { inventory, zone } => {
            let engine = open_engine(config, &inventory).await?;
            print!("{}", engine.preview(&zone).await?);
            Ok(())
        }
        Commands::Sync {
            inventory,
            zone,
            metrics_out,
        } => {
            let engine = open_engine(config, &inventory).await?;
            let result = sync(&engine, zone.as_deref()).await;
            engine.source().save(&inventory).await?;
            if let Some(path) = metrics_out {
                write_metrics(&path).await?;
            }
            result
        }
        Commands::AddDomain {
            inventory,
            zone,
            soa_email,
            apex_ip,
        } => {
            let engine = open_engine(config, &inventory).await?;
            let result = engine
                .create_domain(NewDomain {
                    name: zone,
                    soa_email,
                    apex_ipv4: apex_ip,
                })
                .await;
            engine.source().save(&inventory).await?;
            let report = result?;
            println!("{}", report.message());
            Ok(())
        }
        Commands::AddRecord {
            inventory,
            zone,
            record_type,
            name,
            content,
            priority,
            ttl,
        } => {
            let engine = open_engine(config, &inventory).await?;
            let input = RecordInput {
                record_type,
                name,
                content,
                priority,
                ttl,
            };
            let result = engine.create_record(&zone, input).await;
            engine.source().save(&inventory).await?;
            let change = result?;
            println!("{}", serde_json::to_string_pretty(&change)?);
            Ok(())
        }
        Commands::DeleteRecord { inventory, id } => {
            let engine = open_engine(config, &inventory).await?;
            let result = engine.delete_record(id).await;
            engine.source().save(&inventory).await?;
            let change = result?;
            println!("{}", change.sync.message());
            Ok(())
        }
        Commands::Remove { inventory, zone } => {
            let engine = open_engine(config, &inventory).await?;
            let report = engine.delete_domain(&zone).await?;
            engine.source().save(&inventory).await?;
            if let Some(warning) = &report.reconfig_warning {
                warn!(zone = %report.zone, "{}", warning.user_message());
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Status => {
            let daemon = NsdControl::new(&config);
            let status = daemon.report().await;
            for warning in status.permissions.warnings() {
                warn!("{warning}");
            }
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Commands::List => {
            let store = ZoneStore::new(&config);
            let files = store.list_zone_files().await?;
            println!("{}", serde_json::to_string_pretty(&files)?);
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

/// Initialize logging on stderr; stdout carries command output.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT=json`.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn open_engine(
    config: EngineConfig,
    inventory: &Path,
) -> Result<ZoneEngine<MemoryZoneSource>> {
    let source = MemoryZoneSource::load(inventory).await?;
    let daemon = Arc::new(NsdControl::new(&config));
    Ok(ZoneEngine::new(config, Arc::new(source), daemon))
}

fn validate(zone: &str, record_type: RecordType, name: &str, content: &str) -> Result<()> {
    let zone = validate_domain_name(zone);
    let name = validate_name(name, &zone.corrected);
    let content = validate_content(record_type, content, &zone.corrected);
    let valid = zone.valid && name.valid && content.valid;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "valid": valid,
            "zone": zone,
            "name": name,
            "content": content,
        }))?
    );
    if !valid {
        bail!("validation failed");
    }
    Ok(())
}

async fn sync(engine: &ZoneEngine<MemoryZoneSource>, zone: Option<&str>) -> Result<()> {
    let results = match zone {
        Some(zone) => vec![(zone.to_string(), engine.synchronize(zone).await)],
        None => engine.synchronize_all().await?,
    };

    let mut failed = 0;
    let mut output = Vec::with_capacity(results.len());
    for (zone, result) in results {
        match result {
            Ok(report) => {
                info!(zone = %zone, "{}", report.message());
                output.push(json!({ "zone": zone, "report": report }));
            }
            Err(e) => {
                failed += 1;
                output.push(json!({ "zone": zone, "error": e.user_message() }));
            }
        }
    }
    println!("{}", serde_json::to_string_pretty(&output)?);

    if failed > 0 {
        bail!("{failed} zone(s) failed to synchronize");
    }
    Ok(())
}

async fn write_metrics(path: &Path) -> Result<()> {
    let text = metrics::gather_metrics().context("Failed to encode metrics")?;
    atomic::write_atomic(path.to_path_buf(), text.into_bytes()).await?;
    debug!(path = %path.display(), "Wrote metrics");
    Ok(())
}
