//! CLI entry point for rxquery.
//!
//! `serve` runs the HTTP API. The other subcommands are operator tools
//! sharing the same configuration.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use rxquery_audit::store::{AuditFilter, AuditStore, FileAuditStore};
use rxquery_audit::AuditId;
use rxquery_core::{AppConfig, Interaction, OutcomeKind, UserQuestion};
use rxquery_graph::{GraphClient, GraphConfig};
use rxquery_synth::{LlmClient, Synthesizer};

#[derive(Parser)]
#[command(name = "rxquery")]
#[command(about = "Natural-language questions over a drug-interaction graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: rxquery).
    #[arg(short, long, default_value = "rxquery", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Override the listening port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the query generated for a question without executing it.
    Translate {
        question: String,
    },
    /// Load interactions from a JSON array file into the graph.
    Seed {
        file: std::path::PathBuf,
    },
    /// Inspect the audit trail.
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },
}

#[derive(Subcommand)]
enum AuditCommand {
    /// List audit records, newest first.
    List {
        /// Only show records with this outcome (e.g. security_violation).
        #[arg(long)]
        outcome: Option<OutcomeKind>,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Print one record after checking its content hash.
    Show {
        id: AuditId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Command::Serve { port } => {
            let state = rxquery_server::build_state(&config)?;
            let port = port.unwrap_or(config.server.port);
            rxquery_server::serve(state, port).await?;
        }
        Command::Translate { question } => {
            config.validate()?;
            let llm = LlmClient::new(&config.llm)?;
            let synthesizer = Synthesizer::new(Arc::new(llm));
            let question = UserQuestion::parse(Some(question.as_str()))?;
            let query = synthesizer.synthesize(&question).await?;
            println!("{query}");
        }
        Command::Seed { file } => {
            let input = std::fs::read_to_string(&file)?;
            let interactions: Vec<Interaction> = serde_json::from_str(&input)?;

            let graph = GraphClient::connect(&GraphConfig::from(&config.neo4j)).await?;
            let count = graph.seed(&interactions).await?;
            tracing::info!(count, file = %file.display(), "Seeded interactions");
        }
        Command::Audit { command } => {
            let dir = config
                .audit
                .dir
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("audit.dir is not configured"))?;
            let store = FileAuditStore::new(dir)?;

            match command {
                AuditCommand::List { outcome, limit } => {
                    let listing = store.list(&AuditFilter {
                        outcome,
                        limit: Some(limit),
                    })?;
                    for record in &listing.records {
                        println!("{}", serde_json::to_string(record)?);
                    }
                    if !listing.skipped.is_empty() {
                        anyhow::bail!(
                            "{} audit file(s) failed to parse or verify",
                            listing.skipped.len()
                        );
                    }
                }
                AuditCommand::Show { id } => {
                    let record = store.get(id)?;
                    println!("{}", serde_json::to_string_pretty(&record)?);
                }
            }
        }
    }

    Ok(())
}
