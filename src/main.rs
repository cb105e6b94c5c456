use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::{info, warn};

use sibyl::config::Config;
use sibyl::db::models::EntityKind;
use sibyl::db::Database;
use sibyl::mitigation::lookup::{GiphyLookup, ImageLookup, NoopLookup};
use sibyl::pipeline::{replay, session::Session};
use sibyl::router::MessageRouter;
use sibyl::scoring::policy::ScoringPolicy;

/// Sibyl: crime coefficients for chat.
///
/// Rates every public message, ranks users and channels by their rolling
/// score, and announces enforcement when a channel crosses the threshold.
#[derive(Parser)]
#[command(name = "sibyl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the entity directory
    Init,

    /// Process JSON-lines messages from stdin, writing responses to stdout
    Run,

    /// Rebuild stored scores from a recorded JSON-lines message log
    Replay {
        /// Path to the log file
        file: String,
    },

    /// Show the highest stored crime coefficients
    Leaderboard {
        #[arg(value_enum)]
        kind: KindArg,

        /// Number of entries to show (default: SIBYL_LEADERBOARD_K)
        #[arg(long)]
        k: Option<usize>,
    },

    /// Show the stored score of a user (name or id) or a #channel
    Score {
        /// e.g. alice, U024BE7LH, or #general
        target: String,
    },

    /// Show directory status
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Users,
    Channels,
}

impl From<KindArg> for EntityKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Users => EntityKind::User,
            KindArg::Channels => EntityKind::Channel,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Logs go to stderr: stdout carries responses in `sibyl run`
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sibyl=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            info!("Initializing Sibyl database...");
            let config = Config::load()?;
            let db = sibyl::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nSibyl is ready. Pipe chat messages into: sibyl run");
            if !config.lookup_enabled() {
                println!(
                    "{}",
                    "Tip: set GIPHY_API_KEY to attach images to enforcement notices.".dimmed()
                );
            }
        }

        Commands::Run => {
            let config = Config::load()?;
            let db = sibyl::db::open_sqlite(&config.db_path)?;
            let router = MessageRouter::new(&config.engine_settings(), ScoringPolicy::default());
            let lookup = create_lookup(&config)?;

            let mut session = Session::new(
                router,
                db,
                lookup,
                &config.lookup_query,
                config.lookup_timeout,
            );
            session.bootstrap().await?;

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let writer = tokio::spawn(async move {
                let mut stdout = tokio::io::stdout();
                while let Some(outgoing) = rx.recv().await {
                    let mut line = serde_json::to_string(&outgoing)?;
                    line.push('\n');
                    stdout.write_all(line.as_bytes()).await?;
                    stdout.flush().await?;
                }
                anyhow::Ok(())
            });

            let stats = session
                .run(BufReader::new(tokio::io::stdin()), tx)
                .await?;
            // The writer exits once every pending lookup has posted
            drop(session);
            writer.await.context("Output writer panicked")??;

            eprintln!(
                "{} messages, {} responses, {} enforcement notices, {} skipped",
                stats.messages, stats.responses, stats.mitigations, stats.skipped
            );
        }

        Commands::Replay { file } => {
            let config = Config::load()?;
            let db = sibyl::db::initialize_sqlite(&config.db_path)?;
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read message log {file}"))?;
            let (messages, skipped) = replay::parse_log(&contents);
            if skipped > 0 {
                warn!("Skipped {skipped} malformed lines in {file}");
            }

            println!("Replaying {} messages from {}...", messages.len(), file);
            let mut router =
                MessageRouter::new(&config.engine_settings(), ScoringPolicy::default());
            let mut stats = replay::run(&mut router, &db, &messages).await?;
            stats.skipped = skipped;

            println!(
                "Replayed {} messages: {} users and {} channels scored, {} enforcement triggers",
                stats.messages, stats.users, stats.channels, stats.mitigations
            );
            if stats.skipped > 0 {
                println!("{}", format!("{} lines skipped", stats.skipped).dimmed());
            }
        }

        Commands::Leaderboard { kind, k } => {
            let config = Config::load()?;
            let db = sibyl::db::open_sqlite(&config.db_path)?;
            let kind = EntityKind::from(kind);
            let limit = k.unwrap_or(config.leaderboard_k);
            let rows = db.get_ranked(kind, limit as u32).await?;
            sibyl::output::terminal::display_leaderboard(kind, &rows);
        }

        Commands::Score { target } => {
            let config = Config::load()?;
            let db = sibyl::db::open_sqlite(&config.db_path)?;
            let (kind, key) = match target.strip_prefix('#') {
                Some(channel) => (EntityKind::Channel, channel),
                None => (
                    EntityKind::User,
                    target.strip_prefix('@').unwrap_or(&target),
                ),
            };

            match find_entity(&db, kind, key).await? {
                Some(row) => sibyl::output::terminal::display_entity_detail(kind, &row),
                None => {
                    println!("No {kind} named {}{key} in the directory.", kind.sigil());
                }
            }
        }

        Commands::Status => {
            let config = Config::load()?;
            if !Path::new(&config.db_path).exists() {
                sibyl::status::show_uninitialized();
                return Ok(());
            }
            let db = sibyl::db::open_sqlite(&config.db_path)?;
            sibyl::status::show(&db, &config.db_path).await?;
        }
    }

    Ok(())
}

/// Pick the image lookup provider: Giphy when a key is configured.
fn create_lookup(config: &Config) -> Result<Arc<dyn ImageLookup>> {
    if config.lookup_enabled() {
        info!("Using Giphy for enforcement images");
        let lookup = GiphyLookup::new(config.giphy_api_key.clone(), &config.giphy_api_url)?;
        Ok(Arc::new(lookup))
    } else {
        info!("GIPHY_API_KEY not set, enforcement notices will use fallback text");
        Ok(Arc::new(NoopLookup))
    }
}

/// Look an entity up by id first, then by display name.
async fn find_entity(
    db: &Arc<dyn Database>,
    kind: EntityKind,
    key: &str,
) -> Result<Option<sibyl::db::models::EntityRow>> {
    if let Some(row) = db.get_entity(kind, key).await? {
        return Ok(Some(row));
    }
    db.find_by_name(kind, key).await
}
