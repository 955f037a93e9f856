// ============================================
// main.rs - tgmarkup command line
// ============================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::task::JoinSet;
use tracing::{debug, info};

use tgmarkup::logger::{self, LoggerConfig};
use tgmarkup::{Chat, Config, Dialect, EntityKind, MessageEntity, PeerBatch, PeerCache};

#[derive(Parser)]
#[command(name = "tgmarkup", version, about = "Convert Telegram Markdown/HTML into text + entities")]
struct Cli {
    /// Config file (defaults to ~/.config/tgmarkup/config.yaml)
    #[arg(long, global = true, env = "TGMARKUP_CONFIG")]
    config: Option<PathBuf>,

    /// More logging (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Also write logs to this file (rotated daily)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Strip markup and print the plain text with its entities
    Parse {
        #[arg(short, long, value_enum)]
        dialect: Option<Dialect>,
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
        /// Peer batches (JSON) whose access hashes resolve mentions
        #[arg(long)]
        peers: Vec<PathBuf>,
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },
    /// Escape plain text for the given dialect
    Escape {
        #[arg(short, long, value_enum)]
        dialect: Option<Dialect>,
        /// Input file (stdin when omitted)
        input: Option<PathBuf>,
    },
    /// Merge peer batches (JSON) and print the resulting tables
    Merge {
        #[arg(long)]
        json: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref()).context("Failed to load config")?;

    let level = logger::bump_level(&config.logging.level, cli.verbose);
    let mut logger_config =
        LoggerConfig::from_logging(&config.logging, cli.log_file.clone().or(config.log_file_path()));
    logger_config.level = level.to_string().to_lowercase();
    let _guard = logger::init(logger_config)?;

    if !config.output.color {
        colored::control::set_override(false);
    }
    debug!("Starting {}", tgmarkup::version());

    match cli.command {
        Command::Parse {
            dialect,
            json,
            peers,
            input,
        } => {
            let dialect = dialect.unwrap_or(config.default_dialect);
            let text = read_input(input.as_deref()).await?;

            let mut access_hashes = config.access_hashes.clone();
            if !peers.is_empty() {
                let cache = merge_files(&peers).await?;
                access_hashes.extend(cache.access_hashes());
            }

            let (plain, entities) = dialect.parse(&text, &access_hashes);
            info!(
                "Parsed {} input: {} entities",
                format!("{:?}", dialect).to_lowercase(),
                entities.as_ref().map_or(0, Vec::len)
            );

            if json || config.output.json {
                let out = serde_json::json!({ "text": plain, "entities": entities });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_entities(&plain, entities.as_deref().unwrap_or_default());
            }
        }
        Command::Escape { dialect, input } => {
            let dialect = dialect.unwrap_or(config.default_dialect);
            let text = read_input(input.as_deref()).await?;
            print!("{}", dialect.escape(&text));
        }
        Command::Merge { json, files } => {
            let cache = merge_files(&files).await?;
            if json || config.output.json {
                println!("{}", serde_json::to_string_pretty(&cache.snapshot())?);
            } else {
                print_tables(&cache);
            }
        }
    }

    Ok(())
}

async fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {:?}", path)),
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Load every batch on its own task, all merging into one shared cache.
async fn merge_files(files: &[PathBuf]) -> Result<PeerCache> {
    let cache = Arc::new(PeerCache::new());
    let mut tasks = JoinSet::new();

    for path in files {
        let path = path.clone();
        let cache = Arc::clone(&cache);
        tasks.spawn(async move {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {:?}", path))?;
            let batch = PeerBatch::from_json(&contents)
                .with_context(|| format!("Invalid peer batch {:?}", path))?;
            tokio::task::spawn_blocking(move || cache.collect(&batch))
                .await
                .context("Merge task failed")?;
            info!("Merged {:?}", path);
            anyhow::Ok(())
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.context("Merge task panicked")??;
    }

    Arc::try_unwrap(cache).map_err(|_| anyhow::anyhow!("Peer cache still shared after merge"))
}

fn print_entities(text: &str, entities: &[MessageEntity]) {
    println!("{}", text);

    if entities.is_empty() {
        println!("\n{}", "(no entities)".dimmed());
        return;
    }

    println!();
    for entity in entities {
        let label = format!("{:?}", entity.entity_type()).to_lowercase();
        let detail = match &entity.kind {
            EntityKind::Pre { language } if !language.is_empty() => format!(" lang={}", language),
            EntityKind::TextUrl { url } => format!(" url={}", url),
            EntityKind::MentionName {
                user_id,
                access_hash,
            } => format!(" user={} hash={}", user_id, access_hash),
            _ => String::new(),
        };
        let covered = entity.slice(text).unwrap_or("?");
        println!(
            "{:<12} {:>5} +{:<5} {:?}{}",
            label.bright_blue(),
            entity.offset,
            entity.length,
            covered,
            detail.yellow()
        );
    }
}

fn print_tables(cache: &PeerCache) {
    let mut users: Vec<_> = cache.users().into_values().collect();
    users.sort_by_key(|u| u.id);
    println!("{} ({})", "Users".bright_green(), users.len());
    for user in users {
        let name = match &user.username {
            Some(username) => format!("{} (@{})", user.first_name, username),
            None => user.first_name.clone(),
        };
        println!("  {:>12}  {}{}", user.id, name, min_marker(user.min));
    }

    let chats: HashMap<i64, Chat> = cache.chats();
    let mut chats: Vec<_> = chats.into_values().collect();
    chats.sort_by_key(Chat::id);
    println!("{} ({})", "Chats".bright_green(), chats.len());
    for chat in chats {
        let (kind, min) = match &chat {
            Chat::Group(_) => ("group", false),
            Chat::Channel(channel) => ("channel", channel.min),
        };
        println!(
            "  {:>12}  {:<8} {}{}",
            chat.id(),
            kind,
            chat.title(),
            min_marker(min)
        );
    }
}

fn min_marker(min: bool) -> ColoredString {
    if min {
        " [min]".dimmed()
    } else {
        "".normal()
    }
}
