//! `colloquy` command-line front end.

mod config;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use colloquy_builtins::conversation::conversation_summary;
use colloquy_builtins::{register_conversation_builtins, StdinPromptChannel};
use colloquy_core::{PromptChannel, PromptRequest, ToolCall};
use colloquy_session::{load_from_file, save_to_file, SessionStore};
use colloquy_skills::SkillRegistry;
use config::ColloquyConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "colloquy", about = "Colloquy: human-in-the-loop conversation sessions")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "colloquy.toml")]
    config: PathBuf,

    /// Snapshot file (overrides config)
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Seconds to wait for a human answer (overrides config)
    #[arg(long)]
    timeout: Option<u64>,

    #[arg(long, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the human a single question on the terminal
    Ask {
        question: String,
        #[arg(long, default_value = "")]
        context: String,
    },
    /// Inspect or edit stored sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Manage conversation tools
    Tools {
        #[command(subcommand)]
        action: ToolAction,
    },
    /// Invoke one conversation tool
    Call {
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
}

#[derive(Subcommand)]
enum SessionAction {
    /// List sessions in creation order
    List,
    /// Print one session with its transcript
    Show { id: String },
    /// Delete a session
    Delete { id: String },
}

#[derive(Subcommand)]
enum ToolAction {
    /// List registered tools
    List,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(path: &Path, load: bool) -> anyhow::Result<SessionStore> {
    if !load || !path.exists() {
        return Ok(SessionStore::new());
    }
    load_from_file(path)
        .with_context(|| format!("Failed to load snapshot '{}'", path.display()))
}

/// Autosave may only overwrite a snapshot this run actually loaded. With
/// `load_on_start` off the store starts empty, so saving it would wipe an
/// existing file.
fn autosave_allowed(autosave: bool, load_on_start: bool, path: &Path) -> bool {
    if autosave && !load_on_start && path.exists() {
        warn!(
            path = %path.display(),
            "Snapshot was not loaded, autosave will not overwrite it"
        );
        return false;
    }
    autosave
}

fn persist(store: &SessionStore, path: &Path, autosave: bool) -> anyhow::Result<()> {
    if !autosave {
        warn!(path = %path.display(), "Autosave disabled, changes not written");
        return Ok(());
    }
    save_to_file(store, path)
        .with_context(|| format!("Failed to save snapshot '{}'", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = ColloquyConfig::load(&cli.config)?;
    let snapshot_path = cli.snapshot.unwrap_or_else(|| config.snapshot_path());
    let timeout = cli
        .timeout
        .map(std::time::Duration::from_secs)
        .unwrap_or_else(|| config.prompt_timeout());
    let autosave = autosave_allowed(
        config.persistence.autosave,
        config.persistence.load_on_start,
        &snapshot_path,
    );

    let store = Arc::new(open_store(&snapshot_path, config.persistence.load_on_start)?);
    let channel = Arc::new(StdinPromptChannel::new(timeout));

    match cli.command {
        Commands::Ask { question, context } => {
            let outcome = channel
                .prompt(PromptRequest::new(question, context))
                .await?;
            print_json(&outcome)?;
        }
        Commands::Sessions { action } => match action {
            SessionAction::List => {
                let mut sessions = store.list();
                sessions.sort_by(|a, b| {
                    a.created_at()
                        .cmp(&b.created_at())
                        .then_with(|| a.id().cmp(b.id()))
                });
                let summaries: Vec<_> = sessions.iter().map(conversation_summary).collect();
                print_json(&summaries)?;
            }
            SessionAction::Show { id } => {
                let session = store
                    .get(&id)
                    .ok_or_else(|| anyhow::anyhow!("Session not found: {id}"))?;
                print_json(&session)?;
            }
            SessionAction::Delete { id } => {
                let deleted = store.delete(&id);
                if deleted {
                    persist(&store, &snapshot_path, autosave)?;
                }
                print_json(&serde_json::json!({ "deleted": deleted, "conversation_id": id }))?;
            }
        },
        Commands::Tools { action } => match action {
            ToolAction::List => {
                let mut registry = SkillRegistry::new();
                register_conversation_builtins(
                    &mut registry,
                    store.clone(),
                    channel,
                    snapshot_path.clone(),
                );
                print_json(&registry.list_descriptors())?;
            }
        },
        Commands::Call { tool, args } => {
            let arguments: serde_json::Value = serde_json::from_str(&args)
                .with_context(|| format!("--args is not valid JSON: {args}"))?;
            let mut registry = SkillRegistry::new();
            register_conversation_builtins(
                &mut registry,
                store.clone(),
                channel,
                snapshot_path.clone(),
            );
            info!(tool = %tool, "Invoking tool");

            let result = registry.execute(ToolCall::new(tool.clone(), arguments)).await?;
            print_json(&result.json()?)?;
            persist(&store, &snapshot_path, autosave)?;
            if result.is_error {
                anyhow::bail!("Tool {tool} reported an error");
            }
        }
    }

    Ok(())
}
