use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use xaelai_core::{MessageRole, XaelaiError};
use xaelai_infrastructure::{RecordCodec, Settings};

mod commands;

#[derive(Parser)]
#[command(name = "xaelai")]
#[command(about = "xaelai - manage local assistant runs and chat history", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.config/xaelai/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured user data path
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// User whose history is managed
    #[arg(long, short, env = "XAELAI_USER")]
    user: String,

    /// Record format (yaml or json); defaults to the configured format
    #[arg(long, global = true)]
    format: Option<RecordCodec>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage assistant runs
    Runs {
        #[command(subcommand)]
        action: RunsAction,
    },
    /// Manage named chat histories
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
}

#[derive(Subcommand)]
enum RunsAction {
    /// List stored runs
    List,
    /// Print a run
    Show { run_id: String },
    /// Create an empty run (generates an id if none is given)
    Create { run_id: Option<String> },
    /// Change a run's display name
    Rename { run_id: String, name: String },
    /// Append a message to a run
    Append {
        run_id: String,
        #[arg(long, default_value = "user")]
        role: MessageRole,
        content: String,
    },
    /// Delete a run
    Delete { run_id: String },
}

#[derive(Subcommand)]
enum ChatAction {
    /// Start a new named chat
    New { label: String },
    /// List chats, newest first
    List,
    /// Rename a chat, keeping its creation time
    Rename { file_name: String, new_label: String },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    let mut settings = settings.with_env_overrides(std::env::vars())?;

    if let Some(root) = &cli.root {
        settings.user_data_path = root.clone();
    }
    if let Some(format) = cli.format {
        settings.record_format = format;
    }
    Ok(settings)
}

fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    let ctx = commands::Context::new(settings, cli.user);

    match cli.command {
        Commands::Runs { action } => match action {
            RunsAction::List => commands::runs::list(&ctx)?,
            RunsAction::Show { run_id } => commands::runs::show(&ctx, &run_id)?,
            RunsAction::Create { run_id } => commands::runs::create(&ctx, run_id.as_deref())?,
            RunsAction::Rename { run_id, name } => commands::runs::rename(&ctx, &run_id, &name)?,
            RunsAction::Append {
                run_id,
                role,
                content,
            } => commands::runs::append(&ctx, &run_id, role, &content)?,
            RunsAction::Delete { run_id } => commands::runs::delete(&ctx, &run_id)?,
        },
        Commands::Chat { action } => match action {
            ChatAction::New { label } => commands::chat::new(&ctx, &label)?,
            ChatAction::List => commands::chat::list(&ctx)?,
            ChatAction::Rename {
                file_name,
                new_label,
            } => commands::chat::rename(&ctx, &file_name, &new_label)?,
        },
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("command failed: {:#}", e);
            match e.downcast_ref::<XaelaiError>() {
                Some(err) => eprintln!("error: {}", err.user_message()),
                None => eprintln!("error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}
