mod report;
mod watcher;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vigil_core::{AppConfig, JournalSession};
use vigil_types::MissionSort;

#[derive(Parser)]
#[command(version, about = "Journal watcher for Elite Dangerous sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tail the active journal until Ctrl-C
    Watch {
        #[arg(short, long)]
        dir: Option<PathBuf>,
        #[arg(short, long)]
        interval_ms: Option<u64>,
    },
    /// Read the active journal once and print what it contains
    Summary {
        #[arg(short, long)]
        dir: Option<PathBuf>,
        /// progress | accepted-asc | accepted-desc
        #[arg(short, long)]
        sort: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    // Plain text into VIGIL_LOG_PATH when the file can be opened
    if let Ok(path) = std::env::var("VIGIL_LOG_PATH")
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    // Otherwise stderr, leaving stdout to the summary and watch output
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_logging();
    let cli = Cli::parse();
    let mut config = AppConfig::load();

    match cli.command {
        Commands::Watch { dir, interval_ms } => {
            if let Some(dir) = dir {
                config.journal_directory = dir;
            }
            if let Some(ms) = interval_ms {
                config.poll_interval_ms = ms;
            }
            watcher::run(&config).await
        }
        Commands::Summary { dir, sort } => {
            if let Some(dir) = dir {
                config.journal_directory = dir;
            }
            let sort = match sort.as_deref() {
                Some(name) => MissionSort::from_cli_name(name)
                    .ok_or_else(|| format!("error: unknown sort '{name}'"))?,
                None => config.mission_sort,
            };
            let session = open_session(&config)?;
            let tick = session.tick();
            report::print_summary(&session, &tick, sort);
            Ok(())
        }
        Commands::Config => {
            if let Some(path) = AppConfig::stored_path() {
                println!("# {}", path.display());
            }
            let text = config.to_toml().map_err(|e| e.to_string())?;
            print!("{text}");
            Ok(())
        }
    }
}

fn open_session(config: &AppConfig) -> Result<Arc<JournalSession>, String> {
    JournalSession::open(&config.journal_directory)
        .map(Arc::new)
        .map_err(|e| e.to_string())
}
