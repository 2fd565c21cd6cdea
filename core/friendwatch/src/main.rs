//! friendwatch: notifies you when Nintendo Switch friends come online.
//!
//! Meant to be started periodically by cron, a systemd timer or Task
//! Scheduler. Each invocation is one complete run.
//!
//! ## Subcommands
//!
//! - `run` (default): fetch presence, notify about changes, save state
//! - `test`: send synthetic notifications to check the transport
//! - `status`: show the saved last-check time and friends cache

mod logging;
mod poll;
mod status;
mod test_send;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use friendwatch_core::{SendTest, StorageConfig};

#[derive(Parser)]
#[command(name = "friendwatch")]
#[command(about = "Nintendo Switch friend presence notifier")]
#[command(version)]
struct Cli {
    /// Configuration file (default: <app dir>/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Application directory for state and logs
    /// (default: $FRIENDWATCH_HOME or ~/.friendwatch)
    #[arg(long, global = true, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check friend presence once and send notifications (default)
    Run,

    /// Send test notifications without checking presence or touching state
    Test {
        #[arg(value_enum, default_value_t = TestKind::Both)]
        kind: TestKind,
    },

    /// Show the last check time and cached friends
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum TestKind {
    Watched,
    Unwatched,
    Both,
}

impl From<TestKind> for SendTest {
    fn from(kind: TestKind) -> Self {
        match kind {
            TestKind::Watched => SendTest::Watched,
            TestKind::Unwatched => SendTest::Unwatched,
            TestKind::Both => SendTest::Both,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let storage = match cli.state_dir {
        Some(dir) => StorageConfig::with_root(dir),
        None => match StorageConfig::from_env() {
            Ok(storage) => storage,
            Err(e) => {
                eprintln!("friendwatch: {e}");
                std::process::exit(1);
            }
        },
    };
    let _logging_guard = logging::init(&storage.logs_dir());
    let config_path = cli.config.unwrap_or_else(|| storage.config_file());

    let result = match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => poll::run(&storage, &config_path),
        Commands::Test { kind } => test_send::run(&config_path, kind.into()),
        Commands::Status => status::run(&storage),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "friendwatch failed");
        std::process::exit(1);
    }
}
