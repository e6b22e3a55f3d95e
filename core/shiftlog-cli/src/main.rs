//! shiftlog: track shift blockers and produce end-of-day reports.
//!
//! Every invocation runs one command against the operator's store for today.
//! Session details entered with `session` persist in the data root so later
//! commands know which store to use.
//!
//! ## Subcommands
//!
//! - `session`: record operator/equipment details for today
//! - `start` / `end`: open and close the current blocker
//! - `ticket` / `note`: annotate the current blocker
//! - `status`, `summary`, `report`: today's state and reports
//! - `analytics`: multi-day, multi-operator view
//! - `config`, `clear`, `test-mode`, `paths`: housekeeping

mod active_session;
mod commands;
mod logging;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use shiftlog_core::{SessionFields, StorageConfig};

use crate::commands::{App, ConfigUpdate};

#[derive(Parser)]
#[command(name = "shiftlog")]
#[command(about = "Shift blocker tracker and end-of-day report generator")]
#[command(version)]
struct Cli {
    /// Data root (defaults to $SHIFTLOG_DATA_DIR, then ~/.shiftlog)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Use the shared test store for this command
    #[arg(long, global = true)]
    test_mode: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record session details for today
    Session {
        #[arg(long, default_value = "")]
        pack_operator: String,
        #[arg(long, default_value = "")]
        support_operator: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        pack_number: String,
        #[arg(long, default_value = "")]
        key_used: String,
        #[arg(long, default_value = "")]
        glove_number: String,
        #[arg(long, default_value = "")]
        dongle_number: String,
        #[arg(long, default_value = "")]
        phone_id: String,
    },

    /// Show the current blocker and any recovered state
    Status,

    /// Start a new blocker
    Start {
        /// What is blocking work
        #[arg(value_name = "DESCRIPTION", num_args = 1.., required = true)]
        description: Vec<String>,

        /// software, connectivity, hardware or other (or 1-4)
        #[arg(long, short)]
        category: Option<String>,

        /// Ticket number to attach right away
        #[arg(long, short)]
        ticket: Option<String>,

        /// Link for the ticket
        #[arg(long, default_value = "")]
        link: String,
    },

    /// End the current blocker
    End,

    /// Attach a ticket to the current blocker
    Ticket {
        #[arg(value_name = "NUMBER")]
        number: String,

        #[arg(long, default_value = "")]
        link: String,
    },

    /// Attach a note to the current blocker
    Note {
        #[arg(value_name = "TEXT", num_args = 1.., required = true)]
        content: Vec<String>,
    },

    /// Today's blockers, including the running one
    Summary {
        #[arg(long)]
        json: bool,
    },

    /// End-of-day report
    Report {
        #[arg(long)]
        json: bool,
    },

    /// Blocker analytics across days and operators
    Analytics {
        /// Days before today to include
        #[arg(long)]
        days: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Show settings, or change them with the flags below
    Config {
        /// Minutes in a shift, the base for efficiency
        #[arg(long)]
        shift_minutes: Option<u32>,

        /// Days before today covered by analytics
        #[arg(long)]
        analytics_days: Option<u32>,

        /// Days searched back for the latest active operators
        #[arg(long)]
        active_lookback_days: Option<u32>,

        #[arg(long)]
        lock_timeout_ms: Option<u64>,
    },

    /// Wipe every blocker from today's store
    Clear {
        /// Must be exactly YES
        #[arg(long, value_name = "YES")]
        confirm: Option<String>,
    },

    /// Turn test mode on or off (toggles without an argument)
    TestMode {
        #[arg(value_enum)]
        state: Option<Toggle>,
    },

    /// Print the files shiftlog reads and writes
    Paths,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn main() {
    let cli = Cli::parse();
    let storage = cli
        .data_dir
        .clone()
        .map(StorageConfig::with_root)
        .unwrap_or_default();
    let logging_guard = logging::init(&storage.logs_dir());

    let mut app = App::load(storage, cli.test_mode);
    let result = match cli.command {
        Commands::Session {
            pack_operator,
            support_operator,
            location,
            pack_number,
            key_used,
            glove_number,
            dongle_number,
            phone_id,
        } => app.session(SessionFields {
            pack_operator,
            support_operator,
            location,
            pack_number,
            key_used,
            glove_number,
            dongle_number,
            phone_id,
        }),
        Commands::Status => Ok(app.status()),
        Commands::Start {
            description,
            category,
            ticket,
            link,
        } => app.start(
            &description.join(" "),
            category.as_deref(),
            ticket.as_deref(),
            &link,
        ),
        Commands::End => app.end(),
        Commands::Ticket { number, link } => app.ticket(&number, &link),
        Commands::Note { content } => app.note(&content.join(" ")),
        Commands::Summary { json } => app.summary(json),
        Commands::Report { json } => app.report(json),
        Commands::Analytics { days, json } => app.analytics(days, json),
        Commands::Config {
            shift_minutes,
            analytics_days,
            active_lookback_days,
            lock_timeout_ms,
        } => app.config(ConfigUpdate {
            shift_minutes,
            analytics_days,
            active_lookback_days,
            lock_timeout_ms,
        }),
        Commands::Clear { confirm } => app.clear(confirm.as_deref()),
        Commands::TestMode { state } => app.test_mode(state.map(|s| matches!(s, Toggle::On))),
        Commands::Paths => Ok(app.paths()),
    };

    let code = match result {
        Ok(output) => {
            println!("{output}");
            0
        }
        Err(e) if e.is_expected() => {
            tracing::info!(error = %e, "Command rejected");
            eprintln!("{e}");
            2
        }
        Err(e) => {
            tracing::error!(error = %e, "shiftlog command failed");
            eprintln!("Error: {e}");
            1
        }
    };

    // `exit` skips destructors; flush the log worker first.
    drop(logging_guard);
    std::process::exit(code);
}
