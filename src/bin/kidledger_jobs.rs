//! Batch trigger for the scheduled parts of the rewards engine.
//!
//! Meant to be run from cron or a timer: `pocket-money` once a day,
//! `reminders` once a minute. Results are printed as JSON on stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use kidledger::config::ConfigManager;
use kidledger::domain::YearMonth;
use kidledger::errors::KidLedgerResult;
use kidledger::{KidLedger, KidLedgerError};

#[derive(Parser, Debug)]
#[command(name = "kidledger_jobs", about = "Scheduled jobs for the kids rewards ledger")]
struct Cli {
    /// Path to the JSON config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the SQLite database (overrides the config file).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Post all pocket money due up to a date.
    PocketMoney {
        /// Last date to post, `YYYY-MM-DD`. Defaults to today.
        #[arg(long)]
        through: Option<NaiveDate>,
    },
    /// Send reminders whose time matches the current minute.
    Reminders,
    /// Print the month projection for a kid.
    Project {
        #[arg(long)]
        kid: Uuid,
        /// Month as `YYYY-MM`. Defaults to the current month.
        #[arg(long)]
        month: Option<YearMonth>,
    },
    /// Print a kid's ledger balance.
    Balance {
        #[arg(long)]
        kid: Uuid,
    },
}

#[derive(Serialize)]
struct BalanceReport {
    kid_id: Uuid,
    balance: String,
    balance_cents: i64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "job failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> KidLedgerResult<()> {
    let manager = match cli.config {
        Some(path) => ConfigManager::new(path),
        None => ConfigManager::default_location()?,
    };
    let mut config = manager.load()?;
    kidledger::init_with_filter(&config.log_filter);
    if let Some(db) = cli.db {
        config.database_path = Some(db);
    }

    let mut ledger = KidLedger::open(config)?;
    match cli.command {
        Command::PocketMoney { through } => print_json(&ledger.run_pocket_money(through)?),
        Command::Reminders => print_json(&ledger.sweep_reminders()?),
        Command::Project { kid, month } => print_json(&ledger.project_month(kid, month)?),
        Command::Balance { kid } => {
            if kid.is_nil() {
                return Err(KidLedgerError::InvalidArgument("kid id must not be nil".into()));
            }
            let balance = ledger.balance(kid)?;
            print_json(&BalanceReport {
                kid_id: kid,
                balance: balance.to_string(),
                balance_cents: balance.cents(),
            })
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> KidLedgerResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
