use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "gift-exchange.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable output
    Pretty,
    /// One JSON object per line
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "gift-exchange", about = "Manage gift exchange groups", version)]
pub struct CliArgs {
    /// Directory of the sled database
    #[arg(long, env = "GIFT_EXCHANGE_DB", value_name = "DIR")]
    pub db: Option<PathBuf>,

    #[arg(
        long,
        env = "GIFT_EXCHANGE_LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a new group
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        admin_email: String,
    },
    /// Print a group
    Show { key: String },
    /// Replace a group's members
    Members {
        key: String,
        /// Version token last seen for the group
        #[arg(long)]
        version: String,
        /// JSON list of {"name", "email"} objects
        #[arg(long)]
        users: String,
    },
    /// Record computed assignments, closing the group to edits
    Assign {
        key: String,
        #[arg(long)]
        version: i64,
        /// Pairs written as giver=receiver
        #[arg(long = "pair", value_name = "GIVER=RECEIVER")]
        pairs: Vec<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let db_path = args
            .db
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        anyhow::ensure!(
            !db_path.as_os_str().is_empty(),
            "database path must not be empty"
        );

        Ok(Self {
            db_path,
            log_format: args.log_format,
        })
    }
}
