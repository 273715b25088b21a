use clap::{Parser, Subcommand};
use roster_core::{Level, StudentId};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(about = "Administer the student roster", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides config and ROSTER_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Admin username
    #[arg(long, global = true, env = "ROSTER_USER")]
    pub user: Option<String>,

    /// Admin password
    #[arg(long, global = true, env = "ROSTER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register another admin account
    Register {
        username: String,
        password: String,
    },

    /// List students matching a term and/or level
    #[command(alias = "ls")]
    List {
        /// Id or username fragment
        #[arg(short, long)]
        term: Option<String>,

        /// Exact level label, e.g. THIRD_GRADE
        #[arg(short, long)]
        level: Option<Level>,

        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,

        /// Page size; 0 uses the configured default
        #[arg(long, default_value_t = 0)]
        size: u32,

        /// Return every match in one response
        #[arg(long, conflicts_with_all = ["page", "size"])]
        all: bool,
    },

    /// Show one student
    Get { id: StudentId },

    /// Add a student
    #[command(alias = "add")]
    Create { username: String, level: Level },

    /// Replace a student's username and level
    Update {
        id: StudentId,
        username: String,
        level: Level,
    },

    /// Remove a student
    #[command(alias = "rm")]
    Delete { id: StudentId },

    /// Write every student as CSV
    Export {
        /// Output file; CSV goes to stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Replace every student with the contents of a CSV file
    Import { file: PathBuf },
}
