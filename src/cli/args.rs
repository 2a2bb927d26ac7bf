use clap::{Parser, Subcommand};

use crate::config::CONFIG_PATH_ENV;

/// tracklink - YouTrack tasks for branch-per-task workflows
#[derive(Parser)]
#[command(name = "tracklink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (JSON). Defaults to ~/.tracklink/config.json
    #[arg(short = 'c', long, env = CONFIG_PATH_ENV, global = true)]
    pub config: Option<String>,

    /// Override a configuration parameter, e.g. --set "Branch prefix=yt-"
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    pub overrides: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the effective configuration parameters
    Config,
    /// Check that the configured credentials can log in
    TestConnection,
    /// List unresolved tasks
    Pending {
        /// Only tasks assigned to this user
        #[arg(short, long)]
        assignee: Option<String>,
    },
    /// Resolve the tasks linked to branches
    Branch {
        /// Full branch names, e.g. /main/yt-42
        #[arg(required = true)]
        branches: Vec<String>,
    },
    /// Load tasks by id
    Load {
        #[arg(required = true)]
        task_ids: Vec<String>,
    },
    /// Send a checkin message to linked tasks
    Checkin {
        /// Checkin comment, may embed a command like {{state fixed}}
        #[arg(short, long)]
        message: String,

        /// Linked task ids
        #[arg(short, long = "task", required = true)]
        tasks: Vec<String>,

        /// Changeset number
        #[arg(long, default_value_t = 0)]
        changeset: i64,

        /// Branch the changeset was created on
        #[arg(long, default_value = "")]
        branch: String,
    },
    /// Assign a task and mark it in progress
    Start {
        task_id: String,

        #[arg(short, long)]
        assignee: String,
    },
    /// Open a task in the browser
    Browse { task_id: String },
}
