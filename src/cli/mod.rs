//! CLI command definitions for todo-list
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Args, Parser, Subcommand};

use crate::types::Filter;

/// Single-user to-do list: web server and command-line client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    /// Address to bind (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Task endpoint URL for the `tasks` commands (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server (default if no subcommand given)
    Serve,

    /// Work with tasks through the task endpoint
    #[command(subcommand)]
    Tasks(TasksCommand),

    /// Manage the users table
    #[command(subcommand)]
    Users(UsersCommand),
}

#[derive(Subcommand, Debug)]
pub enum TasksCommand {
    /// List tasks
    List(ListArgs),

    /// Add a task
    Add {
        /// Task title
        title: String,
    },

    /// Mark a task completed
    Done {
        /// Task ID
        id: i64,
    },

    /// Mark a task pending again
    Reopen {
        /// Task ID
        id: i64,
    },

    /// Delete a task
    Remove {
        /// Task ID
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Which tasks to show: all, active or completed
    #[arg(short, long, default_value = "all")]
    pub filter: Filter,

    /// User whose tasks to list
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Add a user
    Add {
        /// User name
        name: String,
    },

    /// List users
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["todo-list"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn list_parses_filter() {
        let cli =
            Cli::try_parse_from(["todo-list", "tasks", "list", "--filter", "completed"]).unwrap();
        match cli.command {
            Some(Command::Tasks(TasksCommand::List(args))) => {
                assert_eq!(args.filter, Filter::Completed);
                assert!(args.user.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn unknown_filter_is_rejected() {
        assert!(Cli::try_parse_from(["todo-list", "tasks", "list", "--filter", "soon"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["todo-list", "tasks", "remove", "3", "--yes", "--port", "9000"])
            .unwrap();
        assert_eq!(cli.port, Some(9000));
        match cli.command {
            Some(Command::Tasks(TasksCommand::Remove { id, yes })) => {
                assert_eq!(id, 3);
                assert!(yes);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
