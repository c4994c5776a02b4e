//! todo-list
//!
//! Serves a single-user to-do list over HTTP (task endpoint plus browser UI)
//! and drives the same endpoint from the command line.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use todo_list::cli::{Cli, Command, ListArgs, TasksCommand, UsersCommand};
use todo_list::client::{ApiClient, TaskApi};
use todo_list::config::Config;
use todo_list::db::Database;
use todo_list::logging::{self, LogTarget};
use todo_list::types::TaskStatus;
use todo_list::ui::terminal::{StdinConfirm, TerminalView};
use todo_list::ui::{Confirmed, TaskController};
use todo_list::web;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let target: LogTarget = cli.log.parse()?;
    logging::init(&target, cli.verbose)?;

    let mut config = Config::resolve(cli.config.as_deref().map(Path::new))?;

    // Override from CLI arguments
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(api_url) = &cli.api_url {
        config.client.api_url = Some(api_url.clone());
    }

    // Handle subcommands
    match cli.command {
        Some(Command::Serve) | None => run_server(&config).await,
        Some(Command::Tasks(command)) => run_tasks(&config, command).await,
        Some(Command::Users(command)) => run_users(&config, command),
    }
}

/// Run the web server until Ctrl-C.
async fn run_server(config: &Config) -> Result<()> {
    info!("Starting todo-list v{}", env!("CARGO_PKG_VERSION"));
    info!("Database: {:?}", config.server.db_path);

    // Open database
    let db = Arc::new(Database::open(&config.server.db_path)?);
    info!("Database initialized successfully");

    let handle = web::start_server(db, config).await?;
    info!("Open {} in a browser", handle.base_url());

    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;
    Ok(())
}

/// Run a `tasks` subcommand against the configured task endpoint.
async fn run_tasks(config: &Config, command: TasksCommand) -> Result<()> {
    let api: Arc<dyn TaskApi> = Arc::new(ApiClient::new(config.client_api_url()));
    let mut controller = TaskController::new(api).with_user(config.client.user.clone());
    let mut view = TerminalView::stdio();

    match command {
        TasksCommand::List(ListArgs { filter, user }) => {
            if let Some(user) = user {
                controller = controller.with_user(user);
            }
            controller.change_filter(filter, &mut view).await;
        }
        TasksCommand::Add { title } => {
            if title.trim().is_empty() {
                bail!("Task title is required");
            }
            controller.add(&title, &mut view).await;
        }
        TasksCommand::Done { id } => {
            controller
                .set_status(id, TaskStatus::Completed, &mut view)
                .await;
        }
        TasksCommand::Reopen { id } => {
            controller
                .set_status(id, TaskStatus::Pending, &mut view)
                .await;
        }
        TasksCommand::Remove { id, yes } => {
            let removed = if yes {
                controller.remove(id, &Confirmed(true), &mut view).await
            } else {
                controller.remove(id, &StdinConfirm, &mut view).await
            };
            if !removed && !view.failed() {
                println!("Cancelled");
            }
        }
    }

    if view.failed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Run a `users` subcommand directly against the database.
fn run_users(config: &Config, command: UsersCommand) -> Result<()> {
    let db = Database::open(&config.server.db_path)?;

    match command {
        UsersCommand::Add { name } => {
            let user = db.create_user(&name)?;
            println!("Added user #{} {}", user.id, user.name);
        }
        UsersCommand::List => {
            let users = db.list_users()?;
            if users.is_empty() {
                println!("No users");
            }
            for user in users {
                println!("#{:<4} {}", user.id, user.name);
            }
        }
    }
    Ok(())
}
