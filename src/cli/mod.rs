//! Command-line interface for taskdeck.
//!
//! Subcommands for the session lifecycle and task CRUD:
//! - `register` / `login` / `logout` / `whoami`: session management
//! - `list` / `show` / `add` / `edit` / `delete`: tasks
//!
//! Running with no subcommand opens the interactive board.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
#[cfg(feature = "tui")]
use std::sync::Arc;

use crate::api::{ApiError, HttpTaskApi, TaskApi};
use crate::config::Config;
use crate::guard::{guard_view, Gate};
use crate::session::{Session, SessionStore};
use crate::tasks::{Priority, Status, StoreError, Task, TaskDraft, TaskFilter, TaskStore};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "taskdeck")]
#[command(author, version, about = "A terminal client for a task-management REST API", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "taskdeck.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API base URL (overrides the config file)
    #[arg(long, env = "TASKDECK_API_URL")]
    pub api_url: Option<String>,

    /// Subcommand to run (if none, opens the interactive board)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account (does not log you in)
    Register {
        username: String,
        email: String,
        password: String,
    },

    /// Log in and persist the session token
    Login { email: String, password: String },

    /// Drop the persisted session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List tasks, optionally filtered
    List {
        /// Only tasks with this status (todo, in-progress, done)
        #[arg(short, long)]
        status: Option<Status>,
        /// Only tasks with this priority (low, medium, high)
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Case-insensitive substring of title or category
        #[arg(short = 'q', long)]
        search: Option<String>,
    },

    /// Show one task in full
    Show {
        /// Task ID
        id: i64,
    },

    /// Create a task
    Add {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        #[arg(short, long, default_value = "todo")]
        status: Status,
        #[arg(short, long, default_value = "")]
        category: String,
    },

    /// Edit a task; unspecified fields keep their current value
    Edit {
        /// Task ID
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        category: Option<String>,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Entry point after argument parsing and config load.
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let base_url = cli
        .api_url
        .clone()
        .unwrap_or_else(|| config.api.base_url.clone());

    let mut sessions = SessionStore::new(&config.storage.data_dir);
    sessions.restore();

    match cli.command {
        Some(command) => run_command(command, &base_url, &mut sessions).await,
        None => open_board(&base_url, &sessions).await,
    }
}

async fn run_command(
    command: Commands,
    base_url: &str,
    sessions: &mut SessionStore,
) -> Result<()> {
    match command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let api = gateway(base_url, None)?;
            sessions
                .register(&api, &username, &email, &password)
                .await
                .map_err(registration_error)?;
            println!("Account created. Log in with `taskdeck login {}`.", email);
            Ok(())
        }

        Commands::Login { email, password } => {
            let api = gateway(base_url, None)?;
            let session = sessions
                .login(&api, &email, &password)
                .await
                .context("Login failed")?;
            println!(
                "Logged in as {} <{}>.",
                session.user.username, session.user.email
            );
            Ok(())
        }

        Commands::Logout => {
            sessions.logout();
            println!("Logged out.");
            Ok(())
        }

        Commands::Whoami => {
            let session = authenticated(sessions)?;
            println!("#{}  {}  {}", session.user.id, session.user.username, session.user.email);
            Ok(())
        }

        Commands::List {
            status,
            priority,
            search,
        } => {
            let session = authenticated(sessions)?;
            let api = gateway(base_url, Some(&session.token))?;
            let filter = TaskFilter {
                search: search.unwrap_or_default(),
                status,
                priority,
            };
            cmd_list(&api, &filter).await
        }

        Commands::Show { id } => {
            let session = authenticated(sessions)?;
            let api = gateway(base_url, Some(&session.token))?;
            cmd_show(&api, id).await
        }

        Commands::Add {
            title,
            description,
            due,
            priority,
            status,
            category,
        } => {
            let session = authenticated(sessions)?;
            let api = gateway(base_url, Some(&session.token))?;
            let draft = TaskDraft {
                title,
                description,
                due_date: due,
                priority,
                status,
                category,
            };
            let mut store = TaskStore::new();
            store
                .create(&api, &draft)
                .await
                .map_err(|err| remote_error(err, "Saving the task"))?;
            println!("Task created. {} task(s) total.", store.len());
            Ok(())
        }

        Commands::Edit {
            id,
            title,
            description,
            due,
            clear_due,
            priority,
            status,
            category,
        } => {
            let session = authenticated(sessions)?;
            let api = gateway(base_url, Some(&session.token))?;

            // Full replace on the wire: pre-fill from the current task, then
            // overlay whatever was passed.
            let current = api
                .get_task(id)
                .await
                .map_err(|err| remote_error(err.into(), "Loading the task"))?;
            let mut draft = TaskDraft::from_task(&current);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(description) = description {
                draft.description = description;
            }
            if clear_due {
                draft.due_date = None;
            } else if let Some(due) = due {
                draft.due_date = Some(due);
            }
            if let Some(priority) = priority {
                draft.priority = priority;
            }
            if let Some(status) = status {
                draft.status = status;
            }
            if let Some(category) = category {
                draft.category = category;
            }

            let mut store = TaskStore::new();
            store
                .update(&api, id, &draft)
                .await
                .map_err(|err| remote_error(err, "Saving the task"))?;
            println!("Task {} updated.", id);
            Ok(())
        }

        Commands::Delete { id, yes } => {
            let session = authenticated(sessions)?;
            if !yes && !confirm(&format!("Delete task {}?", id))? {
                println!("Aborted.");
                return Ok(());
            }
            let api = gateway(base_url, Some(&session.token))?;
            let mut store = TaskStore::new();
            store
                .delete(&api, id)
                .await
                .map_err(|err| remote_error(err, "Deleting the task"))?;
            println!("Task {} deleted.", id);
            Ok(())
        }
    }
}

/// Open the interactive board (the default when no subcommand is given).
#[cfg(feature = "tui")]
async fn open_board(base_url: &str, sessions: &SessionStore) -> Result<()> {
    match guard_view(sessions.current(), |session| session) {
        Gate::Rendered(session) => {
            let api: Arc<dyn TaskApi> = Arc::new(gateway(base_url, Some(&session.token))?);
            crate::tui::run(api, session.user.clone()).await
        }
        Gate::LoginRequired => bail!(
            "You are not logged in. Run `taskdeck login <email> <password>` first."
        ),
    }
}

#[cfg(not(feature = "tui"))]
async fn open_board(_base_url: &str, _sessions: &SessionStore) -> Result<()> {
    bail!("This build has no interactive board (compiled without the `tui` feature). See `taskdeck --help` for subcommands.")
}

async fn cmd_list(api: &HttpTaskApi, filter: &TaskFilter) -> Result<()> {
    let mut store = TaskStore::new();
    store
        .load(api)
        .await
        .map_err(|err| remote_error(err, "Loading tasks"))?;

    let visible = store.filter(filter);
    if visible.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    println!();
    println!(
        "{:<6}  {:<30}  {:<12}  {:<8}  {:<10}  {:<14}",
        "ID", "TITLE", "STATUS", "PRIORITY", "DUE", "CATEGORY"
    );
    println!("{}", "-".repeat(90));
    for task in &visible {
        println!(
            "{:<6}  {:<30}  {:<12}  {:<8}  {:<10}  {:<14}",
            task.id,
            truncate(&task.title, 30),
            task.status.to_string(),
            task.priority.to_string(),
            task.due_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
            truncate(&task.category, 14),
        );
    }
    println!();
    if filter.is_active() {
        println!("{} of {} task(s)", visible.len(), store.len());
    } else {
        println!("{} task(s)", store.len());
    }
    Ok(())
}

async fn cmd_show(api: &HttpTaskApi, id: i64) -> Result<()> {
    let task = api
        .get_task(id)
        .await
        .map_err(|err| remote_error(err.into(), "Loading the task"))?;
    print_task(&task);
    Ok(())
}

fn print_task(task: &Task) {
    println!("Task #{}", task.id);
    println!("  Title:     {}", task.title);
    if !task.description.is_empty() {
        println!("  Details:   {}", task.description);
    }
    println!("  Status:    {}", task.status);
    println!("  Priority:  {}", task.priority);
    if let Some(due) = task.due_date {
        println!("  Due:       {}", due);
    }
    if !task.category.is_empty() {
        println!("  Category:  {}", task.category);
    }
    println!("  Created:   {}", task.created_at.format("%Y-%m-%d %H:%M"));
}

/// Resolve the current session or explain how to get one.
fn authenticated(sessions: &SessionStore) -> Result<&Session> {
    match guard_view(sessions.current(), |session| session) {
        Gate::Rendered(session) => Ok(session),
        Gate::LoginRequired => bail!(
            "You are not logged in. Run `taskdeck login <email> <password>` first."
        ),
    }
}

fn gateway(base_url: &str, token: Option<&str>) -> Result<HttpTaskApi> {
    HttpTaskApi::new(base_url, token).context("Failed to create HTTP client")
}

/// Shape a failed remote call into the message shown to the user. A 401 gets
/// the login hint; everything else is the generic action failure.
fn remote_error(err: StoreError, action: &str) -> anyhow::Error {
    match &err {
        StoreError::Api(api) if api.is_unauthorized() => {
            anyhow::anyhow!("Session expired or rejected. Run `taskdeck login` again.")
        }
        _ => anyhow::Error::new(err).context(format!("{} failed", action)),
    }
}

/// Registration failures surface the server's rejection unchanged (e.g. a
/// duplicate email message).
fn registration_error(err: ApiError) -> anyhow::Error {
    match err {
        ApiError::Status { message, .. } if !message.is_empty() => {
            anyhow::anyhow!("Registration rejected: {}", message)
        }
        other => anyhow::Error::new(other).context("Registration failed"),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}
