// StaffGrid CLI - headless driver for the assignment grid

mod commands;
mod exit_codes;
mod logger;
mod render;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use staffgrid_client::BackendError;
use staffgrid_engine::GridError;

use exit_codes::{backend_exit_code, grid_exit_code, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "sgrid")]
#[command(about = "Staffing assignment grid (headless)")]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace). Overrides SGRID_LOG.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Backend URL (default: saved login, then settings)
    #[arg(long, env = "SGRID_API_BASE", global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that loads the grid.
#[derive(clap::Args, Clone, Debug)]
pub struct ScopeArgs {
    /// Horizon in weeks (default: grid.defaultWeeks)
    #[arg(long, short = 'w')]
    weeks: Option<u32>,

    /// Limit to one department
    #[arg(long)]
    department: Option<i64>,

    /// Include sub-departments of --department
    #[arg(long, requires = "department")]
    include_children: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an API token for the backend
    Login {
        /// Token (otherwise SGRID_API_TOKEN, then prompt)
        #[arg(long)]
        token: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Load and print the grid
    #[command(after_help = "\
Examples:
  sgrid show
  sgrid show --weeks 26 --department 4 --include-children
  sgrid show --status active --status planning --json")]
    Show {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Only projects with this status (repeatable)
        #[arg(long)]
        status: Vec<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Load assignments of collapsed people and print the grid
    Expand {
        /// Person ids
        #[arg(required = true)]
        people: Vec<i64>,

        /// Re-fetch even if already loaded
        #[arg(long)]
        refresh: bool,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Set hours in one cell
    #[command(after_help = "\
Examples:
  sgrid set 7 42 2024-01-08 3
  sgrid set 7 42 2024-01-08 12.5")]
    Set {
        person: i64,
        assignment: i64,
        /// Week key (YYYY-MM-DD, as shown by `show --json`)
        week: String,
        /// Hours; clamped to [0, grid.hoursCap]
        hours: String,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Set the same hours across a week range of one assignment
    #[command(after_help = "\
Examples:
  sgrid fill 7 42 2024-01-01 2024-03-25 8")]
    Fill {
        person: i64,
        assignment: i64,
        from: String,
        to: String,
        hours: String,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Assign a person to a project
    Assign {
        person: i64,
        project: i64,

        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Remove an assignment
    Unassign {
        assignment: i64,

        #[command(flatten)]
        scope: ScopeArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let settings = staffgrid_config::Settings::load();
    let ctx = commands::Context { settings, api_base: cli.api_base };

    let result = match cli.command {
        Commands::Login { token } => commands::cmd_login(&ctx, token),
        Commands::Logout => commands::cmd_logout(),
        Commands::Show { scope, status, json } => commands::cmd_show(&ctx, &scope, status, json),
        Commands::Expand { people, refresh, scope } => commands::cmd_expand(&ctx, &scope, people, refresh),
        Commands::Set { person, assignment, week, hours, scope } => {
            commands::cmd_set(&ctx, &scope, person, assignment, &week, &hours)
        }
        Commands::Fill { person, assignment, from, to, hours, scope } => {
            commands::cmd_fill(&ctx, &scope, person, assignment, &from, &to, &hours)
        }
        Commands::Assign { person, project, scope } => commands::cmd_assign(&ctx, &scope, person, project),
        Commands::Unassign { assignment, scope } => commands::cmd_unassign(&ctx, &scope, assignment),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn backend(err: BackendError) -> Self {
        let hint = match &err {
            BackendError::NotAuthenticated | BackendError::Http(401, _) => {
                Some("run `sgrid login` to store a valid token".to_string())
            }
            BackendError::Network(_) => Some("check --api-base or `api.base` in settings.json".to_string()),
            _ => None,
        };
        Self { code: backend_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn grid(err: GridError) -> Self {
        let hint = match &err {
            GridError::SnapshotAcquisition(_) => Some("retry, or narrow with --department/--weeks".to_string()),
            _ => None,
        };
        Self { code: grid_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
