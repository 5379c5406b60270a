//! Command-line front end for the CerealNotes core.
//!
//! # Responsibility
//! - Map subcommands onto core services against one SQLite file.
//! - Resolve the acting user through `SessionVerifier` for every command
//!   that reads or mutates on someone's behalf.
//! - Print JSON on stdout; failures go to stderr as `{error, message}`.

use cerealnotes_core::db::{open_db, DbError};
use cerealnotes_core::{
    init_logging, AccountService, AccountServiceError, ConfigError, CoreConfig, Credentials,
    NoteId, NoteService, NoteServiceError, PublicationService, RepoError, SessionVerifier,
    SqliteCategoryRepository, SqliteNoteRepository, SqlitePublicationRepository,
    SqliteUserRepository, UserId,
};
use clap::{Args, Parser, Subcommand};
use log::{error, info};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cerealnotes")]
#[command(about = "Write notes, publish them in issues, read everyone's issues")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Database file; overrides CEREALNOTES_DB_PATH
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Login {
    /// Account email
    #[arg(long, short = 'e')]
    email: String,
    /// Account password
    #[arg(long, short = 'p', env = "CEREALNOTES_PASSWORD", hide_env_values = true)]
    password: String,
}

impl Login {
    fn credentials(&self) -> Credentials {
        Credentials {
            email: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Signup {
        #[arg(long, short = 'n')]
        name: String,
        #[command(flatten)]
        login: Login,
    },

    /// List every user keyed by id
    Users {
        #[command(flatten)]
        login: Login,
    },

    /// Write a new note
    AddNote {
        content: String,
        #[command(flatten)]
        login: Login,
    },

    /// List all of your notes
    Notes {
        #[command(flatten)]
        login: Login,
    },

    /// List notes your next publish would include
    Unpublished {
        #[command(flatten)]
        login: Login,
    },

    /// Replace the content of one of your unpublished notes
    EditNote {
        note_id: i64,
        content: String,
        #[command(flatten)]
        login: Login,
    },

    /// Delete one of your notes
    DeleteNote {
        note_id: i64,
        #[command(flatten)]
        login: Login,
    },

    /// Set the category of one of your notes (marginalia|meta|questions|predictions)
    SetCategory {
        note_id: i64,
        category: String,
        #[command(flatten)]
        login: Login,
    },

    /// Show the category of a note
    Category {
        note_id: i64,
        #[command(flatten)]
        login: Login,
    },

    /// Remove the category of one of your notes
    ClearCategory {
        note_id: i64,
        #[command(flatten)]
        login: Login,
    },

    /// Publish every pending note as your next issue
    Publish {
        #[command(flatten)]
        login: Login,
    },

    /// Show every issue you are allowed to read
    Issues {
        #[command(flatten)]
        login: Login,
    },
}

/// Failure reported to the caller with a stable code.
#[derive(Debug)]
struct CliError {
    code: &'static str,
    message: String,
}

impl CliError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::new("invalid_config", value.to_string())
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

impl From<AccountServiceError> for CliError {
    fn from(value: AccountServiceError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

impl From<NoteServiceError> for CliError {
    fn from(value: NoteServiceError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::new("serialization_failed", value.to_string())
    }
}

fn main() {
    let cli = Cli::parse();
    let pretty = cli.pretty;

    match run(cli) {
        Ok(output) => match render(&output, pretty) {
            Ok(text) => println!("{text}"),
            Err(err) => exit_with(&CliError::from(err)),
        },
        Err(err) => exit_with(&err),
    }
}

fn run(cli: Cli) -> Result<Value, CliError> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    init_logging(&config.logging).map_err(|message| CliError::new("invalid_config", message))?;

    let conn = open_db(&config.db_path)?;
    info!(
        "event=cli_start module=cli status=ok db_path={}",
        config.db_path.display()
    );
    execute(&conn, cli.command)
}

fn execute(conn: &Connection, command: Commands) -> Result<Value, CliError> {
    let accounts = AccountService::new(SqliteUserRepository::try_new(conn)?);

    match command {
        Commands::Signup { name, login } => {
            let user_id = accounts.sign_up(&name, &login.email, &login.password)?;
            Ok(json!({ "userId": user_id }))
        }
        Commands::Users { login } => {
            acting_user(&accounts, &login)?;
            Ok(serde_json::to_value(accounts.users_by_id()?)?)
        }
        Commands::AddNote { content, login } => {
            let user_id = acting_user(&accounts, &login)?;
            let note = note_service(conn)?.create_note(user_id, content)?;
            Ok(json!({ "noteId": note.id, "note": note }))
        }
        Commands::Notes { login } => {
            let user_id = acting_user(&accounts, &login)?;
            Ok(serde_json::to_value(note_service(conn)?.notes_of(user_id)?)?)
        }
        Commands::Unpublished { login } => {
            let user_id = acting_user(&accounts, &login)?;
            let notes = note_service(conn)?.unpublished_notes_of(user_id)?;
            Ok(serde_json::to_value(notes)?)
        }
        Commands::EditNote {
            note_id,
            content,
            login,
        } => {
            let user_id = acting_user(&accounts, &login)?;
            let note = note_service(conn)?.update_note(user_id, NoteId(note_id), content)?;
            Ok(json!({ "noteId": note.id, "note": note }))
        }
        Commands::DeleteNote { note_id, login } => {
            let user_id = acting_user(&accounts, &login)?;
            note_service(conn)?.delete_note(user_id, NoteId(note_id))?;
            Ok(json!({ "deleted": note_id }))
        }
        Commands::SetCategory {
            note_id,
            category,
            login,
        } => {
            let user_id = acting_user(&accounts, &login)?;
            let category = note_service(conn)?.set_category(user_id, NoteId(note_id), &category)?;
            Ok(json!({ "noteId": note_id, "category": category }))
        }
        Commands::Category { note_id, login } => {
            acting_user(&accounts, &login)?;
            let category = note_service(conn)?.category_of(NoteId(note_id))?;
            Ok(json!({ "noteId": note_id, "category": category }))
        }
        Commands::ClearCategory { note_id, login } => {
            let user_id = acting_user(&accounts, &login)?;
            note_service(conn)?.clear_category(user_id, NoteId(note_id))?;
            Ok(json!({ "noteId": note_id, "category": null }))
        }
        Commands::Publish { login } => {
            let user_id = acting_user(&accounts, &login)?;
            let receipt = publication_service(conn)?.publish(user_id)?;
            Ok(serde_json::to_value(receipt)?)
        }
        Commands::Issues { login } => {
            let user_id = acting_user(&accounts, &login)?;
            let issues = publication_service(conn)?.visible_issues(user_id)?;
            Ok(serde_json::to_value(issues)?)
        }
    }
}

fn acting_user(verifier: &impl SessionVerifier, login: &Login) -> Result<UserId, CliError> {
    verifier.verify(&login.credentials()).ok_or_else(|| {
        CliError::new(
            "credentials_not_authorized",
            "email or password not recognized",
        )
    })
}

fn note_service(
    conn: &Connection,
) -> Result<NoteService<SqliteNoteRepository<'_>, SqliteCategoryRepository<'_>>, CliError> {
    Ok(NoteService::new(
        SqliteNoteRepository::try_new(conn)?,
        SqliteCategoryRepository::try_new(conn)?,
    ))
}

fn publication_service(
    conn: &Connection,
) -> Result<PublicationService<SqlitePublicationRepository<'_>>, CliError> {
    Ok(PublicationService::new(SqlitePublicationRepository::try_new(
        conn,
    )?))
}

fn render(value: &Value, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

fn exit_with(err: &CliError) -> ! {
    error!(
        "event=cli_command module=cli status=error error_code={}",
        err.code
    );
    let body = json!({ "error": err.code, "message": err.message });
    eprintln!("{body}");
    std::process::exit(1);
}
