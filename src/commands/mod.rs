//! Command-line front end over the client core.

pub mod auth;
pub mod records;
pub mod upload;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::api::ApiError;
use crate::config::{self, ClientConfig};
use crate::core_state::CoreState;
use crate::models::{RecordFilter, RecordKey, RecordKind};
use crate::session::SessionError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Not signed in. Run `intpatient login` first.")]
    NotSignedIn,

    #[error("Select at least one file to upload.")]
    NothingSelected,

    #[error("Could not read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not write {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Record {0} not found")]
    NotFound(RecordKey),

    #[error("One or more uploads failed")]
    SubmissionFailed,
}

#[derive(Parser, Debug)]
#[command(name = "intpatient")]
#[command(about = "Submit imaging and reports, browse submitted records")]
#[command(version)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "INTPATIENT_URL")]
    pub url: Option<String>,

    /// Where the sign-in token is kept between runs
    #[arg(long, env = "INTPATIENT_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and keep the token for later commands
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "INTPATIENT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Upload imaging and/or report files in one submission
    Upload {
        /// Imaging files (.jpg .jpeg .png .bmp .dcm)
        #[arg(long = "imaging", num_args = 1..)]
        imaging: Vec<PathBuf>,
        /// Report files (.jpg .jpeg .png .pdf)
        #[arg(long = "report", num_args = 1..)]
        report: Vec<PathBuf>,
        /// Optional patient note attached to both records
        #[arg(long)]
        note: Option<String>,
    },
    /// List submitted records, newest first
    Records {
        /// all, radiology or report
        #[arg(long, default_value = "all")]
        filter: RecordFilter,
    },
    /// Most recent records across both kinds
    Recent {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Show one record with its files and extracted text
    Show { kind: RecordKind, id: i64 },
    /// Download a stored file
    Download {
        kind: RecordKind,
        file_id: i64,
        out: PathBuf,
    },
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(url) = self.url.as_deref().filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        config
    }
}

pub async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let session_file = cli.session_file.clone().unwrap_or_else(config::session_file);
    let state = CoreState::open(cli.client_config(), &session_file)?;
    tracing::debug!(url = %state.config.base_url, "Using backend");

    match cli.command {
        Command::Login { username, password } => auth::login(&state, &username, &password).await,
        Command::Logout => auth::logout(&state),
        Command::Whoami => auth::whoami(&state).await,
        Command::Upload {
            imaging,
            report,
            note,
        } => upload::upload(&state, &imaging, &report, note.as_deref()).await,
        Command::Records { filter } => records::list(&state, filter).await,
        Command::Recent { limit } => records::recent(&state, limit).await,
        Command::Show { kind, id } => records::show(&state, RecordKey::new(kind, id)).await,
        Command::Download { kind, file_id, out } => records::download(&state, kind, file_id, &out).await,
    }
}

/// Commands other than `login` need a held token.
fn require_session(state: &CoreState) -> Result<(), CliError> {
    if state.session().is_authenticated() {
        Ok(())
    } else {
        Err(CliError::NotSignedIn)
    }
}
