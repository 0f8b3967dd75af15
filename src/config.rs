// Configuration module: the resolved step inputs, the environment the
// runner provides (API endpoint and run token) and the credentials derived
// from both. Everything here is resolved once before the first upload.

use crate::error::{Error, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

pub const DEFAULT_ARTIFACT_NAME: &str = "artifact";
pub const API_URL_VAR: &str = "FORREST_API_URL";
pub const RUN_TOKEN_FILE_VAR: &str = "FORREST_RUN_TOKEN_FILE";

/// How a failed run is reported to the pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum FailureMode {
    /// Propagate the error out of the process.
    #[default]
    Hard,
    /// Mark the step as failed and stop without propagating.
    Soft,
}

/// What to do when discovery returns no files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum IfNoFilesFound {
    #[default]
    Warn,
    Error,
    Ignore,
}

/// Step inputs after defaults have been applied.
#[derive(Clone, Debug)]
pub struct Inputs {
    pub artifact_name: String,
    pub search_path: String,
    pub include_hidden_files: bool,
    /// Extra token appended to the authorization header. Empty means none.
    pub auth_token: String,
    pub if_no_files_found: IfNoFilesFound,
    pub failure_mode: FailureMode,
}

impl Inputs {
    pub fn new(
        artifact_name: Option<String>,
        search_path: String,
        auth_token: Option<String>,
    ) -> Result<Self> {
        if search_path.trim().is_empty() {
            return Err(Error::Config("Input required and not supplied: path".into()));
        }
        let artifact_name = artifact_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_ARTIFACT_NAME.to_string());

        Ok(Inputs {
            artifact_name,
            search_path,
            include_hidden_files: false,
            auth_token: auth_token.unwrap_or_default(),
            if_no_files_found: IfNoFilesFound::default(),
            failure_mode: FailureMode::default(),
        })
    }
}

/// Parse a boolean step input. Only the YAML core schema spellings are
/// accepted so that typos fail loudly instead of silently meaning false.
pub fn parse_boolean_input(value: &str) -> std::result::Result<bool, String> {
    match value.trim() {
        "true" | "True" | "TRUE" => Ok(true),
        "false" | "False" | "FALSE" => Ok(false),
        other => Err(format!(
            "input does not meet YAML 1.2 \"Core Schema\" specification: {:?}; \
             support boolean input list: `true | True | TRUE | false | False | FALSE`",
            other
        )),
    }
}

/// Values the runner injects through the process environment.
#[derive(Clone, Debug)]
pub struct Environment {
    pub api_url: String,
    pub run_token: String,
}

impl Environment {
    /// Read `FORREST_API_URL` and the token file named by
    /// `FORREST_RUN_TOKEN_FILE`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var(API_URL_VAR).ok(),
            std::env::var_os(RUN_TOKEN_FILE_VAR).map(PathBuf::from),
        )
    }

    pub fn from_vars(api_url: Option<String>, token_file: Option<PathBuf>) -> Result<Self> {
        let api_url = api_url
            .filter(|url| !url.is_empty())
            .ok_or(Error::MissingEnv(API_URL_VAR))?;
        let token_file = token_file
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(Error::MissingEnv(RUN_TOKEN_FILE_VAR))?;
        let run_token = read_run_token(&token_file)?;

        Ok(Environment { api_url, run_token })
    }
}

fn read_run_token(path: &Path) -> Result<String> {
    let token = std::fs::read_to_string(path).map_err(|source| Error::RunToken {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(token.trim().to_string())
}

/// Tokens combined into the single authorization header sent with every
/// request of a run.
#[derive(Clone)]
pub struct Credentials {
    run_token: String,
    user_token: Option<String>,
}

impl Credentials {
    pub fn new(run_token: impl Into<String>, user_token: Option<String>) -> Self {
        Credentials {
            run_token: run_token.into(),
            user_token: user_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn authorization(&self) -> String {
        match &self.user_token {
            Some(user) => format!("Bearer {} {}", self.run_token, user),
            None => format!("Bearer {}", self.run_token),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("run_token", &"<redacted>")
            .field("user_token", &self.user_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
