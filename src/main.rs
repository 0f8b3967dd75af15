// Entrypoint for the upload step.
// - Reads inputs from flags or the `INPUT_*` variables the runner sets.
// - Runs discovery, then the upload orchestrator, then publishes outputs.
// - Decides how a failed run is surfaced (`--fail-mode`).

use anyhow::Context;
use clap::{ArgAction, Parser};
use forrest_upload_artifact::api::ApiClient;
use forrest_upload_artifact::config::{
    parse_boolean_input, Credentials, Environment, FailureMode, IfNoFilesFound, Inputs,
};
use forrest_upload_artifact::output::{self, ARTIFACT_URL};
use forrest_upload_artifact::search::{self, SearchResult};
use forrest_upload_artifact::ui::{self, Spinner};
use forrest_upload_artifact::upload::{upload_artifact, UploadOutcome};
use forrest_upload_artifact::Error;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Upload build artifacts to Forrest and replace them with links.
#[derive(Parser, Debug)]
#[command(name = "forrest-upload-artifact", version, about, long_about = None)]
struct Cli {
    /// Artifact name
    #[arg(long, env = "INPUT_NAME")]
    name: Option<String>,

    /// Files, directories or glob patterns to upload, one per line
    #[arg(long, env = "INPUT_PATH")]
    path: String,

    /// Upload files and directories whose names start with a dot
    #[arg(
        long,
        env = "INPUT_INCLUDE-HIDDEN-FILES",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true",
        value_parser = parse_boolean_input
    )]
    include_hidden_files: bool,

    /// Extra token appended to the authorization header
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// What to do when the path matches no files
    #[arg(
        long,
        env = "INPUT_IF-NO-FILES-FOUND",
        value_enum,
        default_value_t = IfNoFilesFound::Warn
    )]
    if_no_files_found: IfNoFilesFound,

    /// `hard` exits with the error; `soft` marks the step failed and stops
    #[arg(long, env = "INPUT_FAIL-MODE", value_enum, default_value_t = FailureMode::Hard)]
    fail_mode: FailureMode,

    /// Print a JSON summary of uploaded files on success
    #[arg(long)]
    json: bool,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let runner_debug = std::env::var("RUNNER_DEBUG").map(|v| v == "1").unwrap_or(false);
    let level = if verbose || runner_debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let failure_mode = cli.fail_mode;
    let inputs = Inputs::new(cli.name, cli.path, cli.token).map(|mut inputs| {
        inputs.include_hidden_files = cli.include_hidden_files;
        inputs.if_no_files_found = cli.if_no_files_found;
        inputs.failure_mode = failure_mode;
        inputs
    });

    match inputs.and_then(|inputs| run(&inputs)) {
        Ok(outcome) => {
            // Without an output file the JSON summary owns stdout and already
            // carries the artifact URL.
            if !cli.json || output::output_file().is_some() {
                let url = outcome.artifact_url.as_deref().unwrap_or("");
                output::set_output(ARTIFACT_URL, url).context("Failed to publish step output")?;
            }
            if cli.json {
                ui::print_summary(&outcome).context("Failed to print summary")?;
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => match failure_mode {
            FailureMode::Hard => Err(e.into()),
            FailureMode::Soft => {
                error!("{}", e);
                ui::mark_failed(&e.to_string());
                Ok(ExitCode::FAILURE)
            }
        },
    }
}

fn run(inputs: &Inputs) -> Result<UploadOutcome, Error> {
    let search = search::find_files_to_upload(&inputs.search_path, inputs.include_hidden_files)?;
    check_found(&search, inputs)?;

    let env = Environment::from_env()?;
    let credentials = Credentials::new(env.run_token, Some(inputs.auth_token.clone()));
    let client = ApiClient::new(&credentials)?;

    let spinner = Spinner::new();
    upload_artifact(&client, &env.api_url, &inputs.artifact_name, &search, &spinner)
}

fn check_found(search: &SearchResult, inputs: &Inputs) -> Result<(), Error> {
    if !search.is_empty() {
        info!(
            "With the provided path, there will be {} file(s) uploaded",
            search.files_to_upload.len()
        );
        return Ok(());
    }

    let path = inputs.search_path.trim();
    match inputs.if_no_files_found {
        IfNoFilesFound::Error => Err(Error::NoFilesFound(path.to_string())),
        IfNoFilesFound::Warn => {
            warn!(
                "No files were found with the provided path: {}. No artifacts will be uploaded.",
                path
            );
            Ok(())
        }
        IfNoFilesFound::Ignore => {
            info!(
                "No files were found with the provided path: {}. No artifacts will be uploaded.",
                path
            );
            Ok(())
        }
    }
}
