// Upload orchestrator: walks the discovered files in order, streams each one
// to the API, validates the response and swaps the local file for a link to
// its public URL. The first failure ends the run; files after it are never
// touched.

use crate::api::{Transport, UploadResponse};
use crate::error::{Error, Result};
use crate::paths::{self, UploadTask};
use crate::search::SearchResult;
use crate::shortcut;
use reqwest::header::CONTENT_LOCATION;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// Observer notified around each file, used for terminal progress.
pub trait Progress {
    fn started(&self, task: &UploadTask);
    fn finished(&self, task: &UploadTask, public_url: &str);
}

impl Progress for () {
    fn started(&self, _: &UploadTask) {}
    fn finished(&self, _: &UploadTask, _: &str) {}
}

/// A file that was uploaded and replaced by its shortcut.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub public_url: String,
    pub shortcut: PathBuf,
}

/// Result of a fully successful run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UploadOutcome {
    /// Base URL derived from the last uploaded file; `None` when no files
    /// were uploaded.
    pub artifact_url: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// Upload every file of `search` as artifact `artifact_name` under
/// `endpoint`.
pub fn upload_artifact<T: Transport>(
    transport: &T,
    endpoint: &str,
    artifact_name: &str,
    search: &SearchResult,
    progress: &dyn Progress,
) -> Result<UploadOutcome> {
    let mut outcome = UploadOutcome::default();

    for path in &search.files_to_upload {
        let task = UploadTask::new(&search.root_directory, path)?;
        let uploaded = upload_one(transport, endpoint, artifact_name, &task, progress)?;

        // Last file wins; prefixes of earlier files are not compared.
        outcome.artifact_url = Some(paths::strip_relative_path(
            &uploaded.public_url,
            &uploaded.relative_path,
        ));
        outcome.files.push(uploaded);
    }

    match &outcome.artifact_url {
        Some(url) => info!("Artifact base URL: {}", url),
        None => info!("No files were uploaded"),
    }
    Ok(outcome)
}

fn upload_one<T: Transport>(
    transport: &T,
    endpoint: &str,
    artifact_name: &str,
    task: &UploadTask,
    progress: &dyn Progress,
) -> Result<UploadedFile> {
    let url = task.destination_url(endpoint, artifact_name);

    debug!("Uploading {}", task.relative_path);
    debug!("  - Destination: {}", url);
    progress.started(task);

    let response = transport.send_file(Method::PUT, &url, &task.absolute_path)?;
    let public_url = validate_response(&response)?;

    info!("Artifact download URL: {}", public_url);

    let shortcut = shortcut::replace_with_shortcut(&task.absolute_path, &public_url)?;
    progress.finished(task, &public_url);

    Ok(UploadedFile {
        path: task.absolute_path.clone(),
        relative_path: task.relative_path.clone(),
        public_url,
        shortcut,
    })
}

/// Accept only `201 Created` carrying a `Content-Location` header, and
/// return that header's value.
fn validate_response(response: &UploadResponse) -> Result<String> {
    let status_line = response.status_line();
    debug!("  - Status: {:?}", status_line);

    if response.status != StatusCode::CREATED {
        debug!("  - Body: {:?}", response.body);
        return Err(Error::UnexpectedStatus {
            status: status_line,
            body: response.body.clone(),
        });
    }

    let public_url = response
        .headers
        .get(CONTENT_LOCATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(Error::MissingPublicUrl)?;
    debug!("  - Public URL: {:?}", public_url);

    Ok(public_url.to_string())
}
