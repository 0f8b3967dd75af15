// Path resolver: maps a discovered file onto its relative path below the
// search root. That relative path is both the suffix of the destination URL
// and the key used to recover the artifact's base URL from a public URL.

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Fixed path segment between the API endpoint and the artifact name.
pub const ARTIFACT_SEGMENT: &str = "artifact";

/// One file of an artifact, alive for a single loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub absolute_path: PathBuf,
    /// `/`-separated, independent of the host platform.
    pub relative_path: String,
}

impl UploadTask {
    pub fn new(root: &Path, file: &Path) -> Result<Self> {
        Ok(UploadTask {
            absolute_path: file.to_path_buf(),
            relative_path: relative_path(root, file)?,
        })
    }

    pub fn destination_url(&self, endpoint: &str, artifact_name: &str) -> String {
        destination_url(endpoint, artifact_name, &self.relative_path)
    }
}

/// Path of `file` relative to `root`, joined with `/`.
pub fn relative_path(root: &Path, file: &Path) -> Result<String> {
    let rest = file.strip_prefix(root).map_err(|_| {
        Error::Config(format!(
            "{} is not below the search root {}",
            file.display(),
            root.display()
        ))
    })?;

    let mut segments = Vec::new();
    for component in rest.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(Error::Config(format!(
                    "unexpected component in {}",
                    rest.display()
                )))
            }
        }
    }

    if segments.is_empty() {
        return Err(Error::Config(format!("{} is the search root itself", file.display())));
    }
    Ok(segments.join("/"))
}

/// `{endpoint}/artifact/{artifact_name}/{relative_path}`
pub fn destination_url(endpoint: &str, artifact_name: &str, relative_path: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        endpoint.trim_end_matches('/'),
        ARTIFACT_SEGMENT,
        artifact_name,
        relative_path
    )
}

/// Remove the file's relative path from the end of its public URL, leaving
/// the prefix shared by every file of the artifact.
pub fn strip_relative_path(public_url: &str, relative_path: &str) -> String {
    if let Some(base) = public_url.strip_suffix(relative_path) {
        return base.to_string();
    }

    warn!(
        "Public URL {:?} does not end with {:?}; trimming by length",
        public_url, relative_path
    );
    let mut cut = public_url.len().saturating_sub(relative_path.len());
    while !public_url.is_char_boundary(cut) {
        cut -= 1;
    }
    public_url[..cut].to_string()
}
