// Shortcut writer: replaces an uploaded file with a desktop link entry
// pointing at its public URL.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `{path}.desktop`, next to the original file.
pub fn shortcut_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".desktop");
    PathBuf::from(name)
}

pub fn desktop_entry(public_url: &str) -> String {
    format!("[Desktop Entry]\nType=Link\nURL={}", public_url)
}

/// Write the link entry and, only once that succeeded, delete the original.
/// Returns the path of the written entry.
pub fn replace_with_shortcut(path: &Path, public_url: &str) -> Result<PathBuf> {
    let desktop_path = shortcut_path(path);

    std::fs::write(&desktop_path, desktop_entry(public_url))
        .map_err(|e| Error::filesystem("write", &desktop_path, e))?;
    debug!("  - Created: {:?}", desktop_path.display().to_string());

    std::fs::remove_file(path).map_err(|e| Error::filesystem("remove", path, e))?;
    debug!("  - Removed: {:?}", path.display().to_string());

    Ok(desktop_path)
}
