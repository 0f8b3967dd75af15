// Library root
// -----------
// Uploads build artifacts to the Forrest API one file at a time and
// replaces each local file with a link to its public URL. The binary
// (`main.rs`) reads inputs and wires these modules together.
//
// Module responsibilities:
// - `config`: step inputs, runner environment and credentials.
// - `search`: discovers the files to upload and their common root.
// - `paths`: relative paths, destination URLs and base-URL derivation.
// - `api`: the authenticated HTTP client that streams each file.
// - `upload`: the orchestrator driving one sequential upload run.
// - `shortcut`: writes the `.desktop` link and removes the original.
// - `output`: step outputs for later pipeline steps.
// - `ui`: progress spinner, failure annotation and JSON summary.
pub mod api;
pub mod config;
pub mod error;
pub mod output;
pub mod paths;
pub mod search;
pub mod shortcut;
pub mod ui;
pub mod upload;

pub use error::{Error, Result};
