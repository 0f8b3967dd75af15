// API client module: a small blocking HTTP client that streams artifact
// files to the Forrest API. One client is built per run and reused for
// every file so the connection stays alive between uploads.

use crate::config::Credentials;
use crate::error::{Error, Result};
use reqwest::blocking::{Body, Client};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use std::fs::File;
use std::path::Path;
use std::time::Duration;

pub const USER_AGENT: &str = "forrest-upload-artifact/0.1";

/// Everything the orchestrator needs from one response. The body has
/// already been read in full.
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub status: StatusCode,
    pub status_message: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl UploadResponse {
    /// `"201 Created"` style status line.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.status.as_u16(), self.status_message)
    }
}

/// Sends a local file as the body of a single request.
pub trait Transport {
    fn send_file(&self, method: Method, url: &str, path: &Path) -> Result<UploadResponse>;
}

/// Authenticated client holding a reqwest blocking client with the
/// authorization header preset on every request.
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    pub fn new(credentials: &Credentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(auth_headers(credentials)?)
            // Artifacts can be large; only the connect phase is bounded.
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(ApiClient { client })
    }
}

/// Build the header map carrying `Authorization: Bearer <run>[ <user>]`.
fn auth_headers(credentials: &Credentials) -> Result<HeaderMap> {
    let mut value = HeaderValue::from_str(&credentials.authorization())
        .map_err(|_| Error::Config("Token contains characters not allowed in a header".into()))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

impl Transport for ApiClient {
    fn send_file(&self, method: Method, url: &str, path: &Path) -> Result<UploadResponse> {
        let file = File::open(path).map_err(|e| Error::filesystem("open", path, e))?;

        let transport_error = |source| Error::Transport {
            url: url.to_string(),
            source,
        };
        let res = self
            .client
            .request(method, url)
            .body(Body::from(file))
            .send()
            .map_err(transport_error)?;

        let status = res.status();
        let headers = res.headers().clone();
        // A rejected upload still reports its status if the body is unreadable.
        let body = if status == StatusCode::CREATED {
            res.text().map_err(transport_error)?
        } else {
            res.text().unwrap_or_default()
        };

        Ok(UploadResponse {
            status,
            status_message: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body,
        })
    }
}
