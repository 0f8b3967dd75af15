//! Shared fixtures for the binary's integration tests: a loopback HTTP stub
//! that answers uploads from a script and records what it received.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::TempDir;

#[derive(Clone, Debug)]
pub struct StubResponse {
    pub status: u16,
    pub reason: &'static str,
    pub location: Option<String>,
    pub body: String,
    /// Advertised `Content-Length` when it differs from the real body; the
    /// connection is closed right after such a response.
    pub declared_len: Option<usize>,
}

impl StubResponse {
    pub fn created(location: &str) -> Self {
        StubResponse {
            status: 201,
            reason: "Created",
            location: Some(location.to_string()),
            body: String::new(),
            declared_len: None,
        }
    }

    pub fn status(status: u16, reason: &'static str, body: &str) -> Self {
        StubResponse {
            status,
            reason,
            location: None,
            body: body.to_string(),
            declared_len: None,
        }
    }

    /// Promises `declared_len` body bytes but sends only `body`.
    pub fn truncated(status: u16, reason: &'static str, body: &str, declared_len: usize) -> Self {
        StubResponse {
            declared_len: Some(declared_len),
            ..StubResponse::status(status, reason, body)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    pub fn start(responses: Vec<StubResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let responses = Arc::new(Mutex::new(VecDeque::from(responses)));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let responses = Arc::clone(&responses);
                let recorded = Arc::clone(&recorded);
                thread::spawn(move || serve(stream, responses, recorded));
            }
        });

        StubServer { url, requests }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve(
    stream: TcpStream,
    responses: Arc<Mutex<VecDeque<StubResponse>>>,
    recorded: Arc<Mutex<Vec<Recorded>>>,
) {
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    // Keep-alive: answer requests on this connection until the client hangs up.
    while let Some(request) = read_request(&mut reader) {
        recorded.lock().unwrap().push(request);
        let response = responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| StubResponse::status(599, "Unscripted", ""));

        let mut head = format!("HTTP/1.1 {} {}\r\n", response.status, response.reason);
        if let Some(location) = &response.location {
            head.push_str(&format!("Content-Location: {}\r\n", location));
        }
        let length = response.declared_len.unwrap_or(response.body.len());
        head.push_str(&format!("Content-Length: {}\r\n\r\n", length));
        if writer.write_all(head.as_bytes()).is_err()
            || writer.write_all(response.body.as_bytes()).is_err()
            || writer.flush().is_err()
            || response.declared_len.is_some()
        {
            let _ = writer.shutdown(std::net::Shutdown::Both);
            return;
        }
    }
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<Recorded> {
    let mut line = String::new();
    if reader.read_line(&mut line).ok()? == 0 {
        return None;
    }
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        let (name, value) = line.split_once(':')?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let find = |name: &str| {
        headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    };
    let mut body = Vec::new();
    if find("transfer-encoding").map_or(false, |v| v.eq_ignore_ascii_case("chunked")) {
        loop {
            let mut size = String::new();
            reader.read_line(&mut size).ok()?;
            let size = usize::from_str_radix(size.trim(), 16).ok()?;
            let mut chunk = vec![0; size + 2];
            reader.read_exact(&mut chunk).ok()?;
            if size == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..size]);
        }
    } else if let Some(len) = find("content-length").and_then(|v| v.parse::<usize>().ok()) {
        body.resize(len, 0);
        reader.read_exact(&mut body).ok()?;
    }

    Some(Recorded {
        method,
        path,
        headers,
        body,
    })
}

/// A workspace with an `a/` directory holding the given files, a run token
/// file and an output file.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        for (name, contents) in files {
            let path = dir.path().join("a").join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("run-token"), "run-token\n").unwrap();
        Workspace { dir }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("a")
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    pub fn token_file(&self) -> PathBuf {
        self.dir.path().join("run-token")
    }

    pub fn output_file(&self) -> PathBuf {
        self.dir.path().join("github-output")
    }

    pub fn output(&self) -> String {
        std::fs::read_to_string(self.output_file()).unwrap_or_default()
    }

    /// The binary with a clean environment pointed at `api_url`.
    pub fn command(&self, api_url: &str) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("forrest-upload-artifact").unwrap();
        cmd.env_clear()
            .current_dir(self.dir.path())
            .env("FORREST_API_URL", api_url)
            .env("FORREST_RUN_TOKEN_FILE", self.token_file())
            .env("GITHUB_OUTPUT", self.output_file())
            .env("INPUT_PATH", self.root());
        cmd
    }
}

pub fn desktop_entry(path: &Path) -> Option<String> {
    let mut name = path.as_os_str().to_owned();
    name.push(".desktop");
    std::fs::read_to_string(PathBuf::from(name)).ok()
}
