// File discovery: turns the `path` input (one pattern per line, `!` to
// exclude) into an ordered list of files plus the directory they are
// uploaded relative to.

use crate::error::{Error, Result};
use glob::MatchOptions;
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub root_directory: PathBuf,
    pub files_to_upload: Vec<PathBuf>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.files_to_upload.is_empty()
    }
}

/// Options shared by includes and excludes: `*` never crosses a `/`.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

struct Pattern {
    text: String,
    /// Directory the pattern starts matching from.
    base: PathBuf,
    /// Compiled form of `text` when it contains wildcards.
    matcher: Option<glob::Pattern>,
}

impl Pattern {
    fn parse(line: &str) -> Result<Self> {
        let text = expand_home(line);
        let is_glob = has_glob_chars(&text);
        let path = absolute(Path::new(&text))?;
        let text = path.to_string_lossy().into_owned();

        let matcher = if is_glob {
            let compiled = glob::Pattern::new(&text).map_err(|e| Error::Pattern {
                pattern: text.clone(),
                message: e.to_string(),
            })?;
            Some(compiled)
        } else {
            None
        };

        let base = if is_glob {
            literal_prefix(&path)
        } else if path.is_file() {
            path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone())
        } else {
            path.clone()
        };

        Ok(Pattern {
            text,
            base,
            matcher,
        })
    }

    fn matches(&self) -> Result<Vec<PathBuf>> {
        if self.matcher.is_none() {
            let path = PathBuf::from(&self.text);
            return Ok(if path.exists() { vec![path] } else { Vec::new() });
        }

        let paths = glob::glob_with(&self.text, MATCH_OPTIONS).map_err(|e| Error::Pattern {
            pattern: self.text.clone(),
            message: e.to_string(),
        })?;
        let mut matched = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                let source = std::io::Error::new(e.error().kind(), e.to_string());
                Error::filesystem("read", e.path(), source)
            })?;
            matched.push(path);
        }
        Ok(matched)
    }

    /// True when `file`, or a directory containing it, matches.
    fn excludes(&self, file: &Path) -> bool {
        match &self.matcher {
            Some(matcher) => file
                .ancestors()
                .any(|p| matcher.matches_path_with(p, MATCH_OPTIONS)),
            None => file.starts_with(&self.text),
        }
    }
}

/// Resolve `search_path` into the files to upload.
pub fn find_files_to_upload(search_path: &str, include_hidden: bool) -> Result<SearchResult> {
    let mut includes = Vec::new();
    let mut excludes = Vec::new();
    for line in search_path.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.strip_prefix('!') {
            Some(rest) => excludes.push(Pattern::parse(rest.trim())?),
            None => includes.push(Pattern::parse(line)?),
        }
    }
    if includes.is_empty() {
        return Err(Error::Config(format!("No search paths in {:?}", search_path)));
    }

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for pattern in &includes {
        for matched in pattern.matches()? {
            for file in expand(&matched, &pattern.base, include_hidden)? {
                if excludes.iter().any(|ex| ex.excludes(&file)) {
                    debug!("Excluded {}", file.display());
                    continue;
                }
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        }
    }

    let root_directory = common_ancestor(includes.iter().map(|p| p.base.as_path()));
    debug!(
        "Found {} file(s) below {}",
        files.len(),
        root_directory.display()
    );

    Ok(SearchResult {
        root_directory,
        files_to_upload: files,
    })
}

/// Files under `path`: the path itself when it is a file, otherwise every
/// file below it in file-name order.
fn expand(path: &Path, base: &Path, include_hidden: bool) -> Result<Vec<PathBuf>> {
    if !include_hidden && is_hidden_below(path, base) {
        return Ok(Vec::new());
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(path)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            include_hidden || entry.depth() == 0 || !is_hidden_name(entry.file_name())
        });
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| path.to_path_buf());
            Error::filesystem("read", path, e.into())
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden_name(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_hidden_below(path: &Path, base: &Path) -> bool {
    path.strip_prefix(base)
        .map(|rest| {
            rest.components()
                .any(|c| matches!(c, Component::Normal(n) if is_hidden_name(n)))
        })
        .unwrap_or(false)
}

fn has_glob_chars(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

fn expand_home(text: &str) -> String {
    if text == "~" || text.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{}", home.display(), &text[1..]);
        }
    }
    text.to_string()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| Error::filesystem("resolve", path, e))?
            .join(path)
    };
    Ok(normalize(&joined))
}

/// Lexically drop `.` and resolve `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Leading directories of a glob pattern that contain no wildcards.
fn literal_prefix(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        if has_glob_chars(&component.as_os_str().to_string_lossy()) {
            break;
        }
        out.push(component.as_os_str());
    }
    out
}

fn common_ancestor<'a>(mut paths: impl Iterator<Item = &'a Path>) -> PathBuf {
    let mut common = match paths.next() {
        Some(first) => first.to_path_buf(),
        None => return PathBuf::new(),
    };
    for path in paths {
        while !path.starts_with(&common) {
            if !common.pop() {
                break;
            }
        }
    }
    common
}
