//! Decoding of inotifywait's `%e|%w%f` output.
//!
//! Bytes arrive in arbitrary chunks; [`LineDecoder`] turns them into complete
//! lines, [`parse_line`] splits a line into event codes and a full path, and
//! [`RootSet`] maps that full path back onto the configured watch roots.

use std::path::{Path, PathBuf};

use crate::event::EventCode;

fn is_line_break(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// Splits a byte stream on runs of `\r` / `\n`, holding back an unterminated
/// tail until the rest of it arrives.
#[derive(Debug, Default)]
pub struct LineDecoder {
    pending: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes. Empty lines are skipped.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        let Some(last_break) = chunk.iter().rposition(|&b| is_line_break(b)) else {
            self.pending.extend_from_slice(chunk);
            return Vec::new();
        };

        self.pending.extend_from_slice(&chunk[..last_break]);
        let complete = std::mem::take(&mut self.pending);
        self.pending.extend_from_slice(&chunk[last_break + 1..]);

        split_lines(&complete)
    }

    /// Flush whatever is left once the stream has ended.
    pub fn finish(&mut self) -> Vec<String> {
        let rest = std::mem::take(&mut self.pending);
        split_lines(&rest)
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|&b| is_line_break(b))
        .filter(|line| !line.is_empty())
        .map(|line| String::from_utf8_lossy(line).into_owned())
        .collect()
}

/// One parsed output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub codes: Vec<EventCode>,
    pub full_path: String,
}

/// Parse `EVENT[,EVENT...]|FULL_PATH`.
///
/// Event names are never rejected: unrecognised ones become
/// [`EventCode::Unknown`]. Returns `None` only for a line with no `|`.
pub fn parse_line(line: &str) -> Option<Record> {
    let (events, full_path) = line.split_once('|')?;
    let codes = events.split(',').map(EventCode::from_name).collect();
    Some(Record {
        codes,
        full_path: full_path.to_string(),
    })
}

/// The watched roots, in configured order.
#[derive(Debug, Clone)]
pub struct RootSet {
    roots: Vec<(PathBuf, String)>,
}

impl RootSet {
    pub fn new(roots: &[PathBuf]) -> Self {
        let roots = roots
            .iter()
            .map(|root| (root.clone(), root.to_string_lossy().into_owned()))
            .collect();
        Self { roots }
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(|(root, _)| root.as_path())
    }

    /// Every root `full_path` lives under, paired with the entry relative to it.
    ///
    /// A root only matches on a component boundary: `/a/b` matches `/a/b` and
    /// `/a/b/c` but not `/a/bc`.
    pub fn matches<'a>(&'a self, full_path: &'a str) -> impl Iterator<Item = (&'a Path, &'a str)> {
        self.roots.iter().filter_map(move |(root, prefix)| {
            relative_entry(prefix, full_path).map(|entry| (root.as_path(), entry))
        })
    }
}

fn relative_entry<'a>(root: &str, full_path: &'a str) -> Option<&'a str> {
    let rest = full_path.strip_prefix(root)?;
    if rest.is_empty() || root.ends_with('/') {
        return Some(rest);
    }
    rest.strip_prefix('/')
}
