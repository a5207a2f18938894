use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use regex::RegexBuilder;

use crate::error::{Result, WatchError};
use crate::event::EventMask;

/// Program launched when [`WatchOptions::program`] is not overridden.
pub const DEFAULT_PROGRAM: &str = "inotifywait";

/// An include/exclude pattern handed to inotifywait.
///
/// inotifywait receives `source` verbatim; `case_insensitive` selects the
/// `--excludei` / `--includei` flag variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub source: String,
    pub case_insensitive: bool,
}

impl Pattern {
    /// Build a pattern, rejecting sources that do not compile as a regex.
    pub fn new(source: impl Into<String>, case_insensitive: bool) -> Result<Self> {
        let source = source.into();
        if let Err(err) = RegexBuilder::new(&source)
            .case_insensitive(case_insensitive)
            .build()
        {
            return Err(WatchError::InvalidPattern {
                pattern: source,
                source: err,
            });
        }
        Ok(Self {
            source,
            case_insensitive,
        })
    }

    /// Parse either a `/source/flags` literal or a bare source.
    ///
    /// Only the `i` flag has an effect; any other flag letters are ignored.
    pub fn parse(literal: &str) -> Result<Self> {
        if let Some(rest) = literal.strip_prefix('/') {
            if let Some(end) = rest.rfind('/') {
                let (source, flags) = (&rest[..end], &rest[end + 1..]);
                if flags.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Self::new(source, flags.contains('i'));
                }
            }
        }
        Self::new(literal, false)
    }
}

impl FromStr for Pattern {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self> {
        Pattern::parse(s)
    }
}

/// Everything needed to launch one watcher.
///
/// Defaults: persistent, not recursive, all events, no include/exclude,
/// [`DEFAULT_PROGRAM`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub paths: Vec<PathBuf>,
    pub exclude: Option<Pattern>,
    /// Needs inotifywait 3.20 or newer.
    pub include: Option<Pattern>,
    /// Keep watching until stopped (`-m`); otherwise exit after the first event.
    pub persistent: bool,
    pub recursive: bool,
    /// Events to report; empty reports everything.
    pub events: EventMask,
    pub program: String,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: None,
            include: None,
            persistent: true,
            recursive: false,
            events: EventMask::empty(),
            program: DEFAULT_PROGRAM.to_string(),
        }
    }
}

impl WatchOptions {
    /// Options for a single path or file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            ..Self::default()
        }
    }

    pub fn with_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn exclude(mut self, pattern: Pattern) -> Self {
        self.exclude = Some(pattern);
        self
    }

    pub fn include(mut self, pattern: Pattern) -> Self {
        self.include = Some(pattern);
        self
    }

    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn events(mut self, events: impl Into<EventMask>) -> Self {
        self.events = events.into();
        self
    }

    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Absolute, normalized form of every configured path, in order.
    pub fn resolved_paths(&self) -> Result<Vec<PathBuf>> {
        if self.paths.is_empty() {
            return Err(WatchError::NoPaths);
        }
        self.paths.iter().map(|p| resolve_path(p)).collect()
    }
}

/// Make `path` absolute against the current directory and fold `.` and `..`
/// lexically. Symlinks are left alone and the path need not exist.
pub fn resolve_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).map_err(|source| WatchError::ResolvePath {
        path: path.to_path_buf(),
        source,
    })?;

    let mut resolved = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `pop` is a no-op at the root, matching `/..` == `/`.
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }
    Ok(resolved)
}
