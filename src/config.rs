use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::{Result, WatchError};
use crate::event::{EventKind, EventMask};
use crate::options::{Pattern, WatchOptions};

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = "inotify-wait.toml";

/// Configuration loaded from `inotify-wait.toml`.
///
/// Every field is optional; unset fields leave the [`WatchOptions`] value alone.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct WatchConfig {
    /// Monitor executable, defaults to `inotifywait`.
    pub program: Option<String>,
    pub persistent: Option<bool>,
    pub recursive: Option<bool>,
    /// Pattern literal such as `/\.swp$/` or `/build/i`.
    pub exclude: Option<String>,
    pub include: Option<String>,
    /// Event names (`create`, `close_write`, `IN_MOVE`, ...).
    pub events: Option<Vec<String>>,
}

impl WatchConfig {
    /// Load `inotify-wait.toml` from `dir`.
    ///
    /// Returns a default (empty) configuration if the file does not exist or cannot be parsed.
    pub fn load(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        Self::load_file(&config_path)
    }

    /// Load an explicit config file, falling back to defaults with a warning.
    pub fn load_file(config_path: &Path) -> Self {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => config,
                Err(err) => {
                    warn!(path = %config_path.display(), %err, "failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(err) => {
                warn!(path = %config_path.display(), %err, "failed to read config, using defaults");
                Self::default()
            }
        }
    }

    /// Overlay the configured values onto `options`.
    pub fn apply(&self, mut options: WatchOptions) -> Result<WatchOptions> {
        if let Some(program) = &self.program {
            options.program = program.clone();
        }
        if let Some(persistent) = self.persistent {
            options.persistent = persistent;
        }
        if let Some(recursive) = self.recursive {
            options.recursive = recursive;
        }
        if let Some(exclude) = &self.exclude {
            options.exclude = Some(Pattern::parse(exclude)?);
        }
        if let Some(include) = &self.include {
            options.include = Some(Pattern::parse(include)?);
        }
        if let Some(events) = &self.events {
            options.events = parse_events(events.as_slice())?;
        }
        Ok(options)
    }
}

/// Fold event names into a mask, rejecting names that are not in the table.
pub fn parse_events<S: AsRef<str>>(names: &[S]) -> Result<EventMask> {
    names.iter().try_fold(EventMask::empty(), |mask, name| {
        let kind: EventKind = name
            .as_ref()
            .parse()
            .map_err(|_| WatchError::UnknownEvent(name.as_ref().to_string()))?;
        Ok(mask | kind.mask())
    })
}
