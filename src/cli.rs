use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};

use inotify_wait::config::{WatchConfig, parse_events};
use inotify_wait::{Pattern, WatchOptions};

/// Watch files and directories through inotifywait and print what changes.
///
/// inotify-wait launches inotifywait (from inotify-tools), parses its event
/// stream and reports each event together with the watched root it belongs to
/// and the changed entry relative to that root.
#[derive(Parser, Debug)]
#[command(
    name = "inotify-wait",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand: what to watch and how.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Files or directories to watch.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Watch directories recursively.
    #[arg(short, long)]
    pub recursive: bool,

    /// Exit after the first event instead of monitoring continuously.
    #[arg(long)]
    pub once: bool,

    /// Skip paths matching this pattern (`/regex/` or `/regex/i` for case-insensitive).
    #[arg(long)]
    pub exclude: Option<String>,

    /// Only report paths matching this pattern (needs inotifywait 3.20+).
    #[arg(long)]
    pub include: Option<String>,

    /// Events to report (comma-separated or repeated: create,modify,close_write,...).
    /// All events when omitted.
    #[arg(short, long = "event", value_delimiter = ',')]
    pub events: Vec<String>,

    /// Monitor executable to launch instead of `inotifywait`.
    #[arg(long)]
    pub program: Option<String>,

    /// Config file to read instead of ./inotify-wait.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl WatchArgs {
    /// Merge the config file (if any) and the command-line flags, flags winning.
    pub fn to_options(&self) -> anyhow::Result<WatchOptions> {
        let config = match &self.config {
            Some(path) => WatchConfig::load_file(path),
            None => WatchConfig::load(&std::env::current_dir()?),
        };
        let mut options = config
            .apply(WatchOptions::with_paths(self.paths.iter().cloned()))
            .context("invalid configuration file")?;

        if self.recursive {
            options.recursive = true;
        }
        if self.once {
            options.persistent = false;
        }
        if let Some(exclude) = &self.exclude {
            options.exclude = Some(Pattern::parse(exclude)?);
        }
        if let Some(include) = &self.include {
            options.include = Some(Pattern::parse(include)?);
        }
        if !self.events.is_empty() {
            options.events = parse_events(self.events.as_slice())?;
        }
        if let Some(program) = &self.program {
            options.program = program.clone();
        }
        Ok(options)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch paths and print one line per event until interrupted.
    ///
    /// Exits non-zero if inotifywait exits on its own, which `--once` always does.
    Watch {
        #[command(flatten)]
        args: WatchArgs,

        /// Print events as JSON lines instead of tab-separated text.
        #[arg(long)]
        json: bool,

        /// Also print events whose names inotify-wait does not know (ISDIR, ATTRIB, ...).
        #[arg(long)]
        unknown: bool,
    },

    /// Print the inotifywait command line that `watch` would run, without running it.
    Args {
        #[command(flatten)]
        args: WatchArgs,

        /// Print a JSON array instead of one argument per line.
        #[arg(long)]
        json: bool,
    },
}
