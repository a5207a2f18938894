//! Run `inotifywait` as a child process and receive its events as typed callbacks.
//!
//! ```no_run
//! use inotify_wait::{EventKind, EventMask, WatchOptions, Watcher};
//!
//! # async fn demo() -> inotify_wait::Result<()> {
//! let options = WatchOptions::new("./src")
//!     .recursive(true)
//!     .events(EventMask::CREATE | EventMask::MODIFY);
//! let mut watcher = Watcher::spawn(options)?;
//! watcher.on(EventKind::Create, |event| println!("created {}", event.entry));
//! watcher.on_error(|message| eprintln!("inotifywait: {message}"));
//! watcher.run().await
//! # }
//! ```

pub mod args;
pub mod config;
pub mod error;
pub mod event;
pub mod options;
pub mod parser;
pub mod watcher;

pub use args::build_args;
pub use error::{Result, WatchError};
pub use event::{EventCode, EventKind, EventMask, UnknownEvent, WatchEvent};
pub use options::{DEFAULT_PROGRAM, Pattern, WatchOptions};
pub use watcher::{ListenerId, StopHandle, Watcher};
