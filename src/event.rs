use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    /// inotify event bits, as numbered by inotify-tools.
    ///
    /// `CLOSE` and `MOVE` are composites. Used as a filter, an empty mask means
    /// "every event".
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct EventMask: u32 {
        const ACCESS = 0x0000_0001;
        const MODIFY = 0x0000_0002;
        const CLOSE_WRITE = 0x0000_0008;
        const CLOSE_NOWRITE = 0x0000_0010;
        const OPEN = 0x0000_0020;
        const MOVED_FROM = 0x0000_0040;
        const MOVED_TO = 0x0000_0080;
        const CREATE = 0x0000_0100;
        const DELETE = 0x0000_0200;
        const DELETE_SELF = 0x0000_0400;
        const MOVE_SELF = 0x0000_0800;
        const UNMOUNT = 0x0000_2000;
        const CLOSE = Self::CLOSE_WRITE.bits() | Self::CLOSE_NOWRITE.bits();
        const MOVE = Self::MOVED_FROM.bits() | Self::MOVED_TO.bits();
    }
}

impl From<EventKind> for EventMask {
    fn from(kind: EventKind) -> Self {
        kind.mask()
    }
}

impl FromIterator<EventKind> for EventMask {
    fn from_iter<I: IntoIterator<Item = EventKind>>(iter: I) -> Self {
        iter.into_iter()
            .fold(EventMask::empty(), |mask, kind| mask | kind.mask())
    }
}

/// A single event code reported by inotifywait.
///
/// `Close` and `Move` are reported by inotifywait alongside the specific code
/// (e.g. `CLOSE_WRITE,CLOSE`), so they get their own listener channel too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Access,
    Modify,
    CloseWrite,
    CloseNowrite,
    Open,
    MovedFrom,
    MovedTo,
    Create,
    Delete,
    DeleteSelf,
    MoveSelf,
    Unmount,
    Close,
    Move,
}

impl EventKind {
    pub const COUNT: usize = 14;

    pub const ALL: [EventKind; Self::COUNT] = [
        EventKind::Access,
        EventKind::Modify,
        EventKind::CloseWrite,
        EventKind::CloseNowrite,
        EventKind::Open,
        EventKind::MovedFrom,
        EventKind::MovedTo,
        EventKind::Create,
        EventKind::Delete,
        EventKind::DeleteSelf,
        EventKind::MoveSelf,
        EventKind::Unmount,
        EventKind::Close,
        EventKind::Move,
    ];

    /// Position in [`EventKind::ALL`]; used to index per-kind listener tables.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn mask(self) -> EventMask {
        match self {
            EventKind::Access => EventMask::ACCESS,
            EventKind::Modify => EventMask::MODIFY,
            EventKind::CloseWrite => EventMask::CLOSE_WRITE,
            EventKind::CloseNowrite => EventMask::CLOSE_NOWRITE,
            EventKind::Open => EventMask::OPEN,
            EventKind::MovedFrom => EventMask::MOVED_FROM,
            EventKind::MovedTo => EventMask::MOVED_TO,
            EventKind::Create => EventMask::CREATE,
            EventKind::Delete => EventMask::DELETE,
            EventKind::DeleteSelf => EventMask::DELETE_SELF,
            EventKind::MoveSelf => EventMask::MOVE_SELF,
            EventKind::Unmount => EventMask::UNMOUNT,
            EventKind::Close => EventMask::CLOSE,
            EventKind::Move => EventMask::MOVE,
        }
    }

    /// Raw bit value of the code.
    pub fn code(self) -> u32 {
        self.mask().bits()
    }

    /// Name as printed by inotifywait's `%e` format (e.g. `CLOSE_WRITE`).
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Access => "ACCESS",
            EventKind::Modify => "MODIFY",
            EventKind::CloseWrite => "CLOSE_WRITE",
            EventKind::CloseNowrite => "CLOSE_NOWRITE",
            EventKind::Open => "OPEN",
            EventKind::MovedFrom => "MOVED_FROM",
            EventKind::MovedTo => "MOVED_TO",
            EventKind::Create => "CREATE",
            EventKind::Delete => "DELETE",
            EventKind::DeleteSelf => "DELETE_SELF",
            EventKind::MoveSelf => "MOVE_SELF",
            EventKind::Unmount => "UNMOUNT",
            EventKind::Close => "CLOSE",
            EventKind::Move => "MOVE",
        }
    }

    /// Selector accepted by `inotifywait -e`.
    pub fn selector(self) -> &'static str {
        match self {
            EventKind::Access => "access",
            EventKind::Modify => "modify",
            EventKind::CloseWrite => "close_write",
            EventKind::CloseNowrite => "close_nowrite",
            EventKind::Open => "open",
            EventKind::MovedFrom => "moved_from",
            EventKind::MovedTo => "moved_to",
            EventKind::Create => "create",
            EventKind::Delete => "delete",
            EventKind::DeleteSelf => "delete_self",
            EventKind::MoveSelf => "move_self",
            EventKind::Unmount => "unmount",
            EventKind::Close => "close",
            EventKind::Move => "move",
        }
    }

    /// Look up a code by the exact name inotifywait prints.
    pub fn from_name(name: &str) -> Option<EventKind> {
        EventKind::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Loose parse for user input: case-insensitive, optional `IN_` prefix.
impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let name = upper.strip_prefix("IN_").unwrap_or(&upper);
        EventKind::from_name(name).ok_or_else(|| format!("unknown event '{s}'"))
    }
}

/// One decoded token from the `%e` column of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventCode {
    Known(EventKind),
    /// A name outside the table (`ISDIR`, `ATTRIB`, `IGNORED`, ...).
    Unknown(String),
}

impl EventCode {
    pub fn from_name(name: &str) -> EventCode {
        match EventKind::from_name(name) {
            Some(kind) => EventCode::Known(kind),
            None => EventCode::Unknown(name.to_string()),
        }
    }
}

/// A change reported under one of the watched roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchEvent {
    pub kind: EventKind,
    /// The configured root the change was matched against.
    pub path: PathBuf,
    /// Path of the changed item relative to `path`; empty when the root itself changed.
    pub entry: String,
}

/// An event whose name is not in the [`EventKind`] table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownEvent {
    pub name: String,
    pub path: PathBuf,
    pub entry: String,
}
