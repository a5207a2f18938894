use std::ffi::OsString;
use std::path::PathBuf;

use crate::event::{EventKind, EventMask};
use crate::options::{Pattern, WatchOptions};

/// Output format requested from inotifywait: `EVENTS|WATCHED_PATH` + filename.
pub const OUTPUT_FORMAT: &str = "%e|%w%f";

/// Individual selectors in the order inotifywait documents them. The composite
/// `close` / `move` selectors are handled separately.
const SELECTOR_ORDER: [EventKind; 12] = [
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
];

/// Build the full inotifywait argument list for already-resolved `paths`.
///
/// Order: fixed format flags, `-m`, `-r`, exclude, include, `-e` selectors,
/// then the paths.
pub fn build_args(options: &WatchOptions, paths: &[PathBuf]) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["--format".into(), OUTPUT_FORMAT.into(), "-q".into()];

    if options.persistent {
        args.push("-m".into());
    }
    if options.recursive {
        args.push("-r".into());
    }
    if let Some(pattern) = &options.exclude {
        push_pattern(&mut args, "--exclude", pattern);
    }
    if let Some(pattern) = &options.include {
        push_pattern(&mut args, "--include", pattern);
    }
    for selector in event_selectors(options.events) {
        args.push("-e".into());
        args.push(selector.into());
    }

    args.extend(paths.iter().map(|p| p.as_os_str().to_os_string()));
    args
}

fn push_pattern(args: &mut Vec<OsString>, flag: &str, pattern: &Pattern) {
    let flag = if pattern.case_insensitive {
        format!("{flag}i")
    } else {
        flag.to_string()
    };
    args.push(flag.into());
    args.push(pattern.source.as_str().into());
}

/// The `-e` selectors needed to reproduce `events` exactly.
///
/// When both halves of `close` (or `move`) are requested they collapse into the
/// single composite selector, which goes after all individual ones.
pub fn event_selectors(events: EventMask) -> Vec<&'static str> {
    if events.is_empty() {
        return Vec::new();
    }

    let close = events.contains(EventMask::CLOSE);
    let moved = events.contains(EventMask::MOVE);

    let mut selectors: Vec<&'static str> = SELECTOR_ORDER
        .into_iter()
        .filter(|kind| events.contains(kind.mask()))
        .filter(|kind| !(close && EventMask::CLOSE.contains(kind.mask())))
        .filter(|kind| !(moved && EventMask::MOVE.contains(kind.mask())))
        .map(EventKind::selector)
        .collect();

    if close {
        selectors.push(EventKind::Close.selector());
    }
    if moved {
        selectors.push(EventKind::Move.selector());
    }
    selectors
}
