use std::ffi::OsString;

use serde::Serialize;

use inotify_wait::{UnknownEvent, WatchEvent};

/// Print one event.
///
/// - `json = true`: one compact JSON object per line.
/// - `json = false`: `KIND<TAB>root<TAB>entry`.
pub fn print_event(event: &WatchEvent, json: bool) {
    if json {
        print_json_line(event);
    } else {
        println!("{}\t{}\t{}", event.kind, event.path.display(), event.entry);
    }
}

/// Same layouts as [`print_event`], with the raw event name in the kind column.
pub fn print_unknown(event: &UnknownEvent, json: bool) {
    if json {
        print_json_line(event);
    } else {
        println!("{}\t{}\t{}", event.name, event.path.display(), event.entry);
    }
}

/// Print the monitor command line: program first, then each argument.
pub fn print_command(program: &str, args: &[OsString], json: bool) {
    let argv: Vec<String> = std::iter::once(program.to_string())
        .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
        .collect();

    if json {
        print_json_line(&argv);
        return;
    }
    for arg in argv {
        println!("{}", arg);
    }
}

fn print_json_line<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("error serialising output: {}", e),
    }
}
