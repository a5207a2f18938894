use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("no paths to watch")]
    NoPaths,

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cannot resolve path {}: {source}", .path.display())]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The monitor exited without `stop()` having been called.
    #[error("{program} exited with code {}", display_code(.code))]
    Exited { program: String, code: Option<i32> },

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        // Killed by a signal.
        None => "null".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_message_names_program_and_code() {
        let err = WatchError::Exited {
            program: "inotifywait".to_string(),
            code: Some(1),
        };
        assert_eq!(err.to_string(), "inotifywait exited with code 1");
    }

    #[test]
    fn test_exit_message_without_code() {
        let err = WatchError::Exited {
            program: "inotifywait".to_string(),
            code: None,
        };
        assert_eq!(err.to_string(), "inotifywait exited with code null");
    }
}
