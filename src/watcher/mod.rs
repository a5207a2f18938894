pub mod listeners;

use std::ffi::OsString;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{Notify, oneshot};
use tracing::{debug, error, trace, warn};

use crate::args::build_args;
use crate::error::{Result, WatchError};
use crate::event::{EventCode, EventKind, UnknownEvent, WatchEvent};
use crate::options::WatchOptions;
use crate::parser::{LineDecoder, Record, RootSet, parse_line};

pub use listeners::ListenerId;
use listeners::Listeners;

const READ_CHUNK: usize = 8 * 1024;

type ExitReceiver = oneshot::Receiver<std::io::Result<ExitStatus>>;

struct StopState {
    stopped: AtomicBool,
    /// Wakes [`Watcher::run`].
    wake: Notify,
    /// Tells the supervisor task to kill the child.
    kill: Notify,
}

impl StopState {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Returns `true` only for the call that performed the transition.
    fn request_stop(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::SeqCst);
        if first {
            self.kill.notify_one();
            self.wake.notify_one();
        }
        first
    }
}

/// Cloneable handle that stops a [`Watcher`] from a listener or another task.
#[derive(Clone)]
pub struct StopHandle {
    state: Arc<StopState>,
}

impl StopHandle {
    /// Idempotent. Kills the monitor whether or not [`Watcher::run`] is being
    /// polled; listeners are never called again.
    pub fn stop(&self) {
        if self.state.request_stop() {
            debug!("stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }
}

/// A running inotifywait process plus the callbacks fed from its output.
///
/// Created by [`Watcher::spawn`], driven by [`Watcher::run`]. The child is
/// owned by a small supervisor task that kills it on the first stop request,
/// including the implicit one when the watcher is dropped.
pub struct Watcher {
    program: String,
    args: Vec<OsString>,
    roots: RootSet,
    pid: Option<u32>,
    exited: Option<ExitReceiver>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    listeners: Listeners,
    state: Arc<StopState>,
}

impl Watcher {
    /// Resolve the configured paths and launch the monitor.
    ///
    /// Must be called from within a Tokio runtime. The child gets its own
    /// process group, a closed stdin and piped stdout/stderr.
    pub fn spawn(options: WatchOptions) -> Result<Self> {
        let paths = options.resolved_paths()?;
        let args = build_args(&options, &paths);
        debug!(program = %options.program, ?args, "spawning monitor");

        let mut std_command = std::process::Command::new(&options.program);
        std_command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_command.process_group(0);
        }
        let mut command = Command::from(std_command);
        command.kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| WatchError::Spawn {
            program: options.program.clone(),
            source,
        })?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let pid = child.id();

        let state = Arc::new(StopState {
            stopped: AtomicBool::new(false),
            wake: Notify::new(),
            kill: Notify::new(),
        });
        let (exit_tx, exit_rx) = oneshot::channel();
        tokio::spawn(supervise(child, Arc::clone(&state), exit_tx));

        Ok(Self {
            program: options.program,
            args,
            roots: RootSet::new(&paths),
            pid,
            exited: Some(exit_rx),
            stdout,
            stderr,
            listeners: Listeners::default(),
            state,
        })
    }

    /// Register a callback for one event kind. Ignored once stopped.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&WatchEvent) + Send + 'static,
    {
        let id = self.listeners.on_event(kind, Box::new(handler));
        self.forget_if_stopped(id)
    }

    /// Register a callback for anything the monitor writes to stderr.
    pub fn on_error<F>(&mut self, handler: F) -> ListenerId
    where
        F: FnMut(&str) + Send + 'static,
    {
        let id = self.listeners.on_error(Box::new(handler));
        self.forget_if_stopped(id)
    }

    /// Register a callback for event names outside [`EventKind`].
    pub fn on_unknown<F>(&mut self, handler: F) -> ListenerId
    where
        F: FnMut(&UnknownEvent) + Send + 'static,
    {
        let id = self.listeners.on_unknown(Box::new(handler));
        self.forget_if_stopped(id)
    }

    fn forget_if_stopped(&mut self, id: ListenerId) -> ListenerId {
        if self.is_stopped() {
            self.listeners.remove(id);
        }
        id
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Remove every registration; the monitor keeps running.
    pub fn clear_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Detach every listener and kill the monitor. Later calls do nothing.
    pub fn stop(&mut self) {
        if !self.state.request_stop() {
            return;
        }
        debug!("stop requested");
        self.release();
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments the monitor was launched with.
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Absolute watched roots, in configured order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.roots.paths()
    }

    /// OS process id of the monitor while it is running.
    pub fn id(&self) -> Option<u32> {
        if self.is_stopped() { None } else { self.pid }
    }

    /// Pump the monitor's output into the registered callbacks until the
    /// watcher is stopped or the monitor exits.
    ///
    /// Returns `Ok` after a stop. Any exit that was not asked for, code 0
    /// included, is [`WatchError::Exited`]; listeners are dropped first.
    pub async fn run(&mut self) -> Result<()> {
        let state = Arc::clone(&self.state);
        let mut stdout = self.stdout.take();
        let mut stderr = self.stderr.take();
        let mut decoder = LineDecoder::new();
        let mut out_buf = vec![0u8; READ_CHUNK];
        let mut err_buf = vec![0u8; READ_CHUNK];

        loop {
            if state.is_stopped() {
                self.release();
                return Ok(());
            }
            let streams_closed = stdout.is_none() && stderr.is_none();

            tokio::select! {
                _ = state.wake.notified() => {}
                read = read_chunk(&mut stdout, &mut out_buf) => match read {
                    Ok(0) => {
                        let lines = decoder.finish();
                        self.dispatch_lines(lines);
                        stdout = None;
                    }
                    Ok(n) => {
                        let lines = decoder.feed(&out_buf[..n]);
                        self.dispatch_lines(lines);
                    }
                    Err(err) => {
                        warn!(%err, "failed to read monitor stdout");
                        stdout = None;
                    }
                },
                read = read_chunk(&mut stderr, &mut err_buf) => match read {
                    Ok(0) => stderr = None,
                    Ok(n) => {
                        let message = String::from_utf8_lossy(&err_buf[..n]).into_owned();
                        self.dispatch_error(&message);
                    }
                    Err(err) => {
                        warn!(%err, "failed to read monitor stderr");
                        stderr = None;
                    }
                },
                status = wait_exit(&mut self.exited), if streams_closed => {
                    return self.handle_exit(status);
                }
            }
        }
    }

    /// Drop what a stopped watcher no longer needs.
    fn release(&mut self) {
        self.listeners.clear();
        self.stdout = None;
        self.stderr = None;
        self.exited = None;
    }

    fn handle_exit(&mut self, status: std::io::Result<ExitStatus>) -> Result<()> {
        if !self.state.request_stop() {
            // stop() raced with the exit; nothing left to report.
            self.release();
            return Ok(());
        }
        self.release();

        let code = status?.code();
        error!(program = %self.program, ?code, "monitor exited unexpectedly");
        Err(WatchError::Exited {
            program: self.program.clone(),
            code,
        })
    }

    fn dispatch_lines(&mut self, lines: Vec<String>) {
        for line in lines {
            if self.state.is_stopped() {
                return;
            }
            trace!(%line, "monitor output");
            match parse_line(&line) {
                Some(record) => self.dispatch_record(&record),
                None => debug!(%line, "ignoring unrecognised monitor output"),
            }
        }
    }

    fn dispatch_record(&mut self, record: &Record) {
        let state = &self.state;
        let listeners = &mut self.listeners;
        let should_continue = || !state.is_stopped();

        for (root, entry) in self.roots.matches(&record.full_path) {
            for code in &record.codes {
                if state.is_stopped() {
                    return;
                }
                match code {
                    EventCode::Known(kind) => {
                        let event = WatchEvent {
                            kind: *kind,
                            path: root.to_path_buf(),
                            entry: entry.to_string(),
                        };
                        listeners.emit_event(&event, should_continue);
                    }
                    EventCode::Unknown(name) => {
                        let event = UnknownEvent {
                            name: name.clone(),
                            path: root.to_path_buf(),
                            entry: entry.to_string(),
                        };
                        listeners.emit_unknown(&event, should_continue);
                    }
                }
            }
        }
    }

    fn dispatch_error(&mut self, message: &str) {
        let state = &self.state;
        debug!(output = %message, "monitor stderr");
        self.listeners.emit_error(message, || !state.is_stopped());
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.state.request_stop();
    }
}

/// Own the child until it exits or a stop is requested, whichever comes first.
async fn supervise(
    mut child: Child,
    state: Arc<StopState>,
    exited: oneshot::Sender<std::io::Result<ExitStatus>>,
) {
    tokio::select! {
        status = child.wait() => {
            let _ = exited.send(status);
        }
        _ = state.kill.notified() => {
            if let Err(err) = child.kill().await {
                debug!(%err, "monitor already gone");
            }
        }
    }
}

/// Read from a stream that may already be closed; a closed stream never resolves.
async fn read_chunk<R>(stream: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match stream {
        Some(stream) => stream.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Exit status from the supervisor. Never resolves once the child was killed
/// on request, since the stop path reports instead.
async fn wait_exit(exited: &mut Option<ExitReceiver>) -> std::io::Result<ExitStatus> {
    let Some(receiver) = exited.as_mut() else {
        return std::future::pending().await;
    };
    let received = receiver.await;
    *exited = None;
    match received {
        Ok(status) => status,
        Err(_) => std::future::pending().await,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tempfile::TempDir;

    use super::*;

    /// Write an executable shell script standing in for inotifywait. The
    /// script sees the same arguments the real tool would; `$last` is the
    /// final watched path.
    fn fake_monitor(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("fake-inotifywait");
        fs::write(&path, format!("#!/bin/sh\nfor last; do :; done\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Spawn, retrying briefly on ETXTBSY: a concurrently forked test may still
    /// hold the freshly written script open.
    fn spawn(options: WatchOptions) -> Watcher {
        for _ in 0..20 {
            match Watcher::spawn(options.clone()) {
                Err(WatchError::Spawn { source, .. }) if source.raw_os_error() == Some(26) => {
                    std::thread::sleep(Duration::from_millis(20));
                }
                other => return other.unwrap(),
            }
        }
        panic!("fake monitor kept failing with ETXTBSY");
    }

    fn watched_dir(dir: &TempDir) -> PathBuf {
        let watched = dir.path().join("watched");
        fs::create_dir(&watched).unwrap();
        watched
    }

    async fn run_with_timeout(watcher: &mut Watcher) -> Result<()> {
        tokio::time::timeout(Duration::from_secs(10), watcher.run())
            .await
            .expect("watcher did not finish in time")
    }

    #[tokio::test]
    async fn test_events_are_dispatched_with_relative_entries() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(
            &dir,
            r#"printf 'CREATE|%s/new.txt\n' "$last"
printf 'garbage without separator\n'
printf 'MODIFY|/somewhere/else\n'
printf 'CREATE,ISDIR|%s/sub\n' "$last"
printf 'CLOSE_WRITE,CLOSE|%s/new.txt\n' "$last"
exec sleep 30"#,
        );

        let mut watcher = spawn(WatchOptions::new(&watched).program(program.to_string_lossy()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in [
            EventKind::Create,
            EventKind::Modify,
            EventKind::CloseWrite,
            EventKind::Close,
        ] {
            let seen = Arc::clone(&seen);
            let root = watched.clone();
            watcher.on(kind, move |event| {
                assert_eq!(event.path, root);
                seen.lock().unwrap().push(format!("{} {}", event.kind, event.entry));
            });
        }
        let unknown = Arc::clone(&seen);
        watcher.on_unknown(move |event| {
            unknown
                .lock()
                .unwrap()
                .push(format!("? {} {}", event.name, event.entry));
        });
        let stop = watcher.stop_handle();
        watcher.on(EventKind::Close, move |_| stop.stop());

        run_with_timeout(&mut watcher).await.unwrap();

        assert!(watcher.is_stopped());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "CREATE new.txt",
                "CREATE sub",
                "? ISDIR sub",
                "CLOSE_WRITE new.txt",
                "CLOSE new.txt",
            ]
        );
    }

    #[tokio::test]
    async fn test_line_fans_out_to_every_matching_root() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let nested = watched.join("nested");
        fs::create_dir(&nested).unwrap();
        let program = fake_monitor(
            &dir,
            r#"printf 'DELETE|%s/gone\n' "$last"
exec sleep 30"#,
        );

        let options = WatchOptions::with_paths([watched.clone(), nested.clone()])
            .program(program.to_string_lossy());
        let mut watcher = spawn(options);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let stop = watcher.stop_handle();
        watcher.on(EventKind::Delete, move |event| {
            let mut seen = sink.lock().unwrap();
            seen.push((event.path.clone(), event.entry.clone()));
            if seen.len() == 2 {
                stop.stop();
            }
        });

        run_with_timeout(&mut watcher).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (watched.clone(), "nested/gone".to_string()),
                (nested.clone(), "gone".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unexpected_exit_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(
            &dir,
            r#"echo "Couldn't watch $last: No such file or directory" >&2
exit 1"#,
        );

        let mut watcher = spawn(WatchOptions::new(&watched).program(program.to_string_lossy()));
        let errors = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&errors);
        watcher.on_error(move |message| sink.lock().unwrap().push_str(message));

        let err = run_with_timeout(&mut watcher).await.unwrap_err();

        assert!(matches!(err, WatchError::Exited { code: Some(1), .. }));
        assert_eq!(
            err.to_string(),
            format!("{} exited with code 1", program.to_string_lossy())
        );
        assert!(errors.lock().unwrap().contains("No such file or directory"));
        assert!(watcher.is_stopped());
    }

    #[tokio::test]
    async fn test_persistent_clean_exit_is_still_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(&dir, "exit 0");

        let mut watcher = spawn(WatchOptions::new(&watched).program(program.to_string_lossy()));
        let err = run_with_timeout(&mut watcher).await.unwrap_err();
        assert!(matches!(err, WatchError::Exited { code: Some(0), .. }));
    }

    #[tokio::test]
    async fn test_one_shot_clean_exit_is_still_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(
            &dir,
            r#"printf 'ACCESS|%s/read.txt\n' "$last"
exit 0"#,
        );

        let options = WatchOptions::new(&watched)
            .persistent(false)
            .program(program.to_string_lossy());
        let mut watcher = spawn(options);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        watcher.on(EventKind::Access, move |event| {
            sink.lock().unwrap().push(event.entry.clone())
        });

        let err = run_with_timeout(&mut watcher).await.unwrap_err();
        assert!(matches!(err, WatchError::Exited { code: Some(0), .. }));
        assert_eq!(*seen.lock().unwrap(), vec!["read.txt".to_string()]);
        assert!(watcher.listeners.is_empty());
    }

    #[tokio::test]
    async fn test_file_close_write_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.txt");
        fs::write(&file, "").unwrap();
        let program = fake_monitor(
            &dir,
            r#"printf 'CLOSE_WRITE,CLOSE|%s\n' "$last"
exec sleep 30"#,
        );

        let mut watcher = spawn(WatchOptions::new(&file).program(program.to_string_lossy()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        watcher.on(EventKind::CloseWrite, move |event| {
            sink.lock().unwrap().push((event.path.clone(), event.entry.clone()));
        });
        let stop = watcher.stop_handle();
        watcher.on(EventKind::Close, move |_| stop.stop());

        run_with_timeout(&mut watcher).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(file.clone(), String::new())]);
    }

    #[tokio::test]
    async fn test_recursive_create_precedes_modify() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(
            &dir,
            r#"printf 'CREATE|%s/test/recursive.txt\n' "$last"
printf 'MODIFY|%s/test/recursive.txt\n' "$last"
exec sleep 30"#,
        );

        let options = WatchOptions::new(&watched)
            .recursive(true)
            .program(program.to_string_lossy());
        let mut watcher = spawn(options);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let created = Arc::clone(&seen);
        watcher.on(EventKind::Create, move |event| {
            created.lock().unwrap().push(format!("{} {}", event.kind, event.entry));
        });
        let (modified, stop) = (Arc::clone(&seen), watcher.stop_handle());
        watcher.on(EventKind::Modify, move |event| {
            modified.lock().unwrap().push(format!("{} {}", event.kind, event.entry));
            stop.stop();
        });

        run_with_timeout(&mut watcher).await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["CREATE test/recursive.txt", "MODIFY test/recursive.txt"]
        );
    }

    #[tokio::test]
    async fn test_off_removes_a_single_listener() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(
            &dir,
            r#"printf 'DELETE|%s/a\n' "$last"
exec sleep 30"#,
        );

        let mut watcher = spawn(WatchOptions::new(&watched).program(program.to_string_lossy()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let removed = Arc::clone(&seen);
        let id = watcher.on(EventKind::Delete, move |_| removed.lock().unwrap().push("removed"));
        let (kept, stop) = (Arc::clone(&seen), watcher.stop_handle());
        watcher.on(EventKind::Delete, move |_| {
            kept.lock().unwrap().push("kept");
            stop.stop();
        });

        assert!(watcher.off(id));
        assert!(!watcher.off(id));
        run_with_timeout(&mut watcher).await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["kept"]);
    }

    #[tokio::test]
    async fn test_clear_listeners_keeps_monitor_running() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(&dir, "exec sleep 30");

        let mut watcher = spawn(WatchOptions::new(&watched).program(program.to_string_lossy()));
        watcher.on(EventKind::Create, |_| {});
        watcher.on_error(|_| {});
        watcher.clear_listeners();

        assert!(watcher.listeners.is_empty());
        assert!(!watcher.is_stopped());
        assert!(watcher.id().is_some());
        watcher.stop();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(&dir, "exec sleep 30");

        let mut watcher = spawn(WatchOptions::new(&watched).program(program.to_string_lossy()));
        watcher.on(EventKind::Create, |_| {});
        assert!(watcher.id().is_some());

        watcher.stop();
        watcher.stop();
        watcher.stop_handle().stop();

        assert!(watcher.is_stopped());
        assert!(watcher.id().is_none());
        run_with_timeout(&mut watcher).await.unwrap();

        // Registration after stop is a no-op.
        watcher.on(EventKind::Create, |_| {});
        assert!(watcher.listeners.is_empty());
    }

    #[tokio::test]
    async fn test_stop_from_listener_cuts_off_remaining_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(
            &dir,
            r#"printf 'MODIFY|%s/a\nMODIFY|%s/b\n' "$last" "$last"
exec sleep 30"#,
        );

        let mut watcher = spawn(WatchOptions::new(&watched).program(program.to_string_lossy()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (first, stop) = (Arc::clone(&seen), watcher.stop_handle());
        watcher.on(EventKind::Modify, move |event| {
            first.lock().unwrap().push(format!("first {}", event.entry));
            stop.stop();
        });
        let second = Arc::clone(&seen);
        watcher.on(EventKind::Modify, move |event| {
            second.lock().unwrap().push(format!("second {}", event.entry));
        });

        run_with_timeout(&mut watcher).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["first a".to_string()]);
    }

    #[cfg(target_os = "linux")]
    async fn wait_for_exit(pid: u32) -> bool {
        let proc_dir = PathBuf::from(format!("/proc/{pid}"));
        for _ in 0..100 {
            if !proc_dir.exists() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_stop_handle_kills_monitor_before_run() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(&dir, "exec sleep 30");

        let mut watcher = spawn(WatchOptions::new(&watched).program(program.to_string_lossy()));
        let pid = watcher.id().unwrap();
        watcher.stop_handle().stop();

        assert!(watcher.id().is_none());
        assert!(wait_for_exit(pid).await, "monitor {pid} still running");
        run_with_timeout(&mut watcher).await.unwrap();
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_dropping_watcher_kills_monitor() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(&dir, "exec sleep 30");

        let watcher = spawn(WatchOptions::new(&watched).program(program.to_string_lossy()));
        let pid = watcher.id().unwrap();
        drop(watcher);

        assert!(wait_for_exit(pid).await, "monitor {pid} still running");
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let options = WatchOptions::new(".").program("/nonexistent/inotifywait");
        let err = Watcher::spawn(options).err().unwrap();
        assert!(matches!(err, WatchError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_watcher_exposes_launch_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let watched = watched_dir(&dir);
        let program = fake_monitor(&dir, "exec sleep 30");

        let options = WatchOptions::new(&watched)
            .recursive(true)
            .events(EventKind::Create)
            .program(program.to_string_lossy());
        let mut watcher = spawn(options.clone());

        assert_eq!(watcher.program(), program.to_string_lossy());
        assert_eq!(watcher.args(), build_args(&options, &[watched.clone()]).as_slice());
        assert_eq!(watcher.paths().collect::<Vec<_>>(), vec![watched.as_path()]);
        watcher.stop();
    }
}
