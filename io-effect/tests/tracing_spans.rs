//! Capability spans carry the command line / pattern they were called with.
#![cfg(unix)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use futures::TryStreamExt;
use io_effect::test_support::fixture_dir;
use io_effect::{ExecOptions, GlobOptions, IoEffect, RealIoEffect, Shell};
use tracing::Level;

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn subscriber(writer: CapturedLog) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish()
}

impl CapturedLog {
    /// The first captured line containing `message`.
    fn line_with(&self, message: &str) -> String {
        let bytes = self.0.lock().expect("log buffer").clone();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        text.lines()
            .find(|line| line.contains(message))
            .unwrap_or_else(|| panic!("no log line with {message:?} in:\n{text}"))
            .to_string()
    }
}

#[tokio::test]
async fn exec_span_records_command() {
    let log = CapturedLog::default();
    let _guard = tracing::subscriber::set_default(subscriber(log.clone()));

    RealIoEffect::new()
        .exec("echo buffered-marker", &ExecOptions::default())
        .await
        .expect("exec");

    let line = log.line_with("command finished");
    assert!(line.contains("command=echo buffered-marker"), "{line}");
    assert!(line.contains("max_buffer=1048576"), "{line}");
}

#[tokio::test]
async fn exec_stream_span_records_command() {
    let log = CapturedLog::default();
    let _guard = tracing::subscriber::set_default(subscriber(log.clone()));

    let handle = RealIoEffect::new()
        .exec_stream("echo streamed-marker", &ExecOptions::default())
        .await
        .expect("exec_stream");
    let stdout: Vec<String> = handle.stdout.try_collect().await.expect("stdout");
    assert_eq!(stdout, vec!["streamed-marker"]);
    assert_eq!(handle.exit.await.expect("exit"), Some(0));

    let line = log.line_with("spawning child process");
    assert!(line.contains("command=echo streamed-marker"), "{line}");
    let line = log.line_with("command finished");
    assert!(line.contains("command=echo streamed-marker"), "{line}");
}

#[tokio::test]
async fn spawn_failure_log_names_the_command() {
    let log = CapturedLog::default();
    let _guard = tracing::subscriber::set_default(subscriber(log.clone()));

    let options = ExecOptions {
        shell: Some(Shell {
            program: "/nonexistent/shell".to_string(),
            args: vec!["-c".to_string()],
        }),
        ..ExecOptions::default()
    };
    RealIoEffect::new()
        .exec_stream("echo unstartable-marker", &options)
        .await
        .expect_err("shell cannot start");

    let line = log.line_with("failed to spawn command");
    assert!(line.contains("command=echo unstartable-marker"), "{line}");
}

#[test]
fn glob_span_records_pattern() {
    let log = CapturedLog::default();
    let _guard = tracing::subscriber::set_default(subscriber(log.clone()));
    let dir = fixture_dir(&[("one.marker", ""), ("two.txt", "")]).expect("fixture");

    let matches = RealIoEffect::new()
        .glob_sync("*.marker", &GlobOptions::in_dir(dir.path()))
        .expect("glob");
    assert_eq!(matches, vec!["one.marker"]);

    let line = log.line_with("glob expanded");
    assert!(line.contains("pattern=*.marker"), "{line}");
    assert!(line.contains("strict=false"), "{line}");
}
