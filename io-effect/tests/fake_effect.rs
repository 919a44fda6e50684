//! `FakeIoEffect` honours the same contracts as the real adapter, so logic
//! written against `dyn IoEffect` can be tested without touching the OS.

use std::path::Path;
use std::sync::Arc;

use futures::TryStreamExt;
use io_effect::test_support::{FakeIoEffect, ScriptedCommand, fixture_dir};
use io_effect::{EffectError, ExecOptions, GlobOptions, IoEffect, RealIoEffect, Result};

/// Example caller: copies a file and reports how many lines it had.
async fn copy_counting_lines(effect: &dyn IoEffect, from: &Path, to: &Path) -> Result<usize> {
    let content = effect.read_file(from).await?;
    effect.write_file(to, &content).await?;
    Ok(content.lines().count())
}

#[tokio::test]
async fn same_caller_runs_against_fake_and_real() {
    let fake = FakeIoEffect::new().with_file("in.txt", "one\ntwo\n");
    let count = copy_counting_lines(&fake, Path::new("in.txt"), Path::new("out.txt"))
        .await
        .expect("copy with fake");
    assert_eq!(count, 2);
    assert_eq!(fake.file("out.txt").as_deref(), Some("one\ntwo\n"));

    let dir = fixture_dir(&[("in.txt", "one\ntwo\nthree\n")]).expect("fixture");
    let real: Arc<dyn IoEffect> = Arc::new(RealIoEffect::new());
    let count = copy_counting_lines(
        real.as_ref(),
        &dir.path().join("in.txt"),
        &dir.path().join("out.txt"),
    )
    .await
    .expect("copy with real");
    assert_eq!(count, 3);
}

#[tokio::test]
async fn fake_stat_distinguishes_files_dirs_and_missing() {
    let fake = FakeIoEffect::new()
        .with_file("src/lib.rs", "fn main() {}")
        .with_dir("empty");

    let file = fake.stat(Path::new("src/lib.rs")).await.expect("file");
    assert!(file.is_file());
    assert_eq!(file.len, 12);

    assert!(fake.stat(Path::new("src")).await.expect("dir").is_dir());
    assert!(fake.stat(Path::new("empty")).await.expect("dir").is_dir());

    let err = fake.stat(Path::new("nope")).await.expect_err("missing");
    assert!(err.is_not_found());
}

#[tokio::test]
async fn fake_write_requires_known_parent() {
    let fake = FakeIoEffect::new().with_dir("out");
    fake.write_file(Path::new("out/a.txt"), "a")
        .await
        .expect("parent exists");
    let err = fake
        .write_file(Path::new("missing/a.txt"), "a")
        .await
        .expect_err("missing parent");
    assert!(err.is_not_found());
    assert!(
        fake.read_file(Path::new("missing/a.txt"))
            .await
            .expect_err("not written")
            .is_not_found()
    );
}

#[tokio::test]
async fn fake_exec_returns_scripted_results_in_order() {
    let fake = FakeIoEffect::new()
        .with_command(ScriptedCommand::ok("hello\n"))
        .with_command(ScriptedCommand::failing(2, "boom\n"));

    let output = fake
        .exec("echo hello", &ExecOptions::default())
        .await
        .expect("first");
    assert_eq!(output.stdout, "hello\n");
    assert_eq!(output.stderr, "");

    let err = fake
        .exec("false", &ExecOptions::default())
        .await
        .expect_err("second fails");
    assert!(matches!(
        err,
        EffectError::NonZeroExit { code: Some(2), ref stderr, .. } if stderr == "boom\n"
    ));

    let err = fake
        .exec("extra", &ExecOptions::default())
        .await
        .expect_err("script exhausted");
    assert!(matches!(err, EffectError::Spawn { .. }));

    assert_eq!(fake.executed(), vec!["echo hello", "false", "extra"]);
}

#[tokio::test]
async fn fake_stream_splits_lines_like_the_real_adapter() {
    let fake = FakeIoEffect::new().with_command(ScriptedCommand {
        stdout: "a\nb\npartial".to_string(),
        stderr: "warn\n".to_string(),
        code: Some(5),
    });
    let handle = fake
        .exec_stream("script", &ExecOptions::default())
        .await
        .expect("exec_stream");

    let stderr: Vec<String> = handle.stderr.try_collect().await.expect("stderr");
    let stdout: Vec<String> = handle.stdout.try_collect().await.expect("stdout");
    assert_eq!(stderr, vec!["warn"]);
    assert_eq!(stdout, vec!["a", "b"]);
    assert_eq!(handle.exit.await.expect("exit"), Some(5));
}

#[test]
fn fake_glob_matches_in_memory_paths() {
    let fake = FakeIoEffect::new()
        .with_file("proj/a.txt", "")
        .with_file("proj/b.md", "")
        .with_file("proj/sub/c.txt", "")
        .with_file("other/d.txt", "");

    let options = GlobOptions::in_dir("proj");
    assert_eq!(
        fake.glob_sync("*.txt", &options).expect("glob"),
        vec!["a.txt"]
    );
    assert_eq!(
        fake.glob_sync("**/*.txt", &options).expect("glob"),
        vec!["a.txt", "sub/c.txt"]
    );
    assert!(fake.glob_sync("*.rs", &options).expect("glob").is_empty());

    let files_only = GlobOptions {
        nodir: true,
        ..GlobOptions::in_dir("proj")
    };
    assert_eq!(
        fake.glob_sync("*", &files_only).expect("glob"),
        vec!["a.txt", "b.md"]
    );

    let err = fake.glob_sync("[", &options).expect_err("invalid");
    assert!(matches!(err, EffectError::InvalidPattern { .. }));
}
