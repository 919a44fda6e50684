//! Subscriber setup for programs that embed [`RealIoEffect`](crate::RealIoEffect).
//!
//! Every capability call on `RealIoEffect` opens an `INFO` span named after
//! the capability:
//!
//! | span | fields |
//! |---|---|
//! | `stat`, `read_file` | `path` |
//! | `write_file` | `path`, `bytes` |
//! | `exec` | `command`, `max_buffer` |
//! | `exec_stream` | `command` |
//! | `glob_sync` | `pattern`, `strict` |
//!
//! Inside those spans the crate emits `debug` events when a child is spawned
//! and when it exits (`exit_code`), plus the glob `matches` count. It emits
//! `warn` when buffered output overflows `max_buffer`, when killing the child
//! fails, and for each directory glob skipped as unreadable. It emits `error`
//! when the shell cannot be started. The crate never installs a subscriber
//! on its own.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install a global subscriber that prints effect spans and events to stderr.
///
/// The filter comes from `RUST_LOG`. Without it only `warn` and above are
/// shown, i.e. skipped glob entries, buffer overflows and spawn failures.
/// When capability spans are enabled, each one logs its duration on close.
/// Returns an error instead of panicking when a global subscriber exists.
///
/// ```bash
/// RUST_LOG=io_effect=debug my-tool   # show every spawn, exit code and call time
/// ```
pub fn init() -> Result<(), TryInitError> {
    let filter = effect_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .compact(),
        )
        .try_init()
}

/// Filter built from a `RUST_LOG`-style value; unset or unparsable means `warn`.
fn effect_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}
