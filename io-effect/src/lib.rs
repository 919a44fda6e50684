//! A single seam between program logic and the outside world.
//!
//! Everything that touches disk or spawns processes goes through the
//! [`IoEffect`] capability set:
//!
//! - **[`effect`]**: the trait and the values it exchanges. No I/O.
//! - **[`io`]**: [`RealIoEffect`], the OS-backed implementation.
//! - **`test_support`** (feature `test-support`): an in-memory double and
//!   fixtures, so callers can be tested without the OS.
//!
//! The one capability with real behavior is [`IoEffect::exec_stream`]: it
//! returns a child's stdout and stderr as independent line streams plus a
//! separate exit-code future, all usable while the child is still running.

pub mod config;
pub mod effect;
pub mod error;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{EffectConfig, load_config};
pub use effect::{
    ExecOptions, ExecOutput, ExecStream, ExitFuture, FileKind, FileMetadata, GlobOptions, IoEffect,
    LineStream, Shell,
};
pub use error::{EffectError, OutputStream, Result};
pub use io::RealIoEffect;
