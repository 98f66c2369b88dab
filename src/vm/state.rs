//! QEMU process outcome types.

use serde::{Deserialize, Serialize};
use std::process::ExitStatus;

/// Why a QEMU process stopped unsuccessfully.
///
/// A non-zero exit is not necessarily a crash: `quit` on the monitor also
/// ends QEMU with a non-zero status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitReason {
    /// Exited with a non-zero code.
    Exited {
        /// Exit code from the process.
        code: i32,
    },

    /// Killed by signal.
    Signaled {
        /// Signal number.
        signal: i32,
    },
}

impl ExitReason {
    /// Classify a finished process. Returns `None` for a successful exit.
    pub fn from_status(status: ExitStatus) -> Option<Self> {
        if status.success() {
            return None;
        }

        if let Some(code) = status.code() {
            return Some(ExitReason::Exited { code });
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Some(ExitReason::Signaled { signal });
            }
        }

        Some(ExitReason::Exited { code: 1 })
    }

    /// Map to exit code for the CLI (shell convention for signals).
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitReason::Exited { code } => *code,
            ExitReason::Signaled { signal } => 128 + signal,
        }
    }
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Exited { code } => write!(f, "exited with status {}", code),
            ExitReason::Signaled { signal } => write!(f, "was killed by signal {}", signal),
        }
    }
}
