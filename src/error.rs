//! Error types for q2boot.

use crate::vm::state::ExitReason;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using q2boot's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in q2boot operations.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    /// A setting is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Architecture string is not one of the supported values.
    #[error("unsupported architecture '{name}'. Supported architectures: {supported}")]
    UnsupportedArchitecture {
        /// The rejected value.
        name: String,
        /// Comma-separated list of supported values.
        supported: String,
    },

    /// Failed to load the configuration file.
    #[error("failed to load config: {0}")]
    ConfigLoad(String),

    /// Failed to save the configuration file.
    #[error("failed to save config: {0}")]
    ConfigSave(String),

    // Detection errors
    /// No detection method could determine the architecture.
    #[error(
        "could not detect architecture from disk image '{}'. Please specify it explicitly with --arch",
        path.display()
    )]
    DetectionFailed {
        /// Disk image that was inspected.
        path: PathBuf,
    },

    // Host environment errors
    /// QEMU binary is not on the search path.
    #[error("QEMU binary '{binary}' not found in PATH. {instructions}")]
    BinaryNotFound {
        /// Binary name that was looked up.
        binary: String,
        /// Distro-specific installation hints.
        instructions: String,
    },

    /// A port required by the VM is already bound.
    #[error("{purpose} port {port} is already in use. Please choose a different port using {flag}")]
    PortInUse {
        /// What the port is for ("SSH", "monitor").
        purpose: &'static str,
        /// The port number.
        port: u16,
        /// CLI flag that selects another port.
        flag: &'static str,
    },

    // Disk errors
    /// Disk image path was not set.
    #[error("disk image path is not set")]
    DiskPathEmpty,

    /// Disk image does not exist.
    #[error("disk image not found at '{}'", path.display())]
    DiskNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    // Process errors
    /// QEMU could not be started at all.
    #[error("failed to start QEMU '{binary}': {source}")]
    LaunchFailed {
        /// Binary that failed to spawn.
        binary: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// QEMU ran and exited unsuccessfully.
    #[error("QEMU {0}")]
    QemuExited(ExitReason),

    /// External helper command failed.
    #[error("command failed: {command}: {message}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// Error message.
        message: String,
    },

    // IO errors
    /// IO error wrapper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid configuration error with a message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a command failed error.
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Process exit code to report for this error.
    ///
    /// A QEMU exit is propagated as-is; every other failure is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::QemuExited(reason) => reason.exit_code(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Error messages should include context that helps users fix the problem.

    #[test]
    fn test_detection_failed_includes_path_and_flag() {
        let err = Error::DetectionFailed {
            path: PathBuf::from("/images/mystery.qcow2"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/images/mystery.qcow2"), "Error should include disk path");
        assert!(msg.contains("--arch"), "Error should tell the user to pass --arch");
    }

    #[test]
    fn test_port_in_use_names_flag() {
        let err = Error::PortInUse {
            purpose: "SSH",
            port: 2222,
            flag: "--ssh-port",
        };
        let msg = err.to_string();
        assert!(msg.contains("2222"));
        assert!(msg.contains("--ssh-port"), "Error should name the flag to change");
    }

    #[test]
    fn test_binary_not_found_includes_instructions() {
        let err = Error::BinaryNotFound {
            binary: "qemu-system-s390x".to_string(),
            instructions: "sudo zypper install qemu-s390x".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("qemu-system-s390x"));
        assert!(msg.contains("zypper"));
    }

    #[test]
    fn test_disk_not_found_includes_path() {
        let err = Error::DiskNotFound {
            path: PathBuf::from("/no/such/disk.img"),
        };
        assert!(err.to_string().contains("/no/such/disk.img"));
    }

    #[test]
    fn test_exit_code_propagates_qemu_status() {
        let err = Error::QemuExited(ExitReason::Exited { code: 3 });
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("status 3"));

        assert_eq!(Error::DiskPathEmpty.exit_code(), 1);
        assert_eq!(Error::invalid_config("cpu").exit_code(), 1);
    }

    #[test]
    fn test_launch_failed_keeps_source() {
        let err = Error::LaunchFailed {
            binary: "qemu-system-x86_64".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("qemu-system-x86_64"));
    }
}
