//! Foreground QEMU execution.

use crate::error::{Error, Result};
use crate::vm::state::ExitReason;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Render a command line for display.
pub fn format_command(binary: &Path, args: &[String]) -> String {
    let mut line = binary.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Run QEMU in the foreground, reading the confirmation from stdin.
pub fn run(binary: &Path, args: &[String], confirm: bool) -> Result<()> {
    let stdin = io::stdin();
    run_with_input(binary, args, confirm, &mut stdin.lock())
}

/// Run QEMU in the foreground with an explicit confirmation source.
///
/// Prints the composed command, optionally waits for one line of `input`,
/// then spawns `binary` with inherited stdio and blocks until it exits.
///
/// # Errors
///
/// - [`Error::LaunchFailed`] if the process cannot be started.
/// - [`Error::QemuExited`] if it exits unsuccessfully.
pub fn run_with_input<R: BufRead>(
    binary: &Path,
    args: &[String],
    confirm: bool,
    input: &mut R,
) -> Result<()> {
    let command_line = format_command(binary, args);
    tracing::info!(command = %command_line, "starting QEMU");
    println!("Starting QEMU with the following command:");
    println!("{command_line}");

    if confirm {
        print!("Press Enter to continue...");
        io::stdout().flush()?;
        let mut line = String::new();
        input.read_line(&mut line)?;
    }

    let status = Command::new(binary)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| Error::LaunchFailed {
            binary: binary.display().to_string(),
            source,
        })?;

    if status.success() {
        tracing::info!("QEMU exited cleanly");
        return Ok(());
    }

    let reason = ExitReason::from_status(status).unwrap_or(ExitReason::Exited { code: 1 });
    tracing::warn!(%reason, "QEMU exited unsuccessfully");
    Err(Error::QemuExited(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sh(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_format_command() {
        let line = format_command(
            Path::new("qemu-system-x86_64"),
            &["-smp".to_string(), "2".to_string()],
        );
        assert_eq!(line, "qemu-system-x86_64 -smp 2");
    }

    #[test]
    fn test_successful_run() {
        let mut input = Cursor::new(Vec::new());
        run_with_input(Path::new("sh"), &sh("exit 0"), false, &mut input).unwrap();
    }

    #[test]
    fn test_nonzero_exit_carries_code() {
        let mut input = Cursor::new(Vec::new());
        let err = run_with_input(Path::new("sh"), &sh("exit 3"), false, &mut input).unwrap_err();

        match err {
            Error::QemuExited(reason) => {
                assert_eq!(reason, ExitReason::Exited { code: 3 });
                assert_eq!(reason.exit_code(), 3);
            }
            other => panic!("expected QemuExited, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_binary_is_launch_failure() {
        let mut input = Cursor::new(Vec::new());
        let err = run_with_input(
            Path::new("/nonexistent/qemu-system-x86_64"),
            &[],
            false,
            &mut input,
        )
        .unwrap_err();

        assert!(matches!(err, Error::LaunchFailed { .. }), "got {err:?}");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_confirm_consumes_one_line() {
        let mut input = Cursor::new(b"\nleftover\n".to_vec());
        run_with_input(Path::new("sh"), &sh("exit 0"), true, &mut input).unwrap();

        let mut rest = String::new();
        input.read_line(&mut rest).unwrap();
        assert_eq!(rest, "leftover\n", "only the first line should be read");
    }

    #[cfg(unix)]
    #[test]
    fn test_signal_death_is_an_error() {
        let mut input = Cursor::new(Vec::new());
        let err = run_with_input(Path::new("sh"), &sh("kill -9 $$"), false, &mut input).unwrap_err();
        assert_eq!(err.exit_code(), 137, "signal should map to 128+signal");

        match err {
            Error::QemuExited(reason) => {
                assert_eq!(reason, ExitReason::Signaled { signal: 9 });
            }
            other => panic!("expected QemuExited, got {other:?}"),
        }
    }
}
