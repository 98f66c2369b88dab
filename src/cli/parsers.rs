//! Shared CLI argument parsers.

use q2boot::Architecture;
use std::path::PathBuf;

/// Parse an architecture name (x86_64, aarch64, ppc64le, s390x).
pub fn parse_arch(s: &str) -> Result<Architecture, String> {
    s.parse::<Architecture>().map_err(|e| e.to_string())
}

/// Parse a log file path. An empty value disables file redirection.
pub fn parse_log_file(s: &str) -> Result<PathBuf, String> {
    Ok(PathBuf::from(s.trim()))
}
