//! VM configuration types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Default number of vCPUs.
pub const DEFAULT_CPUS: u32 = 2;
/// Default memory in GiB.
pub const DEFAULT_RAM_GB: u32 = 2;
/// Default host port forwarded to guest SSH.
pub const DEFAULT_SSH_PORT: u16 = 2222;
/// Monitor port 0 means no TCP monitor.
pub const DEFAULT_MONITOR_PORT: u16 = 0;
/// Default serial console log file.
pub const DEFAULT_LOG_FILE: &str = "q2boot.log";

/// Inclusive vCPU bounds.
pub const MIN_CPUS: u32 = 1;
pub const MAX_CPUS: u32 = 32;
/// Inclusive memory bounds in GiB.
pub const MIN_RAM_GB: u32 = 1;
pub const MAX_RAM_GB: u32 = 128;
/// Lowest non-privileged port accepted for forwarding and the monitor.
pub const MIN_PORT: u16 = 1024;

/// Guest CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    /// 64-bit x86.
    #[serde(rename = "x86_64")]
    X86_64,
    /// 64-bit ARM.
    #[serde(rename = "aarch64")]
    Aarch64,
    /// 64-bit little-endian POWER.
    #[serde(rename = "ppc64le")]
    Ppc64le,
    /// IBM Z.
    #[serde(rename = "s390x")]
    S390x,
}

impl Architecture {
    /// Every supported architecture, in display order.
    pub const ALL: [Architecture; 4] = [
        Architecture::X86_64,
        Architecture::Aarch64,
        Architecture::Ppc64le,
        Architecture::S390x,
    ];

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::X86_64 => "x86_64",
            Architecture::Aarch64 => "aarch64",
            Architecture::Ppc64le => "ppc64le",
            Architecture::S390x => "s390x",
        }
    }

    /// Comma-separated list of supported names, for messages.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| Error::UnsupportedArchitecture {
                name: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

/// Finalized settings for one QEMU launch.
///
/// Built once from defaults, the config file and CLI overrides, then
/// passed by reference to detection, validation, building and running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    /// Target architecture.
    pub architecture: Architecture,

    /// Number of vCPUs (1..=32).
    pub cpus: u32,

    /// Memory in GiB (1..=128).
    pub ram_gb: u32,

    /// Host port forwarded to guest port 22.
    pub ssh_port: u16,

    /// Telnet monitor port; 0 disables it.
    pub monitor_port: u16,

    /// Disk image to boot.
    pub disk_path: PathBuf,

    /// Serial console log file. `None` means no file redirection.
    pub log_file: Option<PathBuf>,

    /// Request a graphical display.
    pub graphical: bool,

    /// Persist disk writes (disables snapshot mode).
    pub write_mode: bool,

    /// Wait for Enter before launching.
    pub confirm: bool,
}

impl VmConfig {
    /// Create a config with default resources for the given disk.
    pub fn new(architecture: Architecture, disk_path: impl Into<PathBuf>) -> Self {
        Self {
            architecture,
            cpus: DEFAULT_CPUS,
            ram_gb: DEFAULT_RAM_GB,
            ssh_port: DEFAULT_SSH_PORT,
            monitor_port: DEFAULT_MONITOR_PORT,
            disk_path: disk_path.into(),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            graphical: false,
            write_mode: false,
            confirm: false,
        }
    }

    /// Whether a TCP monitor was requested.
    pub fn monitor_enabled(&self) -> bool {
        self.monitor_port != 0
    }

    /// Check value ranges. Does not touch the filesystem or network.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_CPUS..=MAX_CPUS).contains(&self.cpus) {
            return Err(Error::invalid_config(format!(
                "CPU count must be between {} and {}, got {}",
                MIN_CPUS, MAX_CPUS, self.cpus
            )));
        }

        if !(MIN_RAM_GB..=MAX_RAM_GB).contains(&self.ram_gb) {
            return Err(Error::invalid_config(format!(
                "RAM must be between {} and {} GB, got {}",
                MIN_RAM_GB, MAX_RAM_GB, self.ram_gb
            )));
        }

        if self.ssh_port < MIN_PORT {
            return Err(Error::invalid_config(format!(
                "SSH port must be between {} and 65535, got {}",
                MIN_PORT, self.ssh_port
            )));
        }

        if self.monitor_enabled() && self.monitor_port < MIN_PORT {
            return Err(Error::invalid_config(format!(
                "monitor port must be 0 (disabled) or between {} and 65535, got {}",
                MIN_PORT, self.monitor_port
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> VmConfig {
        VmConfig::new(Architecture::X86_64, "/tmp/disk.qcow2")
    }

    #[test]
    fn test_defaults() {
        let cfg = config();
        assert_eq!(cfg.cpus, 2);
        assert_eq!(cfg.ram_gb, 2);
        assert_eq!(cfg.ssh_port, 2222);
        assert_eq!(cfg.monitor_port, 0);
        assert!(!cfg.graphical);
        assert!(!cfg.write_mode);
        assert!(!cfg.confirm);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_cpu_boundaries() {
        for (cpus, ok) in [(0, false), (1, true), (32, true), (33, false)] {
            let cfg = VmConfig { cpus, ..config() };
            assert_eq!(cfg.validate().is_ok(), ok, "cpus = {}", cpus);
        }
    }

    #[test]
    fn test_ram_boundaries() {
        for (ram_gb, ok) in [(0, false), (1, true), (128, true), (129, false)] {
            let cfg = VmConfig { ram_gb, ..config() };
            assert_eq!(cfg.validate().is_ok(), ok, "ram_gb = {}", ram_gb);
        }
    }

    #[test]
    fn test_ssh_port_boundaries() {
        for (ssh_port, ok) in [(80, false), (1023, false), (1024, true), (65535, true)] {
            let cfg = VmConfig { ssh_port, ..config() };
            assert_eq!(cfg.validate().is_ok(), ok, "ssh_port = {}", ssh_port);
        }
    }

    #[test]
    fn test_privileged_ssh_port_is_config_error() {
        let cfg = VmConfig {
            ssh_port: 80,
            ..config()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_monitor_port_zero_or_unprivileged() {
        for (monitor_port, ok) in [(0, true), (23, false), (1024, true), (4444, true)] {
            let cfg = VmConfig {
                monitor_port,
                ..config()
            };
            assert_eq!(cfg.validate().is_ok(), ok, "monitor_port = {}", monitor_port);
        }
    }

    #[test]
    fn test_architecture_parse() {
        assert_eq!("x86_64".parse::<Architecture>().unwrap(), Architecture::X86_64);
        assert_eq!("aarch64".parse::<Architecture>().unwrap(), Architecture::Aarch64);
        assert_eq!("ppc64le".parse::<Architecture>().unwrap(), Architecture::Ppc64le);
        assert_eq!("s390x".parse::<Architecture>().unwrap(), Architecture::S390x);

        let err = "riscv64".parse::<Architecture>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("riscv64"));
        assert!(msg.contains("x86_64, aarch64, ppc64le, s390x"));
    }

    #[test]
    fn test_architecture_serde_names() {
        let json = serde_json::to_string(&Architecture::Ppc64le).unwrap();
        assert_eq!(json, "\"ppc64le\"");
        let arch: Architecture = serde_json::from_str("\"s390x\"").unwrap();
        assert_eq!(arch, Architecture::S390x);
    }
}
