//! Pre-launch validation.
//!
//! Checks run in a fixed order and stop at the first failure:
//! value ranges, empty disk path, QEMU binary, ports (SSH then monitor),
//! disk existence. Range and empty-path checks need no host access, so a
//! bad config is reported without probing the binary or the ports.

use crate::error::{Error, Result};
use crate::network;
use crate::qemu;
use crate::vm::config::{Architecture, VmConfig};
use std::path::{Path, PathBuf};

/// Host facilities the validator consults.
pub trait HostProbe {
    /// Resolve the architecture's QEMU binary on the search path.
    fn resolve_binary(&self, arch: Architecture) -> Result<PathBuf>;

    /// Check the SSH port and, when non-zero, the monitor port.
    fn check_ports(&self, ssh_port: u16, monitor_port: u16) -> Result<()>;

    /// Whether the disk image exists.
    fn disk_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// The real host: `PATH` lookup and loopback binds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostProbe for SystemHost {
    fn resolve_binary(&self, arch: Architecture) -> Result<PathBuf> {
        qemu::resolve(arch)
    }

    fn check_ports(&self, ssh_port: u16, monitor_port: u16) -> Result<()> {
        network::check_ports_available(ssh_port, monitor_port)
    }
}

/// Runs the pre-launch checks against a [`HostProbe`].
#[derive(Debug, Clone, Default)]
pub struct Validator<H = SystemHost> {
    host: H,
}

impl Validator<SystemHost> {
    /// Validator for the real host.
    pub fn new() -> Self {
        Self { host: SystemHost }
    }
}

impl<H: HostProbe> Validator<H> {
    /// Validator over a custom host probe.
    pub fn with_host(host: H) -> Self {
        Self { host }
    }

    /// Validate `config`, returning the resolved QEMU binary path.
    ///
    /// # Errors
    ///
    /// The first failing check's error; nothing is aggregated.
    pub fn validate(&self, config: &VmConfig) -> Result<PathBuf> {
        config.validate()?;

        if config.disk_path.as_os_str().is_empty() {
            return Err(Error::DiskPathEmpty);
        }

        let binary = self.host.resolve_binary(config.architecture)?;
        self.host
            .check_ports(config.ssh_port, config.monitor_port)?;

        if !self.host.disk_exists(&config.disk_path) {
            return Err(Error::DiskNotFound {
                path: config.disk_path.clone(),
            });
        }

        tracing::debug!(
            arch = %config.architecture,
            binary = %binary.display(),
            disk = %config.disk_path.display(),
            "validation passed"
        );
        Ok(binary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records which probes ran and fails on demand.
    #[derive(Default)]
    struct FakeHost {
        calls: RefCell<Vec<&'static str>>,
        binary_missing: bool,
        port_busy: bool,
        disk_present: bool,
    }

    impl HostProbe for FakeHost {
        fn resolve_binary(&self, arch: Architecture) -> Result<PathBuf> {
            self.calls.borrow_mut().push("binary");
            if self.binary_missing {
                return Err(Error::BinaryNotFound {
                    binary: qemu::binary_for(arch).to_string(),
                    instructions: qemu::install_instructions(arch),
                });
            }
            Ok(PathBuf::from("/usr/bin").join(qemu::binary_for(arch)))
        }

        fn check_ports(&self, ssh_port: u16, _monitor_port: u16) -> Result<()> {
            self.calls.borrow_mut().push("ports");
            if self.port_busy {
                return Err(Error::PortInUse {
                    purpose: "SSH",
                    port: ssh_port,
                    flag: "--ssh-port",
                });
            }
            Ok(())
        }

        fn disk_exists(&self, _path: &Path) -> bool {
            self.calls.borrow_mut().push("disk");
            self.disk_present
        }
    }

    fn config(disk: &str) -> VmConfig {
        VmConfig::new(Architecture::X86_64, disk)
    }

    fn happy_host() -> FakeHost {
        FakeHost {
            disk_present: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_all_checks_pass() {
        let validator = Validator::with_host(happy_host());
        let binary = validator.validate(&config("/images/a.qcow2")).unwrap();

        assert_eq!(binary, PathBuf::from("/usr/bin/qemu-system-x86_64"));
        assert_eq!(*validator.host.calls.borrow(), ["binary", "ports", "disk"]);
    }

    #[test]
    fn test_empty_disk_fails_before_host_checks() {
        let validator = Validator::with_host(happy_host());
        let err = validator.validate(&config("")).unwrap_err();

        assert!(matches!(err, Error::DiskPathEmpty), "got {err:?}");
        assert!(
            validator.host.calls.borrow().is_empty(),
            "no binary or port probe should run"
        );
    }

    #[test]
    fn test_low_ssh_port_is_config_error_without_probing() {
        let validator = Validator::with_host(happy_host());
        let mut cfg = config("/images/a.qcow2");
        cfg.ssh_port = 80;

        let err = validator.validate(&cfg).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)), "got {err:?}");
        assert!(validator.host.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_binary_stops_before_ports() {
        let validator = Validator::with_host(FakeHost {
            binary_missing: true,
            disk_present: true,
            ..Default::default()
        });
        let err = validator.validate(&config("/images/a.qcow2")).unwrap_err();

        assert!(matches!(err, Error::BinaryNotFound { .. }), "got {err:?}");
        assert_eq!(*validator.host.calls.borrow(), ["binary"]);
    }

    #[test]
    fn test_busy_port_stops_before_disk() {
        let validator = Validator::with_host(FakeHost {
            port_busy: true,
            disk_present: true,
            ..Default::default()
        });
        let err = validator.validate(&config("/images/a.qcow2")).unwrap_err();

        assert!(err.to_string().contains("--ssh-port"));
        assert_eq!(*validator.host.calls.borrow(), ["binary", "ports"]);
    }

    #[test]
    fn test_missing_disk_reported_last() {
        let validator = Validator::with_host(FakeHost::default());
        let err = validator.validate(&config("/images/gone.qcow2")).unwrap_err();

        assert!(matches!(err, Error::DiskNotFound { .. }), "got {err:?}");
        assert!(err.to_string().contains("/images/gone.qcow2"));
    }

    #[test]
    fn test_system_host_sees_real_disk() {
        let disk = tempfile::NamedTempFile::new().unwrap();
        assert!(SystemHost.disk_exists(disk.path()));
        assert!(!SystemHost.disk_exists(Path::new("/nonexistent/q2boot/disk.img")));
    }
}
