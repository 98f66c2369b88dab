//! Host dependency checks behind `q2boot check`.
//!
//! Each check returns data; printing is left to the CLI.

use crate::vm::arch::{UefiFirmware, AAVMF_CODE_PATHS};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Prefix shared by every QEMU system emulator binary.
pub const QEMU_SYSTEM_PREFIX: &str = "qemu-system-";

const CPUINFO: &str = "/proc/cpuinfo";
const KVM_DEVICE: &str = "/dev/kvm";
const OS_RELEASE: &str = "/etc/os-release";

/// Directories scanned for UEFI firmware after the known code images.
/// The second element restricts matches to a filename suffix.
const FIRMWARE_DIRS: &[(&str, Option<&str>)] = &[
    ("/usr/share/qemu-efi-aarch64", None),
    ("/usr/share/qemu", Some(".bin")),
];

/// Result of the KVM check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvmStatus {
    /// Not a Linux host.
    NotApplicable,
    /// `/proc/cpuinfo` could not be read.
    CpuInfoUnreadable(String),
    /// Neither `vmx` nor `svm` is advertised.
    NoCpuSupport,
    /// `/dev/kvm` does not exist.
    ModuleNotLoaded,
    /// `/dev/kvm` exists but cannot be opened read-write.
    NoAccess,
    /// KVM is usable.
    Ready,
}

impl KvmStatus {
    /// Whether this status blocks accelerated guests.
    pub fn is_ok(&self) -> bool {
        matches!(self, KvmStatus::NotApplicable | KvmStatus::Ready)
    }
}

/// Everything `q2boot check` reports.
#[derive(Debug, Clone)]
pub struct PreflightReport {
    /// KVM availability.
    pub kvm: KvmStatus,
    /// Architecture suffixes of `qemu-system-*` binaries on `PATH`.
    pub qemu_arches: Vec<String>,
    /// First UEFI firmware file found.
    pub firmware: Option<PathBuf>,
    /// Whether `virt-cat` is installed.
    pub virt_cat: bool,
}

impl PreflightReport {
    /// Run every check against the current host.
    pub fn collect() -> Self {
        Self {
            kvm: check_kvm(),
            qemu_arches: qemu_arches_on_path(),
            firmware: find_firmware(),
            virt_cat: virt_cat_available(),
        }
    }

    /// Whether install hints are worth printing.
    pub fn needs_hints(&self) -> bool {
        !(self.kvm.is_ok() && !self.qemu_arches.is_empty() && self.virt_cat)
    }
}

/// Check KVM on this host.
pub fn check_kvm() -> KvmStatus {
    if !cfg!(target_os = "linux") {
        return KvmStatus::NotApplicable;
    }
    check_kvm_at(Path::new(CPUINFO), Path::new(KVM_DEVICE))
}

/// Check KVM using the given cpuinfo file and device node.
pub fn check_kvm_at(cpuinfo: &Path, device: &Path) -> KvmStatus {
    let info = match std::fs::read_to_string(cpuinfo) {
        Ok(info) => info,
        Err(e) => return KvmStatus::CpuInfoUnreadable(e.to_string()),
    };
    if !cpu_supports_virtualization(&info) {
        return KvmStatus::NoCpuSupport;
    }
    if !device.exists() {
        return KvmStatus::ModuleNotLoaded;
    }
    match OpenOptions::new().read(true).write(true).open(device) {
        Ok(_) => KvmStatus::Ready,
        Err(e) => {
            tracing::debug!(device = %device.display(), error = %e, "cannot open kvm device");
            KvmStatus::NoAccess
        }
    }
}

/// Whether cpuinfo advertises Intel VT-x or AMD-V.
pub fn cpu_supports_virtualization(cpuinfo: &str) -> bool {
    cpuinfo
        .lines()
        .filter(|line| line.starts_with("flags"))
        .flat_map(str::split_whitespace)
        .any(|flag| flag == "vmx" || flag == "svm")
}

/// Architecture suffixes of executable `qemu-system-*` binaries on `PATH`.
pub fn qemu_arches_on_path() -> Vec<String> {
    match std::env::var_os("PATH") {
        Some(path) => qemu_arches_in(std::env::split_paths(&path)),
        None => Vec::new(),
    }
}

/// Architecture suffixes of executable `qemu-system-*` binaries in `dirs`.
///
/// Sorted and deduplicated.
pub fn qemu_arches_in(dirs: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    let mut arches: Vec<String> = dirs
        .into_iter()
        .filter_map(|dir| std::fs::read_dir(dir).ok())
        .flat_map(|entries| entries.filter_map(|e| e.ok()))
        .filter(|entry| which::which(entry.path()).is_ok())
        .filter_map(|entry| {
            entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_prefix(QEMU_SYSTEM_PREFIX))
                .filter(|arch| !arch.is_empty())
                .map(str::to_string)
        })
        .collect();
    arches.sort();
    arches.dedup();
    arches
}

/// First UEFI firmware file in the common locations.
pub fn find_firmware() -> Option<PathBuf> {
    UefiFirmware::locate(AAVMF_CODE_PATHS).or_else(|| {
        FIRMWARE_DIRS
            .iter()
            .find_map(|(dir, suffix)| first_file_in(Path::new(dir), *suffix))
    })
}

/// First regular file in `dir` (by name), optionally with a suffix.
pub fn first_file_in(dir: &Path, suffix: Option<&str>) -> Option<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| match suffix {
            Some(s) => p.to_string_lossy().ends_with(s),
            None => true,
        })
        .collect();
    files.sort();
    files.into_iter().next()
}

/// Whether `virt-cat` is on `PATH`.
pub fn virt_cat_available() -> bool {
    which::which("virt-cat").is_ok()
}

/// Linux distribution ID from `/etc/os-release`, or `"unknown"`.
pub fn linux_distro() -> String {
    std::fs::read_to_string(OS_RELEASE)
        .ok()
        .and_then(|contents| parse_os_release_id(&contents))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Extract `ID=` from os-release contents.
pub fn parse_os_release_id(contents: &str) -> Option<String> {
    contents
        .lines()
        .find_map(|line| line.strip_prefix("ID="))
        .map(|id| id.trim().trim_matches('"').to_string())
        .filter(|id| !id.is_empty())
}

/// Install hints for a host. `os` follows `std::env::consts::OS`.
pub fn install_hints(os: &str, distro: &str, virt_cat_ok: bool) -> Vec<String> {
    let mut hints = Vec::new();
    match os {
        "linux" => {
            hints.push(format!("Detected OS: Linux ({distro})"));
            let suse = distro.starts_with("opensuse") || distro.starts_with("sles");
            match distro {
                "ubuntu" | "debian" => {
                    hints.push("To install QEMU: 'sudo apt update && sudo apt install qemu-system qemu-utils'".into());
                    hints.push("To install UEFI firmware: 'sudo apt install qemu-efi-aarch64'".into());
                }
                "fedora" | "centos" | "rhel" => {
                    hints.push("To install QEMU: 'sudo dnf install qemu-system-x86 qemu-system-aarch64'".into());
                    if !virt_cat_ok {
                        hints.push("To install virt-cat: 'sudo dnf install libguestfs-tools'".into());
                    }
                    hints.push("To install UEFI firmware: 'sudo dnf install edk2-aarch64'".into());
                }
                "arch" => {
                    hints.push("To install QEMU and firmware: 'sudo pacman -S qemu-full'".into());
                }
                _ if suse => {
                    hints.push("To install QEMU and firmware: 'sudo zypper install qemu-system-x86 qemu-system-aarch64 qemu-uefi-aarch64'".into());
                }
                _ => {
                    hints.push("Please use your distribution's package manager to install 'qemu' and related firmware packages.".into());
                }
            }
            if !virt_cat_ok && (distro == "ubuntu" || distro == "debian" || suse) {
                hints.push("To install virt-cat: 'sudo <package_manager> install guestfs-tools'".into());
            }
        }
        "macos" => {
            hints.push("Detected OS: macOS".into());
            hints.push("To install QEMU: 'brew install qemu'".into());
        }
        "windows" => {
            hints.push("Detected OS: Windows".into());
            hints.push("Download and run the QEMU installer from https://www.qemu.org/download/#windows".into());
        }
        other => {
            hints.push(format!("OS '{other}' is not fully supported for automatic hints."));
        }
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_cpu_flags() {
        let intel = "processor\t: 0\nflags\t\t: fpu vme de pse vmx ssse3\n";
        let amd = "flags\t\t: fpu svm sse4a\n";
        let none = "flags\t\t: fpu vme de pse\nmodel name\t: vmxnet adapter\n";

        assert!(cpu_supports_virtualization(intel));
        assert!(cpu_supports_virtualization(amd));
        assert!(!cpu_supports_virtualization(none), "only whole flags should count");
    }

    #[test]
    fn test_kvm_status_progression() {
        let dir = tempfile::tempdir().unwrap();
        let cpuinfo = dir.path().join("cpuinfo");
        let device = dir.path().join("kvm");

        assert!(matches!(
            check_kvm_at(&cpuinfo, &device),
            KvmStatus::CpuInfoUnreadable(_)
        ));

        fs::write(&cpuinfo, "flags\t: fpu\n").unwrap();
        assert_eq!(check_kvm_at(&cpuinfo, &device), KvmStatus::NoCpuSupport);

        fs::write(&cpuinfo, "flags\t: fpu vmx\n").unwrap();
        assert_eq!(check_kvm_at(&cpuinfo, &device), KvmStatus::ModuleNotLoaded);

        fs::write(&device, b"").unwrap();
        assert_eq!(check_kvm_at(&cpuinfo, &device), KvmStatus::Ready);
    }

    #[test]
    fn test_kvm_status_is_ok() {
        assert!(KvmStatus::Ready.is_ok());
        assert!(KvmStatus::NotApplicable.is_ok());
        assert!(!KvmStatus::NoAccess.is_ok());
        assert!(!KvmStatus::ModuleNotLoaded.is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_qemu_arches_in_dirs() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        for (name, mode) in [
            ("qemu-system-x86_64", 0o755),
            ("qemu-system-aarch64", 0o755),
            ("qemu-system-s390x", 0o644),
            ("qemu-img", 0o755),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, b"#!/bin/sh\n").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        }

        let arches = qemu_arches_in([dir.path().to_path_buf(), PathBuf::from("/nonexistent")]);
        assert_eq!(arches, ["aarch64", "x86_64"], "non-executables are skipped");
    }

    #[test]
    fn test_first_file_in_with_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vgabios.rom"), b"").unwrap();
        fs::write(dir.path().join("b-efi.bin"), b"").unwrap();
        fs::write(dir.path().join("a-efi.bin"), b"").unwrap();

        assert_eq!(
            first_file_in(dir.path(), Some(".bin")),
            Some(dir.path().join("a-efi.bin"))
        );
        assert_eq!(first_file_in(dir.path(), Some(".fd")), None);
        assert_eq!(first_file_in(Path::new("/nonexistent"), None), None);
    }

    #[test]
    fn test_parse_os_release_id() {
        let contents = "NAME=\"openSUSE Tumbleweed\"\nID=\"opensuse-tumbleweed\"\nID_LIKE=\"opensuse suse\"\n";
        assert_eq!(
            parse_os_release_id(contents).as_deref(),
            Some("opensuse-tumbleweed")
        );
        assert_eq!(parse_os_release_id("ID=fedora\n").as_deref(), Some("fedora"));
        assert_eq!(parse_os_release_id("NAME=Foo\n"), None);
    }

    #[test]
    fn test_install_hints_per_distro() {
        let debian = install_hints("linux", "debian", false);
        assert!(debian.iter().any(|h| h.contains("apt install qemu-system")));
        assert!(debian.iter().any(|h| h.contains("guestfs-tools")));

        let fedora = install_hints("linux", "fedora", false);
        assert!(fedora.iter().any(|h| h.contains("libguestfs-tools")));

        let suse = install_hints("linux", "opensuse-leap", true);
        assert!(suse.iter().any(|h| h.contains("zypper")));
        assert!(!suse.iter().any(|h| h.contains("guestfs-tools")));

        let mac = install_hints("macos", "unknown", true);
        assert!(mac.iter().any(|h| h.contains("brew install qemu")));
    }

    #[test]
    fn test_hints_needed_only_when_something_missing() {
        let mut report = PreflightReport {
            kvm: KvmStatus::Ready,
            qemu_arches: vec!["x86_64".into()],
            firmware: None,
            virt_cat: true,
        };
        assert!(!report.needs_hints());

        report.virt_cat = false;
        assert!(report.needs_hints());
    }
}
