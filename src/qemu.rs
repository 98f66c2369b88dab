//! QEMU binary resolution.
//!
//! Maps each architecture to its `qemu-system-*` binary and checks that the
//! binary can be found on `PATH`, producing distro-specific install hints
//! when it cannot.

use crate::error::{Error, Result};
use crate::vm::Architecture;
use std::path::PathBuf;

/// Binary name for an architecture.
pub fn binary_for(arch: Architecture) -> &'static str {
    match arch {
        Architecture::X86_64 => "qemu-system-x86_64",
        Architecture::Aarch64 => "qemu-system-aarch64",
        Architecture::Ppc64le => "qemu-system-ppc64",
        Architecture::S390x => "qemu-system-s390x",
    }
}

/// Installation instructions for an architecture's QEMU binary.
pub fn install_instructions(arch: Architecture) -> String {
    let (debian_pkg, suse_arch, arch_pkg) = match arch {
        Architecture::X86_64 => ("qemu-system-x86", "x86", "x86"),
        Architecture::Aarch64 => ("qemu-system-arm", "arm", "aarch64"),
        Architecture::Ppc64le => ("qemu-system-ppc", "ppc", "ppc64"),
        Architecture::S390x => ("qemu-system-s390x", "s390x", "s390x"),
    };

    format!(
        "Please install the appropriate QEMU package for your system:\n\
         \x20 - Ubuntu/Debian: sudo apt install {debian_pkg}\n\
         \x20 - RHEL/CentOS/Fedora: sudo dnf install qemu-system or sudo yum install qemu-system\n\
         \x20 - SUSE/openSUSE: sudo zypper install qemu-{suse_arch}\n\
         \x20 - Arch Linux: sudo pacman -S qemu-system-{arch_pkg}\n\
         \x20 - macOS: brew install qemu"
    )
}

/// Look up the architecture's binary on `PATH`.
///
/// # Errors
///
/// Returns [`Error::BinaryNotFound`] carrying install instructions.
pub fn resolve(arch: Architecture) -> Result<PathBuf> {
    let binary = binary_for(arch);
    which::which(binary).map_err(|e| {
        tracing::debug!(binary, error = %e, "qemu binary lookup failed");
        Error::BinaryNotFound {
            binary: binary.to_string(),
            instructions: install_instructions(arch),
        }
    })
}

/// Check whether the architecture's binary is on `PATH`.
pub fn is_available(arch: Architecture) -> bool {
    resolve(arch).is_ok()
}

/// Availability of every supported architecture's binary.
pub fn available_binaries() -> Vec<(Architecture, bool)> {
    Architecture::ALL
        .into_iter()
        .map(|arch| (arch, is_available(arch)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_table() {
        assert_eq!(binary_for(Architecture::X86_64), "qemu-system-x86_64");
        assert_eq!(binary_for(Architecture::Aarch64), "qemu-system-aarch64");
        // ppc64le guests run on the big-endian-named binary
        assert_eq!(binary_for(Architecture::Ppc64le), "qemu-system-ppc64");
        assert_eq!(binary_for(Architecture::S390x), "qemu-system-s390x");
    }

    #[test]
    fn test_install_instructions_cover_distros() {
        for arch in Architecture::ALL {
            let text = install_instructions(arch);
            for distro in ["Ubuntu/Debian", "RHEL", "SUSE", "Arch Linux", "macOS"] {
                assert!(text.contains(distro), "{} hints missing {}", arch, distro);
            }
        }
    }

    #[test]
    fn test_install_instructions_are_arch_specific() {
        let aarch64 = install_instructions(Architecture::Aarch64);
        assert!(aarch64.contains("apt install qemu-system-arm"));
        assert!(aarch64.contains("zypper install qemu-arm"));
        assert!(aarch64.contains("pacman -S qemu-system-aarch64"));

        let ppc = install_instructions(Architecture::Ppc64le);
        assert!(ppc.contains("apt install qemu-system-ppc"));
        assert!(ppc.contains("pacman -S qemu-system-ppc64"));
    }

    #[test]
    fn test_available_binaries_lists_every_arch() {
        let listed: Vec<_> = available_binaries().into_iter().map(|(a, _)| a).collect();
        assert_eq!(listed, Architecture::ALL.to_vec());
    }
}
