//! Per-architecture QEMU argument fragments.
//!
//! Each architecture supplies the same capability set through
//! [`ArchVariant`]. [`Variant`] is the closed set of implementations,
//! selected by matching on [`Architecture`].

mod aarch64;
mod ppc64le;
mod s390x;
mod x86_64;

pub use aarch64::{Aarch64, UefiFirmware, AAVMF_CODE_PATHS};
pub use ppc64le::Ppc64le;
pub use s390x::S390x;
pub use x86_64::X86_64;

use crate::qemu;
use crate::vm::config::{Architecture, VmConfig};

/// Disables the framebuffer and puts the serial console on the terminal.
pub const NOGRAPHIC: &str = "-nographic";

/// Architecture-specific pieces of a QEMU command line.
pub trait ArchVariant {
    /// Architecture this variant targets.
    fn architecture(&self) -> Architecture;

    /// QEMU binary name.
    fn qemu_binary(&self) -> &'static str {
        qemu::binary_for(self.architecture())
    }

    /// Machine type, CPU model and firmware.
    fn machine_args(&self) -> Vec<String>;

    /// Boot disk.
    fn disk_args(&self) -> Vec<String>;

    /// User-mode NIC forwarding the SSH port.
    fn network_args(&self) -> Vec<String>;

    /// Display for graphical mode. May itself be a terminal fallback.
    fn graphical_display_args(&self) -> Vec<String>;

    /// Display for console mode. Defaults to a curses text console.
    fn non_graphical_display_args(&self) -> Vec<String> {
        args(&["-display", "curses"])
    }
}

/// One concrete architecture variant.
#[derive(Debug)]
pub enum Variant {
    X86_64(X86_64),
    Aarch64(Aarch64),
    Ppc64le(Ppc64le),
    S390x(S390x),
}

impl Variant {
    /// Select the variant for the config's architecture.
    pub fn for_config(config: &VmConfig) -> Self {
        match config.architecture {
            Architecture::X86_64 => Variant::X86_64(X86_64::new(config)),
            Architecture::Aarch64 => Variant::Aarch64(Aarch64::new(config)),
            Architecture::Ppc64le => Variant::Ppc64le(Ppc64le::new(config)),
            Architecture::S390x => Variant::S390x(S390x::new(config)),
        }
    }

    fn inner(&self) -> &dyn ArchVariant {
        match self {
            Variant::X86_64(v) => v,
            Variant::Aarch64(v) => v,
            Variant::Ppc64le(v) => v,
            Variant::S390x(v) => v,
        }
    }
}

impl ArchVariant for Variant {
    fn architecture(&self) -> Architecture {
        self.inner().architecture()
    }

    fn machine_args(&self) -> Vec<String> {
        self.inner().machine_args()
    }

    fn disk_args(&self) -> Vec<String> {
        self.inner().disk_args()
    }

    fn network_args(&self) -> Vec<String> {
        self.inner().network_args()
    }

    fn graphical_display_args(&self) -> Vec<String> {
        self.inner().graphical_display_args()
    }

    fn non_graphical_display_args(&self) -> Vec<String> {
        self.inner().non_graphical_display_args()
    }
}

/// Convert string literals into an owned argument list.
pub(crate) fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// `-netdev user` value forwarding `ssh_port` on the host to guest port 22.
pub(crate) fn user_netdev(id: &str, ssh_port: u16) -> String {
    format!("user,id={id},hostfwd=tcp::{ssh_port}-:22")
}

/// Multi-queue virtio-blk on PCI, shared by the PCI-based variants.
pub(crate) fn virtio_blk_pci_args(drive_opts: String, cpus: u32) -> Vec<String> {
    vec![
        "-drive".to_string(),
        drive_opts,
        "-device".to_string(),
        format!("virtio-blk-pci,drive=disk0,num-queues={cpus}"),
    ]
}

/// Multi-queue virtio-net on PCI, shared by the PCI-based variants.
pub(crate) fn virtio_net_pci_args(ssh_port: u16) -> Vec<String> {
    vec![
        "-netdev".to_string(),
        user_netdev("net0", ssh_port),
        "-device".to_string(),
        "virtio-net-pci,netdev=net0,mq=on".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_selection_matches_architecture() {
        for arch in Architecture::ALL {
            let config = VmConfig::new(arch, "/tmp/disk.img");
            let variant = Variant::for_config(&config);
            assert_eq!(variant.architecture(), arch);
            assert_eq!(variant.qemu_binary(), qemu::binary_for(arch));
        }
    }

    #[test]
    fn test_user_netdev_forwards_ssh() {
        assert_eq!(
            user_netdev("net0", 2222),
            "user,id=net0,hostfwd=tcp::2222-:22"
        );
    }

    #[test]
    fn test_pci_disk_queue_count_follows_cpus() {
        let args = virtio_blk_pci_args("file=/d,if=none,id=disk0".into(), 6);
        assert_eq!(args[3], "virtio-blk-pci,drive=disk0,num-queues=6");
    }
}
