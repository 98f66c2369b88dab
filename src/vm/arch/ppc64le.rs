//! ppc64le: `pseries` with a POWER9 CPU.
//!
//! Curses rendering is unreliable here and there is no usable virtio GPU
//! path, so both display modes use the raw serial console. Graphical mode
//! degrades to an interactive terminal session.

use super::{args, virtio_blk_pci_args, virtio_net_pci_args, ArchVariant};
use crate::vm::config::{Architecture, VmConfig};

/// ppc64le variant.
#[derive(Debug, Clone)]
pub struct Ppc64le {
    disk: String,
    cpus: u32,
    ssh_port: u16,
}

impl Ppc64le {
    /// Build against a config.
    pub fn new(config: &VmConfig) -> Self {
        Self {
            disk: config.disk_path.display().to_string(),
            cpus: config.cpus,
            ssh_port: config.ssh_port,
        }
    }
}

impl ArchVariant for Ppc64le {
    fn architecture(&self) -> Architecture {
        Architecture::Ppc64le
    }

    fn machine_args(&self) -> Vec<String> {
        args(&["-M", "pseries", "-cpu", "POWER9"])
    }

    fn disk_args(&self) -> Vec<String> {
        virtio_blk_pci_args(
            format!(
                "file={},if=none,id=disk0,cache=writeback,discard=unmap",
                self.disk
            ),
            self.cpus,
        )
    }

    fn network_args(&self) -> Vec<String> {
        virtio_net_pci_args(self.ssh_port)
    }

    fn graphical_display_args(&self) -> Vec<String> {
        args(&["-nographic", "-serial", "stdio"])
    }

    fn non_graphical_display_args(&self) -> Vec<String> {
        args(&["-nographic", "-serial", "stdio"])
    }
}
