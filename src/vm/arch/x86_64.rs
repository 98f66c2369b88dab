//! x86_64: KVM-accelerated q35 with the host CPU.

use super::{args, virtio_blk_pci_args, virtio_net_pci_args, ArchVariant};
use crate::vm::config::{Architecture, VmConfig};

/// x86_64 variant.
#[derive(Debug, Clone)]
pub struct X86_64 {
    disk: String,
    cpus: u32,
    ssh_port: u16,
}

impl X86_64 {
    /// Build against a config.
    pub fn new(config: &VmConfig) -> Self {
        Self {
            disk: config.disk_path.display().to_string(),
            cpus: config.cpus,
            ssh_port: config.ssh_port,
        }
    }
}

impl ArchVariant for X86_64 {
    fn architecture(&self) -> Architecture {
        Architecture::X86_64
    }

    fn machine_args(&self) -> Vec<String> {
        args(&["-M", "q35", "-enable-kvm", "-cpu", "host"])
    }

    fn disk_args(&self) -> Vec<String> {
        virtio_blk_pci_args(
            format!(
                "file={},if=none,id=disk0,cache=none,aio=native,discard=unmap",
                self.disk
            ),
            self.cpus,
        )
    }

    fn network_args(&self) -> Vec<String> {
        virtio_net_pci_args(self.ssh_port)
    }

    fn graphical_display_args(&self) -> Vec<String> {
        args(&["-device", "virtio-vga-gl", "-display", "sdl,gl=on"])
    }
}
