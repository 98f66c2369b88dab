//! s390x: CCW-bus virtio machine.
//!
//! Devices hang off the channel subsystem instead of PCI. Mainframe guests
//! have no framebuffer, so "graphical" means an interactive session on the
//! terminal with the monitor turned off.

use super::{args, user_netdev, ArchVariant};
use crate::vm::config::{Architecture, VmConfig};

/// s390x variant.
#[derive(Debug, Clone)]
pub struct S390x {
    disk: String,
    ssh_port: u16,
}

impl S390x {
    /// Build against a config.
    pub fn new(config: &VmConfig) -> Self {
        Self {
            disk: config.disk_path.display().to_string(),
            ssh_port: config.ssh_port,
        }
    }
}

impl ArchVariant for S390x {
    fn architecture(&self) -> Architecture {
        Architecture::S390x
    }

    fn machine_args(&self) -> Vec<String> {
        args(&["-machine", "s390-ccw-virtio", "-cpu", "max"])
    }

    fn disk_args(&self) -> Vec<String> {
        vec![
            "-drive".to_string(),
            format!(
                "file={},id=disk1,if=none,cache=unsafe,discard=unmap",
                self.disk
            ),
            "-device".to_string(),
            "virtio-blk-ccw,drive=disk1,id=dr1,bootindex=1".to_string(),
        ]
    }

    fn network_args(&self) -> Vec<String> {
        vec![
            "-netdev".to_string(),
            user_netdev("net1", self.ssh_port),
            "-device".to_string(),
            "virtio-net-ccw,netdev=net1".to_string(),
        ]
    }

    fn graphical_display_args(&self) -> Vec<String> {
        args(&["-nographic", "-serial", "stdio", "-monitor", "none"])
    }

    fn non_graphical_display_args(&self) -> Vec<String> {
        args(&["-nographic", "-serial", "stdio"])
    }
}
