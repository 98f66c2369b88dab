//! Host port availability.
//!
//! Ports are probed with a transient bind on the loopback address that is
//! released immediately. QEMU binds them later, so another process may grab
//! a port in between; that window is not guarded.

use crate::error::{Error, Result};
use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};

/// Address QEMU's forwarded ports and monitor are probed on.
pub const LOCALHOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Check if a TCP port can be bound on localhost.
pub fn is_port_available(port: u16) -> bool {
    TcpListener::bind(SocketAddrV4::new(LOCALHOST, port)).is_ok()
}

/// Check the SSH port, then the monitor port unless it is disabled (0).
///
/// # Errors
///
/// Returns [`Error::PortInUse`] for the first port that cannot be bound.
pub fn check_ports_available(ssh_port: u16, monitor_port: u16) -> Result<()> {
    if !is_port_available(ssh_port) {
        return Err(Error::PortInUse {
            purpose: "SSH",
            port: ssh_port,
            flag: "--ssh-port",
        });
    }

    if monitor_port > 0 && !is_port_available(monitor_port) {
        return Err(Error::PortInUse {
            purpose: "monitor",
            port: monitor_port,
            flag: "--monitor-port",
        });
    }

    tracing::debug!(ssh_port, monitor_port, "ports available");
    Ok(())
}
