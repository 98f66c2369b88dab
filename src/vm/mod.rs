//! VM command building, validation and launch.
//!
//! This module provides the launch pipeline for a single foreground VM:
//! - [`VmConfig`]: Finalized settings for one launch
//! - [`ArchVariant`]: Per-architecture QEMU argument fragments
//! - [`build_args`]: Ordered QEMU command line
//! - [`Validator`]: Pre-launch checks against the host
//! - [`runner`]: Foreground execution of the QEMU process

pub mod arch;
pub mod builder;
pub mod config;
pub mod runner;
pub mod state;
pub mod validate;

use crate::error::Result;
pub use arch::{ArchVariant, Variant};
pub use builder::build_args;
pub use config::{Architecture, VmConfig};
pub use state::ExitReason;
pub use validate::{HostProbe, SystemHost, Validator};

/// Validate, build and run a VM in the foreground.
///
/// Blocks until QEMU exits.
///
/// # Errors
///
/// Returns the first validation error, a launch failure, or
/// [`Error::QemuExited`](crate::Error::QemuExited) when QEMU exits unsuccessfully.
pub fn launch(config: &VmConfig) -> Result<()> {
    let binary = Validator::new().validate(config)?;

    // The variant owns temporary firmware state; keep it alive until QEMU exits.
    let variant = Variant::for_config(config);
    let args = build_args(config, &variant);

    tracing::info!(
        arch = %config.architecture,
        cpus = config.cpus,
        ram_gb = config.ram_gb,
        ssh_port = config.ssh_port,
        snapshot = !config.write_mode,
        "launching VM"
    );

    let result = runner::run(&binary, &args, config.confirm);
    drop(variant);
    result
}
