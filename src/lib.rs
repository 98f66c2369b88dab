//! q2boot - a handy QEMU VM launcher.
//!
//! Turns a disk image and a few settings into a validated QEMU command line
//! for one of four guest architectures, then runs it in the foreground.
//!
//! The pipeline is:
//! [`detect`] the architecture (unless given), finalize a [`VmConfig`],
//! [`Validator`](vm::Validator) checks the host, an
//! [`ArchVariant`](vm::ArchVariant) supplies per-architecture arguments,
//! [`build_args`](vm::build_args) assembles them and
//! [`vm::runner`] executes QEMU.

pub mod config;
pub mod detect;
pub mod error;
pub mod network;
pub mod preflight;
pub mod qemu;
pub mod vm;

pub use config::{Overrides, Q2bootConfig};
pub use detect::{ArchitectureDetector, DetectionMethod, DetectionResult};
pub use error::{Error, Result};
pub use vm::{Architecture, VmConfig};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
