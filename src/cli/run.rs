//! Launch command implementation.

use super::parsers::{parse_arch, parse_log_file};
use clap::Args;
use q2boot::config::{Overrides, Q2bootConfig};
use q2boot::{Architecture, ArchitectureDetector, Error, VmConfig};
use std::path::PathBuf;

/// Boot a disk image in QEMU.
#[derive(Args, Debug)]
pub struct RunCmd {
    /// Disk image to boot.
    #[arg(value_name = "DISK", required = true)]
    pub disk: Option<PathBuf>,

    /// Guest architecture (x86_64, aarch64, ppc64le, s390x).
    ///
    /// Detected from the disk image when omitted.
    #[arg(short = 'a', long, value_parser = parse_arch)]
    pub arch: Option<Architecture>,

    /// Number of vCPUs (1-32).
    #[arg(short = 'c', long)]
    pub cpu: Option<u32>,

    /// Memory in GB (1-128).
    #[arg(short = 'r', long)]
    pub ram: Option<u32>,

    /// Host port forwarded to guest SSH (port 22).
    #[arg(short = 'p', long)]
    pub ssh_port: Option<u16>,

    /// Port for the QEMU telnet monitor (0 disables).
    #[arg(short = 'm', long)]
    pub monitor_port: Option<u16>,

    /// Serial console log file. Pass an empty value to disable.
    #[arg(short = 'l', long, value_parser = parse_log_file)]
    pub log_file: Option<PathBuf>,

    /// Use a graphical display.
    #[arg(short = 'g', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub graphical: Option<bool>,

    /// Persist disk writes instead of running in snapshot mode.
    #[arg(short = 'w', long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub write_mode: Option<bool>,

    /// Wait for Enter before starting QEMU.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub confirm: Option<bool>,
}

impl RunCmd {
    /// Overrides given on the command line.
    pub fn overrides(&self) -> Overrides {
        Overrides {
            arch: self.arch,
            cpu: self.cpu,
            ram_gb: self.ram,
            ssh_port: self.ssh_port,
            monitor_port: self.monitor_port,
            log_file: self.log_file.clone(),
            graphical: self.graphical,
            write_mode: self.write_mode,
            confirm: self.confirm,
        }
    }

    /// Execute the launch command.
    pub fn run(self, config: Q2bootConfig) -> q2boot::Result<()> {
        let vm_config = self.resolve(config, &ArchitectureDetector::new())?;
        q2boot::vm::launch(&vm_config)
    }

    /// Merge `config` with the command-line overrides and settle the
    /// architecture, detecting it with `detector` unless `--arch` was given.
    pub fn resolve(
        &self,
        mut config: Q2bootConfig,
        detector: &ArchitectureDetector,
    ) -> q2boot::Result<VmConfig> {
        let disk = self.disk.clone().ok_or(Error::DiskPathEmpty)?;
        let overrides = self.overrides();
        tracing::debug!(?overrides, "applying command-line overrides");
        config.apply(&overrides);

        // Only --arch or detection decide; the config file's arch is ignored.
        let architecture = match overrides.arch {
            Some(arch) => arch,
            None => {
                tracing::info!(disk = %disk.display(), "detecting architecture from disk image");
                detector.detect(&disk)?.architecture
            }
        };

        Ok(config.to_vm_config(architecture, disk))
    }
}
