//! aarch64: generic `virt` machine booting through UEFI firmware.
//!
//! QEMU needs two pflash devices: the firmware code image (read-only) and a
//! writable variable store of exactly the same size. The store is a zeroed
//! temporary file that lives as long as the variant.

use super::{args, virtio_blk_pci_args, virtio_net_pci_args, ArchVariant};
use crate::error::Result;
use crate::vm::config::{Architecture, VmConfig};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Known AAVMF code image locations, checked in order.
pub const AAVMF_CODE_PATHS: &[&str] = &[
    // SUSE
    "/usr/share/qemu/aavmf-aarch64-code.bin",
    // Debian/Ubuntu
    "/usr/share/AAVMF/AAVMF_CODE.fd",
    // Fedora/RHEL
    "/usr/share/edk2/aarch64/QEMU_EFI-pflash.raw",
];

/// UEFI code image plus its temporary variable store.
#[derive(Debug)]
pub struct UefiFirmware {
    code: PathBuf,
    vars: TempPath,
}

impl UefiFirmware {
    /// First existing path among `candidates`.
    pub fn locate<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
        candidates
            .iter()
            .map(AsRef::<Path>::as_ref)
            .find(|p| p.is_file())
            .map(Path::to_path_buf)
    }

    /// Create a zeroed variable store sized like `code`.
    pub fn prepare(code: impl Into<PathBuf>) -> Result<Self> {
        let code = code.into();
        let size = std::fs::metadata(&code)?.len();

        let vars = tempfile::Builder::new()
            .prefix("q2boot-aavmf-vars-")
            .suffix(".fd")
            .tempfile()?;
        vars.as_file().set_len(size)?;

        tracing::debug!(code = %code.display(), vars = %vars.path().display(), size, "prepared uefi vars");

        Ok(Self {
            code,
            vars: vars.into_temp_path(),
        })
    }

    /// Firmware code image.
    pub fn code_path(&self) -> &Path {
        &self.code
    }

    /// Writable variable store.
    pub fn vars_path(&self) -> &Path {
        &self.vars
    }

    fn pflash_args(&self) -> Vec<String> {
        vec![
            "-drive".to_string(),
            format!(
                "if=pflash,format=raw,readonly=on,file={}",
                self.code.display()
            ),
            "-drive".to_string(),
            format!("if=pflash,format=raw,file={}", self.vars.display()),
        ]
    }
}

/// aarch64 variant.
#[derive(Debug)]
pub struct Aarch64 {
    disk: String,
    cpus: u32,
    ssh_port: u16,
    has_log_file: bool,
    firmware: Option<UefiFirmware>,
}

impl Aarch64 {
    /// Build against a config, looking for firmware in the default locations.
    pub fn new(config: &VmConfig) -> Self {
        let firmware = match UefiFirmware::locate(AAVMF_CODE_PATHS) {
            Some(code) => match UefiFirmware::prepare(&code) {
                Ok(fw) => Some(fw),
                Err(e) => {
                    tracing::warn!(code = %code.display(), error = %e, "cannot prepare uefi vars, booting without pflash");
                    None
                }
            },
            None => {
                tracing::warn!("no AAVMF firmware found, booting without pflash");
                None
            }
        };
        Self::with_firmware(config, firmware)
    }

    /// Build against a config with explicit firmware (or none).
    pub fn with_firmware(config: &VmConfig, firmware: Option<UefiFirmware>) -> Self {
        Self {
            disk: config.disk_path.display().to_string(),
            cpus: config.cpus,
            ssh_port: config.ssh_port,
            has_log_file: config.log_file.is_some(),
            firmware,
        }
    }

    /// Firmware in use, if any was found.
    pub fn firmware(&self) -> Option<&UefiFirmware> {
        self.firmware.as_ref()
    }
}

impl ArchVariant for Aarch64 {
    fn architecture(&self) -> Architecture {
        Architecture::Aarch64
    }

    fn machine_args(&self) -> Vec<String> {
        let mut out = args(&["-M", "virt", "-cpu", "max"]);
        if let Some(fw) = &self.firmware {
            out.extend(fw.pflash_args());
        }
        out
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
        args(&["-device", "virtio-vga-gl", "-display", "gtk,gl=on"])
    }

    fn non_graphical_display_args(&self) -> Vec<String> {
        if self.has_log_file {
            args(&["-nographic"])
        } else {
            args(&["-nographic", "-serial", "mon:stdio"])
        }
    }
}
