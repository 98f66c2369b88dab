//! Persistent q2boot configuration.
//!
//! Settings are merged in three layers, highest priority last: built-in
//! defaults, the JSON config file, explicit command-line overrides.

use crate::error::{Error, Result};
use crate::vm::config::{
    Architecture, VmConfig, DEFAULT_CPUS, DEFAULT_LOG_FILE, DEFAULT_MONITOR_PORT,
    DEFAULT_RAM_GB, DEFAULT_SSH_PORT,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name for config file storage.
const APP_NAME: &str = "q2boot";

/// Config file name inside the application directory.
const CONFIG_FILE_NAME: &str = "config.json";

/// On-disk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Q2bootConfig {
    /// Preferred architecture. Kept for compatibility; launches take the
    /// architecture from `--arch` or detection.
    pub arch: String,

    /// Number of vCPUs.
    pub cpu: u32,

    /// Memory in GiB.
    pub ram_gb: u32,

    /// Host port forwarded to guest SSH.
    pub ssh_port: u16,

    /// Telnet monitor port (0 disables).
    pub monitor_port: u16,

    /// Serial console log file. Empty disables file redirection.
    pub log_file: String,

    /// Persist disk writes.
    pub write_mode: bool,

    /// Request a graphical display.
    pub graphical: bool,

    /// Wait for Enter before launching.
    pub confirm: bool,

    /// Last disk image, if stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_path: Option<PathBuf>,
}

impl Default for Q2bootConfig {
    fn default() -> Self {
        Self {
            arch: String::new(),
            cpu: DEFAULT_CPUS,
            ram_gb: DEFAULT_RAM_GB,
            ssh_port: DEFAULT_SSH_PORT,
            monitor_port: DEFAULT_MONITOR_PORT,
            log_file: DEFAULT_LOG_FILE.to_string(),
            write_mode: false,
            graphical: false,
            confirm: false,
            disk_path: None,
        }
    }
}

impl Q2bootConfig {
    /// Default config file location: `<config dir>/q2boot/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
            .ok_or_else(|| Error::ConfigLoad("could not determine config directory".to_string()))
    }

    /// Load configuration from `path`, creating a default file if missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigLoad`] if the file cannot be read or parsed,
    /// and [`Error::ConfigSave`] if the default file cannot be written.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file found, creating default");
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }
        Self::load(path)
    }

    /// Load configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&data)
            .map_err(|e| Error::ConfigLoad(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to `path`, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            create_config_dir(dir)
                .map_err(|e| Error::ConfigSave(format!("{}: {}", dir.display(), e)))?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigSave(e.to_string()))?;
        std::fs::write(path, data)
            .map_err(|e| Error::ConfigSave(format!("{}: {}", path.display(), e)))
    }

    /// Apply command-line overrides. Only values that were set win.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(cpu) = overrides.cpu {
            self.cpu = cpu;
        }
        if let Some(ram_gb) = overrides.ram_gb {
            self.ram_gb = ram_gb;
        }
        if let Some(ssh_port) = overrides.ssh_port {
            self.ssh_port = ssh_port;
        }
        if let Some(monitor_port) = overrides.monitor_port {
            self.monitor_port = monitor_port;
        }
        if let Some(log_file) = &overrides.log_file {
            self.log_file = log_file.display().to_string();
        }
        if let Some(graphical) = overrides.graphical {
            self.graphical = graphical;
        }
        if let Some(write_mode) = overrides.write_mode {
            self.write_mode = write_mode;
        }
        if let Some(confirm) = overrides.confirm {
            self.confirm = confirm;
        }
    }

    /// Finalize into a launch config for `architecture` and `disk_path`.
    pub fn to_vm_config(&self, architecture: Architecture, disk_path: impl Into<PathBuf>) -> VmConfig {
        VmConfig {
            architecture,
            cpus: self.cpu,
            ram_gb: self.ram_gb,
            ssh_port: self.ssh_port,
            monitor_port: self.monitor_port,
            disk_path: disk_path.into(),
            log_file: (!self.log_file.is_empty()).then(|| PathBuf::from(&self.log_file)),
            graphical: self.graphical,
            write_mode: self.write_mode,
            confirm: self.confirm,
        }
    }
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Explicit architecture; skips detection.
    pub arch: Option<Architecture>,
    /// vCPU count.
    pub cpu: Option<u32>,
    /// Memory in GiB.
    pub ram_gb: Option<u32>,
    /// SSH forward port.
    pub ssh_port: Option<u16>,
    /// Monitor port.
    pub monitor_port: Option<u16>,
    /// Serial log file.
    pub log_file: Option<PathBuf>,
    /// Graphical mode.
    pub graphical: Option<bool>,
    /// Write mode.
    pub write_mode: Option<bool>,
    /// Confirm before launch.
    pub confirm: Option<bool>,
}

fn create_config_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}
