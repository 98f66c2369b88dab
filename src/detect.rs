//! Guest architecture detection.
//!
//! Detection is layered and the first method to succeed wins:
//!
//! 1. Guest inspection: extract `/bin/sh` from the image with `virt-cat`
//!    and classify it, preferring `file`'s report and falling back to the
//!    ELF header when `file` is not installed.
//! 2. Filename heuristic: an architecture name right after `-`, `_` or `@`.
//!
//! Guest inspection being unavailable is not an error; detection only fails
//! when neither method produces an answer.

use crate::error::{Error, Result};
use crate::vm::config::Architecture;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Guest file extracted for inspection.
pub const GUEST_PROBE_FILE: &str = "/bin/sh";

/// Separators that may precede an architecture name in a filename.
const FILENAME_SEPARATORS: [char; 3] = ['@', '-', '_'];

/// How an architecture was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    /// A guest binary was extracted and classified.
    GuestInspection,
    /// The disk image filename named the architecture.
    Filename,
}

impl std::fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMethod::GuestInspection => write!(f, "guest inspection"),
            DetectionMethod::Filename => write!(f, "filename"),
        }
    }
}

/// Detected architecture and the method that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionResult {
    /// Detected architecture.
    pub architecture: Architecture,
    /// Method that succeeded.
    pub method: DetectionMethod,
}

/// Inspects a disk image without booting it.
pub trait GuestInspector: std::fmt::Debug {
    /// Determine the guest architecture from the image contents.
    fn inspect(&self, disk: &Path) -> Result<Architecture>;
}

/// Guest inspection through libguestfs `virt-cat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtCat {
    /// `virt-cat` program, looked up on `PATH` unless it is a path.
    pub virt_cat: PathBuf,
    /// `file` program used to classify the extracted binary. `None` reads
    /// the ELF header directly.
    pub file: Option<PathBuf>,
}

impl Default for VirtCat {
    fn default() -> Self {
        Self {
            virt_cat: PathBuf::from("virt-cat"),
            file: Some(PathBuf::from("file")),
        }
    }
}

impl VirtCat {
    fn extract(&self, disk: &Path) -> Result<Vec<u8>> {
        let output = Command::new(&self.virt_cat)
            .arg(disk)
            .arg(GUEST_PROBE_FILE)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::command_failed("virt-cat", e.to_string()))?;

        if !output.status.success() {
            return Err(Error::command_failed(
                "virt-cat",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(output.stdout)
    }

    fn file_report(file: &Path, bytes: &[u8]) -> Result<String> {
        let mut child = Command::new(file)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::command_failed("file -", e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            // `file` may stop reading once it has seen the header.
            if let Err(e) = stdin.write_all(bytes) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::command_failed(
                "file -",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        report.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(report)
    }

    /// `file` program if configured and installed.
    fn file_program(&self) -> Option<PathBuf> {
        self.file.as_ref().and_then(|file| which::which(file).ok())
    }
}

impl GuestInspector for VirtCat {
    fn inspect(&self, disk: &Path) -> Result<Architecture> {
        which::which(&self.virt_cat).map_err(|_| {
            Error::command_failed(
                "virt-cat",
                "not found; please install guestfs-tools (package name may be 'guestfs-tools' or 'libguestfs-tools')",
            )
        })?;

        eprintln!("Detecting architecture using virt-cat (this may take a while)...");
        let bytes = self.extract(disk)?;

        if let Some(file) = self.file_program() {
            let report = Self::file_report(&file, &bytes)?;
            tracing::debug!(report = %report.trim(), "file report");
            return classify_file_report(&report).ok_or_else(|| {
                Error::command_failed(
                    "file -",
                    format!("no clear ELF architecture in: {}", report.trim()),
                )
            });
        }

        tracing::debug!("file not installed, reading ELF header directly");
        classify_elf_header(&bytes).ok_or_else(|| {
            Error::command_failed("virt-cat", "extracted file is not a recognised ELF binary")
        })
    }
}

/// Layered architecture detector.
#[derive(Debug)]
pub struct ArchitectureDetector {
    inspector: Option<Box<dyn GuestInspector>>,
}

impl Default for ArchitectureDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchitectureDetector {
    /// Detector using `virt-cat` for guest inspection.
    pub fn new() -> Self {
        Self::with_inspector(VirtCat::default())
    }

    /// Detector with a custom guest inspector.
    pub fn with_inspector(inspector: impl GuestInspector + 'static) -> Self {
        Self {
            inspector: Some(Box::new(inspector)),
        }
    }

    /// Detector that only looks at the filename.
    pub fn without_guest_inspection() -> Self {
        Self { inspector: None }
    }

    /// Detect the architecture of `disk`.
    ///
    /// # Errors
    ///
    /// - [`Error::DiskPathEmpty`] for an empty path.
    /// - [`Error::DetectionFailed`] when no method succeeds.
    pub fn detect(&self, disk: &Path) -> Result<DetectionResult> {
        if disk.as_os_str().is_empty() {
            return Err(Error::DiskPathEmpty);
        }

        if let Some(inspector) = &self.inspector {
            match inspector.inspect(disk) {
                Ok(architecture) => {
                    return Ok(detected(disk, architecture, DetectionMethod::GuestInspection))
                }
                Err(e) => {
                    tracing::debug!(disk = %disk.display(), error = %e, "guest inspection failed");
                }
            }
        }

        if let Some(architecture) = detect_from_filename(disk) {
            return Ok(detected(disk, architecture, DetectionMethod::Filename));
        }

        Err(Error::DetectionFailed {
            path: disk.to_path_buf(),
        })
    }
}

fn detected(disk: &Path, architecture: Architecture, method: DetectionMethod) -> DetectionResult {
    tracing::info!(disk = %disk.display(), arch = %architecture, %method, "detected architecture");
    DetectionResult {
        architecture,
        method,
    }
}

/// Architecture named in `path` right after a separator.
///
/// Matching is case-insensitive. A bare substring is not enough, so
/// `disk-s390x.img` matches while `disks390x.img` does not.
pub fn detect_from_filename(path: &Path) -> Option<Architecture> {
    let lower = path.to_string_lossy().to_lowercase();
    Architecture::ALL.into_iter().find(|arch| {
        FILENAME_SEPARATORS
            .iter()
            .any(|sep| lower.contains(&format!("{sep}{arch}")))
    })
}

/// Classify the textual report of `file -`.
pub fn classify_file_report(report: &str) -> Option<Architecture> {
    let report = report.to_lowercase();
    if !report.contains("elf") {
        return None;
    }

    if report.contains("aarch64") {
        Some(Architecture::Aarch64)
    } else if report.contains("powerpc") || report.contains("ppc64") {
        Some(Architecture::Ppc64le)
    } else if report.contains("s390") || report.contains("s/390") {
        Some(Architecture::S390x)
    } else if report.contains("x86-64") {
        Some(Architecture::X86_64)
    } else {
        None
    }
}

const ELF_MAGIC: &[u8; 4] = b"\x7fELF";
const EI_DATA: usize = 5;
const ELFDATA2LSB: u8 = 1;
const ELFDATA2MSB: u8 = 2;
const E_MACHINE_OFFSET: usize = 18;

const EM_PPC64: u16 = 0x15;
const EM_S390: u16 = 0x16;
const EM_X86_64: u16 = 0x3E;
const EM_AARCH64: u16 = 0xB7;

/// Classify an ELF binary by its `e_machine` header field.
pub fn classify_elf_header(bytes: &[u8]) -> Option<Architecture> {
    if bytes.len() < E_MACHINE_OFFSET + 2 || &bytes[..4] != ELF_MAGIC {
        return None;
    }

    let raw = [bytes[E_MACHINE_OFFSET], bytes[E_MACHINE_OFFSET + 1]];
    let machine = match bytes[EI_DATA] {
        ELFDATA2LSB => u16::from_le_bytes(raw),
        ELFDATA2MSB => u16::from_be_bytes(raw),
        _ => return None,
    };

    match machine {
        EM_X86_64 => Some(Architecture::X86_64),
        EM_AARCH64 => Some(Architecture::Aarch64),
        EM_PPC64 => Some(Architecture::Ppc64le),
        EM_S390 => Some(Architecture::S390x),
        _ => None,
    }
}
