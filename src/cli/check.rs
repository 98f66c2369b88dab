//! Check command implementation.

use clap::Args;
use q2boot::preflight::{self, KvmStatus, PreflightReport};

/// Pre-flight check of host dependencies.
///
/// Verifies KVM availability and permissions (Linux only), QEMU system
/// binaries, optional UEFI firmware and virt-cat, then prints install hints
/// for anything missing. Always succeeds.
#[derive(Args, Debug)]
pub struct CheckCmd {}

impl CheckCmd {
    /// Execute the check command.
    pub fn run(&self) -> q2boot::Result<()> {
        println!("Running pre-flight checks for q2boot dependencies...");

        let report = PreflightReport::collect();

        println!("\n1. Verifying KVM availability (Linux only)");
        print_kvm(&report.kvm);

        println!("\n2. Checking for QEMU binaries");
        if report.qemu_arches.is_empty() {
            println!("   [missing] No QEMU system binaries found in your PATH.");
        } else {
            println!(
                "   [ok] Found QEMU binaries for architectures: {}",
                report.qemu_arches.join(", ")
            );
        }

        println!("\n3. Checking for optional UEFI firmware");
        match &report.firmware {
            Some(path) => println!("   [ok] Found UEFI firmware: {}", path.display()),
            None => {
                println!("   - UEFI firmware not found in common locations (optional but recommended).");
                println!("     -> Hint: For aarch64, install 'qemu-efi-aarch64' or 'edk2-aarch64'.");
            }
        }

        println!("\n4. Checking for virt-cat (for architecture auto-detection)");
        if report.virt_cat {
            println!("   [ok] virt-cat is installed and available in your PATH.");
        } else {
            println!("   - virt-cat not found (optional, but needed for auto-detecting image architecture).");
        }

        if report.needs_hints() {
            println!("\n5. Installation Hints");
            let distro = preflight::linux_distro();
            for hint in preflight::install_hints(std::env::consts::OS, &distro, report.virt_cat) {
                println!("   - {}", hint);
            }
        }

        tracing::debug!(?report, "preflight finished");
        println!("\nPre-flight check complete.");
        Ok(())
    }
}

fn print_kvm(status: &KvmStatus) {
    match status {
        KvmStatus::NotApplicable => println!("   - KVM check is not applicable on this OS."),
        KvmStatus::CpuInfoUnreadable(e) => println!("   [missing] Could not read /proc/cpuinfo: {}", e),
        KvmStatus::NoCpuSupport => {
            println!("   [missing] KVM acceleration is not supported by this CPU.");
            println!("      -> Hint: Ensure virtualization (VT-x or AMD-V) is enabled in your BIOS/UEFI settings.");
        }
        KvmStatus::ModuleNotLoaded => {
            println!("   - CPU virtualization support is enabled.");
            println!("   [missing] KVM kernel module is not loaded.");
            println!("      -> Hint: Run 'sudo modprobe kvm_intel' or 'sudo modprobe kvm_amd'.");
        }
        KvmStatus::NoAccess => {
            println!("   - CPU virtualization support is enabled.");
            println!("   - KVM kernel module is loaded.");
            println!("   [missing] /dev/kvm device is not accessible by the current user.");
            println!("      -> Hint: Add your user to the 'kvm' group with 'sudo usermod -aG kvm $USER'.");
            println!("      -> Note: You may need to log out and back in for the group change to take effect.");
        }
        KvmStatus::Ready => {
            println!("   - CPU virtualization support is enabled.");
            println!("   - KVM kernel module is loaded.");
            println!("   [ok] KVM is available and ready to use.");
        }
    }
}
