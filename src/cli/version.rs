//! Version command implementation.

use clap::Args;
use q2boot::{qemu, Architecture};

/// Show version and QEMU binary availability.
#[derive(Args, Debug)]
pub struct VersionCmd {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl VersionCmd {
    /// Execute the version command.
    pub fn run(&self) -> q2boot::Result<()> {
        let binaries = qemu::available_binaries();

        if self.json {
            let json_binaries: Vec<_> = binaries
                .iter()
                .map(|(arch, available)| {
                    serde_json::json!({
                        "arch": arch.as_str(),
                        "binary": qemu::binary_for(*arch),
                        "available": available,
                    })
                })
                .collect();
            let out = serde_json::json!({
                "version": q2boot::VERSION,
                "binaries": json_binaries,
            });
            let text = serde_json::to_string_pretty(&out)
                .map_err(|e| q2boot::Error::command_failed("version", e.to_string()))?;
            println!("{}", text);
            return Ok(());
        }

        println!("q2boot {}", q2boot::VERSION);
        println!("Supported architectures: {}", Architecture::supported_list());
        println!();
        println!("QEMU binaries:");
        for (arch, available) in &binaries {
            let status = if *available { "available" } else { "not found" };
            println!("  {:<8} {:<22} {}", arch.as_str(), qemu::binary_for(*arch), status);
        }

        for (arch, _) in binaries.iter().filter(|(_, available)| !available) {
            println!();
            println!("{} ({}):", qemu::binary_for(*arch), arch);
            println!("{}", qemu::install_instructions(*arch));
        }

        Ok(())
    }
}
