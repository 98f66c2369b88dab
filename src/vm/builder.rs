//! QEMU command-line assembly.
//!
//! The argument order is fixed: machine, resources, disk, network, audio,
//! display, monitor. Tests depend on it being deterministic.

use super::arch::{ArchVariant, NOGRAPHIC};
use crate::network::LOCALHOST;
use crate::vm::config::VmConfig;

/// Discard guest disk writes on exit.
pub const SNAPSHOT_ARG: &str = "-snapshot";

/// QEMU monitor flag.
pub const MONITOR_ARG: &str = "-monitor";

/// Build the full ordered argument list for `variant` under `config`.
///
/// The binary itself is not included; see [`ArchVariant::qemu_binary`].
pub fn build_args<V: ArchVariant + ?Sized>(config: &VmConfig, variant: &V) -> Vec<String> {
    let mut args = variant.machine_args();

    args.push("-smp".to_string());
    args.push(config.cpus.to_string());
    args.push("-m".to_string());
    args.push(format!("{}G", config.ram_gb));

    args.extend(variant.disk_args());
    args.extend(variant.network_args());

    args.push("-audiodev".to_string());
    args.push("none,id=snd0".to_string());

    if config.graphical {
        let display = variant.graphical_display_args();
        // A terminal fallback owns stdio, so the monitor must not claim it too.
        let terminal_fallback = has_flag(&display, NOGRAPHIC);
        args.extend(display);
        if terminal_fallback && !has_flag(&args, MONITOR_ARG) {
            args.push(MONITOR_ARG.to_string());
            args.push("none".to_string());
        }
    } else {
        args.extend(variant.non_graphical_display_args());
        if !config.write_mode {
            args.push(SNAPSHOT_ARG.to_string());
        }
    }

    // A TCP monitor never touches stdio, so it may coexist with `-monitor none`.
    if config.monitor_enabled() {
        args.push(MONITOR_ARG.to_string());
        args.push(monitor_spec(config.monitor_port));
    } else if !config.graphical && !has_flag(&args, MONITOR_ARG) {
        args.push(MONITOR_ARG.to_string());
        args.push("none".to_string());
    }

    args
}

/// Telnet monitor listener bound to localhost.
pub fn monitor_spec(port: u16) -> String {
    format!("telnet:{LOCALHOST}:{port},server,nowait")
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
