//! q2boot CLI entry point.

use clap::{Parser, Subcommand, ValueEnum};
use q2boot::config::Q2bootConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod cli;

/// q2boot - a handy QEMU VM launcher
#[derive(Parser, Debug)]
#[command(name = "q2boot")]
#[command(about = "A handy QEMU VM launcher")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: cli::run::RunCmd,

    /// Config file (default: <config dir>/q2boot/config.json).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pre-flight check of host dependencies.
    Check(cli::check::CheckCmd),

    /// Show version and QEMU binary availability.
    Version(cli::version::VersionCmd),
}

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging based on RUST_LOG or default to info
    init_logging(cli.log_format);

    tracing::debug!(version = q2boot::VERSION, "starting q2boot");

    let result = match cli.command {
        Some(Commands::Check(cmd)) => cmd.run(),
        Some(Commands::Version(cmd)) => cmd.run(),
        None => {
            let config = load_config(cli.config.as_deref());
            cli.run.run(config)
        }
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

/// Load configuration, falling back to defaults on any failure.
fn load_config(path: Option<&Path>) -> Q2bootConfig {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match Q2bootConfig::default_path() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "failed to locate config, using defaults");
                return Q2bootConfig::default();
            }
        },
    };

    match Q2bootConfig::load_or_create(&path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Q2bootConfig::default()
        }
    }
}

/// Initialize the tracing subscriber on stderr.
fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("q2boot=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disk_required_without_subcommand() {
        assert!(Cli::try_parse_from(["q2boot"]).is_err());
    }

    #[test]
    fn test_subcommands_do_not_need_disk() {
        let cli = Cli::try_parse_from(["q2boot", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check(_))));

        let cli = Cli::try_parse_from(["q2boot", "version", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Version(ref v)) if v.json));
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from([
            "q2boot",
            "--config",
            "/tmp/q2boot.json",
            "--log-format",
            "json",
            "disk.qcow2",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/q2boot.json")));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        assert_eq!(load_config(Some(&path)), Q2bootConfig::default());
    }
}
