//! fOS Overlay - Main Entry Point

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fos_overlay::{OverlayConfig, Script};

/// Accessible meeting overlay tools
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scripted session and print every live region write
    Replay {
        /// Replay script (JSON)
        #[arg(value_hint = clap::ValueHint::FilePath)]
        script: PathBuf,

        /// Overlay configuration (JSON); defaults apply when omitted
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    fos_overlay::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay { script, config } => run_replay(&script, config.as_deref()),
    }
}

fn run_replay(script_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => OverlayConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => OverlayConfig::default(),
    };
    let json = std::fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let script = Script::from_json(&json)
        .with_context(|| format!("failed to parse script {}", script_path.display()))?;

    tracing::info!(script = %script_path.display(), steps = script.steps.len(), "starting replay");
    let spoken = smol::block_on(fos_overlay::replay(&config, &script))?;

    for line in &spoken {
        println!("{line}");
    }
    tracing::info!(writes = spoken.len(), "replay finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_replay_args() {
        let cli = Cli::try_parse_from(["fos-overlay", "replay", "standup.json", "--config", "overlay.json"]).unwrap();
        let Command::Replay { script, config } = cli.command;
        assert_eq!(script, PathBuf::from("standup.json"));
        assert_eq!(config, Some(PathBuf::from("overlay.json")));

        assert!(Cli::try_parse_from(["fos-overlay", "replay"]).is_err());
        assert!(Cli::try_parse_from(["fos-overlay", "dance"]).is_err());
    }
}
