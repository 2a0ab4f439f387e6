//! CLI module for Tandem.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Args, Parser, Subcommand};

/// Tandem - Transcript Fusion
///
/// Fuses a diarized segmenter transcript (reliable times and speakers) with a
/// high-fidelity reader transcript into one speaker-attributed transcript.
#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "TANDEM_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fuse segmenter utterances with reader text
    Fuse(FuseArgs),

    /// Preview the window plan without calling the reader
    Windows {
        /// Segmenter utterances (JSON array or FunASR output with sentence_info)
        input: String,

        /// Override the minimum window duration, in seconds
        #[arg(long)]
        min_window: Option<f64>,

        /// Override the maximum window duration, in seconds
        #[arg(long)]
        max_window: Option<f64>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Debug, Clone)]
pub struct FuseArgs {
    /// Segmenter utterances (JSON array or FunASR output with sentence_info)
    pub input: String,

    /// Audio file passed to the reader
    #[arg(short, long)]
    pub audio: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output format (json, jsonl, text, srt, vtt)
    #[arg(long, default_value = "json")]
    pub format: String,

    /// Split single-speaker windows across utterances by text length
    #[arg(long)]
    pub split_by_text_ratio: bool,

    /// Minimum similarity for a fuzzy match (0.0-1.0)
    #[arg(long)]
    pub min_similarity: Option<f64>,

    /// Reader backend (command, http, replay)
    #[arg(long)]
    pub provider: Option<String>,

    /// Serve reader text from a file captured with --record
    #[arg(long, conflicts_with = "provider")]
    pub replay: Option<String>,

    /// Save every reader response to this file for later --replay
    #[arg(long)]
    pub record: Option<String>,

    /// Identifier stored in the output (defaults to the input file name)
    #[arg(long)]
    pub media_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fuse() {
        let cli = Cli::try_parse_from([
            "tandem",
            "-vv",
            "fuse",
            "talk.json",
            "--audio",
            "talk.wav",
            "--format",
            "srt",
            "--split-by-text-ratio",
            "--min-similarity",
            "0.6",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Fuse(args) => {
                assert_eq!(args.input, "talk.json");
                assert_eq!(args.audio.as_deref(), Some("talk.wav"));
                assert_eq!(args.format, "srt");
                assert!(args.split_by_text_ratio);
                assert_eq!(args.min_similarity, Some(0.6));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_replay_conflicts_with_provider() {
        let result = Cli::try_parse_from([
            "tandem", "fuse", "talk.json", "--provider", "http", "--replay", "r.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::try_parse_from(["tandem", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));
    }
}
