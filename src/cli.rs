use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "converse", about = "One-on-one conversation viewer and search")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print a chat's cached history grouped by calendar day
    Show {
        /// Chat key (the counterpart's id)
        chat: String,
    },
    /// Search a chat's cached history
    Search {
        /// Chat key (the counterpart's id)
        chat: String,
        /// Substring to look for, case-insensitive
        query: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_show_command() {
        let cli = Cli::parse_from(["converse", "show", "5511999990000"]);

        match cli.command {
            Command::Show { chat } => assert_eq!(chat, "5511999990000"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_search_command_with_global_config_flag() {
        let cli = Cli::parse_from([
            "converse",
            "search",
            "5511999990000",
            "invoice",
            "--config",
            "custom.toml",
        ]);

        match cli.command {
            Command::Search { chat, query } => {
                assert_eq!(chat, "5511999990000");
                assert_eq!(query, "invoice");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(
            cli.config
                .as_deref()
                .map(|p| p.to_string_lossy().to_string()),
            Some("custom.toml".to_owned())
        );
    }
}
