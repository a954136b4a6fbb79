pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "homebase-api")]
#[command(about = "Homebase API - collections backend behind a home-IP allowlist")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Bind address, e.g. 0.0.0.0:8090 (overrides HTTP_ADDR)")]
        http: Option<String>,
    },

    #[command(about = "Apply, revert or inspect schema migrations")]
    Migrate {
        #[command(subcommand)]
        cmd: commands::migrate::MigrateCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { http: None }) {
        Commands::Serve { http } => commands::serve::handle(http).await,
        Commands::Migrate { cmd } => commands::migrate::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["homebase-api"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_migrate_down_with_default_steps() {
        let cli = Cli::try_parse_from(["homebase-api", "migrate", "down"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Migrate {
                cmd: commands::migrate::MigrateCommands::Down { steps: 1 }
            })
        ));

        let cli = Cli::try_parse_from(["homebase-api", "--json", "migrate", "down", "3"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Some(Commands::Migrate {
                cmd: commands::migrate::MigrateCommands::Down { steps: 3 }
            })
        ));
    }

    #[test]
    fn parses_migrate_history_sync() {
        let cli = Cli::try_parse_from(["homebase-api", "migrate", "history-sync"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Migrate {
                cmd: commands::migrate::MigrateCommands::HistorySync
            })
        ));
    }

    #[test]
    fn parses_serve_bind_address() {
        let cli = Cli::try_parse_from(["homebase-api", "serve", "--http", "0.0.0.0:9000"]).unwrap();
        match cli.command {
            Some(Commands::Serve { http }) => assert_eq!(http.as_deref(), Some("0.0.0.0:9000")),
            _ => panic!("expected serve command"),
        }
    }
}
