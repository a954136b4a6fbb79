use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config;
use crate::database::{DatabaseManager, PgSchemaStore};
use crate::migrations::{self, MigrationRunner};

#[derive(Subcommand)]
pub enum MigrateCommands {
    #[command(about = "Apply all pending migrations")]
    Up,

    #[command(about = "Revert the most recently applied migrations")]
    Down {
        #[arg(default_value_t = 1, help = "Number of migrations to revert")]
        steps: usize,
    },

    #[command(about = "List applied migrations")]
    History,

    #[command(about = "Remove history entries for migrations that no longer exist")]
    HistorySync,
}

pub async fn handle(cmd: MigrateCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("migrations need a reachable DATABASE_URL")?;
    let store = PgSchemaStore::new(pool.clone()).await?;
    let runner = MigrationRunner::new(&store, migrations::registry());

    let result = match cmd {
        MigrateCommands::Up => {
            let applied = runner.up().await?;
            output_success(
                &output_format,
                &format!("Applied {} migration(s)", applied.len()),
                Some(json!({ "applied": applied })),
            )
        }
        MigrateCommands::Down { steps } => {
            let reverted = runner.down(steps).await?;
            output_success(
                &output_format,
                &format!("Reverted {} migration(s)", reverted.len()),
                Some(json!({ "reverted": reverted })),
            )
        }
        MigrateCommands::History => {
            let history = runner.history().await?;
            if let OutputFormat::Text = output_format {
                for entry in &history {
                    println!("{}  {}  {}", entry.version, entry.applied_at.to_rfc3339(), entry.name);
                }
            }
            output_success(
                &output_format,
                &format!("{} migration(s) applied", history.len()),
                Some(json!({ "history": history })),
            )
        }
        MigrateCommands::HistorySync => {
            let removed = runner.sync_history().await?;
            output_success(
                &output_format,
                &format!("Removed {} orphaned history entry(s)", removed.len()),
                Some(json!({ "removed": removed })),
            )
        }
    };

    pool.close().await;
    result
}
