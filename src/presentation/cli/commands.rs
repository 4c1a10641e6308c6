use serde::Serialize;
use std::error::Error;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

use crate::application::services::SchemaManagerService;
use crate::application::services::schema_manager::{CleanupPolicy, DEFAULT_CLEANUP_DAYS};
use crate::infrastructure::{AppConfig, AppContainer};
use crate::presentation::cli::{CONFIRMATION_PHRASE, Command, SchemaCommand};
use crate::presentation::http::HttpServer;

fn print_json<T: Serialize, W: Write>(out: &mut W, value: &T) -> Result<(), Box<dyn Error>> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Reads one line and accepts only the exact confirmation phrase.
pub fn confirmed<R: BufRead>(input: &mut R) -> io::Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim() == CONFIRMATION_PHRASE)
}

pub async fn run(
    command: Command,
    container: &AppContainer,
    config: &AppConfig,
) -> Result<(), Box<dyn Error>> {
    let mut out = io::stdout().lock();

    match command {
        Command::Serve => {
            drop(out);
            let server = HttpServer::new(
                container.chat_handler.clone(),
                container.data_handler.clone(),
                container.health_handler.clone(),
                container.schema_handler.clone(),
                config.bind_address(),
            );
            server.run().await?;
        }
        Command::Summary => {
            let summary = container.data_summary_use_case.execute().await;
            print_json(&mut out, &summary)?;
        }
        Command::Clear { force } => {
            if !force {
                write!(
                    out,
                    "This removes every vector, table and schema. Type '{}' to continue: ",
                    CONFIRMATION_PHRASE
                )?;
                out.flush()?;
                if !confirmed(&mut io::stdin().lock())? {
                    warn!("Clear cancelled");
                    writeln!(out, "Cancelled.")?;
                    return Ok(());
                }
            }

            let result = container.clear_all_data_use_case.execute().await;
            print_json(&mut out, &result)?;
            if !result.success {
                return Err(result.message.into());
            }
        }
        Command::Schemas { command } => {
            run_schema_command(command, &container.schema_manager, &mut out).await?;
        }
    }

    Ok(())
}

pub async fn run_schema_command<W: Write>(
    command: SchemaCommand,
    manager: &SchemaManagerService,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    match command {
        SchemaCommand::List => print_json(out, &manager.all_schemas().await?),
        SchemaCommand::Summary => print_json(out, &manager.summary().await?),
        SchemaCommand::Validate => {
            let report = manager.validate().await?;
            print_json(out, &report)?;
            if !report.is_valid() {
                warn!("Schema registry has {} issues", report.issue_count());
            }
            Ok(())
        }
        SchemaCommand::Search { keyword } => {
            print_json(out, &manager.search_tables(&keyword).await?)
        }
        SchemaCommand::Export { path } => {
            let markdown = manager.export_markdown().await?;
            match path {
                Some(path) => {
                    tokio::fs::write(&path, markdown).await?;
                    info!("Schema documentation exported to {}", path.display());
                    writeln!(out, "{}", path.display())?;
                }
                None => write!(out, "{}", markdown)?,
            }
            Ok(())
        }
        SchemaCommand::Backup => {
            let path = manager.backup().await?;
            writeln!(out, "{}", path)?;
            Ok(())
        }
        SchemaCommand::Restore { path } => {
            let restored = manager.restore(&path).await?;
            writeln!(out, "Restored {} schemas from {}", restored, path)?;
            Ok(())
        }
        SchemaCommand::Cleanup { days, keep } => {
            let policy = if keep.is_empty() {
                CleanupPolicy::OlderThanDays(days.unwrap_or(DEFAULT_CLEANUP_DAYS))
            } else {
                CleanupPolicy::KeepFileHashes(keep)
            };
            let removed = manager.cleanup(policy).await?;
            writeln!(out, "Removed {} schemas", removed)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::InMemorySchemaRegistry;
    use crate::domain::entities::{SchemaEntry, TableSchema};
    use crate::domain::repositories::SchemaRegistry;
    use crate::domain::value_objects::{FileHash, SqlIdentifier};
    use serde_json::Value;
    use std::sync::Arc;

    fn agenda_hash() -> FileHash {
        FileHash::from_bytes(b"agenda.pdf")
    }

    async fn manager() -> SchemaManagerService {
        let registry = Arc::new(InMemorySchemaRegistry::default());
        for (name, uuid, file) in [
            ("pdf_ab12cd34_speakers", "ab12cd34", "agenda.pdf"),
            ("pdf_ef56ab78_rooms", "ef56ab78", "venue.pdf"),
        ] {
            let entry = SchemaEntry::new(
                TableSchema::all_strings(vec![SqlIdentifier::parse("speaker").unwrap()]),
                "Conference speakers".to_string(),
                uuid.to_string(),
                Some(FileHash::from_bytes(file.as_bytes())),
                Some(file.to_string()),
            );
            registry.upsert(name, &entry).await.unwrap();
        }
        SchemaManagerService::new(registry)
    }

    async fn output(command: SchemaCommand, manager: &SchemaManagerService) -> String {
        let mut out = Vec::new();
        run_schema_command(command, manager, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_confirmation_phrase() {
        assert!(confirmed(&mut "DELETE ALL\n".as_bytes()).unwrap());
        assert!(confirmed(&mut "  DELETE ALL  \n".as_bytes()).unwrap());
        assert!(!confirmed(&mut "delete all\n".as_bytes()).unwrap());
        assert!(!confirmed(&mut "".as_bytes()).unwrap());
    }

    #[tokio::test]
    async fn test_list_and_search_print_json() {
        let manager = manager().await;

        let listed: Value = serde_json::from_str(&output(SchemaCommand::List, &manager).await).unwrap();
        assert_eq!(listed.as_object().unwrap().len(), 2);

        let found: Value = serde_json::from_str(
            &output(
                SchemaCommand::Search {
                    keyword: "rooms".to_string(),
                },
                &manager,
            )
            .await,
        )
        .unwrap();
        assert_eq!(found.as_array().unwrap().len(), 1);
        assert_eq!(found[0]["table_name"], "pdf_ef56ab78_rooms");
    }

    #[tokio::test]
    async fn test_cleanup_keeps_listed_hashes() {
        let manager = manager().await;

        let printed = output(
            SchemaCommand::Cleanup {
                days: None,
                keep: vec![agenda_hash().to_string()],
            },
            &manager,
        )
        .await;
        assert_eq!(printed.trim(), "Removed 1 schemas");
        assert_eq!(manager.list_tables().await.unwrap(), vec!["pdf_ab12cd34_speakers"]);
    }

    #[tokio::test]
    async fn test_export_to_file() {
        let manager = manager().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schemas.md");

        output(
            SchemaCommand::Export {
                path: Some(path.clone()),
            },
            &manager,
        )
        .await;

        let markdown = std::fs::read_to_string(path).unwrap();
        assert!(markdown.starts_with("# Table Schema Documentation"));
        assert!(markdown.contains("pdf_ab12cd34_speakers"));
    }
}
