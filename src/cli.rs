//! Command line interface.
//!
//! Each subcommand maps onto one client operation. JSON responses are
//! pretty-printed to stdout or saved to `--output`; `export` writes CSV.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::ZenexError;
use crate::export::{
    cancel_on_ctrl_c, CancelFlag, CsvSink, ExportOutcome, ExportPipeline, PageSource, RowSink,
};
use crate::models::{Payload, ResourceType};
use crate::zendesk_client::ZendeskClient;

/// Exit code for a remote rejection or an export that stopped early.
const EXIT_STOPPED: u8 = 2;

/// Exit code for an export interrupted with Ctrl+C.
const EXIT_INTERRUPTED: u8 = 130;

/// Search, list and export Zendesk tickets.
#[derive(Debug, Parser)]
#[command(name = "zenex", version, about)]
pub struct Cli {
    /// Do not log response summaries.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch one page of search results, newest first.
    Search {
        /// Zendesk search query, e.g. "type:ticket status:closed".
        query: String,

        /// Page number.
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Save the JSON response here instead of printing it.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export every ticket matching a query to CSV.
    Export {
        /// Zendesk search query, e.g. "status:closed created>2024-01-01".
        query: String,

        /// CSV file to write once the export completes.
        #[arg(short, long, default_value = "downloads/export.csv")]
        output: PathBuf,
    },

    /// List tickets, newest first.
    Tickets {
        /// Save the JSON response here instead of printing it.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show a single resource by id.
    Show {
        /// Resource type.
        #[arg(value_enum)]
        resource: ResourceType,

        /// Resource id.
        id: String,

        /// Save the JSON response here instead of printing it.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Runs the parsed command line against the configured account.
///
/// # Errors
///
/// Transport faults, rejected cursors and write failures are returned as
/// errors. Remote rejections and early-stopped exports are reported through
/// the exit code.
pub async fn run(cli: Cli, config: Config) -> Result<ExitCode> {
    let client = ZendeskClient::new(&config)
        .context("Failed to create Zendesk client")?
        .with_response_logging(!cli.quiet);

    tracing::debug!(base_url = %client.base_url(), "Zendesk client initialized");

    match cli.command {
        Command::Search {
            query,
            page,
            output,
        } => {
            let result = client.search(&query, page).await;
            finish_json(&client, result, output.as_deref())
        }
        Command::Tickets { output } => {
            let result = client.list_tickets().await;
            finish_json(&client, result, output.as_deref())
        }
        Command::Show {
            resource,
            id,
            output,
        } => {
            let result = client.show_resource(resource, &id).await;
            finish_json(&client, result, output.as_deref())
        }
        Command::Export { query, output } => export(&client, &config, &query, output).await,
    }
}

async fn export(
    client: &ZendeskClient,
    config: &Config,
    query: &str,
    output: PathBuf,
) -> Result<ExitCode> {
    let cancel = CancelFlag::new();
    let listener = cancel_on_ctrl_c(cancel.clone());
    let mut sink = CsvSink::new(output);

    tracing::info!(query, output = %sink.path().display(), "Starting export");

    let pipeline = ExportPipeline::new(client, &mut sink)
        .with_field_mapping(config.field_mapping)
        .with_cancel_flag(cancel.clone());
    let result = run_until_aborted(pipeline, query, &cancel).await;
    listener.abort();

    let Some(result) = result else {
        tracing::warn!("Export aborted, no file written");
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    };

    let outcome = result.map_err(|e| {
        anyhow::anyhow!(e.sanitized_display(client.api_token_for_sanitization()))
    })?;

    Ok(match outcome {
        ExportOutcome::Completed { pages, rows } => {
            tracing::info!(pages, rows, path = %sink.path().display(), "Done");
            ExitCode::SUCCESS
        }
        ExportOutcome::Stopped { pages, .. } => {
            tracing::warn!(pages, "Export did not complete, no file written");
            ExitCode::from(EXIT_STOPPED)
        }
        ExportOutcome::Cancelled { pages, .. } => {
            tracing::info!(pages, "Export cancelled, no file written");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    })
}

/// Runs `pipeline` unless `cancel` is aborted first, in which case the
/// pending request is dropped and `None` is returned. Nothing is flushed
/// on abort.
async fn run_until_aborted<S: PageSource, K: RowSink>(
    pipeline: ExportPipeline<'_, S, K>,
    query: &str,
    cancel: &CancelFlag,
) -> Option<Result<ExportOutcome, ZenexError>> {
    tokio::select! {
        result = pipeline.run(query) => Some(result),
        () = cancel.aborted() => None,
    }
}

/// Writes a successful payload; reports a rejection through the exit code.
fn finish_json(
    client: &ZendeskClient,
    result: Result<Payload, ZenexError>,
    output: Option<&Path>,
) -> Result<ExitCode> {
    match result {
        Ok(payload) => {
            write_json(&payload, output)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_remote_rejection() => {
            tracing::error!(
                error = %e.sanitized_display(client.api_token_for_sanitization()),
                "Request rejected"
            );
            Ok(ExitCode::from(EXIT_STOPPED))
        }
        Err(e) => Err(anyhow::anyhow!(
            e.sanitized_display(client.api_token_for_sanitization())
        )),
    }
}

/// Pretty-prints `payload` to `output`, or stdout when no path is given.
fn write_json(payload: &Payload, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(payload)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Response saved");
        }
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::try_parse_from(["zenex", "show", "ticket_fields", "16862464937369"]).unwrap();
        match cli.command {
            Command::Show { resource, id, output } => {
                assert_eq!(resource, ResourceType::TicketFields);
                assert_eq!(id, "16862464937369");
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_show_rejects_unknown_resource() {
        assert!(Cli::try_parse_from(["zenex", "show", "macros", "1"]).is_err());
    }

    #[test]
    fn test_parse_export_defaults() {
        let cli = Cli::try_parse_from(["zenex", "--quiet", "export", "status:closed"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Command::Export { query, output } => {
                assert_eq!(query, "status:closed");
                assert_eq!(output, PathBuf::from("downloads/export.csv"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_rejects_page_zero() {
        assert!(Cli::try_parse_from(["zenex", "search", "status:open", "--page", "0"]).is_err());
    }

    /// Never answers, like a request stuck on a dead connection.
    struct StalledSource;

    impl PageSource for StalledSource {
        async fn fetch_page(
            &self,
            _query: &str,
            _cursor: Option<&str>,
        ) -> Result<Payload, ZenexError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_abort_drops_stalled_request_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let mut sink = CsvSink::new(&path);
        let cancel = CancelFlag::new();

        let pipeline =
            ExportPipeline::new(&StalledSource, &mut sink).with_cancel_flag(cancel.clone());
        let aborter = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            aborter.abort();
        });

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            run_until_aborted(pipeline, "status:closed", &cancel),
        )
        .await
        .expect("abort did not interrupt the stalled request");

        assert!(result.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_write_json_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("downloads").join("searchable.json");
        let payload: Payload = serde_json::from_value(json!({"results": [], "count": 0})).unwrap();

        write_json(&payload, Some(&path)).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved, json!({"results": [], "count": 0}));
    }
}
