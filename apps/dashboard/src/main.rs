use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    CommitOutcome, ControllerError, HttpRecordStore, ListEditController, ViewQuery,
};
use shared::domain::{FieldKey, RecordField, RecordId, SensorRecord};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;
mod events;
mod render;

use config::load_settings;
use events::describe_failure;
use render::render_table;

#[derive(Parser, Debug)]
#[command(name = "sensor-dashboard", about = "List and edit sensor readings")]
struct Cli {
    /// TOML settings file (default: ./dashboard.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    store_url: Option<String>,
    #[arg(long, global = true)]
    model: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show one page of readings.
    List {
        #[arg(long, default_value = "")]
        search: String,
        /// Column to sort by; repeating the same column flips the direction.
        #[arg(long = "sort")]
        sort: Vec<FieldKey>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
    },
    /// Change fields of one reading and save it.
    Edit {
        id: String,
        #[arg(long)]
        topicsensor: Option<String>,
        /// Empty string clears the value.
        #[arg(long, allow_hyphen_values = true)]
        temperature: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        system: Option<String>,
    },
}

fn failure(err: ControllerError) -> anyhow::Error {
    anyhow!(describe_failure(&err))
}

/// Finds the loaded record whose id prints as `raw`, whether the store sent it as a number or text.
fn resolve_id(records: &[SensorRecord], raw: &str) -> Option<RecordId> {
    let raw = raw.trim();
    records
        .iter()
        .find(|record| record.id.to_string() == raw)
        .map(|record| record.id.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(store_url) = cli.store_url {
        settings.store_url = store_url;
    }
    if let Some(model) = cli.model {
        settings.model = model;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let store = match settings.request_timeout() {
        Some(timeout) => HttpRecordStore::with_timeout(&settings.store_url, &settings.model, timeout)?,
        None => HttpRecordStore::new(&settings.store_url, &settings.model)?,
    };
    let controller = ListEditController::with_view(
        Arc::new(store),
        ViewQuery {
            page_size: settings.page_size,
            ..ViewQuery::default()
        },
    );

    let mut snapshots = controller.subscribe();
    tokio::spawn(async move {
        loop {
            match snapshots.recv().await {
                Ok(snapshot) => debug!(
                    version = snapshot.version,
                    rows = snapshot.records.len(),
                    loading = snapshot.loading,
                    editing = ?snapshot.editing_id(),
                    "snapshot published"
                ),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "snapshot observer lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    controller.load().await.map_err(failure)?;

    match cli.command {
        Command::List {
            search,
            sort,
            page,
            page_size,
        } => {
            controller.set_search(search).await.map_err(failure)?;
            for key in sort {
                controller.sort_by(key).await.map_err(failure)?;
            }
            if let Some(page_size) = page_size {
                controller.set_page_size(page_size).await.map_err(failure)?;
            }
            controller.set_page(page).await.map_err(failure)?;
            print!("{}", render_table(&*controller.snapshot().await));
        }
        Command::Edit {
            id,
            topicsensor,
            temperature,
            location,
            system,
        } => {
            let edits: Vec<(RecordField, String)> = [
                (RecordField::TopicSensor, topicsensor),
                (RecordField::Temperature, temperature),
                (RecordField::Location, location),
                (RecordField::System, system),
            ]
            .into_iter()
            .filter_map(|(field, value)| value.map(|value| (field, value)))
            .collect();
            if edits.is_empty() {
                bail!("nothing to change; pass at least one of --topicsensor, --temperature, --location, --system");
            }

            let Some(id) = resolve_id(&controller.snapshot().await.records, &id) else {
                bail!("no record with id {id}");
            };
            if !controller.begin_edit(&id).await.map_err(failure)? {
                bail!("no record with id {id}");
            }
            for (field, value) in &edits {
                if let Err(err) = controller.update_draft_field(*field, value).await {
                    controller.cancel_edit().await.map_err(failure)?;
                    return Err(failure(err));
                }
            }

            match controller.commit_edit().await {
                Ok(CommitOutcome::Committed(record)) => println!("Saved record {}", record.id),
                Ok(CommitOutcome::NoDraft) => bail!("edit session for record {id} was closed"),
                Err(err) => {
                    controller.cancel_edit().await.map_err(failure)?;
                    return Err(failure(err));
                }
            }

            let snapshot = controller.snapshot().await;
            if let Some(err) = &snapshot.last_error {
                eprintln!("warning: {}", describe_failure(err));
            }
            print!("{}", render_table(&snapshot));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_target_matches_numeric_and_textual_ids() {
        let records = vec![
            SensorRecord::new(7),
            SensorRecord::new(RecordId::Text("12".into())),
            SensorRecord::new(RecordId::Text("spare".into())),
        ];
        assert_eq!(resolve_id(&records, "7"), Some(RecordId::Number(7)));
        assert_eq!(
            resolve_id(&records, " 12"),
            Some(RecordId::Text("12".into()))
        );
        assert_eq!(
            resolve_id(&records, "spare"),
            Some(RecordId::Text("spare".into()))
        );
        assert_eq!(resolve_id(&records, "8"), None);
    }
}
