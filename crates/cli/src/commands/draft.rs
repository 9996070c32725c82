// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tb draft` - Saved draft commands

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use tb_core::{EntityDraft, EntityId, Hydration};
use tokio::io::AsyncReadExt;

use crate::backend::Backend;
use crate::output::{print_content, print_json, OutputFormat};

#[derive(Args)]
pub struct DraftArgs {
    #[command(subcommand)]
    pub command: DraftCommand,
}

#[derive(Subcommand)]
pub enum DraftCommand {
    /// Print the saved draft of an entity
    Show {
        /// Entity id (source file path or test-case id)
        entity: String,
    },
    /// Replace the saved draft of an entity
    Save {
        /// Entity id (source file path or test-case id)
        entity: String,
        /// File with the new content, or "-" for stdin
        source: PathBuf,
    },
}

#[derive(Serialize)]
struct SaveJson<'a> {
    entity: &'a EntityId,
    saved: bool,
    changed: bool,
}

pub async fn handle(command: DraftCommand, backend: &Backend, format: OutputFormat) -> Result<()> {
    match command {
        DraftCommand::Show { entity } => show(backend, EntityId::new(entity), format).await,
        DraftCommand::Save { entity, source } => {
            save(backend, EntityId::new(entity), &source, format).await
        }
    }
}

/// Select the entity and wait for its saved content to arrive.
async fn hydrate(
    session: &tb_engine::Session<tb_adapters::HttpRemoteClient>,
    entity: &EntityId,
) -> Result<EntityDraft> {
    session.select_entity(entity.clone())?;
    let Some(draft) = session.wait_for_hydration(entity).await else {
        bail!("no draft for {entity}");
    };
    if draft.hydration == Hydration::Pending {
        bail!("{}", draft.log_text);
    }
    Ok(draft)
}

async fn show(backend: &Backend, entity: EntityId, format: OutputFormat) -> Result<()> {
    let session = backend.session(None)?;
    let draft = hydrate(&session, &entity).await?;
    match format {
        OutputFormat::Text => {
            if draft.hydration == Hydration::Missing {
                eprintln!("No saved draft for {entity}");
            }
            print_content(&draft.content);
        }
        OutputFormat::Json => print_json(&draft)?,
    }
    session.close();
    Ok(())
}

async fn save(
    backend: &Backend,
    entity: EntityId,
    source: &Path,
    format: OutputFormat,
) -> Result<()> {
    let content = read_source(source).await?;
    let session = backend.session(None)?;
    hydrate(&session, &entity).await?;
    let changed = session.edit_content(&entity, content)?;
    session.save_draft(&entity).await.with_context(|| format!("saving draft for {entity}"))?;
    session.close();

    match format {
        OutputFormat::Text if changed => println!("Saved draft for {entity}"),
        OutputFormat::Text => println!("Saved draft for {entity} (unchanged)"),
        OutputFormat::Json => print_json(&SaveJson { entity: &entity, saved: true, changed })?,
    }
    Ok(())
}

async fn read_source(source: &Path) -> Result<String> {
    if source.as_os_str() == "-" {
        let mut content = String::new();
        tokio::io::stdin().read_to_string(&mut content).await.context("reading stdin")?;
        return Ok(content);
    }
    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("reading {}", source.display()))
}
