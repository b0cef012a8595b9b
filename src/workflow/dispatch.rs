//! Dispatch - downloads a group's images, transforms them concurrently and
//! delivers the results
//!
//! Downloads run one after another and abort the group on the first failure.
//! Transforms fan out on the blocking pool; a failure on one image never
//! affects its siblings.

use crate::{
    common::errors::{TransformError, handle_error},
    models::{ChatId, GroupId, ImageItem, Selection},
    transport::Transport,
    workflow::{
        processors::{LogoAssets, Watermark, transform_file},
        prompts,
    },
};
use anyhow::{Context, Result};
use futures::future::join_all;
use std::{sync::Arc, time::Instant};
use tempfile::TempDir;

/// Everything needed to process a dispatched group, detached from the store.
#[derive(Debug, Clone)]
pub struct DispatchJob {
    pub chat: ChatId,
    pub group: GroupId,
    pub images: Vec<ImageItem>,
    pub selection: Selection,
    /// Keeps the scratch directory alive until the job is dropped.
    pub scratch: Arc<TempDir>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A download failed; nothing was transformed.
    DownloadFailed,
    Completed { succeeded: usize, failed: usize },
}

impl DispatchOutcome {
    /// True only if every image was delivered.
    pub fn processed(&self) -> bool {
        matches!(self, Self::Completed { failed: 0, .. })
    }
}

pub async fn run<T: Transport>(
    transport: &T,
    assets: &LogoAssets,
    job: DispatchJob,
) -> Result<DispatchOutcome> {
    let start_time = Instant::now();
    let chat = job.chat;

    transport.send_text(chat, &job.selection.summary()).await?;
    let wait_message = transport.send_text(chat, prompts::PLEASE_WAIT).await?;

    let outcome = process(transport, assets, &job).await;

    if let Err(err) = transport.delete_message(chat, wait_message).await {
        warn!("Failed to delete wait message {}: {:#}", wait_message, err);
    }

    let outcome = outcome?;
    info!(
        duration = &*format!("{:?}", start_time.elapsed());
        "Group {} finished: {:?}",
        job.group,
        outcome
    );
    Ok(outcome)
}

async fn process<T: Transport>(
    transport: &T,
    assets: &LogoAssets,
    job: &DispatchJob,
) -> Result<DispatchOutcome> {
    for item in &job.images {
        let download = transport
            .download(&item.file, &item.input_path)
            .await
            .with_context(|| {
                format!("failed to download {} for group {}", item.file_name, job.group)
            });
        if let Err(err) = download {
            handle_error(err);
            transport.send_text(job.chat, prompts::DOWNLOAD_FAILED).await?;
            return Ok(DispatchOutcome::DownloadFailed);
        }
        debug!("Downloaded {} to {:?}", item.file_name, item.input_path);
    }

    let selection = job.selection;
    let watermarks = assets.watermarks(selection.logo, selection.anchor, selection.opacity);

    let results = join_all(
        job.images
            .iter()
            .map(|item| deliver(transport, job.chat, item, selection, watermarks.clone())),
    )
    .await;

    let succeeded = results.iter().filter(|delivered| **delivered).count();
    Ok(DispatchOutcome::Completed {
        succeeded,
        failed: results.len() - succeeded,
    })
}

/// Transform and send one image. Returns whether it reached the user.
async fn deliver<T: Transport>(
    transport: &T,
    chat: ChatId,
    item: &ImageItem,
    selection: Selection,
    watermarks: Vec<Watermark>,
) -> bool {
    let start_time = Instant::now();
    let input = item.input_path.clone();
    let crop = selection.crop;

    let rendered = tokio::task::spawn_blocking(move || transform_file(&input, crop, &watermarks))
        .await
        .unwrap_or_else(|join_error| Err(TransformError::Unknown(join_error.to_string())));

    let result = match rendered {
        Ok(rendered) => {
            info!(
                duration = &*format!("{:?}", start_time.elapsed());
                "{} {}x{}: {}",
                item.output_filename,
                rendered.width,
                rendered.height,
                rendered.message
            );
            send_output(transport, chat, item, &rendered.bytes).await
        }
        Err(err) => {
            warn!("Error processing image {}: {}", item.output_filename, err);
            let reply = prompts::processing_failed(&item.output_filename, &err.to_string());
            transport
                .send_text(chat, &reply)
                .await
                .map(|_| false)
        }
    };

    result.unwrap_or_else(|err| {
        handle_error(err.context(format!("failed to deliver {}", item.output_filename)));
        false
    })
}

async fn send_output<T: Transport>(
    transport: &T,
    chat: ChatId,
    item: &ImageItem,
    bytes: &[u8],
) -> Result<bool> {
    tokio::fs::write(&item.output_path, bytes)
        .await
        .with_context(|| format!("failed to write output {:?}", item.output_path))?;
    transport
        .send_document(chat, &item.output_path, &item.output_filename)
        .await?;
    Ok(true)
}
