//! Workflow module - the per-conversation selection workflow
//!
//! This module contains the following submodules:
//! - `store`: per-conversation state and scratch storage
//! - `aggregator`: idle-gap grouping of incoming uploads
//! - `machine`: crop → logo → position → opacity transitions
//! - `prompts`: button prompts and user-facing replies
//! - `dispatch`: download, concurrent transform and delivery
//! - `processors`: the image transform engine and startup setup

pub mod aggregator;
pub mod dispatch;
pub mod machine;
pub mod processors;
pub mod prompts;
pub mod store;

use crate::{
    common::errors::{SelectionError, handle_error},
    config::AppConfig,
    models::{ChatId, SelectionEvent, Upload},
    transport::{MessageId, Prompt, Transport},
    utils::megabytes,
};
use aggregator::GroupAggregator;
use anyhow::Result;
use dispatch::{DispatchJob, DispatchOutcome};
use machine::Effect;
use processors::LogoAssets;
use std::time::Instant;
use store::{ConversationState, ConversationStore};

/// What to do once the conversation lock is released.
enum Step {
    Prompt(Prompt),
    Dispatch(DispatchJob),
    Nothing,
}

pub struct Workflow<T: Transport> {
    transport: T,
    assets: LogoAssets,
    store: ConversationStore,
    aggregator: GroupAggregator,
    max_upload_bytes: u64,
}

impl<T: Transport> Workflow<T> {
    pub fn new(transport: T, assets: LogoAssets, config: &AppConfig) -> Self {
        Self {
            transport,
            assets,
            store: ConversationStore::new(&config.scratch_dir),
            aggregator: GroupAggregator::new(config.idle_gap()),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    // ────────────────────────────────────────────────────────────────
    // Public API
    // ────────────────────────────────────────────────────────────────

    pub async fn greet(&self, chat: ChatId) {
        if let Err(err) = self.transport.send_text(chat, prompts::GREETING).await {
            handle_error(err.context("failed to send greeting"));
        }
    }

    /// Accept one upload. `arrival` drives the idle-gap grouping.
    pub async fn handle_image(&self, chat: ChatId, upload: Upload, arrival: Instant) {
        if let Err(err) = self.try_image(chat, &upload, arrival).await {
            self.recover(chat, err).await;
        }
    }

    /// Apply one selection token. `origin` is the prompt message that carried
    /// the button; it is removed once the event is accepted.
    pub async fn handle_selection(&self, chat: ChatId, token: &str, origin: Option<MessageId>) {
        if let Err(err) = self.try_selection(chat, token, origin).await {
            self.recover(chat, err).await;
        }
    }

    /// Drop every group and the scratch storage of a conversation.
    pub fn cleanup(&self, chat: ChatId) {
        self.store.cleanup(chat);
    }

    // ────────────────────────────────────────────────────────────────
    // Uploads
    // ────────────────────────────────────────────────────────────────

    async fn try_image(&self, chat: ChatId, upload: &Upload, arrival: Instant) -> Result<()> {
        if !upload.is_image() {
            info!("Rejected non-image upload {:?} in chat {}", upload.mime_type, chat);
            self.transport.send_text(chat, prompts::NOT_AN_IMAGE).await?;
            return Ok(());
        }
        if upload.size > self.max_upload_bytes {
            info!("Rejected {} byte upload in chat {}", upload.size, chat);
            self.transport
                .send_text(chat, &prompts::too_large(megabytes(self.max_upload_bytes)))
                .await?;
            return Ok(());
        }

        let admission = self
            .store
            .with_conversation(chat, |conversation| {
                self.aggregator.admit(conversation, chat, upload, arrival)
            })?;
        info!(
            "Added image to group_id={}, total images: {}",
            admission.group, admission.images
        );

        if admission.prompt_crop {
            self.transport
                .send_prompt(chat, &prompts::crop(admission.group))
                .await?;
        }
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────
    // Selections
    // ────────────────────────────────────────────────────────────────

    async fn try_selection(
        &self,
        chat: ChatId,
        token: &str,
        origin: Option<MessageId>,
    ) -> Result<()> {
        let event = match SelectionEvent::parse(token) {
            Ok(event) => event,
            Err(err) => return self.reject(chat, err).await,
        };
        info!("Chat {} selected {}", chat, event.token());

        let group = event.group();
        let applied = self
            .store
            .with_existing(chat, |conversation| apply(conversation, &event))
            .unwrap_or_else(|| Err(SelectionError::StaleGroup(group.to_string())));

        let step = match applied {
            Ok(step) => step,
            Err(SelectionError::StaleGroup(_)) if self.store.was_retired(chat, &group) => {
                return self.reject(chat, SelectionError::Duplicate(group.to_string())).await;
            }
            Err(err) => return self.reject(chat, err).await,
        };

        if let Some(message) = origin {
            if let Err(err) = self.transport.delete_message(chat, message).await {
                warn!("Failed to delete prompt message {}: {:#}", message, err);
            }
        }

        match step {
            Step::Prompt(prompt) => {
                debug!("Prompting chat {} with {:?}", chat, prompt.text);
                self.transport.send_prompt(chat, &prompt).await?;
            }
            Step::Dispatch(job) => self.dispatch(job).await?,
            Step::Nothing => {}
        }
        Ok(())
    }

    async fn reject(&self, chat: ChatId, err: SelectionError) -> Result<()> {
        if !err.is_fatal() {
            debug!("Chat {}: {}", chat, err);
            return Ok(());
        }

        warn!("Chat {}: {}", chat, err);
        let reply = match err {
            SelectionError::StaleGroup(_) => prompts::NO_IMAGES,
            _ => prompts::INVALID_SELECTION,
        };
        self.store.cleanup(chat);
        self.transport.send_text(chat, reply).await?;
        Ok(())
    }

    async fn dispatch(&self, job: DispatchJob) -> Result<()> {
        let (chat, group) = (job.chat, job.group);
        info!("Dispatching group {} with {} image(s)", group, job.images.len());

        let outcome = dispatch::run(&self.transport, &self.assets, job).await;
        self.store.retire(chat, group);

        match outcome? {
            DispatchOutcome::DownloadFailed => {
                warn!("Group {} aborted by a failed download", group)
            }
            outcome => info!("Group {} processed: {}", group, outcome.processed()),
        }
        Ok(())
    }

    /// Last-resort handler: log, apologise and release everything.
    async fn recover(&self, chat: ChatId, err: anyhow::Error) {
        handle_error(err.context(format!("workflow failed for chat {chat}")));
        self.store.cleanup(chat);
        if let Err(err) = self.transport.send_text(chat, prompts::INTERNAL_ERROR).await {
            handle_error(err.context("failed to send error reply"));
        }
    }
}

/// Run the transition for `event` while the conversation is locked.
fn apply(
    conversation: &mut ConversationState,
    event: &SelectionEvent,
) -> Result<Step, SelectionError> {
    let id = event.group();
    let group = conversation
        .groups
        .get_mut(&id)
        .ok_or_else(|| SelectionError::StaleGroup(id.to_string()))?;

    let step = match machine::transition(group, event)? {
        Effect::PromptCrop => Step::Prompt(prompts::crop(id)),
        Effect::PromptLogo => Step::Prompt(prompts::logo(id)),
        Effect::PromptPosition { logo } => Step::Prompt(prompts::position(id, logo)),
        Effect::PromptOpacity { logo } => Step::Prompt(prompts::opacity(id, logo)),
        Effect::Dispatch(selection) => {
            let chat = group.chat;
            let images = group.images().to_vec();
            if conversation.current == Some(id) {
                conversation.current = None;
            }
            Step::Dispatch(DispatchJob {
                chat,
                group: id,
                images,
                selection,
                scratch: conversation.scratch_handle(),
            })
        }
        Effect::Nothing => Step::Nothing,
    };
    Ok(step)
}
