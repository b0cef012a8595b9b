//! The seam between the selection workflow and whatever chat service
//! delivers messages, buttons and files.

pub mod console;

use crate::models::{ChatId, FileRef};
use anyhow::Result;
use std::{future::Future, path::Path};

pub type MessageId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub token: String,
}

/// A question with one button per answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub buttons: Vec<Button>,
}

impl Prompt {
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.buttons.iter().map(|button| button.token.as_str())
    }
}

pub trait Transport: Send + Sync {
    fn send_text(&self, chat: ChatId, text: &str) -> impl Future<Output = Result<MessageId>> + Send;

    fn send_prompt(
        &self,
        chat: ChatId,
        prompt: &Prompt,
    ) -> impl Future<Output = Result<MessageId>> + Send;

    fn delete_message(
        &self,
        chat: ChatId,
        message: MessageId,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fetch the uploaded file behind `file` into `dest`.
    fn download(&self, file: &FileRef, dest: &Path) -> impl Future<Output = Result<()>> + Send;

    fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        filename: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
