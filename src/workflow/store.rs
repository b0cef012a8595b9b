use crate::common::{RETIRED_HISTORY, RETIRED_TTL};
use crate::models::{ChatId, GroupId, MediaGroup};
use anyhow::{Context, Result};
use dashmap::DashMap;
use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, Instant},
};
use tempfile::TempDir;

/// Everything one conversation owns: its scratch directory and its groups.
#[derive(Debug)]
pub struct ConversationState {
    scratch: Arc<TempDir>,
    pub(crate) groups: HashMap<GroupId, MediaGroup>,
    pub(crate) current: Option<GroupId>,
    pub(crate) last_arrival: Option<Instant>,
    sequence: u64,
}

impl ConversationState {
    fn create(scratch_root: &Path, chat: ChatId) -> Result<Self> {
        let scratch = tempfile::Builder::new()
            .prefix(&format!("chat-{chat}-"))
            .tempdir_in(scratch_root)
            .with_context(|| format!("failed to create scratch dir in {:?}", scratch_root))?;
        debug!("Created scratch dir {:?} for chat {}", scratch.path(), chat);
        Ok(Self {
            scratch: Arc::new(scratch),
            groups: HashMap::new(),
            current: None,
            last_arrival: None,
            sequence: 0,
        })
    }

    pub fn scratch_path(&self) -> &Path {
        self.scratch.path()
    }

    /// Shared handle that keeps the scratch directory alive while held.
    pub fn scratch_handle(&self) -> Arc<TempDir> {
        Arc::clone(&self.scratch)
    }

    pub fn current_group(&self) -> Option<&MediaGroup> {
        self.current.and_then(|id| self.groups.get(&id))
    }

    pub fn group(&self, id: &GroupId) -> Option<&MediaGroup> {
        self.groups.get(id)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub(crate) fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Per-conversation state keyed by chat id. No state is shared across chats.
#[derive(Debug)]
pub struct ConversationStore {
    scratch_root: PathBuf,
    conversations: DashMap<ChatId, ConversationState>,
    /// Recently retired group ids per chat, with the time of the last retirement.
    retired: DashMap<ChatId, (Instant, VecDeque<GroupId>)>,
    retired_ttl: Duration,
}

impl ConversationStore {
    pub fn new(scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            conversations: DashMap::new(),
            retired: DashMap::new(),
            retired_ttl: RETIRED_TTL,
        }
    }

    /// How long a chat's retired ids are remembered after its last retirement.
    pub fn with_retired_ttl(mut self, ttl: Duration) -> Self {
        self.retired_ttl = ttl;
        self
    }

    /// Run `f` on the conversation, creating it (and its scratch dir) lazily.
    pub fn with_conversation<R>(
        &self,
        chat: ChatId,
        f: impl FnOnce(&mut ConversationState) -> R,
    ) -> Result<R> {
        let mut entry = self
            .conversations
            .entry(chat)
            .or_try_insert_with(|| ConversationState::create(&self.scratch_root, chat))?;
        Ok(f(entry.value_mut()))
    }

    /// Run `f` on the conversation only if it already exists.
    pub fn with_existing<R>(
        &self,
        chat: ChatId,
        f: impl FnOnce(&mut ConversationState) -> R,
    ) -> Option<R> {
        self.conversations
            .get_mut(&chat)
            .map(|mut entry| f(entry.value_mut()))
    }

    pub fn contains(&self, chat: ChatId) -> bool {
        self.conversations.contains_key(&chat)
    }

    pub fn group_count(&self, chat: ChatId) -> usize {
        self.with_existing(chat, |conversation| conversation.group_count())
            .unwrap_or(0)
    }

    pub fn scratch_path(&self, chat: ChatId) -> Option<PathBuf> {
        self.with_existing(chat, |conversation| conversation.scratch_path().to_path_buf())
    }

    /// Remove a finished group. The conversation and its scratch storage go
    /// with it once no groups remain.
    pub fn retire(&self, chat: ChatId, group: GroupId) {
        self.remember_retired(chat, group);
        let now_empty = self
            .with_existing(chat, |conversation| {
                conversation.groups.remove(&group);
                if conversation.current == Some(group) {
                    conversation.current = None;
                }
                conversation.groups.is_empty()
            })
            .unwrap_or(false);

        if now_empty {
            info!("No groups left for chat {}, releasing scratch storage", chat);
            self.cleanup(chat);
        }
    }

    pub fn was_retired(&self, chat: ChatId, group: &GroupId) -> bool {
        self.retired
            .get(&chat)
            .is_some_and(|entry| entry.1.contains(group))
    }

    /// Drop the conversation, its groups and (once no dispatch holds it) its
    /// scratch directory.
    pub fn cleanup(&self, chat: ChatId) {
        if let Some((_, conversation)) = self.conversations.remove(&chat) {
            debug!(
                "Cleaned up chat {} ({} group(s), scratch {:?})",
                chat,
                conversation.group_count(),
                conversation.scratch_path()
            );
        }
    }

    fn remember_retired(&self, chat: ChatId, group: GroupId) {
        let now = Instant::now();
        let ttl = self.retired_ttl;
        self.retired
            .retain(|_, (touched, _)| now.saturating_duration_since(*touched) <= ttl);

        let mut entry = self
            .retired
            .entry(chat)
            .or_insert_with(|| (now, VecDeque::new()));
        let (touched, history) = entry.value_mut();
        *touched = now;
        if history.len() == RETIRED_HISTORY {
            history.pop_front();
        }
        history.push_back(group);
    }
}
