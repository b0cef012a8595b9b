use crate::models::{ChatId, GroupId, GroupState, ImageItem, MediaGroup, Upload};
use crate::workflow::store::ConversationState;
use std::time::{Duration, Instant};

/// Where an accepted upload ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub group: GroupId,
    pub images: usize,
    /// Set exactly once per group, for the upload that opened it.
    pub prompt_crop: bool,
}

/// Folds uploads that arrive close together into one media group.
#[derive(Debug, Clone, Copy)]
pub struct GroupAggregator {
    idle_gap: Duration,
}

impl GroupAggregator {
    pub fn new(idle_gap: Duration) -> Self {
        Self { idle_gap }
    }

    pub fn idle_gap(&self) -> Duration {
        self.idle_gap
    }

    pub fn admit(
        &self,
        conversation: &mut ConversationState,
        chat: ChatId,
        upload: &Upload,
        arrival: Instant,
    ) -> Admission {
        let sequence = conversation.next_sequence();
        let item = ImageItem::new(upload, conversation.scratch_path(), sequence);

        let joined = self.joinable_group(conversation, arrival).filter(|id| {
            conversation
                .groups
                .get_mut(id)
                .is_some_and(|group| group.push(item.clone()))
        });
        conversation.last_arrival = Some(arrival);

        let id = match joined {
            Some(id) => id,
            None => open_group(conversation, chat, item),
        };

        let mut admission = Admission {
            group: id,
            images: 0,
            prompt_crop: false,
        };
        if let Some(group) = conversation.groups.get_mut(&id) {
            admission.images = group.images().len();
            if !group.crop_prompted() {
                group.state = GroupState::AwaitingCrop;
                admission.prompt_crop = true;
            }
        }
        admission
    }

    /// The current group, if it is still open and the gap since the previous
    /// upload is within the idle window.
    fn joinable_group(
        &self,
        conversation: &ConversationState,
        arrival: Instant,
    ) -> Option<GroupId> {
        let current = conversation.current_group().filter(|group| !group.processed())?;
        let last = conversation.last_arrival?;
        (arrival.saturating_duration_since(last) <= self.idle_gap).then_some(current.id)
    }
}

fn open_group(conversation: &mut ConversationState, chat: ChatId, item: ImageItem) -> GroupId {
    let id = GroupId::generate();
    info!("Created new media group {} for chat {}", id, chat);
    conversation.groups.insert(id, MediaGroup::new(id, chat, item));
    conversation.current = Some(id);
    id
}
