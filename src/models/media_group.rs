use crate::models::{
    event::GroupId,
    image_item::ImageItem,
    selection::{CropPolicy, LogoChoice, Selection},
};

pub type ChatId = i64;

/// Where a group sits in the crop → logo → position → opacity sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupState {
    CollectingImages,
    AwaitingCrop,
    AwaitingLogo {
        crop: CropPolicy,
    },
    AwaitingPosition {
        crop: CropPolicy,
        logo: LogoChoice,
    },
    AwaitingOpacity {
        crop: CropPolicy,
        logo: LogoChoice,
    },
    Dispatching(Selection),
}

impl GroupState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CollectingImages => "collecting-images",
            Self::AwaitingCrop => "awaiting-crop",
            Self::AwaitingLogo { .. } => "awaiting-logo",
            Self::AwaitingPosition { .. } => "awaiting-position",
            Self::AwaitingOpacity { .. } => "awaiting-opacity",
            Self::Dispatching(_) => "dispatching",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaGroup {
    pub id: GroupId,
    pub chat: ChatId,
    images: Vec<ImageItem>,
    pub state: GroupState,
}

impl MediaGroup {
    /// A group always starts with its first image.
    pub fn new(id: GroupId, chat: ChatId, first: ImageItem) -> Self {
        Self {
            id,
            chat,
            images: vec![first],
            state: GroupState::CollectingImages,
        }
    }

    /// Append an image; refused once the group is dispatched.
    pub fn push(&mut self, image: ImageItem) -> bool {
        if self.processed() {
            return false;
        }
        self.images.push(image);
        true
    }

    pub fn images(&self) -> &[ImageItem] {
        &self.images
    }

    pub fn crop_prompted(&self) -> bool {
        !matches!(self.state, GroupState::CollectingImages)
    }

    pub fn logo_prompted(&self) -> bool {
        matches!(
            self.state,
            GroupState::AwaitingLogo { .. }
                | GroupState::AwaitingPosition { .. }
                | GroupState::AwaitingOpacity { .. }
                | GroupState::Dispatching(_)
        )
    }

    pub fn processed(&self) -> bool {
        matches!(self.state, GroupState::Dispatching(_))
    }

    pub fn crop(&self) -> Option<CropPolicy> {
        match self.state {
            GroupState::AwaitingLogo { crop }
            | GroupState::AwaitingPosition { crop, .. }
            | GroupState::AwaitingOpacity { crop, .. } => Some(crop),
            GroupState::Dispatching(selection) => Some(selection.crop),
            _ => None,
        }
    }

    pub fn logo(&self) -> Option<LogoChoice> {
        match self.state {
            GroupState::AwaitingPosition { logo, .. }
            | GroupState::AwaitingOpacity { logo, .. } => Some(logo),
            GroupState::Dispatching(selection) => Some(selection.logo),
            _ => None,
        }
    }
}
