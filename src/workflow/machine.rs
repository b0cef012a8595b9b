//! Selection state machine - advances one media group per user event
//!
//! Transitions are synchronous and run while the conversation entry is
//! locked. They return an [`Effect`] that the caller performs after the lock
//! is released.

use crate::{
    common::errors::SelectionError,
    models::{Anchor, GroupState, LogoChoice, MediaGroup, Opacity, Selection, SelectionEvent},
};

/// What the caller must do after a transition is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    PromptCrop,
    PromptLogo,
    PromptPosition { logo: LogoChoice },
    PromptOpacity { logo: LogoChoice },
    Dispatch(Selection),
    /// The event was absorbed without anything to show.
    Nothing,
}

pub fn transition(
    group: &mut MediaGroup,
    event: &SelectionEvent,
) -> Result<Effect, SelectionError> {
    if group.processed() {
        return Err(SelectionError::Duplicate(group.id.to_string()));
    }

    let (next, effect) = match (group.state, *event) {
        (GroupState::AwaitingCrop, SelectionEvent::CropSelected { policy, .. }) => {
            (GroupState::AwaitingLogo { crop: policy }, Effect::PromptLogo)
        }
        // A second crop answer while the logo prompt is up just replaces the crop.
        (GroupState::AwaitingLogo { .. }, SelectionEvent::CropSelected { policy, .. }) => {
            (GroupState::AwaitingLogo { crop: policy }, Effect::Nothing)
        }
        (GroupState::AwaitingLogo { crop }, SelectionEvent::LogoSelected { logo, .. }) => {
            if logo == LogoChoice::None {
                let selection = Selection {
                    crop,
                    logo,
                    anchor: None,
                    opacity: Opacity::OPAQUE,
                };
                (GroupState::Dispatching(selection), Effect::Dispatch(selection))
            } else {
                (GroupState::AwaitingPosition { crop, logo }, Effect::PromptPosition { logo })
            }
        }
        (GroupState::AwaitingLogo { .. }, SelectionEvent::BackToCrop { .. }) => {
            (GroupState::AwaitingCrop, Effect::PromptCrop)
        }
        (
            GroupState::AwaitingPosition { crop, logo },
            SelectionEvent::PositionSelected {
                anchor,
                logo: claimed,
                ..
            },
        ) => {
            warn_on_logo_mismatch(group, logo, claimed);
            if anchor == Anchor::Center {
                (GroupState::AwaitingOpacity { crop, logo }, Effect::PromptOpacity { logo })
            } else {
                let selection = Selection {
                    crop,
                    logo,
                    anchor: Some(anchor),
                    opacity: Opacity::OPAQUE,
                };
                (GroupState::Dispatching(selection), Effect::Dispatch(selection))
            }
        }
        (GroupState::AwaitingPosition { crop, .. }, SelectionEvent::BackToLogo { .. }) => {
            (GroupState::AwaitingLogo { crop }, Effect::PromptLogo)
        }
        (
            GroupState::AwaitingOpacity { crop, logo },
            SelectionEvent::OpacitySelected {
                opacity,
                logo: claimed,
                ..
            },
        ) => {
            warn_on_logo_mismatch(group, logo, claimed);
            let selection = Selection {
                crop,
                logo,
                anchor: Some(Anchor::Center),
                opacity,
            };
            (GroupState::Dispatching(selection), Effect::Dispatch(selection))
        }
        (GroupState::AwaitingOpacity { crop, logo }, SelectionEvent::BackToPosition { .. }) => {
            (GroupState::AwaitingPosition { crop, logo }, Effect::PromptPosition { logo })
        }
        (state, event) => {
            return Err(SelectionError::OutOfOrder {
                group: group.id.to_string(),
                event: event.name(),
                state: state.name(),
            });
        }
    };

    debug!(
        "Group {}: {} -> {} on {}",
        group.id,
        group.state.name(),
        next.name(),
        event.name()
    );
    group.state = next;
    Ok(effect)
}

fn warn_on_logo_mismatch(group: &MediaGroup, stored: LogoChoice, claimed: LogoChoice) {
    if stored != claimed {
        warn!(
            "Group {} event names logo {} but {} was selected, keeping {}",
            group.id,
            claimed.token(),
            stored.token(),
            stored.token()
        );
    }
}
