use crate::common::errors::SelectionError;
use crate::models::selection::{Anchor, CropPolicy, LogoChoice, Opacity};
use arrayvec::ArrayString;
use std::fmt;
use uuid::Uuid;

/// Conversation-unique id of a media group; also embedded in selection tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(ArrayString<32>);

impl GroupId {
    pub fn generate() -> Self {
        let mut buffer = Uuid::encode_buffer();
        let mut id = ArrayString::new();
        id.push_str(Uuid::new_v4().simple().encode_lower(&mut buffer));
        Self(id)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.contains(':') {
            return None;
        }
        ArrayString::from(raw).ok().map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user interface event, decoded from its token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionEvent {
    CropSelected {
        policy: CropPolicy,
        group: GroupId,
    },
    LogoSelected {
        logo: LogoChoice,
        group: GroupId,
    },
    BackToCrop {
        group: GroupId,
    },
    PositionSelected {
        anchor: Anchor,
        group: GroupId,
        logo: LogoChoice,
    },
    OpacitySelected {
        opacity: Opacity,
        group: GroupId,
        logo: LogoChoice,
    },
    BackToLogo {
        group: GroupId,
    },
    BackToPosition {
        group: GroupId,
    },
}

impl SelectionEvent {
    pub fn parse(token: &str) -> Result<Self, SelectionError> {
        let invalid =
            |reason: String| SelectionError::InvalidSelection(format!("{token}: {reason}"));
        let fields: Vec<&str> = token.trim().split(':').collect();
        let group = |raw: &str| {
            GroupId::parse(raw).ok_or_else(|| invalid(format!("bad group id `{raw}`")))
        };

        match fields.as_slice() {
            ["crop", policy, id] => Ok(Self::CropSelected {
                policy: policy.parse().map_err(invalid)?,
                group: group(*id)?,
            }),
            ["logo", logo, id] => Ok(Self::LogoSelected {
                logo: logo.parse().map_err(invalid)?,
                group: group(*id)?,
            }),
            ["position", anchor, id, logo] => Ok(Self::PositionSelected {
                anchor: anchor.parse().map_err(invalid)?,
                group: group(*id)?,
                logo: logo.parse().map_err(invalid)?,
            }),
            ["opacity", opacity, id, logo] => Ok(Self::OpacitySelected {
                opacity: opacity.parse().map_err(invalid)?,
                group: group(*id)?,
                logo: logo.parse().map_err(invalid)?,
            }),
            ["back", "to-crop", id] => Ok(Self::BackToCrop { group: group(*id)? }),
            ["back", "to-logo", id] => Ok(Self::BackToLogo { group: group(*id)? }),
            ["back", "to-position", id] => Ok(Self::BackToPosition { group: group(*id)? }),
            _ => Err(invalid("unrecognised layout".to_string())),
        }
    }

    pub fn token(&self) -> String {
        match self {
            Self::CropSelected { policy, group } => format!("crop:{}:{group}", policy.token()),
            Self::LogoSelected { logo, group } => format!("logo:{}:{group}", logo.token()),
            Self::BackToCrop { group } => format!("back:to-crop:{group}"),
            Self::PositionSelected {
                anchor,
                group,
                logo,
            } => format!("position:{}:{group}:{}", anchor.token(), logo.token()),
            Self::OpacitySelected {
                opacity,
                group,
                logo,
            } => format!("opacity:{opacity}:{group}:{}", logo.token()),
            Self::BackToLogo { group } => format!("back:to-logo:{group}"),
            Self::BackToPosition { group } => format!("back:to-position:{group}"),
        }
    }

    pub fn group(&self) -> GroupId {
        match *self {
            Self::CropSelected { group, .. }
            | Self::LogoSelected { group, .. }
            | Self::BackToCrop { group }
            | Self::PositionSelected { group, .. }
            | Self::OpacitySelected { group, .. }
            | Self::BackToLogo { group }
            | Self::BackToPosition { group } => group,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CropSelected { .. } => "crop",
            Self::LogoSelected { .. } => "logo",
            Self::BackToCrop { .. } => "back-to-crop",
            Self::PositionSelected { .. } => "position",
            Self::OpacitySelected { .. } => "opacity",
            Self::BackToLogo { .. } => "back-to-logo",
            Self::BackToPosition { .. } => "back-to-position",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gid() -> GroupId {
        GroupId::parse("a1b2c3").unwrap()
    }

    #[test]
    fn generated_ids_are_distinct_and_token_safe() {
        let (a, b) = (GroupId::generate(), GroupId::generate());
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert_eq!(GroupId::parse(a.as_str()), Some(a));
    }

    #[test]
    fn parses_every_event_kind() {
        assert_eq!(
            SelectionEvent::parse("crop:ratio4x5:a1b2c3"),
            Ok(SelectionEvent::CropSelected {
                policy: CropPolicy::Ratio4x5,
                group: gid()
            })
        );
        assert_eq!(
            SelectionEvent::parse("position:middle-bottom:a1b2c3:AI.png"),
            Ok(SelectionEvent::PositionSelected {
                anchor: Anchor::MiddleBottom,
                group: gid(),
                logo: LogoChoice::Ai
            })
        );
        assert_eq!(
            SelectionEvent::parse("back:to-position:a1b2c3"),
            Ok(SelectionEvent::BackToPosition { group: gid() })
        );
        let opacity = SelectionEvent::parse("opacity:0.85:a1b2c3:gd").unwrap();
        assert_eq!(opacity.group(), gid());
        assert_eq!(opacity.token(), "opacity:0.85:a1b2c3:gd");
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in [
            "",
            "crop:square",
            "crop:circle:a1b2c3",
            "logo:kenh14:",
            "opacity:1.5:a1b2c3:gd",
            "back:to-nowhere:a1b2c3",
            "position:center:a1b2c3",
        ] {
            assert!(
                matches!(SelectionEvent::parse(token), Err(SelectionError::InvalidSelection(_))),
                "{token} should be rejected"
            );
        }
    }
}
