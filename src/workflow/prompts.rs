//! Button prompts for each step of the selection sequence.

use crate::{
    common::OPACITY_CHOICES,
    models::{Anchor, CropPolicy, GroupId, LogoChoice, Opacity, SelectionEvent},
    transport::{Button, Prompt},
};

pub const GREETING: &str = "I am an image editing bot. \
    Send or forward photos and I will process them for you!\n\
    You will be able to choose how to crop them and which logo to add.";
pub const NOT_AN_IMAGE: &str = "Please send or forward an image file!";
pub const PLEASE_WAIT: &str = "Please wait a moment...";
pub const INVALID_SELECTION: &str = "Invalid selection!";
pub const NO_IMAGES: &str = "No images to process, please send images again!";
pub const DOWNLOAD_FAILED: &str = "Error downloading image file. Please try again!";
pub const INTERNAL_ERROR: &str = "An error occurred. Please try again later!";

const BACK: &str = "Back";

pub fn too_large(limit_mb: u64) -> String {
    format!("Image file is too large (max {limit_mb}MB)!")
}

pub fn processing_failed(output_filename: &str, reason: &str) -> String {
    format!("Error processing image {output_filename}: {reason}")
}

fn button(label: impl Into<String>, event: SelectionEvent) -> Button {
    Button {
        label: label.into(),
        token: event.token(),
    }
}

pub fn crop(group: GroupId) -> Prompt {
    Prompt {
        text: "CHOOSE IMAGE RATIO:".to_string(),
        buttons: CropPolicy::ALL
            .into_iter()
            .map(|policy| button(policy.label(), SelectionEvent::CropSelected { policy, group }))
            .collect(),
    }
}

pub fn logo(group: GroupId) -> Prompt {
    let mut buttons: Vec<Button> = LogoChoice::ALL
        .into_iter()
        .map(|logo| button(logo.label(), SelectionEvent::LogoSelected { logo, group }))
        .collect();
    buttons.push(button(BACK, SelectionEvent::BackToCrop { group }));
    Prompt {
        text: "CHOOSE LOGO:".to_string(),
        buttons,
    }
}

pub fn position(group: GroupId, logo: LogoChoice) -> Prompt {
    let mut buttons: Vec<Button> = Anchor::ALL
        .into_iter()
        .map(|anchor| {
            button(
                anchor.label(),
                SelectionEvent::PositionSelected { anchor, group, logo },
            )
        })
        .collect();
    buttons.push(button(BACK, SelectionEvent::BackToLogo { group }));
    Prompt {
        text: "CHOOSE LOGO POSITION:".to_string(),
        buttons,
    }
}

pub fn opacity(group: GroupId, logo: LogoChoice) -> Prompt {
    let mut buttons: Vec<Button> = OPACITY_CHOICES
        .iter()
        .filter_map(|value| Opacity::new(*value))
        .map(|opacity| {
            let label = if opacity.is_opaque() {
                "Sharp 100%".to_string()
            } else {
                format!("Opacity {}%", opacity.percent())
            };
            button(label, SelectionEvent::OpacitySelected { opacity, group, logo })
        })
        .collect();
    buttons.push(button(BACK, SelectionEvent::BackToPosition { group }));
    Prompt {
        text: "CHOOSE OPACITY FOR THE CENTERED LOGO:".to_string(),
        buttons,
    }
}
