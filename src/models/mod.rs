pub mod event;
pub mod image_item;
pub mod media_group;
pub mod selection;

pub use event::{GroupId, SelectionEvent};
pub use image_item::{FileRef, ImageItem, Upload};
pub use media_group::{ChatId, GroupState, MediaGroup};
pub use selection::{Anchor, CropPolicy, LogoChoice, Opacity, Selection};
