//! Processors module - the image transform engine and startup setup
//!
//! This module contains the following submodules:
//! - `geometry`: crop policy and bounded resize planning
//! - `watermark`: watermark scaling, opacity and compositing
//! - `image`: decode → crop/resize → watermark → JPEG encode
//! - `assets`: named watermark asset lookup
//! - `setup`: logger, folders and asset check at startup

pub mod assets;
pub mod geometry;
pub mod image;
pub mod setup;
pub mod watermark;

pub use self::image::{Rendered, transform, transform_file};
pub use assets::LogoAssets;
pub use watermark::Watermark;
