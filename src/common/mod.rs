pub mod errors;

use std::time::Duration;

/// Lower bound applied to the limiting side of every processed canvas.
pub const MIN_DIM: u32 = 1200;

/// Upper bound applied to the limiting side of every processed canvas.
pub const MAX_DIM: u32 = 1920;

pub const JPEG_QUALITY: u8 = 98;

pub const DEFAULT_IDLE_GAP: Duration = Duration::from_secs(5);

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 30 * 1024 * 1024;

/// Opacity values offered for a centered watermark.
pub const OPACITY_CHOICES: &[f32] = &[0.65, 0.75, 0.85, 1.0];

/// How many retired group ids a conversation remembers for duplicate detection.
pub const RETIRED_HISTORY: usize = 16;

/// How long a chat's retired group ids are kept once it goes quiet.
pub const RETIRED_TTL: Duration = Duration::from_secs(10 * 60);

pub const VALID_IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "jfif", "jpe", "png", "tif", "tiff", "webp", "bmp", "gif", "heic", "heif",
];

pub const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1",
];
