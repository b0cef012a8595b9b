use std::path::Path;

use crate::common::VALID_IMAGE_EXTENSIONS;

pub trait PathExt {
    fn ext_lower(&self) -> String;
    fn is_image_file(&self) -> bool;
    /// `image/<ext>` for a known image extension.
    fn image_mime(&self) -> Option<String>;
}

impl PathExt for Path {
    fn ext_lower(&self) -> String {
        self.extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_default()
    }

    fn is_image_file(&self) -> bool {
        self.is_file() && VALID_IMAGE_EXTENSIONS.contains(&self.ext_lower().as_str())
    }

    fn image_mime(&self) -> Option<String> {
        let ext = self.ext_lower();
        VALID_IMAGE_EXTENSIONS
            .contains(&ext.as_str())
            .then(|| format!("image/{ext}"))
    }
}

/// Human-readable byte size for user-facing replies.
pub fn megabytes(bytes: u64) -> u64 {
    bytes / (1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(Path::new("a/B.JPG").ext_lower(), "jpg");
        assert_eq!(Path::new("noext").ext_lower(), "");
    }

    #[test]
    fn image_mime_follows_extension() {
        assert_eq!(Path::new("IMG_1.HEIC").image_mime().as_deref(), Some("image/heic"));
        assert_eq!(Path::new("notes.pdf").image_mime(), None);
        assert_eq!(Path::new("noext").image_mime(), None);
    }

    #[test]
    fn megabytes_rounds_down() {
        assert_eq!(megabytes(30 * 1024 * 1024 + 5), 30);
    }
}
