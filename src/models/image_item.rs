use crate::utils::PathExt;
use std::path::{Path, PathBuf};

/// Opaque handle a transport hands out for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef(pub String);

/// An incoming upload as the transport describes it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file: FileRef,
    /// Original file name for documents; photos usually have none.
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub size: u64,
}

impl Upload {
    pub fn photo(file: FileRef, size: u64) -> Self {
        Self {
            file,
            file_name: None,
            mime_type: Some("image/jpeg".to_string()),
            size,
        }
    }

    /// A document upload. The MIME type is inferred from the name and stays
    /// unset for anything that does not look like an image.
    pub fn document(file: FileRef, file_name: impl Into<String>, size: u64) -> Self {
        let file_name = file_name.into();
        Self {
            file,
            mime_type: Path::new(&file_name).image_mime(),
            file_name: Some(file_name),
            size,
        }
    }

    /// Only uploads that declare an `image/*` type are accepted.
    pub fn is_image(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|mime| mime.starts_with("image/"))
    }
}

#[derive(Debug, Clone)]
pub struct ImageItem {
    pub file: FileRef,
    pub file_name: String,
    pub base_name: String,
    pub input_path: PathBuf,
    pub output_filename: String,
    pub output_path: PathBuf,
}

impl ImageItem {
    /// Derive storage paths for the `sequence`-th image of a conversation.
    pub fn new(upload: &Upload, scratch: &Path, sequence: u64) -> Self {
        let (file_name, base_name) = match upload.file_name.as_deref().map(sanitize) {
            Some(name) if !name.is_empty() => {
                let base = Path::new(&name)
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .filter(|stem| !stem.is_empty())
                    .unwrap_or("document")
                    .to_string();
                (name, base)
            }
            _ => (format!("input_{sequence}.jpg"), "photo".to_string()),
        };
        let output_filename = format!("{base_name}_edit.jpg");

        Self {
            file: upload.file.clone(),
            input_path: scratch.join(format!("{sequence:04}_{file_name}")),
            output_path: scratch.join(format!("{sequence:04}_{output_filename}")),
            file_name,
            base_name,
            output_filename,
        }
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_gets_generic_names() {
        let upload = Upload::photo(FileRef("f1".into()), 10);
        let item = ImageItem::new(&upload, Path::new("/tmp/s"), 3);
        assert_eq!(item.base_name, "photo");
        assert_eq!(item.output_filename, "photo_edit.jpg");
        assert_eq!(item.input_path, PathBuf::from("/tmp/s/0003_input_3.jpg"));
    }

    #[test]
    fn document_keeps_its_stem() {
        let upload = Upload::document(FileRef("f2".into()), "holiday.beach.HEIC", 10);
        let item = ImageItem::new(&upload, Path::new("/tmp/s"), 7);
        assert_eq!(item.base_name, "holiday.beach");
        assert_eq!(item.output_filename, "holiday.beach_edit.jpg");
        assert_eq!(item.output_path, PathBuf::from("/tmp/s/0007_holiday.beach_edit.jpg"));
    }

    #[test]
    fn path_separators_never_escape_scratch() {
        let upload = Upload::document(FileRef("f3".into()), "../../etc/passwd", 10);
        let item = ImageItem::new(&upload, Path::new("/tmp/s"), 1);
        assert_eq!(item.input_path.parent(), Some(Path::new("/tmp/s")));
    }

    #[test]
    fn non_image_mime_is_rejected() {
        let mut upload = Upload::document(FileRef("f4".into()), "notes.pdf", 10);
        assert_eq!(upload.mime_type, None);
        assert!(!upload.is_image());
        upload.mime_type = Some("application/pdf".into());
        assert!(!upload.is_image());
    }

    #[test]
    fn missing_mime_is_not_an_image() {
        let mut upload = Upload::document(FileRef("f5".into()), "Cover.PNG", 10);
        assert_eq!(upload.mime_type.as_deref(), Some("image/png"));
        assert!(upload.is_image());
        upload.mime_type = None;
        assert!(!upload.is_image());
        assert!(Upload::photo(FileRef("f6".into()), 10).is_image());
    }
}
