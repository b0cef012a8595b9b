use crate::models::{Anchor, LogoChoice, Opacity};
use crate::workflow::processors::watermark::Watermark;
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Resolved locations of the named watermark assets.
#[derive(Debug, Clone)]
pub struct LogoAssets {
    dir: PathBuf,
}

impl LogoAssets {
    /// Fails unless every named asset exists under `dir`.
    pub fn verify(dir: impl Into<PathBuf>) -> Result<Self> {
        let assets = Self { dir: dir.into() };
        let missing: Vec<String> = LogoChoice::WATERMARKS
            .into_iter()
            .filter_map(|logo| assets.path(logo))
            .filter(|path| !path.is_file())
            .map(|path| path.display().to_string())
            .collect();

        if !missing.is_empty() {
            bail!("logo file(s) do not exist: {}", missing.join(", "));
        }
        Ok(assets)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, logo: LogoChoice) -> Option<PathBuf> {
        logo.asset_file().map(|file| self.dir.join(file))
    }

    /// Watermark descriptors for a selection; `none` yields an empty list.
    pub fn watermarks(
        &self,
        logo: LogoChoice,
        anchor: Option<Anchor>,
        opacity: Opacity,
    ) -> Vec<Watermark> {
        match (self.path(logo), anchor) {
            (Some(path), Some(anchor)) => vec![Watermark {
                path,
                identity: logo,
                anchor,
                opacity,
            }],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_reports_every_missing_asset() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("disoi.png"), b"x").unwrap();
        let err = LogoAssets::verify(dir.path()).unwrap_err().to_string();
        assert!(err.contains("kenh14.png") && err.contains("gd.png") && err.contains("AI.png"));
        assert!(!err.contains("disoi.png"));
    }

    #[test]
    fn no_logo_means_no_watermarks() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["disoi.png", "kenh14.png", "gd.png", "AI.png"] {
            std::fs::write(dir.path().join(file), b"x").unwrap();
        }
        let assets = LogoAssets::verify(dir.path()).unwrap();
        let none = assets.watermarks(LogoChoice::None, Some(Anchor::Center), Opacity::OPAQUE);
        assert!(none.is_empty());

        let marks = assets.watermarks(LogoChoice::Ai, Some(Anchor::TopRight), Opacity::OPAQUE);
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].path, dir.path().join("AI.png"));
    }
}
