//! Screenshot persistence.
//!
//! Raw image payloads from the runner are decoded (so corrupt data fails
//! fast), re-encoded as PNG and written under
//! `<project_root>/<report_dir>/<area>/<uuid>.png`.
//!
//! Directories are shared by every stream. Creation is idempotent and files
//! are opened with `create_new`, so concurrent writers never collide without
//! any locking.

use crate::config::{Config, ConfigProvider};
use image::ImageFormat;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// File extension of every persisted artifact.
pub const ARTIFACT_EXTENSION: &str = "png";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ArtifactError>;

/// Destination area within the report directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactArea {
    Screenshots,
    FailureScreenshots,
}

impl ArtifactArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Screenshots => "screenshots",
            Self::FailureScreenshots => "failure_screenshots",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    report_root: PathBuf,
    screenshots_dir: PathBuf,
    failure_screenshots_dir: PathBuf,
}

impl ArtifactStore {
    pub fn from_config(config: &Config) -> Self {
        Self {
            report_root: config.report_root(),
            screenshots_dir: config.screenshots_dir.clone(),
            failure_screenshots_dir: config.failure_screenshots_dir.clone(),
        }
    }

    /// Store using the default report layout under the provider's project root.
    pub fn for_project(provider: &impl ConfigProvider) -> Self {
        Self::from_config(&Config::for_project(provider.project_root()))
    }

    pub fn area_dir(&self, area: ArtifactArea) -> PathBuf {
        let dir = match area {
            ArtifactArea::Screenshots => &self.screenshots_dir,
            ArtifactArea::FailureScreenshots => &self.failure_screenshots_dir,
        };
        self.report_root.join(dir)
    }

    /// Decode `raw`, write it as a uniquely named PNG and return its path.
    pub fn persist(&self, raw: &[u8], area: ArtifactArea) -> Result<PathBuf> {
        let image = image::load_from_memory(raw).map_err(ArtifactError::Decode)?;

        let dir = self.area_dir(area);
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.{ARTIFACT_EXTENSION}", Uuid::new_v4()));

        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        let mut writer = BufWriter::new(file);
        let written = image
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(ArtifactError::Encode)
            .and_then(|()| writer.flush().map_err(ArtifactError::from));

        if let Err(e) = written {
            // Don't leave a truncated file behind.
            drop(writer);
            fs::remove_file(&path).ok();
            return Err(e);
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn store_in(dir: &TempDir) -> ArtifactStore {
        ArtifactStore::from_config(&Config::for_project(dir.path()))
    }

    #[test]
    fn area_dirs_follow_report_layout() {
        let store = ArtifactStore::from_config(&Config::for_project("/proj"));
        assert_eq!(
            store.area_dir(ArtifactArea::Screenshots),
            PathBuf::from("/proj/reports/html-report/screenshots")
        );
        assert_eq!(
            store.area_dir(ArtifactArea::FailureScreenshots),
            PathBuf::from("/proj/reports/html-report/failure_screenshots")
        );
    }

    #[test]
    fn persist_writes_decodable_png() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let path = store.persist(&png_bytes(4, 3), ArtifactArea::Screenshots).unwrap();

        assert!(path.starts_with(store.area_dir(ArtifactArea::Screenshots)));
        assert_eq!(path.extension().unwrap(), ARTIFACT_EXTENSION);
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 3));
    }

    #[test]
    fn persist_generates_unique_names() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let bytes = png_bytes(1, 1);

        let a = store.persist(&bytes, ArtifactArea::Screenshots).unwrap();
        let b = store.persist(&bytes, ArtifactArea::Screenshots).unwrap();

        assert_ne!(a, b);
        assert_eq!(
            fs::read_dir(store.area_dir(ArtifactArea::Screenshots))
                .unwrap()
                .count(),
            2
        );
    }

    #[test]
    fn persist_rejects_corrupt_payload_without_writing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store
            .persist(b"definitely not an image", ArtifactArea::FailureScreenshots)
            .unwrap_err();

        assert!(matches!(err, ArtifactError::Decode(_)));
        assert!(!store.area_dir(ArtifactArea::FailureScreenshots).exists());
    }

    #[test]
    fn persist_reports_io_error_when_dir_is_a_file() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let report_root = dir.path().join("reports/html-report");
        fs::create_dir_all(&report_root).unwrap();
        fs::write(report_root.join("screenshots"), b"").unwrap();

        let err = store
            .persist(&png_bytes(1, 1), ArtifactArea::Screenshots)
            .unwrap_err();
        assert!(matches!(err, ArtifactError::Io(_)));
    }

    #[test]
    fn for_project_uses_provider_root() {
        let config = Config::for_project("/somewhere");
        let store = ArtifactStore::for_project(&config);
        assert!(store
            .area_dir(ArtifactArea::Screenshots)
            .starts_with("/somewhere"));
    }

    #[test]
    fn area_as_str() {
        assert_eq!(ArtifactArea::Screenshots.as_str(), "screenshots");
        assert_eq!(
            ArtifactArea::FailureScreenshots.as_str(),
            "failure_screenshots"
        );
    }
}
