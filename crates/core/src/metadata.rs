use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classifies by extension, case-insensitively. Anything outside the
    /// allow-list is `None`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.');
        if IMAGE_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
        {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
        {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| Self::from_extension(&ext.to_string_lossy()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateSource {
    ExifDateTimeOriginal,
    ExifDateTime,
    VideoMediaCreated,
    FileModified,
}

impl DateSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::ExifDateTimeOriginal => "exif:original",
            Self::ExifDateTime => "exif:modified",
            Self::VideoMediaCreated => "video:created",
            Self::FileModified => "file:mtime",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    pub path: PathBuf,
    pub extension: String,
    pub kind: MediaKind,
    pub modified: DateTime<Local>,
}

impl MediaFile {
    /// Builds a reference from a path on disk. Returns `Ok(None)` for files
    /// whose extension is not on the allow-list.
    pub fn from_path(path: &Path) -> Result<Option<Self>> {
        let Some(kind) = MediaKind::from_path(path) else {
            return Ok(None);
        };
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .with_context(|| format!("更新日時を取得できませんでした: {}", path.display()))?;

        Ok(Some(Self {
            path: path.to_path_buf(),
            extension: path
                .extension()
                .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default(),
            kind,
            modified: DateTime::from(modified),
        }))
    }

    /// Lossy form for display and logging. Renames go through `file_name_os`.
    pub fn file_name(&self) -> String {
        self.file_name_os().to_string_lossy().to_string()
    }

    pub fn file_name_os(&self) -> &OsStr {
        self.path.file_name().unwrap_or_default()
    }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDateRecord {
    pub file: MediaFile,
    pub date: DateTime<Local>,
    pub source: DateSource,
}

impl MediaDateRecord {
    pub fn is_fallback(&self) -> bool {
        self.source == DateSource::FileModified
    }
}
