use anyhow::Result;
use std::ffi::OsStr;
use std::path::Path;

/// Embedded image tags that carry a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageField {
    /// Original capture time.
    DateTimeOriginal,
    /// Last modification, usually written by editing software.
    DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoProperty {
    MediaCreated,
}

/// Reads one embedded tag from an image file.
///
/// `Ok(None)` means the file was readable but the tag is absent. `Err` covers
/// everything else (unreadable file, no metadata container, corrupt data).
/// Implementations must release the file handle before returning.
pub trait ImageTagReader {
    fn resolve_image_field(&self, path: &Path, field: ImageField) -> Result<Option<Vec<u8>>>;
}

/// Queries a platform-level media property for a video file. The returned
/// string is passed through as reported and may carry formatting noise.
pub trait VideoPropertyReader {
    fn resolve_video_property(
        &self,
        directory: &Path,
        file_name: &OsStr,
        property: VideoProperty,
    ) -> Result<Option<String>>;
}
