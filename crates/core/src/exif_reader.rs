use crate::probe::{ImageField, ImageTagReader};
use anyhow::{anyhow, Context, Result};
use exif::{Exif, In, Reader, Tag, Value};
use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Reads date tags with kamadak-exif.
///
/// The resolver asks for `DateTimeOriginal` and then `DateTime` on the same
/// file, so the last parse is kept and reused while the path stays the same.
/// A failed parse is kept too and reported again without reopening the file.
#[derive(Default)]
pub struct ExifTagReader {
    last: RefCell<Option<ParsedExif>>,
}

struct ParsedExif {
    path: PathBuf,
    exif: Result<Exif, String>,
}

impl ParsedExif {
    fn load(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            exif: read_exif(path).map_err(|err| format!("{err:#}")),
        }
    }
}

impl ExifTagReader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ImageTagReader for ExifTagReader {
    fn resolve_image_field(&self, path: &Path, field: ImageField) -> Result<Option<Vec<u8>>> {
        let mut last = self.last.borrow_mut();
        if last.as_ref().is_some_and(|parsed| parsed.path != path) {
            *last = None;
        }
        let parsed = last.get_or_insert_with(|| ParsedExif::load(path));
        let exif = parsed.exif.as_ref().map_err(|message| anyhow!("{message}"))?;

        let Some(found) = exif.get_field(tag_for(field), In::PRIMARY) else {
            return Ok(None);
        };

        match &found.value {
            Value::Ascii(parts) => Ok(parts.first().cloned().filter(|raw| !raw.is_empty())),
            _ => Ok(None),
        }
    }
}

fn read_exif(path: &Path) -> Result<Exif> {
    let file = File::open(path)
        .with_context(|| format!("EXIF読み込み対象を開けませんでした: {}", path.display()))?;
    let mut buf = BufReader::new(file);
    Reader::new()
        .read_from_container(&mut buf)
        .with_context(|| format!("EXIFを解析できませんでした: {}", path.display()))
}

fn tag_for(field: ImageField) -> Tag {
    match field {
        ImageField::DateTimeOriginal => Tag::DateTimeOriginal,
        ImageField::DateTime => Tag::DateTime,
    }
}
