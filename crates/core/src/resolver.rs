use crate::exif_reader::ExifTagReader;
use crate::metadata::{DateSource, MediaDateRecord, MediaFile, MediaKind};
use crate::probe::{ImageField, ImageTagReader, VideoProperty, VideoPropertyReader};
use crate::sanitize::sanitize_property_value;
use crate::timestamp::{parse_ascii_datetime, parse_local_datetime};
use crate::video_reader::SystemVideoReader;
use chrono::{DateTime, Local};
use log::debug;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found(DateTime<Local>),
    NotFound,
}

impl From<Option<DateTime<Local>>> for Resolution {
    fn from(value: Option<DateTime<Local>>) -> Self {
        value.map_or(Self::NotFound, Self::Found)
    }
}

/// One link of the fallback chain.
pub trait DateStrategy {
    fn source(&self) -> DateSource;
    fn applies_to(&self, kind: MediaKind) -> bool;
    fn resolve(&self, file: &MediaFile) -> Resolution;
}

pub struct ImageFieldStrategy {
    reader: Rc<dyn ImageTagReader>,
    field: ImageField,
}

impl ImageFieldStrategy {
    pub fn new(reader: Rc<dyn ImageTagReader>, field: ImageField) -> Self {
        Self { reader, field }
    }
}

impl DateStrategy for ImageFieldStrategy {
    fn source(&self) -> DateSource {
        match self.field {
            ImageField::DateTimeOriginal => DateSource::ExifDateTimeOriginal,
            ImageField::DateTime => DateSource::ExifDateTime,
        }
    }

    fn applies_to(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Image
    }

    fn resolve(&self, file: &MediaFile) -> Resolution {
        match self.reader.resolve_image_field(&file.path, self.field) {
            Ok(Some(raw)) => {
                let parsed = parse_ascii_datetime(&raw);
                if parsed.is_none() {
                    debug!(
                        "{:?} を日時として解釈できません: {} ({:?})",
                        self.field,
                        file.path.display(),
                        String::from_utf8_lossy(&raw)
                    );
                }
                parsed.into()
            }
            Ok(None) => Resolution::NotFound,
            Err(err) => {
                debug!("{:?} 読み込み失敗: {err:#}", self.field);
                Resolution::NotFound
            }
        }
    }
}

pub struct VideoCreatedStrategy {
    reader: Rc<dyn VideoPropertyReader>,
}

impl VideoCreatedStrategy {
    pub fn new(reader: Rc<dyn VideoPropertyReader>) -> Self {
        Self { reader }
    }
}

impl DateStrategy for VideoCreatedStrategy {
    fn source(&self) -> DateSource {
        DateSource::VideoMediaCreated
    }

    fn applies_to(&self, kind: MediaKind) -> bool {
        kind == MediaKind::Video
    }

    fn resolve(&self, file: &MediaFile) -> Resolution {
        let property = self.reader.resolve_video_property(
            file.directory(),
            file.file_name_os(),
            VideoProperty::MediaCreated,
        );
        match property {
            Ok(Some(raw)) => {
                let cleaned = sanitize_property_value(&raw);
                let parsed = parse_local_datetime(&cleaned);
                if parsed.is_none() {
                    debug!(
                        "作成日時を解釈できません: {} ({raw:?})",
                        file.path.display()
                    );
                }
                parsed.into()
            }
            Ok(None) => Resolution::NotFound,
            Err(err) => {
                debug!("動画メタデータ読み込み失敗: {err:#}");
                Resolution::NotFound
            }
        }
    }
}

/// Walks the strategies in order and takes the first hit. When nothing
/// matches, the filesystem modification time is used, so resolution never
/// fails.
pub struct DateResolver {
    strategies: Vec<Box<dyn DateStrategy>>,
}

impl DateResolver {
    pub fn new(image: Rc<dyn ImageTagReader>, video: Rc<dyn VideoPropertyReader>) -> Self {
        let strategies: Vec<Box<dyn DateStrategy>> = vec![
            Box::new(ImageFieldStrategy::new(
                Rc::clone(&image),
                ImageField::DateTimeOriginal,
            )),
            Box::new(ImageFieldStrategy::new(image, ImageField::DateTime)),
            Box::new(VideoCreatedStrategy::new(video)),
        ];
        Self::with_strategies(strategies)
    }

    pub fn system() -> Self {
        Self::new(
            Rc::new(ExifTagReader::new()),
            Rc::new(SystemVideoReader::default()),
        )
    }

    pub fn with_strategies(strategies: Vec<Box<dyn DateStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn resolve(&self, file: MediaFile) -> MediaDateRecord {
        let found = self
            .strategies
            .iter()
            .filter(|strategy| strategy.applies_to(file.kind))
            .find_map(|strategy| match strategy.resolve(&file) {
                Resolution::Found(date) => Some((date, strategy.source())),
                Resolution::NotFound => None,
            });

        let (date, source) = found.unwrap_or_else(|| {
            debug!("メタデータなし、更新日時を使用: {}", file.path.display());
            (file.modified, DateSource::FileModified)
        });

        MediaDateRecord { file, date, source }
    }
}
