mod apply;
mod config;
mod exif_reader;
mod metadata;
mod planner;
mod probe;
mod resolver;
mod sanitize;
mod timestamp;
mod video_reader;

pub use apply::{apply_plan, apply_plan_with_progress, validate_targets, ApplyResult, CollisionError};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
};
pub use exif_reader::ExifTagReader;
pub use metadata::{
    DateSource, MediaDateRecord, MediaFile, MediaKind, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS,
};
pub use planner::{
    format_counter, generate_plan, target_file_name, PlanError, PlanOptions, RenameCandidate,
    RenamePlan, RenameStats, DEFAULT_START, DEFAULT_WIDTH, MAX_WIDTH,
};
pub use probe::{ImageField, ImageTagReader, VideoProperty, VideoPropertyReader};
pub use resolver::{DateResolver, DateStrategy, ImageFieldStrategy, Resolution, VideoCreatedStrategy};
pub use sanitize::{sanitize_property_value, validate_prefix, PrefixError};
pub use timestamp::{parse_ascii_datetime, parse_local_datetime};
pub use video_reader::SystemVideoReader;
