use crate::metadata::{MediaDateRecord, MediaFile, MediaKind};
use crate::resolver::DateResolver;
use crate::sanitize::{validate_prefix, PrefixError};
use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_START: u64 = 1;
pub const DEFAULT_WIDTH: usize = 3;
/// u64::MAX has 20 digits; anything past 18 is never useful for a folder.
pub const MAX_WIDTH: usize = 18;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("フォルダが存在しません: {}", .0.display())]
    MissingDirectory(PathBuf),
    #[error("桁数は1〜18で指定してください: {0}")]
    InvalidWidth(usize),
    #[error(transparent)]
    InvalidPrefix(#[from] PrefixError),
    #[error("連番が上限を超えました (開始 {start}, 件数 {count})")]
    CounterOverflow { start: u64, count: usize },
}

#[derive(Debug, Clone)]
pub struct PlanOptions {
    pub input: PathBuf,
    pub prefix: String,
    pub start: u64,
    pub width: usize,
    pub include_hidden: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            prefix: String::new(),
            start: DEFAULT_START,
            width: DEFAULT_WIDTH,
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameCandidate {
    pub counter: u64,
    pub original_path: PathBuf,
    pub target_path: PathBuf,
    pub record: MediaDateRecord,
}

impl RenameCandidate {
    pub fn original_name(&self) -> String {
        file_name_of(&self.original_path)
    }

    pub fn target_name(&self) -> String {
        file_name_of(&self.target_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenameStats {
    pub scanned_files: usize,
    pub media_files: usize,
    pub skipped_non_media: usize,
    pub skipped_hidden: usize,
    pub fallback_dates: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenamePlan {
    pub root: PathBuf,
    pub prefix: String,
    pub start: u64,
    pub width: usize,
    pub candidates: Vec<RenameCandidate>,
    pub stats: RenameStats,
}

pub fn generate_plan(options: &PlanOptions, resolver: &DateResolver) -> Result<RenamePlan> {
    validate_options(options)?;

    let mut stats = RenameStats::default();
    let files = collect_media_files(&options.input, options.include_hidden, &mut stats)?;

    let mut records: Vec<MediaDateRecord> = files
        .into_iter()
        .map(|file| resolver.resolve(file))
        .collect();
    stats.fallback_dates = records.iter().filter(|r| r.is_fallback()).count();

    // stable: equal dates keep enumeration order
    records.sort_by_key(|record| record.date);

    let candidates = assign_counters(records, options)?;

    Ok(RenamePlan {
        root: options.input.clone(),
        prefix: options.prefix.clone(),
        start: options.start,
        width: options.width,
        candidates,
        stats,
    })
}

/// Zero-pads to `width`. Values that need more digits are kept whole.
pub fn format_counter(counter: u64, width: usize) -> String {
    format!("{:0width$}", counter, width = width)
}

/// Builds `<counter>_<prefix><original>`. The original name is appended as
/// raw OS bytes so names that are not valid UTF-8 survive unchanged.
pub fn target_file_name(counter: u64, width: usize, prefix: &str, original: &OsStr) -> OsString {
    let mut name = OsString::from(format!("{}_{}", format_counter(counter, width), prefix));
    name.push(original);
    name
}

fn validate_options(options: &PlanOptions) -> Result<()> {
    if !options.input.is_dir() {
        return Err(PlanError::MissingDirectory(options.input.clone()).into());
    }
    if options.width == 0 || options.width > MAX_WIDTH {
        return Err(PlanError::InvalidWidth(options.width).into());
    }
    validate_prefix(&options.prefix).map_err(PlanError::from)?;
    Ok(())
}

fn assign_counters(
    records: Vec<MediaDateRecord>,
    options: &PlanOptions,
) -> Result<Vec<RenameCandidate>> {
    let count = records.len();
    let overflow = || PlanError::CounterOverflow {
        start: options.start,
        count,
    };

    if let Some(last_index) = count.checked_sub(1) {
        let last = options
            .start
            .checked_add(last_index as u64)
            .ok_or_else(overflow)?;
        let digits = last.to_string().len();
        if digits > options.width {
            warn!(
                "連番 {} は桁数 {} を超えます。桁数を {} 以上にすると並び順が揃います",
                last, options.width, digits
            );
        }
    }

    let mut candidates = Vec::with_capacity(count);
    for (index, record) in records.into_iter().enumerate() {
        let counter = options
            .start
            .checked_add(index as u64)
            .ok_or_else(overflow)?;
        let target_name = target_file_name(
            counter,
            options.width,
            &options.prefix,
            record.file.file_name_os(),
        );
        let target_path = record.file.directory().join(target_name);

        candidates.push(RenameCandidate {
            counter,
            original_path: record.file.path.clone(),
            target_path,
            record,
        });
    }
    Ok(candidates)
}

fn collect_media_files(
    root: &Path,
    include_hidden: bool,
    stats: &mut RenameStats,
) -> Result<Vec<MediaFile>> {
    let mut paths = Vec::new();

    for entry in
        fs::read_dir(root).with_context(|| format!("フォルダを読めませんでした: {}", root.display()))?
    {
        let entry = entry.with_context(|| format!("エントリ読み取り失敗: {}", root.display()))?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        stats.scanned_files += 1;

        if is_hidden(&path) && !include_hidden {
            stats.skipped_hidden += 1;
            continue;
        }

        if MediaKind::from_path(&path).is_some() {
            paths.push(path);
        } else {
            stats.skipped_non_media += 1;
        }
    }
    paths.sort();

    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        if let Some(file) = MediaFile::from_path(&path)? {
            debug!("対象: {} ({:?})", path.display(), file.kind);
            out.push(file);
        }
    }
    stats.media_files = out.len();

    Ok(out)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
