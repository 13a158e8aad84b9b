use crate::probe::{VideoProperty, VideoPropertyReader};
use crate::sanitize::sanitize_property_value;
use crate::timestamp::parse_local_datetime;
use anyhow::{bail, Context, Result};
use chrono::{TimeZone, Utc};
use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Seconds between the ISO-BMFF epoch (1904-01-01) and the Unix epoch.
const MP4_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Tag keys that ffprobe reports for the creation date, most specific first.
const CREATED_TAGS: &[&str] = &["com.apple.quicktime.creationdate", "creation_time", "date"];

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    #[serde(default)]
    tags: HashMap<String, String>,
}

/// Asks `ffprobe` for the container tags first; for ISO-BMFF files
/// (`.mp4`/`.mov`) it falls back to the `mvhd` header.
#[derive(Debug, Clone)]
pub struct SystemVideoReader {
    ffprobe: PathBuf,
}

impl Default for SystemVideoReader {
    fn default() -> Self {
        Self::with_ffprobe("ffprobe")
    }
}

impl SystemVideoReader {
    pub fn with_ffprobe(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    fn probe_created(&self, path: &Path) -> Result<Vec<String>> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .with_context(|| format!("ffprobeを起動できませんでした: {}", self.ffprobe.display()))?;

        if !output.status.success() {
            bail!("ffprobeが失敗しました: {}", path.display());
        }

        created_tags_from_json(&String::from_utf8_lossy(&output.stdout))
    }
}

impl VideoPropertyReader for SystemVideoReader {
    fn resolve_video_property(
        &self,
        directory: &Path,
        file_name: &OsStr,
        property: VideoProperty,
    ) -> Result<Option<String>> {
        let VideoProperty::MediaCreated = property;
        let path = directory.join(file_name);

        let probed = self.probe_created(&path);
        if let Err(err) = &probed {
            debug!("ffprobe: {err:#}");
        }
        choose_created(&path, probed)
    }
}

/// Picks the first probed tag that parses as a date. When none does, ISO-BMFF
/// files get the `mvhd` creation time. Failing both, the first raw tag is
/// returned as-is.
fn choose_created(path: &Path, probed: Result<Vec<String>>) -> Result<Option<String>> {
    if let Ok(values) = &probed {
        if let Some(value) = values.iter().find(|value| is_parseable(value)) {
            return Ok(Some(value.clone()));
        }
    }

    if is_iso_bmff(path) {
        let nothing_probed = probed.as_ref().map_or(true, |values| values.is_empty());
        match read_mvhd_created(path) {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(err) if nothing_probed => return Err(err),
            Err(err) => debug!("mvhd: {err:#}"),
        }
    }

    probed.map(|values| values.into_iter().next())
}

fn is_parseable(value: &str) -> bool {
    parse_local_datetime(&sanitize_property_value(value)).is_some()
}

/// Returns every present creation tag, in `CREATED_TAGS` order.
fn created_tags_from_json(body: &str) -> Result<Vec<String>> {
    let parsed: ProbeOutput =
        serde_json::from_str(body).context("ffprobeの出力を解析できませんでした")?;
    let Some(format) = parsed.format else {
        return Ok(Vec::new());
    };

    let values = CREATED_TAGS
        .iter()
        .filter_map(|key| {
            format
                .tags
                .iter()
                .find(|(tag, _)| tag.eq_ignore_ascii_case(key))
                .map(|(_, value)| value.trim())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        })
        .collect();
    Ok(values)
}

fn read_mvhd_created(path: &Path) -> Result<Option<String>> {
    let file = File::open(path)
        .with_context(|| format!("動画ファイルを開けませんでした: {}", path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("動画ファイルのサイズを取得できませんでした: {}", path.display()))?
        .len();
    let reader = BufReader::new(file);
    let mp4 = mp4::Mp4Reader::read_header(reader, size)
        .with_context(|| format!("mvhdを読めませんでした: {}", path.display()))?;

    Ok(mvhd_seconds_to_rfc3339(mp4.moov.mvhd.creation_time))
}

fn mvhd_seconds_to_rfc3339(seconds: u64) -> Option<String> {
    // 0 is what muxers write when they do not know the time
    if seconds == 0 {
        return None;
    }
    let unix = i64::try_from(seconds).ok()? - MP4_EPOCH_OFFSET;
    Utc.timestamp_opt(unix, 0)
        .single()
        .map(|dt| dt.to_rfc3339())
}

fn is_iso_bmff(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            ext.eq_ignore_ascii_case("mp4") || ext.eq_ignore_ascii_case("mov")
        })
        .unwrap_or(false)
}
