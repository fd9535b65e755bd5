use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::{FormatOption, MediaEntry, ProbeResult, SubtitleTrack};

/// Raw engine metadata, as dumped by `yt-dlp --dump-single-json`.
/// Only the fields we normalize are declared.
#[derive(Deserialize)]
struct RawInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    id: Option<String>,
    title: Option<String>,
    thumbnail: Option<String>,
    duration: Option<f64>,
    #[serde(default)]
    formats: Option<Vec<RawFormat>>,
    #[serde(default)]
    subtitles: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    automatic_captions: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    entries: Option<Vec<Option<RawInfo>>>,
}

#[derive(Deserialize)]
struct RawFormat {
    format_id: Option<String>,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    resolution: Option<String>,
    format_note: Option<String>,
    filesize: Option<f64>,
    filesize_approx: Option<f64>,
}

/// Validate that a string looks like a URL.
/// Rejects anything that isn't http:// or https://.
pub(crate) fn validate_url(url: &str) -> Result<&str> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyUrl);
    }
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(trimmed)
    } else {
        Err(Error::InvalidUrl(trimmed.to_string()))
    }
}

/// Cap engine stderr so a diagnostic never dumps pages of output.
pub(crate) fn truncate_stderr(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).chars().take(1000).collect()
}

/// Probe a URL for available formats and subtitle languages.
///
/// Metadata only — nothing is downloaded and nothing is written. The
/// engine is asked for the full format catalog plus both authored and
/// auto-generated subtitle listings across all languages.
pub async fn probe(url: &str) -> Result<ProbeResult> {
    let url = validate_url(url)?;

    info!(%url, "probing media info");

    let output = tokio::process::Command::new("yt-dlp")
        .args(["--dump-single-json", "--no-warnings"])
        .arg(url)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::YtDlpNotFound
            } else {
                Error::Io(e)
            }
        })?;

    if !output.status.success() {
        return Err(Error::MetadataFetch(truncate_stderr(&output.stderr)));
    }

    parse_probe_output(&output.stdout)
}

/// Parse the engine's JSON dump into the normalized probe shape.
fn parse_probe_output(stdout: &[u8]) -> Result<ProbeResult> {
    let info: RawInfo =
        serde_json::from_slice(stdout).map_err(|e| Error::MetadataFetch(e.to_string()))?;

    if info.kind.as_deref() == Some("playlist") {
        let title = info.title.unwrap_or_default();
        let entries: Vec<MediaEntry> = info
            .entries
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(normalize_entry)
            .collect();
        debug!(count = entries.len(), "probed playlist");
        return Ok(ProbeResult::Playlist { title, entries });
    }

    Ok(ProbeResult::Single {
        entries: vec![normalize_entry(info)],
    })
}

fn normalize_entry(info: RawInfo) -> MediaEntry {
    let formats = info
        .formats
        .unwrap_or_default()
        .into_iter()
        .map(normalize_format)
        .collect();

    // Authored subtitles win over auto-generated captions for the same
    // language; each language appears once.
    let mut subtitles = BTreeMap::new();
    for lang in info.subtitles.unwrap_or_default().into_keys() {
        subtitles.insert(
            lang.clone(),
            SubtitleTrack {
                label: lang,
                auto: false,
            },
        );
    }
    for lang in info.automatic_captions.unwrap_or_default().into_keys() {
        subtitles.entry(lang.clone()).or_insert(SubtitleTrack {
            label: lang,
            auto: true,
        });
    }

    MediaEntry {
        id: info.id.unwrap_or_default(),
        title: info.title.unwrap_or_else(|| "unknown".into()),
        thumbnail: info.thumbnail.unwrap_or_default(),
        duration: info.duration,
        formats,
        subtitles,
    }
}

/// Build the display label for one raw format. Component order is
/// fixed: resolution/note, extension, stream-presence tag, size tag.
fn normalize_format(f: RawFormat) -> FormatOption {
    let has_video = f.vcodec.as_deref().is_some_and(|v| v != "none");
    let has_audio = f.acodec.as_deref().is_some_and(|a| a != "none");

    let resolution = f
        .resolution
        .or(f.format_note)
        .unwrap_or_default();
    let ext = f.ext.unwrap_or_else(|| "?".into());
    let filesize = f.filesize.or(f.filesize_approx);

    let mut parts = Vec::new();
    if !resolution.is_empty() {
        parts.push(resolution);
    }
    parts.push(ext);
    if has_video && has_audio {
        parts.push("(video+audio)".into());
    } else if has_video {
        parts.push("(video only)".into());
    } else if has_audio {
        parts.push("(audio only)".into());
    }
    if let Some(size) = filesize.filter(|s| *s >= 0.0) {
        parts.push(format!("[{:.1}MB]", size / 1024.0 / 1024.0));
    }

    FormatOption {
        format_id: f.format_id.unwrap_or_default(),
        label: parts.join(" "),
        has_video,
        has_audio,
    }
}
