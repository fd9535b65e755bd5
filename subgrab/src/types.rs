use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One downloadable stream variant as shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatOption {
    pub format_id: String,
    pub label: String,
    pub has_video: bool,
    pub has_audio: bool,
}

/// An available subtitle language. The language code is the key of
/// [`MediaEntry::subtitles`]; a language listed both as authored and
/// auto-generated is recorded once with `auto: false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub label: String,
    pub auto: bool,
}

/// Probe result for a single media item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEntry {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: Option<f64>,
    pub formats: Vec<FormatOption>,
    pub subtitles: BTreeMap<String, SubtitleTrack>,
}

/// Outcome of probing a URL: a single item, or a playlist of items.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeResult {
    Single {
        entries: Vec<MediaEntry>,
    },
    Playlist {
        title: String,
        entries: Vec<MediaEntry>,
    },
}

impl ProbeResult {
    pub fn entries(&self) -> &[MediaEntry] {
        match self {
            ProbeResult::Single { entries } | ProbeResult::Playlist { entries, .. } => entries,
        }
    }
}

/// A completed download: an opaque task id, the workspace directory it
/// exclusively owns, and the name of the final artifact inside it.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadTask {
    pub task_id: String,
    #[serde(skip)]
    pub dir: PathBuf,
    pub filename: String,
}

impl DownloadTask {
    /// Absolute path of the final artifact.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }
}

/// One timed subtitle cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Render an ordered cue sequence as an SRT document.
///
/// Cues are numbered from 1 and text is trimmed. Segment order is
/// preserved as given — the recognizer already emits time-ordered
/// segments and we do not re-sort.
pub fn render_srt(segments: &[SubtitleSegment]) -> String {
    let mut out = String::new();
    for (i, seg) in segments.iter().enumerate() {
        out.push_str(&format!("{}\n", i + 1));
        out.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(seg.start),
            format_srt_time(seg.end)
        ));
        out.push_str(seg.text.trim());
        out.push_str("\n\n");
    }
    out
}

/// Format seconds as an SRT timestamp: HH:MM:SS,mmm.
///
/// Milliseconds are floored, hours are unbounded.
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0) as u64;
    let h = total_ms / 3_600_000;
    let m = (total_ms % 3_600_000) / 60_000;
    let s = (total_ms % 60_000) / 1_000;
    let ms = total_ms % 1_000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srt_time_zero() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
    }

    #[test]
    fn test_srt_time_hours_minutes() {
        assert_eq!(format_srt_time(3725.250), "01:02:05,250");
    }

    #[test]
    fn test_srt_time_millis_floor() {
        assert_eq!(format_srt_time(59.999), "00:00:59,999");
    }

    #[test]
    fn test_render_srt_numbering_and_trim() {
        let segments = vec![
            SubtitleSegment {
                start: 0.0,
                end: 1.5,
                text: "  hello  ".into(),
            },
            SubtitleSegment {
                start: 1.5,
                end: 3.0,
                text: "world".into(),
            },
        ];
        let srt = render_srt(&segments);
        assert_eq!(
            srt,
            "1\n00:00:00,000 --> 00:00:01,500\nhello\n\n\
             2\n00:00:01,500 --> 00:00:03,000\nworld\n\n"
        );
    }

    /// Minimal SRT parser, only good enough to verify the round-trip.
    fn parse_srt(srt: &str) -> Vec<SubtitleSegment> {
        fn parse_time(t: &str) -> f64 {
            let (hms, ms) = t.split_once(',').unwrap();
            let parts: Vec<u64> = hms.split(':').map(|p| p.parse().unwrap()).collect();
            let ms: u64 = ms.parse().unwrap();
            (parts[0] * 3600 + parts[1] * 60 + parts[2]) as f64 + ms as f64 / 1000.0
        }

        srt.split("\n\n")
            .filter(|block| !block.trim().is_empty())
            .map(|block| {
                let mut lines = block.lines();
                lines.next(); // index
                let (start, end) = lines.next().unwrap().split_once(" --> ").unwrap();
                SubtitleSegment {
                    start: parse_time(start),
                    end: parse_time(end),
                    text: lines.collect::<Vec<_>>().join("\n"),
                }
            })
            .collect()
    }

    #[test]
    fn test_srt_round_trip() {
        let segments = vec![
            SubtitleSegment {
                start: 0.25,
                end: 2.75,
                text: "first cue".into(),
            },
            SubtitleSegment {
                start: 2.75,
                end: 61.5,
                text: "second cue".into(),
            },
        ];
        let parsed = parse_srt(&render_srt(&segments));
        assert_eq!(parsed, segments);
    }

    #[test]
    fn test_probe_result_serializes_with_type_tag() {
        let result = ProbeResult::Playlist {
            title: "mix".into(),
            entries: Vec::new(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "playlist");
        assert_eq!(json["title"], "mix");
    }

    #[test]
    fn test_download_task_omits_dir() {
        let task = DownloadTask {
            task_id: "abc123".into(),
            dir: PathBuf::from("/tmp/abc123"),
            filename: "video.mp4".into(),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["task_id"], "abc123");
        assert_eq!(json["filename"], "video.mp4");
        assert!(json.get("dir").is_none());
    }
}
