//! Media download pipeline: probe a URL for formats and subtitle
//! languages, fetch one item via yt-dlp into an isolated task
//! workspace, and optionally synthesize subtitles from the audio track
//! with whisper and mux them into the output.

pub mod audio;
pub mod config;
pub mod download;
pub mod error;
pub mod model;
pub mod probe;
pub mod registry;
pub mod select;
pub mod subtitle;
pub mod transcribe;
pub mod types;

pub use config::{DownloadOptions, Language, WhisperModel};
pub use download::Downloader;
pub use error::{Error, Result};
pub use probe::probe;
pub use registry::ArtifactRegistry;
pub use select::{engine_options, EngineOptions};
pub use subtitle::{
    generate_subtitles, FfmpegMuxer, Muxer, SpeechRecognizer, WhisperRecognizer,
};
pub use types::{
    render_srt, DownloadTask, FormatOption, MediaEntry, ProbeResult, SubtitleSegment,
    SubtitleTrack,
};
