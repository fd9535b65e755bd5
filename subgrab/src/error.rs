use std::path::PathBuf;

/// All errors that can occur in subgrab.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("URL must not be empty")]
    EmptyUrl,

    #[error("invalid URL (must start with http:// or https://): {0}")]
    InvalidUrl(String),

    #[error("could not fetch media info: {0}")]
    MetadataFetch(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("expected exactly one media file in the task workspace, found {found}")]
    NoArtifact { found: usize },

    #[error("subtitle generation failed: {0}")]
    SubtitleGeneration(#[source] Box<Error>),

    #[error("muxing failed: {0}")]
    Mux(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("model not found: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("model download failed: {0}")]
    ModelDownload(String),

    #[error("audio decoding error: {0}")]
    AudioDecode(String),

    #[error("unsupported language: \"{0}\" — use Language::supported() to list valid codes")]
    UnsupportedLanguage(String),

    #[error("transcription error: {0}")]
    Transcription(String),

    #[error("whisper error: {0}")]
    Whisper(#[from] whisper_rs::WhisperError),

    #[error("yt-dlp not found — install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Wrap a pipeline failure so callers see one subtitle-generation
    /// error class regardless of which step broke.
    pub(crate) fn into_subtitle_failure(self) -> Error {
        match self {
            e @ Error::SubtitleGeneration(_) => e,
            e => Error::SubtitleGeneration(Box::new(e)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
