use std::fmt;
use std::path::PathBuf;

use crate::error::Error;

/// A validated language for whisper transcription.
///
/// Wraps a code that has been verified against whisper.cpp's supported
/// language list. Accepts both short codes ("en", "de") and full names
/// ("english", "german"). `Language::Auto` lets the model detect the
/// language from the audio.
#[derive(Debug, Clone, Default)]
pub enum Language {
    /// Auto-detect language from audio.
    #[default]
    Auto,
    /// A validated language code (e.g. "en", "de", "ja").
    Code {
        /// Short code as whisper expects it.
        code: String,
        /// Whisper internal language ID.
        id: i32,
    },
}

impl Language {
    /// Create a language from a code or full name, validating against
    /// whisper.cpp. Returns an error for unsupported languages.
    pub fn new(lang: &str) -> Result<Self, Error> {
        let lower = lang.to_lowercase();
        if lower == "auto" {
            return Ok(Language::Auto);
        }

        match whisper_rs::get_lang_id(&lower) {
            Some(id) => {
                // Normalize to short code
                let code = whisper_rs::get_lang_str(id).unwrap_or(&lower).to_string();
                Ok(Language::Code { code, id })
            }
            None => Err(Error::UnsupportedLanguage(lang.to_string())),
        }
    }

    /// Short language code (e.g. "en"), or None for Auto.
    pub fn code(&self) -> Option<&str> {
        match self {
            Language::Auto => None,
            Language::Code { code, .. } => Some(code),
        }
    }

    /// Tag used for the subtitle stream metadata in the muxed output.
    /// Auto-detected languages are tagged "und" (undefined).
    pub fn stream_tag(&self) -> &str {
        self.code().unwrap_or("und")
    }

    /// List all supported languages as (code, full_name) pairs.
    pub fn supported() -> Vec<(&'static str, &'static str)> {
        let max = whisper_rs::get_lang_max_id();
        (0..=max)
            .filter_map(|id| {
                let code = whisper_rs::get_lang_str(id)?;
                let name = whisper_rs::get_lang_str_full(id)?;
                Some((code, name))
            })
            .collect()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Auto => write!(f, "auto"),
            Language::Code { code, .. } => write!(f, "{code}"),
        }
    }
}

/// Whisper model sizes.
#[derive(Debug, Clone)]
pub enum WhisperModel {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV2,
    LargeV3,
    LargeV3Turbo,
    /// User-provided .ggml file path.
    Custom(PathBuf),
}

impl WhisperModel {
    /// Model filename as used by HuggingFace / whisper.cpp.
    pub fn filename(&self) -> String {
        match self {
            WhisperModel::Tiny => "ggml-tiny.bin".into(),
            WhisperModel::TinyEn => "ggml-tiny.en.bin".into(),
            WhisperModel::Base => "ggml-base.bin".into(),
            WhisperModel::BaseEn => "ggml-base.en.bin".into(),
            WhisperModel::Small => "ggml-small.bin".into(),
            WhisperModel::SmallEn => "ggml-small.en.bin".into(),
            WhisperModel::Medium => "ggml-medium.bin".into(),
            WhisperModel::MediumEn => "ggml-medium.en.bin".into(),
            WhisperModel::LargeV2 => "ggml-large-v2.bin".into(),
            WhisperModel::LargeV3 => "ggml-large-v3.bin".into(),
            WhisperModel::LargeV3Turbo => "ggml-large-v3-turbo.bin".into(),
            WhisperModel::Custom(path) => path
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "custom-model".into()),
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::TinyEn => "tiny.en",
            WhisperModel::Base => "base",
            WhisperModel::BaseEn => "base.en",
            WhisperModel::Small => "small",
            WhisperModel::SmallEn => "small.en",
            WhisperModel::Medium => "medium",
            WhisperModel::MediumEn => "medium.en",
            WhisperModel::LargeV2 => "large-v2",
            WhisperModel::LargeV3 => "large-v3",
            WhisperModel::LargeV3Turbo => "large-v3-turbo",
            WhisperModel::Custom(_) => "custom",
        }
    }

    /// Parse from string (e.g. CLI argument).
    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "tiny" => Some(WhisperModel::Tiny),
            "tiny.en" => Some(WhisperModel::TinyEn),
            "base" => Some(WhisperModel::Base),
            "base.en" => Some(WhisperModel::BaseEn),
            "small" => Some(WhisperModel::Small),
            "small.en" => Some(WhisperModel::SmallEn),
            "medium" => Some(WhisperModel::Medium),
            "medium.en" => Some(WhisperModel::MediumEn),
            "large-v2" => Some(WhisperModel::LargeV2),
            "large-v3" => Some(WhisperModel::LargeV3),
            "large-v3-turbo" => Some(WhisperModel::LargeV3Turbo),
            _ => None,
        }
    }
}

/// Options for one download request.
///
/// Empty strings for `format_id` / `subtitle_lang` mean "not chosen",
/// matching the wire shape where those fields are optional.
pub struct DownloadOptions {
    /// Extraction-engine format id, or empty for the best single stream.
    pub format_id: String,
    /// Subtitle language to request from the engine, or empty for none.
    pub subtitle_lang: String,
    /// Embed engine-provided subtitles into the container.
    pub embed_subs: bool,
    /// Synthesize subtitles from the audio track via speech recognition.
    pub generate_subs: bool,
    /// Language hint for speech recognition.
    pub whisper_lang: Language,
    /// Whisper model used when `generate_subs` is set.
    pub model: WhisperModel,
    /// Model cache directory override.
    pub cache_dir: Option<PathBuf>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            format_id: String::new(),
            subtitle_lang: String::new(),
            embed_subs: false,
            generate_subs: false,
            whisper_lang: Language::Auto,
            model: WhisperModel::Base,
            cache_dir: None,
        }
    }
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn format_id(mut self, id: impl Into<String>) -> Self {
        self.format_id = id.into();
        self
    }

    pub fn subtitle_lang(mut self, lang: impl Into<String>) -> Self {
        self.subtitle_lang = lang.into();
        self
    }

    pub fn embed_subs(mut self, enabled: bool) -> Self {
        self.embed_subs = enabled;
        self
    }

    pub fn generate_subs(mut self, enabled: bool) -> Self {
        self.generate_subs = enabled;
        self
    }

    /// Set the speech-recognition language hint. Validates against
    /// whisper's supported languages.
    pub fn whisper_lang(mut self, lang: &str) -> Result<Self, Error> {
        self.whisper_lang = Language::new(lang)?;
        Ok(self)
    }

    pub fn model(mut self, model: WhisperModel) -> Self {
        self.model = model;
        self
    }

    pub fn cache_dir(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    /// Resolve the model cache directory, defaulting to
    /// ~/.cache/subgrab/models.
    pub fn resolve_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("subgrab")
                .join("models")
        })
    }
}
