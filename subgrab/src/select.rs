use crate::config::DownloadOptions;

/// Standard container for merged/embedded output. The engine's subtitle
/// embed postprocessor needs a container it can write text tracks into.
const MERGE_CONTAINER: &str = "mp4";

/// Extraction-engine configuration derived from a download request.
///
/// This is a plain value: building it never fails and building it twice
/// from the same request yields the same configuration. Invalid
/// combinations surface later, from the engine itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// yt-dlp format selection expression.
    pub format_spec: String,
    /// Container forced for merged output, when any.
    pub merge_output_format: Option<String>,
    /// Subtitle language requested from the engine, when any. Both
    /// authored and auto-generated variants are requested for it.
    pub subtitle_lang: Option<String>,
    /// Ask the engine to embed the fetched subtitles into the container.
    pub embed_subtitles: bool,
}

/// Translate a download request into an engine configuration.
///
/// - No format id: the engine's best overall single-stream option.
/// - A format id F: `F+bestaudio/best/F` — F merged with best audio,
///   then best-overall, then F alone as fallbacks — merged into mp4.
/// - A subtitle language: fetch authored and auto-generated subs for
///   exactly that language; with embedding requested, force mp4 even
///   when no format id was chosen.
pub fn engine_options(options: &DownloadOptions) -> EngineOptions {
    let format_id = options.format_id.trim();
    let subtitle_lang = options.subtitle_lang.trim();

    let (format_spec, mut merge_output_format) = if format_id.is_empty() {
        ("best".to_string(), None)
    } else {
        (
            format!("{format_id}+bestaudio/best/{format_id}"),
            Some(MERGE_CONTAINER.to_string()),
        )
    };

    let mut embed_subtitles = false;
    let subtitle_lang = if subtitle_lang.is_empty() {
        None
    } else {
        if options.embed_subs {
            embed_subtitles = true;
            merge_output_format.get_or_insert_with(|| MERGE_CONTAINER.to_string());
        }
        Some(subtitle_lang.to_string())
    };

    EngineOptions {
        format_spec,
        merge_output_format,
        subtitle_lang,
        embed_subtitles,
    }
}

impl EngineOptions {
    /// Render as yt-dlp arguments.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["-f".to_string(), self.format_spec.clone()];

        if let Some(container) = &self.merge_output_format {
            args.push("--merge-output-format".to_string());
            args.push(container.clone());
        }

        if let Some(lang) = &self.subtitle_lang {
            args.push("--write-subs".to_string());
            args.push("--write-auto-subs".to_string());
            args.push("--sub-langs".to_string());
            args.push(lang.clone());
        }

        if self.embed_subtitles {
            args.push("--embed-subs".to_string());
        }

        args
    }
}
