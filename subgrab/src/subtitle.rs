use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::audio;
use crate::config::Language;
use crate::error::{Error, Result};
use crate::transcribe;
use crate::types::{render_srt, SubtitleSegment};

/// Suffix appended to the input stem for the muxed output file.
const OUTPUT_SUFFIX: &str = "subbed";

/// Container for the muxed output; mp4 carries mov_text subtitle
/// tracks everywhere we care about.
const OUTPUT_CONTAINER: &str = "mp4";

/// Speech-recognition capability: media file in, timed segments out.
///
/// The real implementation loads a whisper model on demand; tests
/// inject fakes so the pipeline runs without a model present.
pub trait SpeechRecognizer {
    fn transcribe(&self, media: &Path, language: &Language) -> Result<Vec<SubtitleSegment>>;
}

/// Muxing capability: copy every stream of `input` and add `subtitles`
/// as a text subtitle track tagged `language_tag`, writing `output`.
pub trait Muxer {
    fn mux(&self, input: &Path, subtitles: &Path, language_tag: &str, output: &Path)
        -> Result<()>;
}

/// Whisper-backed recognizer. Holds the path of an already-cached
/// model file; the whisper context itself is loaded per transcription.
pub struct WhisperRecognizer {
    model_path: PathBuf,
}

impl WhisperRecognizer {
    pub fn new(model_path: PathBuf) -> Self {
        Self { model_path }
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, media: &Path, language: &Language) -> Result<Vec<SubtitleSegment>> {
        let samples = audio::decode_audio(media)?;
        transcribe::transcribe_samples(&samples, &self.model_path, language)
    }
}

/// ffmpeg-backed muxer: streams are copied verbatim, the subtitle file
/// becomes a mov_text track with a language metadata tag.
pub struct FfmpegMuxer;

impl Muxer for FfmpegMuxer {
    fn mux(
        &self,
        input: &Path,
        subtitles: &Path,
        language_tag: &str,
        output: &Path,
    ) -> Result<()> {
        let result = Command::new("ffmpeg")
            .args(["-nostdin", "-y", "-i"])
            .arg(input)
            .arg("-i")
            .arg(subtitles)
            .args(["-c", "copy", "-c:s", "mov_text"])
            .arg("-metadata:s:s:0")
            .arg(format!("language={language_tag}"))
            .arg(output)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::Mux("ffmpeg not found — install with: apt install ffmpeg".into())
                } else {
                    Error::Mux(format!("failed to run ffmpeg: {e}"))
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let truncated: String = stderr.chars().take(1000).collect();
            return Err(Error::Mux(format!("ffmpeg failed: {truncated}")));
        }

        Ok(())
    }
}

/// Synthesize subtitles for a downloaded media file and mux them into
/// a new output next to it.
///
/// Sequence: transcribe the audio track, serialize the segments as an
/// SRT file in the workspace, then mux that file into
/// `<stem>.subbed.mp4`. The input file is left untouched. Every
/// failure surfaces as a subtitle-generation error wrapping the
/// underlying cause; partially written outputs are not cleaned up
/// here.
pub async fn generate_subtitles(
    input: &Path,
    workspace: &Path,
    language: &Language,
    recognizer: &dyn SpeechRecognizer,
    muxer: &dyn Muxer,
) -> Result<PathBuf> {
    let result = run_pipeline(input, workspace, language, recognizer, muxer).await;
    result.map_err(Error::into_subtitle_failure)
}

async fn run_pipeline(
    input: &Path,
    workspace: &Path,
    language: &Language,
    recognizer: &dyn SpeechRecognizer,
    muxer: &dyn Muxer,
) -> Result<PathBuf> {
    info!(input = %input.display(), %language, "generating subtitles");

    let segments = recognizer.transcribe(input, language)?;
    debug!(segments = segments.len(), "transcription finished");

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media".into());

    let srt_path = workspace.join(format!("{stem}.{OUTPUT_SUFFIX}.srt"));
    tokio::fs::write(&srt_path, render_srt(&segments)).await?;
    debug!(path = %srt_path.display(), "subtitle file written");

    let output = workspace.join(format!("{stem}.{OUTPUT_SUFFIX}.{OUTPUT_CONTAINER}"));
    muxer.mux(input, &srt_path, language.stream_tag(), &output)?;

    info!(output = %output.display(), "subtitles embedded");
    Ok(output)
}
