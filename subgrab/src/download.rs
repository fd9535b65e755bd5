use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::DownloadOptions;
use crate::error::{Error, Result};
use crate::model;
use crate::probe::{truncate_stderr, validate_url};
use crate::select::{engine_options, EngineOptions};
use crate::subtitle::{self, FfmpegMuxer, WhisperRecognizer};
use crate::types::DownloadTask;

/// Engine output template: title capped at 80 chars, engine-chosen
/// extension.
const OUTPUT_TEMPLATE: &str = "%(title).80s.%(ext)s";

/// Side-files the engine may write next to the media; never the
/// primary artifact.
const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt", "ass"];

/// Drives the extraction engine. Every download gets a fresh
/// uuid-named workspace directory under `root`; tasks never share
/// state beyond that namespace partition.
pub struct Downloader {
    root: PathBuf,
}

impl Downloader {
    /// Create a downloader writing task workspaces under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run a full download request: fetch the media, then synthesize
    /// and embed subtitles when the request asks for them.
    ///
    /// On a subtitle-generation failure the already-fetched file stays
    /// in the workspace; only engine failures and the no-artifact case
    /// clean up the workspace.
    pub async fn download(&self, url: &str, options: &DownloadOptions) -> Result<DownloadTask> {
        let engine = engine_options(options);
        let mut task = self.fetch(url, &engine).await?;

        if options.generate_subs {
            let model_path = model::ensure_model(&options.model, &options.resolve_cache_dir())
                .await
                .map_err(Error::into_subtitle_failure)?;

            let recognizer = WhisperRecognizer::new(model_path);
            let output = subtitle::generate_subtitles(
                &task.path(),
                &task.dir,
                &options.whisper_lang,
                &recognizer,
                &FfmpegMuxer,
            )
            .await?;

            task.filename = output
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .ok_or_else(|| Error::Mux("muxer produced a path without a filename".into()))
                .map_err(Error::into_subtitle_failure)?;
        }

        Ok(task)
    }

    /// Fetch a single media item into a fresh task workspace.
    ///
    /// Always single-item: playlist URLs are forced to one entry. On
    /// engine failure the workspace is deleted (best effort) before
    /// the error is surfaced. On success the workspace holds exactly
    /// one non-subtitle file — anything else is an internal fault.
    pub async fn fetch(&self, url: &str, engine: &EngineOptions) -> Result<DownloadTask> {
        let url = validate_url(url)?;
        ensure_engine_available().await?;

        let task_id = uuid::Uuid::new_v4().simple().to_string();
        let dir = self.root.join(&task_id);
        tokio::fs::create_dir_all(&dir).await?;

        let template = dir
            .join(OUTPUT_TEMPLATE)
            .to_str()
            .ok_or_else(|| {
                Error::DownloadFailed("workspace path contains invalid UTF-8".into())
            })?
            .to_string();

        info!(%url, task_id, "starting download");

        let output = tokio::process::Command::new("yt-dlp")
            .args(engine.to_args())
            .args(["--no-playlist", "--no-warnings", "-o", &template])
            .arg(url)
            .output()
            .await?;

        if !output.status.success() {
            remove_workspace(&dir).await;
            return Err(Error::DownloadFailed(truncate_stderr(&output.stderr)));
        }

        let filename = match locate_artifact(&dir) {
            Ok(name) => name,
            Err(e) => {
                remove_workspace(&dir).await;
                return Err(e);
            }
        };

        debug!(task_id, %filename, "download complete");

        Ok(DownloadTask {
            task_id,
            dir,
            filename,
        })
    }
}

async fn ensure_engine_available() -> Result<()> {
    let check = tokio::process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await;

    if check.is_err() {
        return Err(Error::YtDlpNotFound);
    }
    Ok(())
}

/// Best-effort workspace cleanup; a failed download must not leave a
/// half-written task directory behind.
async fn remove_workspace(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        warn!(dir = %dir.display(), error = %e, "failed to clean up task workspace");
    }
}

/// Identify the primary artifact: the single file in the workspace
/// that is not an engine-written subtitle side-file. Zero or more than
/// one candidate means the engine did something we cannot interpret.
fn locate_artifact(dir: &Path) -> Result<String> {
    let mut candidates = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let is_subtitle = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SUBTITLE_EXTENSIONS.contains(&ext));
        if is_subtitle {
            continue;
        }

        candidates.push(entry.file_name().to_string_lossy().into_owned());
    }

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        found => Err(Error::NoArtifact { found }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("subgrab_test")
            .join(format!("{name}_{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_locate_artifact_skips_subtitle_files() {
        let dir = scratch_dir("locate");
        std::fs::write(dir.join("video.mp4"), b"v").unwrap();
        std::fs::write(dir.join("video.en.srt"), b"s").unwrap();
        std::fs::write(dir.join("video.en.vtt"), b"s").unwrap();
        std::fs::write(dir.join("video.ja.ass"), b"s").unwrap();

        assert_eq!(locate_artifact(&dir).unwrap(), "video.mp4");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_locate_artifact_empty_workspace() {
        let dir = scratch_dir("empty");
        assert!(matches!(
            locate_artifact(&dir),
            Err(Error::NoArtifact { found: 0 })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_locate_artifact_only_subtitles() {
        let dir = scratch_dir("subs_only");
        std::fs::write(dir.join("video.en.srt"), b"s").unwrap();
        assert!(matches!(
            locate_artifact(&dir),
            Err(Error::NoArtifact { found: 0 })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_locate_artifact_ambiguous() {
        let dir = scratch_dir("ambiguous");
        std::fs::write(dir.join("video.f137.mp4"), b"v").unwrap();
        std::fs::write(dir.join("video.f140.m4a"), b"a").unwrap();
        assert!(matches!(
            locate_artifact(&dir),
            Err(Error::NoArtifact { found: 2 })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_failure_cleans_up_workspace() {
        use std::os::unix::fs::PermissionsExt;

        fn write_shim(dir: &Path, script: &str) {
            let shim = dir.join("yt-dlp");
            std::fs::write(&shim, script).unwrap();
            std::fs::set_permissions(&shim, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        // Stand-in engines: one that fails outright, one that
        // "succeeds" without producing any file.
        let failing_bin = scratch_dir("engine_fail_bin");
        write_shim(
            &failing_bin,
            "#!/bin/sh\necho 'ERROR: unsupported URL' >&2\nexit 1\n",
        );
        let silent_bin = scratch_dir("engine_silent_bin");
        write_shim(&silent_bin, "#!/bin/sh\nexit 0\n");

        let original_path = std::env::var_os("PATH").unwrap_or_default();
        let with_shim = |dir: &Path| {
            let mut paths = vec![dir.to_path_buf()];
            paths.extend(std::env::split_paths(&original_path));
            std::env::join_paths(paths).unwrap()
        };

        let root = scratch_dir("engine_fail_root");
        let downloader = Downloader::new(&root);
        let engine = engine_options(&DownloadOptions::default());

        // Engine failure: the error carries the engine's diagnostic,
        // the workspace is gone, and no task id ever surfaces.
        std::env::set_var("PATH", with_shim(&failing_bin));
        let err = downloader
            .fetch("https://example.com/video", &engine)
            .await
            .unwrap_err();
        match err {
            Error::DownloadFailed(msg) => assert!(msg.contains("unsupported URL")),
            other => panic!("expected DownloadFailed, got {other:?}"),
        }
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);

        // Engine exit 0 but empty workspace: same cleanup guarantee.
        std::env::set_var("PATH", with_shim(&silent_bin));
        let err = downloader
            .fetch("https://example.com/video", &engine)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoArtifact { found: 0 }));
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);

        std::env::set_var("PATH", original_path);
        for dir in [root, failing_bin, silent_bin] {
            std::fs::remove_dir_all(&dir).unwrap();
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_url_before_touching_disk() {
        let root = scratch_dir("badurl");
        let downloader = Downloader::new(&root);
        let engine = engine_options(&DownloadOptions::default());

        assert!(matches!(
            downloader.fetch("", &engine).await,
            Err(Error::EmptyUrl)
        ));
        assert!(matches!(
            downloader.fetch("notaurl", &engine).await,
            Err(Error::InvalidUrl(_))
        ));

        // No task workspaces were created
        assert_eq!(std::fs::read_dir(&root).unwrap().count(), 0);
        std::fs::remove_dir_all(&root).unwrap();
    }
}
