use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::WhisperModel;
use crate::error::{Error, Result};

const HUGGINGFACE_BASE: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Ensure a whisper model is available locally, downloading if needed.
/// Returns the path to the model file.
pub async fn ensure_model(model: &WhisperModel, cache_dir: &Path) -> Result<PathBuf> {
    if let WhisperModel::Custom(path) = model {
        return if path.exists() {
            Ok(path.clone())
        } else {
            Err(Error::ModelNotFound { path: path.clone() })
        };
    }

    let filename = model.filename();
    let model_path = cache_dir.join(&filename);

    if model_path.exists() {
        info!(path = %model_path.display(), "model already cached");
        return Ok(model_path);
    }

    std::fs::create_dir_all(cache_dir).map_err(|e| {
        Error::Model(format!(
            "failed to create cache dir {}: {e}",
            cache_dir.display()
        ))
    })?;

    let url = format!("{HUGGINGFACE_BASE}/{filename}");
    info!(%url, "downloading model");
    download_model(&url, &model_path).await?;

    Ok(model_path)
}

async fn download_model(url: &str, dest: &Path) -> Result<()> {
    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| Error::ModelDownload(format!("HTTP error: {e}")))?;

    let total_size = response.content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb.set_message(format!(
        "Downloading {}",
        dest.file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));

    // Stage the download next to the destination, then rename
    let tmp_path = staging_path(dest);
    let mut file = std::fs::File::create(&tmp_path)?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    use std::io::Write;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    // A tiny file is an error page, not a model
    let file_size = std::fs::metadata(&tmp_path)?.len();
    if file_size < 1_000_000 {
        std::fs::remove_file(&tmp_path).ok();
        return Err(Error::ModelDownload(format!(
            "downloaded file too small ({file_size} bytes) — likely an error page"
        )));
    }

    std::fs::rename(&tmp_path, dest)?;
    pb.finish_with_message("Download complete");

    if total_size > 0 && file_size != total_size {
        warn!(
            expected = total_size,
            actual = file_size,
            "file size mismatch — model may be corrupt"
        );
    }

    info!(path = %dest.display(), size = file_size, "model saved");
    Ok(())
}

/// Per-attempt staging file next to the final destination. The model
/// cache is shared across tasks, so concurrent downloads of the same
/// model must never write through one partial file; each attempt gets
/// its own, and the final rename is atomic — the last complete copy
/// wins.
fn staging_path(dest: &Path) -> PathBuf {
    dest.with_extension(format!("part.{}", uuid::Uuid::new_v4().simple()))
}

/// List all cached model files.
pub fn list_cached_models(cache_dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(cache_dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "bin"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_custom_model_must_exist() {
        let missing = PathBuf::from("/nonexistent/ggml-custom.bin");
        let err = ensure_model(&WhisperModel::Custom(missing.clone()), Path::new("/tmp"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ModelNotFound { path } if path == missing));
    }

    #[test]
    fn test_list_cached_models_missing_dir() {
        assert!(list_cached_models(Path::new("/nonexistent/cache")).is_empty());
    }

    #[test]
    fn test_staging_paths_are_unique_per_attempt() {
        let dest = PathBuf::from("/cache/ggml-base.bin");
        let a = staging_path(&dest);
        let b = staging_path(&dest);
        assert_ne!(a, b);
        assert_ne!(a, dest);
        assert_eq!(a.parent(), dest.parent());
    }

    #[test]
    fn test_list_cached_models_ignores_staging_files() {
        let dir = std::env::temp_dir()
            .join("subgrab_test")
            .join(format!("staging_{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();

        let dest = dir.join("ggml-base.bin");
        std::fs::write(&dest, b"model").unwrap();
        std::fs::write(staging_path(&dest), b"partial").unwrap();

        let cached = list_cached_models(&dir);
        assert_eq!(cached, vec![dest]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
