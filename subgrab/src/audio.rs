use std::path::Path;
use std::process::Command;

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Target sample rate for whisper.cpp.
pub(crate) const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Decode the audio track of any media file to 16kHz mono f32 samples.
///
/// ffmpeg handles demuxing, decoding, channel downmix, and resampling
/// in one shot, so the downloaded container goes straight in. Output
/// is raw s16le PCM which we convert to f32.
pub fn decode_audio(path: &Path) -> Result<Vec<f32>> {
    info!(path = %path.display(), "decoding audio track");

    if !path.exists() {
        return Err(Error::AudioDecode(format!(
            "media file not found: {}",
            path.display()
        )));
    }

    let output = Command::new("ffmpeg")
        .args(["-nostdin", "-threads", "0", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "s16le",
            "-ac",
            "1",
            "-acodec",
            "pcm_s16le",
            "-ar",
            &WHISPER_SAMPLE_RATE.to_string(),
            "-",
        ])
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::AudioDecode("ffmpeg not found — install with: apt install ffmpeg".into())
            } else {
                Error::AudioDecode(format!("failed to run ffmpeg: {e}"))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::AudioDecode(format!("ffmpeg failed: {stderr}")));
    }

    if output.stdout.is_empty() {
        return Err(Error::AudioDecode("ffmpeg produced no audio output".into()));
    }

    let samples = samples_from_s16le(&output.stdout);

    debug!(
        samples = samples.len(),
        duration_secs = format!("{:.1}", samples.len() as f64 / WHISPER_SAMPLE_RATE as f64),
        "audio decoded"
    );

    Ok(samples)
}

/// Convert s16le PCM bytes to f32 samples normalized to [-1.0, 1.0].
fn samples_from_s16le(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|chunk| {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            sample as f32 / 32768.0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s16le_conversion() {
        // 0, i16::MAX, i16::MIN
        let bytes = [0x00, 0x00, 0xff, 0x7f, 0x00, 0x80];
        let samples = samples_from_s16le(&bytes);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert!((samples[1] - 0.99997).abs() < 1e-4);
        assert_eq!(samples[2], -1.0);
    }

    #[test]
    fn test_s16le_ignores_trailing_odd_byte() {
        let samples = samples_from_s16le(&[0x00, 0x00, 0xff]);
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_decode_missing_file() {
        let err = decode_audio(Path::new("/nonexistent/media.mp4")).unwrap_err();
        assert!(matches!(err, Error::AudioDecode(_)));
    }
}
