//! Video-to-frames extraction.
//!
//! Extraction turns a source video into the zero-padded frame files a session
//! runs over. Two backends, dispatched on the source path:
//!
//! - `stub://` sources generate a deterministic synthetic scene (a bright
//!   square drifting over a gradient); used by tests and demos
//! - real paths decode through FFmpeg behind the `extract-ffmpeg` feature
//!
//! Extraction requires the frames directory to exist and to contain no frame
//! files yet: refusing to mix a fresh extraction into a previous session's
//! frames is cheaper than renumbering.

use std::path::Path;

use anyhow::{anyhow, Context, Result};

#[cfg(feature = "extract-ffmpeg")]
use crate::extract_ffmpeg::FfmpegExtractor;
use crate::frames::{list_frame_files, sequence_file_name};

/// Extraction parameters. Frames are scaled to a fixed size on the way out,
/// matching what the downstream tracker models were trained against.
#[derive(Clone, Debug)]
pub struct ExtractSettings {
    pub width: u32,
    pub height: u32,
    /// Frame count for `stub://` sources.
    pub stub_frames: usize,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 576,
            stub_frames: 90,
        }
    }
}

/// Extract `video` into `frames_dir` as `%08d.jpg` files, 0-based.
/// Returns the number of frames written.
pub fn extract_frames(video: &str, frames_dir: &Path, settings: &ExtractSettings) -> Result<usize> {
    let existing = list_frame_files(frames_dir)?;
    if !existing.is_empty() {
        return Err(anyhow!(
            "frames directory {} already contains {} frame files; run without a video or clear it",
            frames_dir.display(),
            existing.len()
        ));
    }

    if video.starts_with("stub://") {
        return extract_synthetic(video, frames_dir, settings);
    }

    #[cfg(feature = "extract-ffmpeg")]
    {
        let mut extractor = FfmpegExtractor::new(video, settings)?;
        return extractor.run(frames_dir);
    }

    #[cfg(not(feature = "extract-ffmpeg"))]
    Err(anyhow!(
        "video extraction requires the extract-ffmpeg feature"
    ))
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and demos
// ----------------------------------------------------------------------------

fn extract_synthetic(video: &str, frames_dir: &Path, settings: &ExtractSettings) -> Result<usize> {
    log::info!(
        "extracting {} synthetic frames from {} at {}x{}",
        settings.stub_frames,
        video,
        settings.width,
        settings.height
    );

    for index in 0..settings.stub_frames {
        let pixels = synthetic_scene(index, settings.width, settings.height);
        let path = frames_dir.join(sequence_file_name(index));
        image::RgbImage::from_raw(settings.width, settings.height, pixels)
            .ok_or_else(|| anyhow!("synthetic frame buffer size mismatch"))?
            .save(&path)
            .with_context(|| format!("writing synthetic frame {}", path.display()))?;
    }
    Ok(settings.stub_frames)
}

/// Deterministic scene: dim gradient background, bright 48x48 square drifting
/// down-right by (3, 2) pixels per frame. Gives a stub or real tracker an
/// actual target to follow.
fn synthetic_scene(index: usize, width: u32, height: u32) -> Vec<u8> {
    let mut pixels = vec![0u8; (width * height * 3) as usize];
    for y in 0..height {
        for x in 0..width {
            let offset = ((y * width + x) * 3) as usize;
            let shade = ((x + y) % 128) as u8;
            pixels[offset] = shade;
            pixels[offset + 1] = shade / 2;
            pixels[offset + 2] = shade;
        }
    }

    let side = 48u32;
    let max_x = width.saturating_sub(side);
    let max_y = height.saturating_sub(side);
    let square_x = ((10 + 3 * index) as u32) % max_x.max(1);
    let square_y = ((20 + 2 * index) as u32) % max_y.max(1);
    for y in square_y..(square_y + side).min(height) {
        for x in square_x..(square_x + side).min(width) {
            let offset = ((y * width + x) * 3) as usize;
            pixels[offset] = 250;
            pixels[offset + 1] = 250;
            pixels[offset + 2] = 250;
        }
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::FrameStore;

    fn settings() -> ExtractSettings {
        ExtractSettings {
            width: 64,
            height: 48,
            stub_frames: 5,
        }
    }

    #[test]
    fn synthetic_extraction_writes_sequence_files() {
        let dir = tempfile::tempdir().expect("tempdir");

        let written = extract_frames("stub://demo", dir.path(), &settings()).expect("extract");
        assert_eq!(written, 5);

        let store = FrameStore::open(dir.path()).expect("open extracted frames");
        assert_eq!(store.len(), 5);
        assert_eq!(
            store.path(0).file_name().unwrap().to_str().unwrap(),
            "00000000.jpg"
        );
        let frame = store.load(4).expect("decode extracted frame");
        assert_eq!(frame.width(), 64);
        assert_eq!(frame.height(), 48);
    }

    #[test]
    fn extraction_refuses_a_populated_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        extract_frames("stub://demo", dir.path(), &settings()).expect("first extraction");

        let err = extract_frames("stub://demo", dir.path(), &settings()).unwrap_err();
        assert!(err.to_string().contains("already contains"));
    }

    #[test]
    fn extraction_refuses_a_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(extract_frames("stub://demo", &dir.path().join("missing"), &settings()).is_err());
    }

    #[test]
    fn synthetic_scene_moves_between_frames() {
        let a = synthetic_scene(0, 64, 48);
        let b = synthetic_scene(1, 64, 48);
        assert_ne!(a, b);
        assert_eq!(a, synthetic_scene(0, 64, 48));
    }
}
