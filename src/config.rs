use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::extract::ExtractSettings;
use crate::tracker::TrackerSettings;

const DEFAULT_OUTPUT_DIR: &str = "labeled";
const DEFAULT_PLAYBACK_INTERVAL_MS: u64 = 33;
const DEFAULT_EXTRACT_WIDTH: u32 = 1024;
const DEFAULT_EXTRACT_HEIGHT: u32 = 576;
const DEFAULT_STUB_FRAMES: usize = 90;
const DEFAULT_TRACKER_BACKEND: &str = "stub";
const DEFAULT_MODEL_SIZE: u32 = 227;

#[derive(Debug, Deserialize, Default)]
struct SessionConfigFile {
    video: Option<String>,
    frames_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    annotations: Option<PathBuf>,
    span: Option<SpanConfigFile>,
    playback: Option<PlaybackConfigFile>,
    extract: Option<ExtractConfigFile>,
    tracker: Option<TrackerConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SpanConfigFile {
    first_frame: Option<usize>,
    last_frame: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct PlaybackConfigFile {
    interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct ExtractConfigFile {
    width: Option<u32>,
    height: Option<u32>,
    stub_frames: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct TrackerConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    model_width: Option<u32>,
    model_height: Option<u32>,
}

/// Resolved session configuration: config file (via `TRACKMARK_CONFIG`), then
/// environment overrides, then validation. Command-line flags override
/// individual fields afterwards in the binary.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Source video; presence triggers extraction into `frames_dir`.
    pub video: Option<String>,
    /// Frame directory; the one genuinely required input.
    pub frames_dir: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// Sparse annotation file to import at startup.
    pub annotations: Option<PathBuf>,
    pub first_frame: usize,
    /// Defaults to the final frame of the sequence when absent.
    pub last_frame: Option<usize>,
    pub playback_interval_ms: u64,
    pub extract: ExtractSettings,
    pub tracker: TrackerSettings,
}

impl SessionConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("TRACKMARK_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SessionConfigFile) -> Self {
        let span = file.span.unwrap_or_default();
        let playback = file.playback.unwrap_or_default();
        let extract = file.extract.unwrap_or_default();
        let tracker = file.tracker.unwrap_or_default();
        Self {
            video: file.video,
            frames_dir: file.frames_dir,
            output_dir: file
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            annotations: file.annotations,
            first_frame: span.first_frame.unwrap_or(0),
            last_frame: span.last_frame,
            playback_interval_ms: playback.interval_ms.unwrap_or(DEFAULT_PLAYBACK_INTERVAL_MS),
            extract: ExtractSettings {
                width: extract.width.unwrap_or(DEFAULT_EXTRACT_WIDTH),
                height: extract.height.unwrap_or(DEFAULT_EXTRACT_HEIGHT),
                stub_frames: extract.stub_frames.unwrap_or(DEFAULT_STUB_FRAMES),
            },
            tracker: TrackerSettings {
                backend: tracker
                    .backend
                    .unwrap_or_else(|| DEFAULT_TRACKER_BACKEND.to_string()),
                model_path: tracker.model_path,
                model_width: tracker.model_width.unwrap_or(DEFAULT_MODEL_SIZE),
                model_height: tracker.model_height.unwrap_or(DEFAULT_MODEL_SIZE),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(video) = std::env::var("TRACKMARK_VIDEO") {
            if !video.trim().is_empty() {
                self.video = Some(video);
            }
        }
        if let Ok(dir) = std::env::var("TRACKMARK_FRAMES_DIR") {
            if !dir.trim().is_empty() {
                self.frames_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(dir) = std::env::var("TRACKMARK_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(path) = std::env::var("TRACKMARK_ANNOTATIONS") {
            if !path.trim().is_empty() {
                self.annotations = Some(PathBuf::from(path));
            }
        }
        if let Ok(interval) = std::env::var("TRACKMARK_PLAYBACK_INTERVAL_MS") {
            let interval_ms: u64 = interval.parse().map_err(|_| {
                anyhow!("TRACKMARK_PLAYBACK_INTERVAL_MS must be an integer number of milliseconds")
            })?;
            self.playback_interval_ms = interval_ms;
        }
        if let Ok(backend) = std::env::var("TRACKMARK_TRACKER_BACKEND") {
            if !backend.trim().is_empty() {
                self.tracker.backend = backend;
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.playback_interval_ms == 0 {
            return Err(anyhow!("playback interval must be at least 1 ms"));
        }
        if let Some(last) = self.last_frame {
            if self.first_frame > last {
                return Err(anyhow!(
                    "first frame {} is beyond last frame {}",
                    self.first_frame,
                    last
                ));
            }
        }
        if self.extract.width == 0 || self.extract.height == 0 {
            return Err(anyhow!("extraction size must be non-zero"));
        }
        if self.tracker.backend.trim().is_empty() {
            return Err(anyhow!("tracker backend must not be empty"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SessionConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
