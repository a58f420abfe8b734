//! trackmark - interactive tracker-assisted labeling session
//!
//! Seeds come from the operator (`box x1 y1 x2 y2` on stdin), propagation
//! from the configured tracker backend; staged results export as an
//! ALOV-style annotation span plus copied frames.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use trackmark::ui::Ui;
use trackmark::{
    extract_frames, help_text, load_annotations, select_backend, AnnotationTrack, FrameStore,
    Session, SessionConfig, SessionOptions, StdioSurface, TrackingAssistant,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Input video to extract frames from (stub:// generates a synthetic scene)
    #[arg(long, value_name = "PATH")]
    video: Option<String>,

    /// Directory containing (or receiving) the frame sequence
    #[arg(long, value_name = "DIR")]
    frames_dir: Option<PathBuf>,

    /// Output directory for the exported annotations and frames
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Sparse annotation file to import at startup
    #[arg(long, value_name = "PATH")]
    annotations: Option<PathBuf>,

    /// 0-based id of the first span frame
    #[arg(long, value_name = "N")]
    first_frame: Option<usize>,

    /// 0-based id of the last span frame (defaults to the final frame)
    #[arg(long, value_name = "N")]
    last_frame: Option<usize>,

    /// Playback interval in milliseconds
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Tracker backend (stub, or tract with the tracker-tract feature)
    #[arg(long, value_name = "NAME")]
    tracker: Option<String>,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut cfg = SessionConfig::load()?;
    if args.video.is_some() {
        cfg.video = args.video;
    }
    if args.frames_dir.is_some() {
        cfg.frames_dir = args.frames_dir;
    }
    if let Some(output_dir) = args.output_dir {
        cfg.output_dir = output_dir;
    }
    if args.annotations.is_some() {
        cfg.annotations = args.annotations;
    }
    if let Some(first_frame) = args.first_frame {
        cfg.first_frame = first_frame;
    }
    if args.last_frame.is_some() {
        cfg.last_frame = args.last_frame;
    }
    if let Some(interval_ms) = args.interval_ms {
        if interval_ms == 0 {
            return Err(anyhow!("--interval-ms must be at least 1"));
        }
        cfg.playback_interval_ms = interval_ms;
    }
    if let Some(tracker) = args.tracker {
        cfg.tracker.backend = tracker;
    }

    let ui = Ui::from_flag(Some(&args.ui), std::io::stderr().is_terminal());

    let frames_dir = cfg.frames_dir.clone().ok_or_else(|| {
        anyhow!("--frames-dir is required (or TRACKMARK_FRAMES_DIR, or the config file)")
    })?;

    if let Some(video) = &cfg.video {
        let _stage = ui.stage("Extract video frames");
        let written = extract_frames(video, &frames_dir, &cfg.extract)?;
        log::info!("extracted {} frames into {}", written, frames_dir.display());
    }

    let store = {
        let _stage = ui.stage("Enumerate frames");
        FrameStore::open(&frames_dir)?
    };
    let frame_count = store.len();
    let last_frame = match cfg.last_frame {
        Some(last) if last < frame_count => last,
        Some(last) => {
            return Err(anyhow!(
                "last frame {} is beyond the final frame {}",
                last,
                frame_count - 1
            ))
        }
        None => frame_count - 1,
    };

    let mut track = AnnotationTrack::new(frame_count);
    if let Some(path) = &cfg.annotations {
        let _stage = ui.stage("Import annotations");
        match load_annotations(path, &mut track, cfg.first_frame, last_frame) {
            Ok(summary) => log::info!(
                "imported {} keyframes from {}",
                summary.keyframes,
                path.display()
            ),
            Err(e) => log::warn!("annotation import skipped: {e}"),
        }
    }

    let assistant = TrackingAssistant::new(select_backend(&cfg.tracker)?);
    log::info!("tracker backend: {}", assistant.backend_name());

    let mut session = Session::new(
        store,
        track,
        assistant,
        SessionOptions {
            first_frame: cfg.first_frame,
            last_frame,
            playback_interval_ms: cfg.playback_interval_ms,
            out_dir: cfg.output_dir.clone(),
        },
    )?;

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = interrupted.clone();
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .context("install Ctrl-C handler")?;
    }

    println!("{}", help_text());
    println!(
        "labeling {} frames from {}; exports go to {}",
        frame_count,
        frames_dir.display(),
        cfg.output_dir.display()
    );

    let mut surface = StdioSurface::new();
    session.run(&mut surface, &interrupted)?;

    println!("session ended at frame {}", session.currframe());
    Ok(())
}
