//! Labeling session state machine.
//!
//! The session owns all mutable state -- the frame store, the annotation
//! track, the tracking assistant, the frame pointer, the span markers, and
//! the playback flags -- and routes every mutation through its methods. Each
//! loop iteration is one `tick`: load the current frame, advance playback,
//! apply the tracker, present overlays, poll one event, dispatch. The update
//! phases are separate methods so they can be exercised without a display.
//!
//! Tracker ordering invariant: the assistant is only advanced on frames
//! visited in strictly increasing order following initialization -- the
//! pending-update mark is set by playback advance and drag completion, never
//! by manual navigation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Result};

use crate::annfile;
use crate::bbox::BoundingBox;
use crate::frames::{FrameImage, FrameStore};
use crate::input::{command_for_key, help_text, Command};
use crate::render::{InputEvent, Overlay, OverlayKind, Surface};
use crate::track::AnnotationTrack;
use crate::tracker::TrackingAssistant;

/// Whether the loop keeps running after a tick/dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// First frame of the export span (inclusive).
    pub first_frame: usize,
    /// Last frame marker; export covers `[first_frame, last_frame)`.
    pub last_frame: usize,
    pub playback_interval_ms: u64,
    pub out_dir: PathBuf,
}

pub struct Session {
    store: FrameStore,
    track: AnnotationTrack,
    assistant: TrackingAssistant,
    out_dir: PathBuf,
    currframe: usize,
    firstframe: usize,
    lastframe: usize,
    playing: bool,
    paused: bool,
    autostage: bool,
    tracking_enabled: bool,
    playback_interval_ms: u64,
    needs_update: bool,
}

impl Session {
    pub fn new(
        store: FrameStore,
        track: AnnotationTrack,
        assistant: TrackingAssistant,
        options: SessionOptions,
    ) -> Result<Self> {
        if track.len() != store.len() {
            return Err(anyhow!(
                "annotation track length {} does not match frame count {}",
                track.len(),
                store.len()
            ));
        }
        let last_valid = store.len() - 1;
        if options.first_frame > options.last_frame || options.last_frame > last_valid {
            return Err(anyhow!(
                "invalid span [{}, {}] for a {}-frame sequence",
                options.first_frame,
                options.last_frame,
                store.len()
            ));
        }
        if options.playback_interval_ms == 0 {
            return Err(anyhow!("playback interval must be at least 1 ms"));
        }

        Ok(Self {
            store,
            track,
            assistant,
            out_dir: options.out_dir,
            currframe: options.first_frame,
            firstframe: options.first_frame,
            lastframe: options.last_frame,
            playing: false,
            paused: true,
            autostage: false,
            tracking_enabled: true,
            playback_interval_ms: options.playback_interval_ms,
            needs_update: false,
        })
    }

    pub fn currframe(&self) -> usize {
        self.currframe
    }

    pub fn firstframe(&self) -> usize {
        self.firstframe
    }

    pub fn lastframe(&self) -> usize {
        self.lastframe
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn autostage(&self) -> bool {
        self.autostage
    }

    pub fn tracking_enabled(&self) -> bool {
        self.tracking_enabled
    }

    pub fn playback_interval_ms(&self) -> u64 {
        self.playback_interval_ms
    }

    pub fn track(&self) -> &AnnotationTrack {
        &self.track
    }

    pub fn track_mut(&mut self) -> &mut AnnotationTrack {
        &mut self.track
    }

    /// Run until Quit, a fatal error, or the interrupt flag is raised.
    pub fn run(&mut self, surface: &mut dyn Surface, interrupted: &AtomicBool) -> Result<()> {
        loop {
            if interrupted.load(Ordering::SeqCst) {
                log::info!("interrupted, leaving session loop");
                return Ok(());
            }
            if self.tick(surface)? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// One loop iteration: load, advance, track, present, poll, dispatch.
    pub fn tick(&mut self, surface: &mut dyn Surface) -> Result<Flow> {
        let mut image = self.store.load(self.currframe)?;
        if self.advance_playback() {
            // Track against the frame being predicted, not the one that was
            // on screen before the advance.
            image = self.store.load(self.currframe)?;
        }
        self.apply_tracker(&image)?;

        let overlays = self.overlays(&image);
        surface.present(self.currframe, &image, &overlays)?;

        match surface.poll(Duration::from_millis(self.playback_interval_ms))? {
            Some(InputEvent::Key(key)) => match command_for_key(key) {
                Some(command) => self.dispatch(command, &image),
                None => Ok(Flow::Continue),
            },
            Some(InputEvent::DragComplete { ax, ay, bx, by }) => {
                self.begin_tracking(&image, BoundingBox::from_corners(ax, ay, bx, by));
                Ok(Flow::Continue)
            }
            None => Ok(Flow::Continue),
        }
    }

    /// Playback phase: move to the next frame when playing and not paused.
    /// Returns true when the frame pointer moved.
    pub fn advance_playback(&mut self) -> bool {
        if self.playing && !self.paused && self.currframe + 1 < self.store.len() {
            self.currframe += 1;
            self.needs_update = true;
            true
        } else {
            false
        }
    }

    /// Tracker phase: resolve a pending update for the current frame.
    ///
    /// With tracking enabled the assistant is advanced and its estimate
    /// becomes the frame's proposal; with tracking disabled the assistant's
    /// last estimate is carried forward unchanged so the operator can
    /// hand-correct a frozen box. Autostage then commits the proposal.
    pub fn apply_tracker(&mut self, image: &FrameImage) -> Result<()> {
        if !self.assistant.is_bound() || !self.needs_update {
            return Ok(());
        }
        if self.tracking_enabled {
            let bbox = self.assistant.advance(image)?;
            self.track.set_unstaged(self.currframe, Some(bbox));
        } else if let Some(frozen) = self.assistant.current() {
            self.track.set_unstaged(self.currframe, Some(frozen));
        }
        if self.autostage {
            self.track.stage(self.currframe);
        }
        self.needs_update = false;
        Ok(())
    }

    /// Render phase input: the overlays for the current frame. Span markers
    /// are full-frame rectangles.
    pub fn overlays(&self, frame: &FrameImage) -> Vec<Overlay> {
        let mut overlays = Vec::new();
        if let Some(bbox) = self.track.unstaged(self.currframe) {
            overlays.push(Overlay {
                kind: OverlayKind::Proposal,
                bbox,
            });
        }
        if let Some(bbox) = self.track.staged(self.currframe) {
            overlays.push(Overlay {
                kind: OverlayKind::Committed,
                bbox,
            });
        }
        let full_frame =
            BoundingBox::new(0.0, 0.0, frame.width() as f32, frame.height() as f32);
        if self.currframe == self.firstframe {
            overlays.push(Overlay {
                kind: OverlayKind::SpanStart,
                bbox: full_frame,
            });
        }
        if self.currframe == self.lastframe {
            overlays.push(Overlay {
                kind: OverlayKind::SpanEnd,
                bbox: full_frame,
            });
        }
        overlays
    }

    /// Drag completion: bind the tracker to the drawn rectangle, mark the
    /// pending update, and unconditionally start playing. A rejected box
    /// (zero area) is reported and ignored.
    pub fn begin_tracking(&mut self, image: &FrameImage, bbox: BoundingBox) {
        if let Err(e) = self.assistant.initialize(image, bbox) {
            log::warn!("tracking not started: {e}");
            return;
        }
        self.needs_update = true;
        self.playing = true;
    }

    /// Apply one command. Commands mutate state synchronously; there is no
    /// queueing.
    pub fn dispatch(&mut self, command: Command, image: &FrameImage) -> Result<Flow> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::TogglePlayPause => {
                self.paused = !self.paused;
            }
            Command::StepBack => {
                if self.paused && self.currframe > 0 {
                    self.currframe -= 1;
                }
            }
            Command::StepForward => {
                if self.paused && self.currframe + 1 < self.store.len() {
                    self.currframe += 1;
                }
            }
            Command::StageCurrent => {
                if self.paused {
                    self.track.stage(self.currframe);
                }
            }
            Command::StageAll => {
                if self.paused {
                    self.track.stage_all();
                }
            }
            Command::ToggleAutostage => {
                self.autostage = !self.autostage;
                log::info!("autostage {}", if self.autostage { "on" } else { "off" });
            }
            Command::ResetCurrent => {
                self.track.reset(self.currframe);
                self.rebind(image, self.track.staged(self.currframe));
            }
            Command::ResetAll => {
                self.track.reset_all();
                self.rebind(image, self.track.staged(self.currframe));
            }
            Command::Save => self.save(),
            Command::MarkSpanStart => {
                if self.currframe != self.lastframe {
                    self.firstframe = self.currframe;
                }
            }
            Command::MarkSpanEnd => {
                if self.currframe != self.firstframe {
                    self.lastframe = self.currframe;
                }
            }
            Command::SpeedUp => {
                self.playback_interval_ms = (self.playback_interval_ms / 2).max(1);
                log::info!("time per frame: {}ms", self.playback_interval_ms);
            }
            Command::SlowDown => {
                self.playback_interval_ms = self.playback_interval_ms.saturating_mul(2);
                log::info!("time per frame: {}ms", self.playback_interval_ms);
            }
            Command::ReinitFromUnstaged => {
                self.rebind(image, self.track.unstaged(self.currframe));
            }
            Command::ReinitFromStaged => {
                self.rebind(image, self.track.staged(self.currframe));
            }
            Command::ToggleTracking => {
                self.tracking_enabled = !self.tracking_enabled;
                log::info!(
                    "tracking {}",
                    if self.tracking_enabled { "on" } else { "off" }
                );
            }
            Command::JumpToSpanStart => {
                self.currframe = self.firstframe;
            }
            Command::JumpToSpanEnd => {
                self.currframe = self.lastframe;
            }
            Command::Help => {
                println!("{}", help_text());
            }
        }
        Ok(Flow::Continue)
    }

    /// Re-initialize the tracker at an existing annotation, if there is one.
    fn rebind(&mut self, image: &FrameImage, bbox: Option<BoundingBox>) {
        let Some(bbox) = bbox else {
            log::warn!("no annotation on frame {} to re-init from", self.currframe);
            return;
        };
        if let Err(e) = self.assistant.initialize(image, bbox) {
            log::warn!("tracker re-init failed: {e}");
        }
    }

    /// Export the staged span. An incomplete span is recoverable: it is
    /// reported and nothing is written, the session keeps running.
    fn save(&mut self) {
        match annfile::export_span(
            &self.store,
            &self.track,
            self.firstframe,
            self.lastframe,
            &self.out_dir,
        ) {
            Ok(summary) => {
                println!(
                    "saved {} frames to {}",
                    summary.frames_written,
                    self.out_dir.display()
                );
            }
            Err(e) => {
                log::warn!("save failed: {e}");
                println!("save failed: {e}");
            }
        }
    }
}
