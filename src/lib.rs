//! trackmark
//!
//! Interactive, tracker-assisted bounding-box labeling for video frame
//! sequences. A human seeds a target region on one frame; an external
//! single-object tracker propagates it across subsequent frames; the human
//! reviews, corrects, and stages the result frame by frame before exporting
//! a contiguous labeled span in the flat ALOV-style quad format.
//!
//! # Session invariants
//!
//! 1. **Two tracks, one length**: `staged` (operator-approved) and `unstaged`
//!    (tracker proposal) are parallel arrays aligned to the frame sequence.
//! 2. **Explicit presence**: "no annotation" is `None`, never a zero-box
//!    sentinel.
//! 3. **Tracker ordering**: the assistant is advanced only on frames visited
//!    in strictly increasing order after initialization, one call per frame;
//!    advancing before initialization is rejected.
//! 4. **Export is all-or-nothing**: an incomplete staged span writes nothing.
//! 5. **Single-threaded session**: all session state is mutated from the one
//!    render/poll/dispatch loop.
//!
//! # Module Structure
//!
//! - `bbox`, `track`: annotation value types and per-frame tracks
//! - `frames`, `extract`: frame sequence storage and video extraction
//! - `tracker`: tracking assistant and its backends
//! - `annfile`: sparse import / dense export of annotation spans
//! - `session`, `input`, `render`: the interactive state machine, its
//!   command table, and the display/input seam
//! - `config`, `ui`: configuration layering and stage reporting

pub mod annfile;
pub mod bbox;
pub mod config;
pub mod extract;
#[cfg(feature = "extract-ffmpeg")]
mod extract_ffmpeg;
pub mod frames;
pub mod input;
pub mod render;
pub mod session;
pub mod track;
pub mod tracker;
pub mod ui;

pub use annfile::{export_span, load_annotations, ANNOTATIONS_FILE, SPAN_FILE};
pub use bbox::BoundingBox;
pub use config::SessionConfig;
pub use extract::{extract_frames, ExtractSettings};
pub use frames::{sequence_file_name, FrameImage, FrameStore, FRAME_EXTENSION};
pub use input::{command_for_key, help_text, Command};
pub use render::{HeadlessSurface, InputEvent, Overlay, OverlayKind, StdioSurface, Surface};
pub use session::{Flow, Session, SessionOptions};
pub use track::AnnotationTrack;
pub use tracker::{select_backend, StubTracker, TrackerBackend, TrackerSettings, TrackingAssistant};
#[cfg(feature = "tracker-tract")]
pub use tracker::TractTracker;
