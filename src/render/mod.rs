//! Render/input surface seam.
//!
//! The session draws through, and polls events from, a `Surface`. The trait
//! keeps the state machine independent of any concrete display: the shipped
//! implementations are a line-oriented terminal surface and a scripted
//! headless surface for tests and batch runs. A windowed implementation only
//! has to draw rectangles and report key presses and completed pointer drags.

mod headless;
mod stdio;

use std::time::Duration;

use anyhow::Result;

use crate::bbox::BoundingBox;
use crate::frames::FrameImage;

pub use headless::HeadlessSurface;
pub use stdio::StdioSurface;

/// What a rectangle overlay means, so surfaces can style them apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
    /// The unstaged (tracker/pending) box.
    Proposal,
    /// The staged (operator-approved) box.
    Committed,
    /// Full-frame marker: current frame is the span start.
    SpanStart,
    /// Full-frame marker: current frame is the span end.
    SpanEnd,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub bbox: BoundingBox,
}

/// One input event per poll.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    /// A key press, delivered as the key's character.
    Key(char),
    /// A completed pointer drag, corners in any order (unnormalized).
    DragComplete { ax: f32, ay: f32, bx: f32, by: f32 },
}

/// Display plus input collaborator for one session.
pub trait Surface {
    /// Show the current frame with its overlays.
    fn present(&mut self, frame_index: usize, frame: &FrameImage, overlays: &[Overlay])
        -> Result<()>;

    /// Wait up to `timeout` for one input event.
    fn poll(&mut self, timeout: Duration) -> Result<Option<InputEvent>>;
}
