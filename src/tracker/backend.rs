use anyhow::Result;

use crate::bbox::BoundingBox;

/// Single-object tracker backend trait.
///
/// A backend is bound to one target at a time: `init` (re)binds the target
/// inside a frame, `advance` estimates the target's box in a later frame.
/// Calling order is enforced by the owning `TrackingAssistant`; a backend may
/// additionally reject an `advance` without a prior `init`.
///
/// Implementations must treat the pixel slice as read-only and ephemeral --
/// it is the decoded RGB24 content of the current frame and is not retained
/// by the caller across calls.
pub trait TrackerBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Bind the tracker to `target` within the given frame. A later call
    /// rebinds, discarding the prior binding.
    fn init(&mut self, pixels: &[u8], width: u32, height: u32, target: &BoundingBox)
        -> Result<()>;

    /// Estimate the bound target's box within the given frame.
    ///
    /// One call per frame, in visitation order; temporal consistency across
    /// skipped frames is entirely the model's responsibility.
    fn advance(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<BoundingBox>;
}
