use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Result;

use super::{InputEvent, Overlay, Surface};
use crate::frames::FrameImage;

/// Scripted surface for tests and batch runs.
///
/// Events are served in order, one per poll; presented frames and their
/// overlays are recorded for assertions. Draws nothing.
#[derive(Default)]
pub struct HeadlessSurface {
    events: VecDeque<InputEvent>,
    presented: Vec<(usize, Vec<Overlay>)>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            presented: Vec::new(),
        }
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Recorded `(frame_index, overlays)` pairs, one per present call.
    pub fn presented(&self) -> &[(usize, Vec<Overlay>)] {
        &self.presented
    }
}

impl Surface for HeadlessSurface {
    fn present(
        &mut self,
        frame_index: usize,
        _frame: &FrameImage,
        overlays: &[Overlay],
    ) -> Result<()> {
        self.presented.push((frame_index, overlays.to_vec()));
        Ok(())
    }

    fn poll(&mut self, _timeout: Duration) -> Result<Option<InputEvent>> {
        Ok(self.events.pop_front())
    }
}
