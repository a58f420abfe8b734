//! Per-frame annotation tracks.
//!
//! An `AnnotationTrack` holds two parallel arrays, frame index -> box:
//!
//! - `staged`: the operator-approved label, eligible for export
//! - `unstaged`: the tracker's (or a pending) proposal, not yet trusted
//!
//! Both arrays are length-aligned to the frame store and created once at
//! session start. Absence of an annotation is an explicit `None`, not a
//! zero-coordinate sentinel.

use crate::bbox::BoundingBox;

pub struct AnnotationTrack {
    staged: Vec<Option<BoundingBox>>,
    unstaged: Vec<Option<BoundingBox>>,
}

impl AnnotationTrack {
    pub fn new(len: usize) -> Self {
        Self {
            staged: vec![None; len],
            unstaged: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn staged(&self, frame: usize) -> Option<BoundingBox> {
        self.staged.get(frame).copied().flatten()
    }

    pub fn unstaged(&self, frame: usize) -> Option<BoundingBox> {
        self.unstaged.get(frame).copied().flatten()
    }

    pub fn set_staged(&mut self, frame: usize, bbox: Option<BoundingBox>) {
        self.staged[frame] = bbox;
    }

    pub fn set_unstaged(&mut self, frame: usize, bbox: Option<BoundingBox>) {
        self.unstaged[frame] = bbox;
    }

    /// Commit the proposal for one frame: `staged[frame] = unstaged[frame]`.
    pub fn stage(&mut self, frame: usize) {
        self.staged[frame] = self.unstaged[frame];
    }

    /// Commit every proposal: `staged[i] = unstaged[i]` for all `i`.
    pub fn stage_all(&mut self) {
        self.staged.copy_from_slice(&self.unstaged);
    }

    /// Discard the proposal for one frame: `unstaged[frame] = staged[frame]`.
    pub fn reset(&mut self, frame: usize) {
        self.unstaged[frame] = self.staged[frame];
    }

    /// Discard every proposal: `unstaged[i] = staged[i]` for all `i`.
    pub fn reset_all(&mut self) {
        self.unstaged.copy_from_slice(&self.staged);
    }

    /// First frame in `[first, last)` without a staged box, if any.
    pub fn first_unstaged_in_span(&self, first: usize, last: usize) -> Option<usize> {
        (first..last.min(self.staged.len())).find(|&i| self.staged[i].is_none())
    }

    /// Linearly interpolate staged boxes over the open interval `(from, to)`.
    ///
    /// Requires `from < to`, `to - from > 1`, and explicit staged boxes at
    /// both endpoints; anything else is a no-op. Every frame strictly between
    /// the endpoints is overwritten -- this is a bulk fill used while
    /// importing sparse keyframes, not a merge.
    pub fn interpolate_staged(&mut self, from: usize, to: usize) {
        if from >= to || to - from <= 1 || to >= self.staged.len() {
            return;
        }
        let (Some(a), Some(b)) = (self.staged[from], self.staged[to]) else {
            return;
        };
        let span = (to - from) as f32;
        let step = BoundingBox::new(
            (b.x1 - a.x1) / span,
            (b.y1 - a.y1) / span,
            (b.x2 - a.x2) / span,
            (b.y2 - a.y2) / span,
        );
        for i in (from + 1)..to {
            let k = (i - from) as f32;
            self.staged[i] = Some(BoundingBox::new(
                a.x1 + k * step.x1,
                a.y1 + k * step.y1,
                a.x2 + k * step.x2,
                a.y2 + k * step.y2,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-4;

    fn assert_close(actual: BoundingBox, expected: BoundingBox) {
        for (a, e) in [
            (actual.x1, expected.x1),
            (actual.y1, expected.y1),
            (actual.x2, expected.x2),
            (actual.y2, expected.y2),
        ] {
            assert!((a - e).abs() < TOLERANCE, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn interpolation_is_linear_and_leaves_endpoints_untouched() {
        let mut track = AnnotationTrack::new(12);
        let a = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        let b = BoundingBox::new(20.0, 20.0, 60.0, 60.0);
        track.set_staged(0, Some(a));
        track.set_staged(10, Some(b));

        track.interpolate_staged(0, 10);

        assert_eq!(track.staged(0), Some(a));
        assert_eq!(track.staged(10), Some(b));
        for i in 1..10 {
            let k = i as f32 / 10.0;
            let expected = BoundingBox::new(
                a.x1 + k * (b.x1 - a.x1),
                a.y1 + k * (b.y1 - a.y1),
                a.x2 + k * (b.x2 - a.x2),
                a.y2 + k * (b.y2 - a.y2),
            );
            assert_close(track.staged(i).unwrap(), expected);
        }
        assert_close(track.staged(5).unwrap(), BoundingBox::new(15.0, 15.0, 55.0, 55.0));
    }

    #[test]
    fn interpolation_overwrites_previously_staged_frames() {
        let mut track = AnnotationTrack::new(6);
        track.set_staged(0, Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
        track.set_staged(4, Some(BoundingBox::new(4.0, 4.0, 14.0, 14.0)));
        track.set_staged(2, Some(BoundingBox::new(99.0, 99.0, 100.0, 100.0)));

        track.interpolate_staged(0, 4);

        assert_close(
            track.staged(2).unwrap(),
            BoundingBox::new(2.0, 2.0, 12.0, 12.0),
        );
    }

    #[test]
    fn adjacent_or_inverted_ranges_are_noops() {
        let mut track = AnnotationTrack::new(8);
        track.set_staged(2, Some(BoundingBox::new(1.0, 1.0, 2.0, 2.0)));
        track.set_staged(3, Some(BoundingBox::new(5.0, 5.0, 6.0, 6.0)));

        track.interpolate_staged(2, 3);
        track.interpolate_staged(3, 3);
        track.interpolate_staged(3, 2);

        assert_eq!(track.staged(1), None);
        assert_eq!(track.staged(4), None);
    }

    #[test]
    fn missing_endpoint_is_a_noop() {
        let mut track = AnnotationTrack::new(8);
        track.set_staged(0, Some(BoundingBox::new(1.0, 1.0, 2.0, 2.0)));

        track.interpolate_staged(0, 6);

        for i in 1..6 {
            assert_eq!(track.staged(i), None);
        }
    }

    #[test]
    fn stage_all_and_reset_all_are_idempotent() {
        let mut track = AnnotationTrack::new(4);
        track.set_unstaged(1, Some(BoundingBox::new(1.0, 1.0, 2.0, 2.0)));
        track.set_unstaged(3, Some(BoundingBox::new(3.0, 3.0, 4.0, 4.0)));

        track.stage_all();
        for i in 0..4 {
            assert_eq!(track.staged(i), track.unstaged(i));
        }
        track.stage_all();
        for i in 0..4 {
            assert_eq!(track.staged(i), track.unstaged(i));
        }

        track.set_staged(2, Some(BoundingBox::new(7.0, 7.0, 8.0, 8.0)));
        track.reset_all();
        for i in 0..4 {
            assert_eq!(track.unstaged(i), track.staged(i));
        }
        track.reset_all();
        for i in 0..4 {
            assert_eq!(track.unstaged(i), track.staged(i));
        }
    }

    #[test]
    fn first_unstaged_in_span_reports_the_gap() {
        let mut track = AnnotationTrack::new(6);
        track.set_staged(2, Some(BoundingBox::new(1.0, 1.0, 2.0, 2.0)));
        track.set_staged(3, Some(BoundingBox::new(1.0, 1.0, 2.0, 2.0)));

        assert_eq!(track.first_unstaged_in_span(2, 5), Some(4));
        assert_eq!(track.first_unstaged_in_span(2, 4), None);
    }
}
