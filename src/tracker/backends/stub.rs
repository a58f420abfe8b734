use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};

use crate::bbox::BoundingBox;
use crate::tracker::backend::TrackerBackend;

/// Stub tracker for tests and demos.
///
/// Carries the bound box forward with a small deterministic drift derived
/// from a hash of the frame pixels, so identical frame sequences reproduce
/// identical tracks. `with_fixed_drift` pins the drift for tests that need
/// exact positions.
pub struct StubTracker {
    current: Option<BoundingBox>,
    fixed_drift: Option<(f32, f32)>,
}

impl StubTracker {
    pub fn new() -> Self {
        Self {
            current: None,
            fixed_drift: None,
        }
    }

    /// Pin the per-frame drift instead of deriving it from pixel content.
    pub fn with_fixed_drift(dx: f32, dy: f32) -> Self {
        Self {
            current: None,
            fixed_drift: Some((dx, dy)),
        }
    }

    fn drift_for(&self, pixels: &[u8]) -> (f32, f32) {
        if let Some(drift) = self.fixed_drift {
            return drift;
        }
        let digest: [u8; 32] = Sha256::digest(pixels).into();
        let dx = (digest[0] % 5) as f32 - 2.0;
        let dy = (digest[1] % 5) as f32 - 2.0;
        (dx, dy)
    }
}

impl Default for StubTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackerBackend for StubTracker {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn init(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
        target: &BoundingBox,
    ) -> Result<()> {
        self.current = Some(*target);
        Ok(())
    }

    fn advance(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<BoundingBox> {
        let current = self
            .current
            .ok_or_else(|| anyhow!("stub tracker advanced without a bound target"))?;
        let (dx, dy) = self.drift_for(pixels);

        // Shift, then clamp back inside the frame without changing the size.
        let mut next = BoundingBox::new(
            current.x1 + dx,
            current.y1 + dy,
            current.x2 + dx,
            current.y2 + dy,
        );
        if next.x1 < 0.0 {
            let shift = -next.x1;
            next.x1 += shift;
            next.x2 += shift;
        }
        if next.y1 < 0.0 {
            let shift = -next.y1;
            next.y1 += shift;
            next.y2 += shift;
        }
        let width = width as f32;
        let height = height as f32;
        if next.x2 > width {
            let shift = next.x2 - width;
            next.x1 -= shift;
            next.x2 -= shift;
        }
        if next.y2 > height {
            let shift = next.y2 - height;
            next.y1 -= shift;
            next.y2 -= shift;
        }

        self.current = Some(next);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_drift_moves_the_box_each_frame() {
        let mut tracker = StubTracker::with_fixed_drift(3.0, 2.0);
        tracker
            .init(&[0u8; 12], 100, 100, &BoundingBox::new(10.0, 10.0, 20.0, 20.0))
            .unwrap();

        let first = tracker.advance(&[0u8; 12], 100, 100).unwrap();
        assert_eq!(first, BoundingBox::new(13.0, 12.0, 23.0, 22.0));
        let second = tracker.advance(&[0u8; 12], 100, 100).unwrap();
        assert_eq!(second, BoundingBox::new(16.0, 14.0, 26.0, 24.0));
    }

    #[test]
    fn hash_drift_is_deterministic_per_frame_content() {
        let frame = vec![7u8; 48];
        let mut a = StubTracker::new();
        let mut b = StubTracker::new();
        let target = BoundingBox::new(10.0, 10.0, 20.0, 20.0);
        a.init(&frame, 100, 100, &target).unwrap();
        b.init(&frame, 100, 100, &target).unwrap();

        assert_eq!(
            a.advance(&frame, 100, 100).unwrap(),
            b.advance(&frame, 100, 100).unwrap()
        );
    }

    #[test]
    fn advance_stays_inside_the_frame() {
        let mut tracker = StubTracker::with_fixed_drift(50.0, 50.0);
        tracker
            .init(&[0u8; 12], 100, 100, &BoundingBox::new(80.0, 80.0, 95.0, 95.0))
            .unwrap();

        let next = tracker.advance(&[0u8; 12], 100, 100).unwrap();
        assert!(next.x2 <= 100.0 && next.y2 <= 100.0);
        assert_eq!(next.width(), 15.0);
        assert_eq!(next.height(), 15.0);
    }

    #[test]
    fn advance_without_init_is_rejected() {
        let mut tracker = StubTracker::new();
        assert!(tracker.advance(&[0u8; 12], 100, 100).is_err());
    }
}
