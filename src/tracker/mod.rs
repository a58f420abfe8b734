//! Tracking assistant.
//!
//! `TrackingAssistant` is the owned adapter around the external single-object
//! tracking model. It holds the "is a target currently bound" state
//! explicitly: `advance` before `initialize` is a usage error, not undefined
//! behavior, and re-initializing rebinds the target, discarding the prior
//! binding.

mod backend;
mod backends;

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::bbox::BoundingBox;
use crate::frames::FrameImage;

pub use backend::TrackerBackend;
pub use backends::StubTracker;
#[cfg(feature = "tracker-tract")]
pub use backends::TractTracker;

/// Tracker backend selection, from configuration.
#[derive(Clone, Debug)]
pub struct TrackerSettings {
    /// Backend name: "stub", or "tract" (with the tracker-tract feature).
    pub backend: String,
    /// ONNX model path for the tract backend.
    pub model_path: Option<PathBuf>,
    /// Model input size for the tract backend.
    pub model_width: u32,
    pub model_height: u32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            backend: "stub".to_string(),
            model_path: None,
            model_width: 227,
            model_height: 227,
        }
    }
}

/// Instantiate the configured tracker backend.
pub fn select_backend(settings: &TrackerSettings) -> Result<Box<dyn TrackerBackend>> {
    match settings.backend.as_str() {
        "stub" => Ok(Box::new(StubTracker::new())),
        #[cfg(feature = "tracker-tract")]
        "tract" => {
            let model_path = settings
                .model_path
                .as_ref()
                .ok_or_else(|| anyhow!("tracker backend 'tract' requires a model path"))?;
            Ok(Box::new(TractTracker::new(
                model_path,
                settings.model_width,
                settings.model_height,
            )?))
        }
        #[cfg(not(feature = "tracker-tract"))]
        "tract" => Err(anyhow!(
            "tracker backend 'tract' requires the tracker-tract feature"
        )),
        other => Err(anyhow!("unknown tracker backend '{}'", other)),
    }
}

/// Adapter around a tracker backend with explicit binding state.
pub struct TrackingAssistant {
    backend: Box<dyn TrackerBackend>,
    current: Option<BoundingBox>,
}

impl TrackingAssistant {
    pub fn new(backend: Box<dyn TrackerBackend>) -> Self {
        Self {
            backend,
            current: None,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// True once a target has been bound by `initialize`.
    pub fn is_bound(&self) -> bool {
        self.current.is_some()
    }

    /// The bound target's latest estimate (the initialization box until the
    /// first `advance`).
    pub fn current(&self) -> Option<BoundingBox> {
        self.current
    }

    /// Bind the tracker to `target` within `frame`. Rebinds on repeat calls.
    /// Rejects a degenerate target: a zero-area box cannot seed a tracker.
    pub fn initialize(&mut self, frame: &FrameImage, target: BoundingBox) -> Result<()> {
        if target.is_degenerate() {
            return Err(anyhow!(
                "cannot initialize tracking on a zero-area box ({:?})",
                target
            ));
        }
        self.backend
            .init(frame.pixels(), frame.width(), frame.height(), &target)?;
        self.current = Some(target);
        log::debug!("tracker {} bound to {:?}", self.backend.name(), target);
        Ok(())
    }

    /// Estimate the target's box within `frame` and remember it as the
    /// latest estimate. Requires a prior `initialize`.
    pub fn advance(&mut self, frame: &FrameImage) -> Result<BoundingBox> {
        if self.current.is_none() {
            return Err(anyhow!("tracker advanced before initialization"));
        }
        let next = self
            .backend
            .advance(frame.pixels(), frame.width(), frame.height())?;
        self.current = Some(next);
        Ok(next)
    }
}
