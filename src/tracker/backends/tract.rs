#![cfg(feature = "tracker-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::bbox::BoundingBox;
use crate::tracker::backend::TrackerBackend;

/// Tract-based regression tracker for ONNX models.
///
/// The model is expected to take a six-channel input of shape
/// `(1, 6, H, W)` -- the template crop of the bound target stacked
/// channel-wise with a same-sized search crop of the current frame -- and
/// produce four floats: the target box inside the search region, normalized
/// to `0..=1`. The search region is the last known box padded by one box
/// width/height on each side, the usual context margin for regression
/// trackers.
pub struct TractTracker {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_width: u32,
    input_height: u32,
    template: Option<Vec<f32>>,
    last_box: Option<BoundingBox>,
}

impl TractTracker {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_width: u32, input_height: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 6, input_height as usize, input_width as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_width,
            input_height,
            template: None,
            last_box: None,
        })
    }

    fn search_region(&self, target: &BoundingBox, width: u32, height: u32) -> BoundingBox {
        let pad_x = target.width();
        let pad_y = target.height();
        BoundingBox::new(
            (target.x1 - pad_x).max(0.0),
            (target.y1 - pad_y).max(0.0),
            (target.x2 + pad_x).min(width as f32),
            (target.y2 + pad_y).min(height as f32),
        )
    }

    /// Crop `region` out of an RGB24 frame and resample it to the model input
    /// size, planar channel-first, scaled to `0..=1`.
    fn crop_to_input(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        region: &BoundingBox,
    ) -> Result<Vec<f32>> {
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }
        if region.is_degenerate() {
            return Err(anyhow!("tracker search region is degenerate"));
        }

        let out_w = self.input_width as usize;
        let out_h = self.input_height as usize;
        let mut out = vec![0f32; 3 * out_w * out_h];
        for oy in 0..out_h {
            let sy = region.y1 + region.height() * (oy as f32 + 0.5) / out_h as f32;
            let sy = (sy as usize).min(height as usize - 1);
            for ox in 0..out_w {
                let sx = region.x1 + region.width() * (ox as f32 + 0.5) / out_w as f32;
                let sx = (sx as usize).min(width as usize - 1);
                let src = (sy * width as usize + sx) * 3;
                for channel in 0..3 {
                    out[channel * out_w * out_h + oy * out_w + ox] =
                        pixels[src + channel] as f32 / 255.0;
                }
            }
        }
        Ok(out)
    }

    fn run_model(&self, template: &[f32], search: &[f32]) -> Result<[f32; 4]> {
        let out_w = self.input_width as usize;
        let out_h = self.input_height as usize;
        let plane = out_w * out_h;
        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 6, out_h, out_w),
            |(_, channel, y, x)| {
                let idx = (channel % 3) * plane + y * out_w + x;
                if channel < 3 {
                    template[idx]
                } else {
                    search[idx]
                }
            },
        );

        let input = input.into_tensor();
        let outputs = self
            .model
            .run(tvec!(input))
            .context("ONNX inference failed")?;
        let output = outputs
            .get(0)
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let values = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        if values.len() < 4 {
            return Err(anyhow!(
                "model produced {} outputs, expected 4 box coordinates",
                values.len()
            ));
        }
        let mut coords = [0f32; 4];
        for (slot, value) in coords.iter_mut().zip(values.iter()) {
            *slot = value.clamp(0.0, 1.0);
        }
        Ok(coords)
    }
}

impl TrackerBackend for TractTracker {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn init(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        target: &BoundingBox,
    ) -> Result<()> {
        let region = self.search_region(target, width, height);
        self.template = Some(self.crop_to_input(pixels, width, height, &region)?);
        self.last_box = Some(*target);
        Ok(())
    }

    fn advance(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<BoundingBox> {
        let last_box = self
            .last_box
            .ok_or_else(|| anyhow!("tract tracker advanced without a bound target"))?;
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| anyhow!("tract tracker has no template crop"))?;

        let region = self.search_region(&last_box, width, height);
        let search = self.crop_to_input(pixels, width, height, &region)?;
        let coords = self.run_model(template, &search)?;

        let next = BoundingBox::from_corners(
            region.x1 + coords[0] * region.width(),
            region.y1 + coords[1] * region.height(),
            region.x1 + coords[2] * region.width(),
            region.y1 + coords[3] * region.height(),
        );

        // Re-anchor the template on the fresh estimate.
        let next_region = self.search_region(&next, width, height);
        self.template = Some(self.crop_to_input(pixels, width, height, &next_region)?);
        self.last_box = Some(next);
        Ok(next)
    }
}
