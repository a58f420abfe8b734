//! FFmpeg-backed video extraction.
//!
//! Decodes the best video stream of a local file, scales every frame to the
//! configured extraction size, and writes `%08d.jpg` files. Compiled only
//! with the `extract-ffmpeg` feature.

#![cfg(feature = "extract-ffmpeg")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ffmpeg_next as ffmpeg;

use crate::extract::ExtractSettings;
use crate::frames::sequence_file_name;

pub(crate) struct FfmpegExtractor {
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    width: u32,
    height: u32,
}

impl FfmpegExtractor {
    pub(crate) fn new(video: &str, settings: &ExtractSettings) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&video)
            .with_context(|| format!("failed to open video '{}' with ffmpeg", video))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow!("'{}' has no video track", video))?;
        let stream_index = input_stream.index();
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::RGB24,
            settings.width,
            settings.height,
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        Ok(Self {
            input,
            stream_index,
            decoder,
            scaler,
            width: settings.width,
            height: settings.height,
        })
    }

    /// Decode every frame and write it under `frames_dir`. Returns the frame
    /// count.
    pub(crate) fn run(&mut self, frames_dir: &Path) -> Result<usize> {
        let mut decoded = ffmpeg::frame::Video::empty();
        let mut rgb_frame = ffmpeg::frame::Video::empty();
        let mut count = 0usize;

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            self.decoder
                .send_packet(&packet)
                .context("send packet to ffmpeg decoder")?;
            while self.decoder.receive_frame(&mut decoded).is_ok() {
                self.scaler
                    .run(&decoded, &mut rgb_frame)
                    .context("scale frame to RGB")?;
                self.write_frame(&rgb_frame, frames_dir, count)?;
                count += 1;
            }
        }

        self.decoder.send_eof().context("flush ffmpeg decoder")?;
        while self.decoder.receive_frame(&mut decoded).is_ok() {
            self.scaler
                .run(&decoded, &mut rgb_frame)
                .context("scale frame to RGB")?;
            self.write_frame(&rgb_frame, frames_dir, count)?;
            count += 1;
        }

        if count == 0 {
            return Err(anyhow!("video ended without any decodable frames"));
        }
        log::info!("extracted {} frames", count);
        Ok(count)
    }

    fn write_frame(
        &self,
        rgb_frame: &ffmpeg::frame::Video,
        frames_dir: &Path,
        index: usize,
    ) -> Result<()> {
        // ffmpeg pads scanlines to the stride; copy row by row.
        let stride = rgb_frame.stride(0);
        let row_len = (self.width * 3) as usize;
        let data = rgb_frame.data(0);
        let mut pixels = Vec::with_capacity(row_len * self.height as usize);
        for row in 0..self.height as usize {
            let start = row * stride;
            pixels.extend_from_slice(&data[start..start + row_len]);
        }

        let path = frames_dir.join(sequence_file_name(index));
        image::RgbImage::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| anyhow!("decoded frame buffer size mismatch"))?
            .save(&path)
            .with_context(|| format!("writing frame {}", path.display()))?;
        Ok(())
    }
}
