use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};

use super::{InputEvent, Overlay, OverlayKind, Surface};
use crate::frames::FrameImage;

/// Line-oriented terminal surface.
///
/// Status goes to stderr (one line per frame change, so playback does not
/// flood the terminal); input comes from stdin, one command per line:
/// the first character of a line is a key press, and `box x1 y1 x2 y2`
/// stands in for a completed pointer drag. A reader thread feeds lines into
/// a channel so `poll` can time out at the playback cadence; session state
/// itself stays on the loop thread.
pub struct StdioSurface {
    lines: Receiver<String>,
    last_status: String,
}

impl StdioSurface {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });
        Self {
            lines: receiver,
            last_status: String::new(),
        }
    }

    fn parse_line(line: &str) -> Result<Option<InputEvent>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if let Some(rest) = trimmed.strip_prefix("box ") {
            let coords: Vec<f32> = rest
                .split_whitespace()
                .map(|token| token.parse::<f32>())
                .collect::<Result<_, _>>()
                .map_err(|_| anyhow!("box command expects four numbers: box x1 y1 x2 y2"))?;
            if coords.len() != 4 {
                return Err(anyhow!("box command expects four numbers: box x1 y1 x2 y2"));
            }
            return Ok(Some(InputEvent::DragComplete {
                ax: coords[0],
                ay: coords[1],
                bx: coords[2],
                by: coords[3],
            }));
        }
        Ok(trimmed.chars().next().map(InputEvent::Key))
    }
}

impl Default for StdioSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for StdioSurface {
    fn present(
        &mut self,
        frame_index: usize,
        _frame: &FrameImage,
        overlays: &[Overlay],
    ) -> Result<()> {
        let status = format_status(frame_index, overlays);
        if status != self.last_status {
            eprintln!("{status}");
            self.last_status = status;
        }
        Ok(())
    }

    fn poll(&mut self, timeout: Duration) -> Result<Option<InputEvent>> {
        match self.lines.recv_timeout(timeout) {
            Ok(line) => match Self::parse_line(&line) {
                Ok(event) => Ok(event),
                Err(e) => {
                    log::warn!("ignoring input line: {e}");
                    Ok(None)
                }
            },
            Err(RecvTimeoutError::Timeout) => Ok(None),
            // stdin closed: no more input will ever arrive, quit the loop.
            Err(RecvTimeoutError::Disconnected) => Ok(Some(InputEvent::Key('\x1b'))),
        }
    }
}

fn format_status(frame_index: usize, overlays: &[Overlay]) -> String {
    let mut status = format!("frame {:08}", frame_index);
    for overlay in overlays {
        match overlay.kind {
            OverlayKind::Proposal => {
                status.push_str(&format!(
                    " proposal=({:.0},{:.0},{:.0},{:.0})",
                    overlay.bbox.x1, overlay.bbox.y1, overlay.bbox.x2, overlay.bbox.y2
                ));
            }
            OverlayKind::Committed => {
                status.push_str(&format!(
                    " staged=({:.0},{:.0},{:.0},{:.0})",
                    overlay.bbox.x1, overlay.bbox.y1, overlay.bbox.x2, overlay.bbox.y2
                ));
            }
            OverlayKind::SpanStart => status.push_str(" [span start]"),
            OverlayKind::SpanEnd => status.push_str(" [span end]"),
        }
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_lines() {
        assert_eq!(
            StdioSurface::parse_line("k").unwrap(),
            Some(InputEvent::Key('k'))
        );
        assert_eq!(StdioSurface::parse_line("   ").unwrap(), None);
    }

    #[test]
    fn parses_box_lines_as_drags() {
        assert_eq!(
            StdioSurface::parse_line("box 10 20 30 40").unwrap(),
            Some(InputEvent::DragComplete {
                ax: 10.0,
                ay: 20.0,
                bx: 30.0,
                by: 40.0
            })
        );
        assert!(StdioSurface::parse_line("box 10 20").is_err());
        assert!(StdioSurface::parse_line("box a b c d").is_err());
    }
}
