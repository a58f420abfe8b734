//! Annotation file import/export.
//!
//! The on-disk format is the flat ALOV-style quad list: one ASCII record per
//! keyframe, `id xA yA xB yB xC yC xD yD`, coordinates 1-indexed, ids
//! ascending. Import reads sparse keyframes and fills the gaps between them
//! by linear interpolation; export writes one dense record per span frame,
//! copies the frame images under zero-padded sequence names, and records the
//! exported span bounds in a side file so the output is self-describing.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::bbox::BoundingBox;
use crate::frames::{sequence_file_name, FrameStore};
use crate::track::AnnotationTrack;

/// Record file name inside an export directory.
pub const ANNOTATIONS_FILE: &str = "annotations.ann";
/// Side file recording the exported span's original frame bounds.
pub const SPAN_FILE: &str = "beginend.txt";

#[derive(Clone, Copy, Debug)]
pub struct ImportSummary {
    /// Keyframe records applied to the track.
    pub keyframes: usize,
}

#[derive(Clone, Debug)]
pub struct ExportSummary {
    pub frames_written: usize,
    pub annotations_path: PathBuf,
}

/// Import sparse keyframe annotations into the staged track.
///
/// The first record lands on `first_frame`; each later record advances the
/// target frame by the id delta (ids need not be contiguous). Gaps wider than
/// one frame are filled by interpolation. Parsing stops cleanly at end of
/// input, at the first malformed, short, or non-ascending record, and upon
/// reaching `last_frame`. Only a missing/unreadable file is an error, and a
/// recoverable one: the caller reports it and starts with an empty track.
pub fn load_annotations(
    path: &Path,
    track: &mut AnnotationTrack,
    first_frame: usize,
    last_frame: usize,
) -> Result<ImportSummary> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read annotations {}", path.display()))?;

    let mut tokens = raw.split_ascii_whitespace();
    let mut keyframes = 0usize;
    let mut prev: Option<(u64, usize)> = None;

    'records: loop {
        let Some(id_token) = tokens.next() else {
            break;
        };
        let Ok(id) = id_token.parse::<u64>() else {
            break;
        };

        let mut coords = [0f32; 8];
        for slot in &mut coords {
            let Some(token) = tokens.next() else {
                break 'records;
            };
            let Ok(value) = token.parse::<f32>() else {
                break 'records;
            };
            *slot = value;
        }

        let target = match prev {
            None => first_frame,
            Some((prev_id, prev_frame)) => {
                if id <= prev_id {
                    break;
                }
                prev_frame + (id - prev_id) as usize
            }
        };
        if target > last_frame || target >= track.len() {
            break;
        }

        // 1-indexed source coordinates -> 0-indexed internal coordinates.
        let bbox = BoundingBox::from_quad([
            (coords[0], coords[1]),
            (coords[2], coords[3]),
            (coords[4], coords[5]),
            (coords[6], coords[7]),
        ])
        .offset(-1.0);

        track.set_staged(target, Some(bbox));
        if let Some((_, prev_frame)) = prev {
            if target - prev_frame > 1 {
                track.interpolate_staged(prev_frame, target);
            }
        }
        keyframes += 1;
        prev = Some((id, target));
        if target == last_frame {
            break;
        }
    }

    Ok(ImportSummary { keyframes })
}

/// Export the staged span `[first_frame, last_frame)` into `out_dir`.
///
/// Validates that every span frame has a staged box BEFORE creating or
/// writing anything; an incomplete span aborts with no side effects and names
/// the first unstaged frame. On success writes `annotations.ann` (one quad
/// record per frame, 1-based counter, corners top-left, top-right,
/// bottom-left, bottom-right in 1-indexed coordinates), copies each frame
/// image to `%08d.jpg` matching the counter, and writes the span side file.
pub fn export_span(
    store: &FrameStore,
    track: &AnnotationTrack,
    first_frame: usize,
    last_frame: usize,
    out_dir: &Path,
) -> Result<ExportSummary> {
    if let Some(missing) = track.first_unstaged_in_span(first_frame, last_frame) {
        return Err(anyhow!(
            "cannot export: frame {} within span [{}, {}) has no staged annotation",
            missing,
            first_frame,
            last_frame
        ));
    }

    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let annotations_path = out_dir.join(ANNOTATIONS_FILE);
    let file = fs::File::create(&annotations_path)
        .with_context(|| format!("creating {}", annotations_path.display()))?;
    let mut writer = BufWriter::new(file);

    let mut counter = 0usize;
    for frame in first_frame..last_frame {
        counter += 1;
        let bbox = track
            .staged(frame)
            .ok_or_else(|| anyhow!("staged box for frame {} disappeared during export", frame))?;

        // 0-indexed internal coordinates -> 1-indexed record coordinates.
        let quad = bbox.offset(1.0).quad();
        writeln!(
            writer,
            "{} {} {} {} {} {} {} {} {}",
            counter,
            quad[0].0,
            quad[0].1,
            quad[1].0,
            quad[1].1,
            quad[2].0,
            quad[2].1,
            quad[3].0,
            quad[3].1
        )?;

        let dest = out_dir.join(sequence_file_name(counter));
        fs::copy(store.path(frame), &dest).with_context(|| {
            format!(
                "copying frame {} to {}",
                store.path(frame).display(),
                dest.display()
            )
        })?;
    }
    writer.flush()?;

    let span_path = out_dir.join(SPAN_FILE);
    fs::write(&span_path, format!("{} {}\n", first_frame, last_frame))
        .with_context(|| format!("writing {}", span_path.display()))?;

    Ok(ExportSummary {
        frames_written: counter,
        annotations_path,
    })
}
