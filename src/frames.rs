//! Frame sequence storage.
//!
//! A `FrameStore` is the ordered, 0-based list of frame image files backing a
//! labeling session. It is produced once at session start -- either by
//! enumerating a pre-populated directory or right after video extraction --
//! and is immutable for the lifetime of the session.
//!
//! Frames are re-decoded from disk on every access rather than cached. The
//! session is human-paced; simplicity wins over throughput here.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};

/// Fixed image extension for frame files, with and without the dot.
pub const FRAME_EXTENSION: &str = "jpg";

/// A decoded RGB24 frame.
pub struct FrameImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl FrameImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB24 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Ordered frame sequence backed by files on disk.
pub struct FrameStore {
    dir: PathBuf,
    frames: Vec<PathBuf>,
}

impl FrameStore {
    /// Enumerate `*.jpg` files under `dir`, sorted lexicographically by file
    /// name so zero-padded numeric names yield temporal order.
    ///
    /// A missing or inaccessible directory, and an empty directory, are both
    /// errors: the session cannot run without frames.
    pub fn open(dir: &Path) -> Result<Self> {
        let mut frames = list_frame_files(dir)?;
        if frames.is_empty() {
            return Err(anyhow!("frames directory {} is empty", dir.display()));
        }
        frames.sort();

        if frames
            .iter()
            .any(|path| !is_sequence_file_name(file_name_str(path)))
        {
            log::warn!(
                "frames in {} are not zero-padded sequence names; lexicographic order may not be temporal order",
                dir.display()
            );
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            frames,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Path of frame `index`. Panics on out-of-range access; the session
    /// clamps `currframe` to `[0, len - 1]` before getting here.
    pub fn path(&self, index: usize) -> &Path {
        &self.frames[index]
    }

    /// Decode frame `index` to RGB24. A frame that fails to decode is fatal
    /// for the session; the error carries the offending path.
    pub fn load(&self, index: usize) -> Result<FrameImage> {
        let path = self.path(index);
        let decoded = image::open(path)
            .with_context(|| format!("failed to decode frame {}", path.display()))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        Ok(FrameImage::new(width, height, decoded.into_raw()))
    }
}

/// List frame files (fixed extension) in a directory, unsorted.
///
/// Distinguishes "directory unusable" (error) from "no frames" (empty list)
/// so extraction can require an existing-but-empty directory.
pub fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).with_context(|| {
        format!(
            "frames directory {} does not exist or is not accessible",
            dir.display()
        )
    })?;

    let mut frames = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("reading frames directory {}", dir.display()))?;
        let path = entry.path();
        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(FRAME_EXTENSION))
        {
            frames.push(path);
        }
    }
    Ok(frames)
}

/// Zero-padded 8-digit sequence file name for a frame counter.
pub fn sequence_file_name(counter: usize) -> String {
    format!("{:08}.{}", counter, FRAME_EXTENSION)
}

/// True when a file name matches the `%08d.jpg` sequence layout.
pub fn is_sequence_file_name(name: &str) -> bool {
    static SEQUENCE_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = SEQUENCE_RE.get_or_init(|| regex::Regex::new(r"^\d{8}\.jpg$").unwrap());
    re.is_match(name)
}

fn file_name_str(path: &Path) -> &str {
    path.file_name().and_then(|name| name.to_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_frame(dir: &Path, name: &str) {
        let buffer = image::RgbImage::from_pixel(4, 4, image::Rgb([30, 60, 90]));
        buffer.save(dir.join(name)).expect("write frame");
    }

    #[test]
    fn open_sorts_lexicographically_and_filters_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_frame(dir.path(), "00000002.jpg");
        write_frame(dir.path(), "00000000.jpg");
        write_frame(dir.path(), "00000001.jpg");
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let store = FrameStore::open(dir.path()).expect("open store");
        assert_eq!(store.len(), 3);
        for (i, expected) in ["00000000.jpg", "00000001.jpg", "00000002.jpg"]
            .iter()
            .enumerate()
        {
            assert_eq!(store.path(i).file_name().unwrap().to_str().unwrap(), *expected);
        }
    }

    #[test]
    fn open_rejects_missing_and_empty_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(FrameStore::open(&dir.path().join("missing")).is_err());
        assert!(FrameStore::open(dir.path()).is_err());
    }

    #[test]
    fn load_decodes_rgb_pixels() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_frame(dir.path(), "00000000.jpg");

        let store = FrameStore::open(dir.path()).expect("open store");
        let frame = store.load(0).expect("decode frame");
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 4);
        assert_eq!(frame.pixels().len(), 4 * 4 * 3);
    }

    #[test]
    fn load_fails_on_undecodable_frame() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("00000000.jpg"), b"not a jpeg").unwrap();

        let store = FrameStore::open(dir.path()).expect("open store");
        assert!(store.load(0).is_err());
    }

    #[test]
    fn sequence_file_names_are_zero_padded() {
        assert_eq!(sequence_file_name(1), "00000001.jpg");
        assert_eq!(sequence_file_name(12345678), "12345678.jpg");
        assert!(is_sequence_file_name("00000001.jpg"));
        assert!(!is_sequence_file_name("frame-1.jpg"));
        assert!(!is_sequence_file_name("000000001.jpg"));
    }
}
