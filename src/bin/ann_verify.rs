//! ann_verify - Verify an exported annotation directory.
//!
//! This tool proves:
//! - `annotations.ann` parses as sequential 1-based quad records
//! - every quad is an axis-aligned rectangle with ordered corners
//! - every record's frame image exists under its sequence name
//! - `beginend.txt` matches the record count
//!
//! It re-parses the raw files strictly; the session's import parser is
//! deliberately lenient, a verifier must not be.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use trackmark::ui::Ui;
use trackmark::{sequence_file_name, ANNOTATIONS_FILE, SPAN_FILE};

#[derive(Parser, Debug)]
#[command(
    name = "ann_verify",
    about = "Verify an exported annotation directory"
)]
struct Args {
    /// Exported directory (contains annotations.ann, beginend.txt, frames)
    #[arg(long, value_name = "DIR")]
    dir: PathBuf,

    /// Print every record while verifying
    #[arg(short, long)]
    verbose: bool,

    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

struct QuadRecord {
    id: usize,
    corners: [(f32, f32); 4],
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let ui = Ui::from_flag(Some(&args.ui), std::io::stderr().is_terminal());

    let (first_frame, last_frame) = {
        let _stage = ui.stage("Read span bounds");
        read_span_file(&args.dir.join(SPAN_FILE))?
    };

    let records = {
        let _stage = ui.stage("Parse annotation records");
        read_records(&args.dir.join(ANNOTATIONS_FILE))?
    };

    {
        let _stage = ui.stage("Check records against span and frames");
        let expected = last_frame - first_frame;
        if records.len() != expected {
            return Err(anyhow!(
                "record count {} does not match span [{}, {}) of {} frames",
                records.len(),
                first_frame,
                last_frame,
                expected
            ));
        }
        for (index, record) in records.iter().enumerate() {
            if record.id != index + 1 {
                return Err(anyhow!(
                    "record {} has id {}, expected sequential id {}",
                    index,
                    record.id,
                    index + 1
                ));
            }
            check_axis_aligned(record)?;
            let frame_path = args.dir.join(sequence_file_name(record.id));
            if !frame_path.is_file() {
                return Err(anyhow!(
                    "record {} has no frame image at {}",
                    record.id,
                    frame_path.display()
                ));
            }
            if args.verbose {
                let [(x1, y1), _, _, (x2, y2)] = record.corners;
                println!("{:>8}  ({}, {}) .. ({}, {})", record.id, x1, y1, x2, y2);
            }
        }
    }

    println!(
        "OK: {} records over span [{}, {}) in {}",
        records.len(),
        first_frame,
        last_frame,
        args.dir.display()
    );
    Ok(())
}

fn read_span_file(path: &Path) -> Result<(usize, usize)> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading span file {}", path.display()))?;
    let mut tokens = raw.split_ascii_whitespace();
    let first: usize = tokens
        .next()
        .ok_or_else(|| anyhow!("span file is empty"))?
        .parse()
        .context("span file first frame is not an integer")?;
    let last: usize = tokens
        .next()
        .ok_or_else(|| anyhow!("span file is missing the last frame"))?
        .parse()
        .context("span file last frame is not an integer")?;
    if first > last {
        return Err(anyhow!("span file has first frame {} > last frame {}", first, last));
    }
    Ok((first, last))
}

fn read_records(path: &Path) -> Result<Vec<QuadRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading annotations {}", path.display()))?;

    let mut records = Vec::new();
    for (line_number, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        if tokens.len() != 9 {
            return Err(anyhow!(
                "line {}: expected 9 fields, found {}",
                line_number + 1,
                tokens.len()
            ));
        }
        let id: usize = tokens[0]
            .parse()
            .with_context(|| format!("line {}: bad record id", line_number + 1))?;
        let mut coords = [0f32; 8];
        for (slot, token) in coords.iter_mut().zip(&tokens[1..]) {
            *slot = token
                .parse()
                .with_context(|| format!("line {}: bad coordinate", line_number + 1))?;
        }
        records.push(QuadRecord {
            id,
            corners: [
                (coords[0], coords[1]),
                (coords[2], coords[3]),
                (coords[4], coords[5]),
                (coords[6], coords[7]),
            ],
        });
    }
    Ok(records)
}

/// Exported quads are axis-aligned rectangles with corners ordered top-left,
/// top-right, bottom-left, bottom-right.
fn check_axis_aligned(record: &QuadRecord) -> Result<()> {
    let [(ax, ay), (bx, by), (cx, cy), (dx, dy)] = record.corners;
    let aligned = ax == cx && bx == dx && ay == by && cy == dy;
    let ordered = ax <= bx && ay <= cy;
    if !aligned || !ordered {
        return Err(anyhow!(
            "record {} is not an axis-aligned TL/TR/BL/BR quad",
            record.id
        ));
    }
    Ok(())
}
