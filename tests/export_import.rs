//! Round-trip and failure-policy tests for annotation span export/import.

use std::path::Path;

use trackmark::{
    export_span, load_annotations, sequence_file_name, AnnotationTrack, BoundingBox, FrameStore,
    ANNOTATIONS_FILE, SPAN_FILE,
};

fn write_frames(dir: &Path, count: usize) -> FrameStore {
    std::fs::create_dir_all(dir).expect("create frames dir");
    for i in 0..count {
        image::RgbImage::from_pixel(8, 8, image::Rgb([(i * 13 % 255) as u8, 40, 40]))
            .save(dir.join(sequence_file_name(i)))
            .expect("write frame");
    }
    FrameStore::open(dir).expect("open frames")
}

fn assert_box_close(actual: BoundingBox, expected: BoundingBox, tolerance: f32) {
    for (a, e) in [
        (actual.x1, expected.x1),
        (actual.y1, expected.y1),
        (actual.x2, expected.x2),
        (actual.y2, expected.y2),
    ] {
        assert!((a - e).abs() <= tolerance, "{actual:?} != {expected:?}");
    }
}

#[test]
fn export_then_import_reproduces_the_span() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = write_frames(&dir.path().join("frames"), 8);

    let mut track = AnnotationTrack::new(8);
    for frame in 1..6 {
        let base = frame as f32;
        track.set_staged(
            frame,
            Some(BoundingBox::new(
                10.0 + base,
                12.0 + base,
                50.0 + base,
                48.0 + base,
            )),
        );
    }

    let out_dir = dir.path().join("out");
    let summary = export_span(&store, &track, 1, 6, &out_dir).expect("export");
    assert_eq!(summary.frames_written, 5);
    assert!(out_dir.join(SPAN_FILE).is_file());
    for counter in 1..=5 {
        assert!(out_dir.join(sequence_file_name(counter)).is_file());
    }

    // Re-import the exported records into a fresh track over the same span.
    let mut reimported = AnnotationTrack::new(8);
    let result = load_annotations(&out_dir.join(ANNOTATIONS_FILE), &mut reimported, 1, 7)
        .expect("import exported file");
    assert_eq!(result.keyframes, 5);
    for frame in 1..6 {
        assert_box_close(
            reimported.staged(frame).expect("round-tripped box"),
            track.staged(frame).unwrap(),
            1.0,
        );
    }

    let span = std::fs::read_to_string(out_dir.join(SPAN_FILE)).expect("read span file");
    assert_eq!(span.trim(), "1 6");
}

#[test]
fn incomplete_span_save_fails_and_writes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = write_frames(&dir.path().join("frames"), 6);

    // firstframe=2, lastframe=5: frames 2 and 3 staged, frame 4 unset.
    let mut track = AnnotationTrack::new(6);
    track.set_staged(2, Some(BoundingBox::new(1.0, 1.0, 5.0, 5.0)));
    track.set_staged(3, Some(BoundingBox::new(2.0, 2.0, 6.0, 6.0)));

    let out_dir = dir.path().join("out");
    let err = export_span(&store, &track, 2, 5, &out_dir).unwrap_err();
    assert!(err.to_string().contains("frame 4"));
    assert!(
        !out_dir.exists(),
        "failed export must leave the output directory empty"
    );

    // Filling the gap makes the same export succeed.
    track.set_staged(4, Some(BoundingBox::new(3.0, 3.0, 7.0, 7.0)));
    let summary = export_span(&store, &track, 2, 5, &out_dir).expect("export after fix");
    assert_eq!(summary.frames_written, 3);
}

#[test]
fn sparse_import_interpolates_between_keyframes() {
    // N=20, keyframes at frames 0 and 10 (id delta 10); frame 5 must land
    // exactly between them.
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("seed.ann");
    std::fs::write(
        &path,
        "1 11 11 51 11 11 51 51 51\n11 21 21 61 21 21 61 61 61\n",
    )
    .expect("write seed annotations");

    let mut track = AnnotationTrack::new(20);
    let summary = load_annotations(&path, &mut track, 0, 19).expect("import");
    assert_eq!(summary.keyframes, 2);

    assert_eq!(
        track.staged(0),
        Some(BoundingBox::new(10.0, 10.0, 50.0, 50.0))
    );
    assert_eq!(
        track.staged(10),
        Some(BoundingBox::new(20.0, 20.0, 60.0, 60.0))
    );
    assert_box_close(
        track.staged(5).expect("interpolated frame"),
        BoundingBox::new(15.0, 15.0, 55.0, 55.0),
        1e-3,
    );
    // Nothing beyond the last keyframe.
    assert_eq!(track.staged(11), None);
}

#[test]
fn exported_records_are_one_indexed_quads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = write_frames(&dir.path().join("frames"), 3);

    let mut track = AnnotationTrack::new(3);
    track.set_staged(0, Some(BoundingBox::new(10.0, 20.0, 30.0, 40.0)));

    let out_dir = dir.path().join("out");
    export_span(&store, &track, 0, 1, &out_dir).expect("export");

    let raw = std::fs::read_to_string(out_dir.join(ANNOTATIONS_FILE)).expect("read records");
    assert_eq!(raw.trim(), "1 11 21 31 21 11 41 31 41");
}
