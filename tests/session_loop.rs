//! End-to-end session loop test: scripted input over a headless surface,
//! stub tracker with a fixed drift, real frame files on disk.

use std::path::Path;

use trackmark::{
    sequence_file_name, AnnotationTrack, BoundingBox, Flow, FrameStore, HeadlessSurface,
    InputEvent, Session, SessionOptions, StubTracker, TrackingAssistant, ANNOTATIONS_FILE,
};

fn write_frames(dir: &Path, count: usize) -> FrameStore {
    std::fs::create_dir_all(dir).expect("create frames dir");
    for i in 0..count {
        image::RgbImage::from_pixel(16, 16, image::Rgb([(i * 31 % 255) as u8, 10, 10]))
            .save(dir.join(sequence_file_name(i)))
            .expect("write frame");
    }
    FrameStore::open(dir).expect("open frames")
}

#[test]
fn scripted_session_tracks_stages_and_exports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = write_frames(&dir.path().join("frames"), 6);
    let out_dir = dir.path().join("out");

    let assistant = TrackingAssistant::new(Box::new(StubTracker::with_fixed_drift(1.0, 0.0)));
    let mut session = Session::new(
        store,
        AnnotationTrack::new(6),
        assistant,
        SessionOptions {
            first_frame: 0,
            last_frame: 5,
            playback_interval_ms: 1,
            out_dir: out_dir.clone(),
        },
    )
    .expect("session");

    let mut surface = HeadlessSurface::scripted([
        // Seed the tracker with a drag on frame 0.
        InputEvent::DragComplete {
            ax: 2.0,
            ay: 2.0,
            bx: 8.0,
            by: 8.0,
        },
        // Unpause.
        InputEvent::Key(' '),
    ]);

    // Tick 1: drag -> tracker bound, playing, still paused.
    assert_eq!(session.tick(&mut surface).unwrap(), Flow::Continue);
    assert!(session.playing());
    assert!(session.paused());

    // Tick 2: pending update resolves on the init frame, then unpause.
    assert_eq!(session.tick(&mut surface).unwrap(), Flow::Continue);
    assert_eq!(
        session.track().unstaged(0),
        Some(BoundingBox::new(3.0, 2.0, 9.0, 8.0))
    );
    assert!(!session.paused());

    // Ticks 3..=5: playback advances through frames 1..=3, tracking each.
    for _ in 0..3 {
        assert_eq!(session.tick(&mut surface).unwrap(), Flow::Continue);
    }
    assert_eq!(session.currframe(), 3);
    assert_eq!(
        session.track().unstaged(3),
        Some(BoundingBox::new(6.0, 2.0, 12.0, 8.0))
    );

    // Tick 6: advance onto frame 4, then pause.
    surface.push_event(InputEvent::Key(' '));
    assert_eq!(session.tick(&mut surface).unwrap(), Flow::Continue);
    assert_eq!(session.currframe(), 4);
    assert!(session.paused());
    assert_eq!(
        session.track().unstaged(4),
        Some(BoundingBox::new(7.0, 2.0, 13.0, 8.0))
    );

    // Tick 7: stage everything while paused.
    surface.push_event(InputEvent::Key('a'));
    assert_eq!(session.tick(&mut surface).unwrap(), Flow::Continue);
    for frame in 0..=4 {
        assert_eq!(session.track().staged(frame), session.track().unstaged(frame));
        assert!(session.track().staged(frame).is_some());
    }

    // Tick 8: save; span [0, 5) is fully staged.
    surface.push_event(InputEvent::Key('s'));
    assert_eq!(session.tick(&mut surface).unwrap(), Flow::Continue);
    let records = std::fs::read_to_string(out_dir.join(ANNOTATIONS_FILE)).expect("records");
    assert_eq!(records.lines().count(), 5);
    for counter in 1..=5 {
        assert!(out_dir.join(sequence_file_name(counter)).is_file());
    }

    // Tick 9: quit.
    surface.push_event(InputEvent::Key('\x1b'));
    assert_eq!(session.tick(&mut surface).unwrap(), Flow::Quit);

    // Every tick presented a frame.
    assert_eq!(surface.presented().len(), 9);
}

#[test]
fn unknown_keys_are_noops() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = write_frames(&dir.path().join("frames"), 3);

    let assistant = TrackingAssistant::new(Box::new(StubTracker::new()));
    let mut session = Session::new(
        store,
        AnnotationTrack::new(3),
        assistant,
        SessionOptions {
            first_frame: 0,
            last_frame: 2,
            playback_interval_ms: 1,
            out_dir: dir.path().join("out"),
        },
    )
    .expect("session");

    let mut surface = HeadlessSurface::scripted([InputEvent::Key('z'), InputEvent::Key('9')]);
    assert_eq!(session.tick(&mut surface).unwrap(), Flow::Continue);
    assert_eq!(session.tick(&mut surface).unwrap(), Flow::Continue);
    assert_eq!(session.currframe(), 0);
    assert!(session.paused());
}
