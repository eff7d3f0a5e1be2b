use std::path::PathBuf;

use dip_studio::testing::FakeCamera;
use dip_studio::{Color, Command, FrameBuffer, Operation, Studio, StudioConfig, StudioError, assets};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dip-studio-{}-{name}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn checker() -> FrameBuffer {
    FrameBuffer::from_fn(16, 12, |x, y| if (x / 4 + y / 4) % 2 == 0 { Color::WHITE } else { Color::new(0, 0, 200) })
        .unwrap()
}

#[test]
fn load_edit_save_round_trip() {
    let dir = scratch_dir("round-trip");
    let input = dir.join("in.png");
    let output = dir.join("out.png");
    assets::save_image(&input, &checker()).unwrap();

    let mut studio = Studio::new(FakeCamera::with_frames([]), &StudioConfig::default());
    studio.submit(Command::Load(input));
    studio.submit(Command::Commit(Operation::Grayscale));
    studio.submit(Command::Commit(Operation::Blur { kernel: 3 }));
    studio.submit(Command::Undo);
    studio.submit(Command::Save(output.clone()));
    for res in studio.drain() {
        res.unwrap();
    }

    let saved = assets::load_image(&output).unwrap();
    assert_eq!(&saved, studio.session().displayed().unwrap());
    assert_eq!(studio.session().redo_len(), 1);
}

#[test]
fn save_writes_preview_while_it_is_shown() {
    let dir = scratch_dir("preview");
    let output = dir.join("preview.bmp");

    let mut studio = Studio::new(FakeCamera::with_frames([]), &StudioConfig::default());
    studio.execute(Command::LoadFrame(checker())).unwrap();
    let op = Operation::BrightnessContrast {
        brightness: -40,
        contrast: 0,
    };
    studio.execute(Command::Preview(op)).unwrap();
    studio.execute(Command::Save(output.clone())).unwrap();

    let saved = assets::load_image(&output).unwrap();
    assert_eq!(saved.pixel(0, 0), Some(Color::new(215, 215, 215)));
    assert_eq!(studio.session().history_len(), 1);
}

#[test]
fn failed_load_leaves_session_untouched() {
    let dir = scratch_dir("bad-load");
    let junk = dir.join("junk.png");
    std::fs::write(&junk, b"definitely not a png").unwrap();

    let mut studio = Studio::new(FakeCamera::with_frames([]), &StudioConfig::default());
    studio.execute(Command::LoadFrame(checker())).unwrap();
    studio.execute(Command::Commit(Operation::Sharpen)).unwrap();

    let err = studio.execute(Command::Load(junk)).unwrap_err();
    assert!(matches!(err, StudioError::Decode(_)));
    let err = studio.execute(Command::Load(dir.join("missing.png"))).unwrap_err();
    assert!(matches!(err, StudioError::InvalidInput(_)));

    assert_eq!(studio.session().history_len(), 2);
    assert_eq!(studio.session().base().unwrap(), &checker());
}

#[test]
fn unsupported_extension_is_encode_error() {
    let dir = scratch_dir("bad-ext");
    let mut studio = Studio::new(FakeCamera::with_frames([]), &StudioConfig::default());
    studio.execute(Command::LoadFrame(checker())).unwrap();
    let err = studio.execute(Command::Save(dir.join("out.xyz"))).unwrap_err();
    assert!(matches!(err, StudioError::Encode(_)));
}

#[test]
fn save_before_anything_is_displayed_is_invalid_state() {
    let dir = scratch_dir("empty");
    let mut studio = Studio::new(FakeCamera::with_frames([]), &StudioConfig::default());
    let err = studio.execute(Command::Save(dir.join("out.png"))).unwrap_err();
    assert!(matches!(err, StudioError::InvalidState(_)));
}

#[test]
fn live_capture_saves_latest_frame() {
    let dir = scratch_dir("live");
    let output = dir.join("live.png");
    let frame = FrameBuffer::solid(8, 8, Color::new(10, 200, 30)).unwrap();

    let mut studio = Studio::new(FakeCamera::with_frames([frame.clone()]), &StudioConfig::default());
    studio.submit(Command::StartLive);
    studio.submit(Command::Tick);
    studio.submit(Command::Save(output.clone()));
    studio.submit(Command::StopLive);
    for res in studio.drain() {
        res.unwrap();
    }
    assert_eq!(assets::load_image(&output).unwrap(), frame);
    assert_eq!(studio.live().device().open_handles(), 0);
}
