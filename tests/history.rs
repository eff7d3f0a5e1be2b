use dip_studio::filters::odd_kernel_size;
use dip_studio::testing::FakeCamera;
use dip_studio::{
    Color, CpuFilters, EditSession, FilterLibrary, FrameBuffer, LiveSource, LiveState, Operation, StudioError,
};

fn solid_red() -> FrameBuffer {
    FrameBuffer::solid(100, 100, Color::RED).unwrap()
}

fn textured() -> FrameBuffer {
    FrameBuffer::from_fn(24, 16, |x, y| Color::new((x * 10) as u8, (y * 15) as u8, ((x + y) * 5) as u8)).unwrap()
}

fn script() -> Vec<Operation> {
    vec![
        Operation::Grayscale,
        Operation::Blur { kernel: 4 },
        Operation::EdgeDetect { low: 20, high: 60 },
        Operation::HueShift { degrees: 45 },
        Operation::BrightnessContrast {
            brightness: 30,
            contrast: -20,
        },
        Operation::Sharpen,
    ]
}

#[test]
fn n_commits_then_n_undos_returns_to_base() {
    let ops = script();
    for n in 0..=ops.len() {
        let mut s = EditSession::new();
        s.load(textured());
        for op in &ops[..n] {
            s.commit_operation(*op).unwrap();
        }
        for _ in 0..n {
            assert!(s.undo().unwrap());
        }
        assert_eq!(s.cursor().unwrap(), 0);
        assert_eq!(s.displayed().unwrap(), &textured());
    }
}

#[test]
fn redo_after_undo_restores_identical_frame() {
    let mut s = EditSession::new();
    s.load(textured());
    for op in script() {
        s.commit_operation(op).unwrap();
        let before = s.displayed().unwrap().clone();
        s.undo().unwrap();
        s.redo().unwrap();
        assert_eq!(s.displayed().unwrap(), &before, "after {op}");
    }
}

#[test]
fn commit_after_undo_clears_redo_tail() {
    let mut s = EditSession::new();
    s.load(textured());
    s.commit_operation(Operation::Grayscale).unwrap();
    s.commit_operation(Operation::Sharpen).unwrap();
    s.undo().unwrap();
    s.undo().unwrap();
    assert_eq!(s.redo_len(), 2);
    s.commit_operation(Operation::HueShift { degrees: 10 }).unwrap();
    assert_eq!(s.redo_len(), 0);
    assert_eq!(s.history_len(), 2);
}

#[test]
fn even_blur_kernel_matches_next_odd() {
    assert_eq!(odd_kernel_size(6), 7);
    let f = CpuFilters;
    for k in [0u32, 2, 8, 12] {
        assert_eq!(f.gaussian_blur(&textured(), k), f.gaussian_blur(&textured(), k + 1), "k={k}");
    }
}

#[test]
fn half_turn_hue_shift_leaves_hue_unchanged() {
    let f = CpuFilters;
    let src = textured();
    let there = f.hue_shift(&src, 180);
    let back = f.hue_shift(&there, -180);
    assert_eq!(there, f.hue_shift(&src, 0));
    assert_eq!(back, f.hue_shift(&there, 0));
}

#[test]
fn grayscale_blur_undo_redo_scenario() {
    let mut s = EditSession::new();
    s.load(solid_red());
    let gray = s.commit_operation(Operation::Grayscale).unwrap().clone();
    let blurred = s.commit_operation(Operation::Blur { kernel: 5 }).unwrap().clone();

    s.undo().unwrap();
    assert_eq!(s.displayed().unwrap(), &gray);
    assert_ne!(s.displayed().unwrap(), &solid_red());

    s.redo().unwrap();
    assert_eq!(s.displayed().unwrap(), &blurred);
}

#[test]
fn previews_never_grow_history() {
    let mut s = EditSession::new();
    s.load(solid_red());
    let len = s.history_len();
    for contrast in [10, -35] {
        s.preview_operation(Operation::BrightnessContrast {
            brightness: 50,
            contrast,
        })
        .unwrap();
        assert_eq!(s.history_len(), len);
    }
}

#[test]
fn unopenable_camera_scenario() {
    let mut live = LiveSource::new(FakeCamera::unavailable(), 0);
    assert!(matches!(live.start(), Err(StudioError::DeviceUnavailable(_))));
    assert_eq!(live.state(), LiveState::Closed);
    live.stop();
    assert_eq!(live.state(), LiveState::Closed);
}

#[test]
fn reset_after_three_commits() {
    let mut s = EditSession::new();
    s.load(textured());
    s.commit_operation(Operation::Grayscale).unwrap();
    s.commit_operation(Operation::Sharpen).unwrap();
    s.commit_operation(Operation::Blur { kernel: 3 }).unwrap();
    s.undo().unwrap();
    s.reset().unwrap();
    assert_eq!(s.history_len(), 1);
    assert_eq!(s.redo_len(), 0);
    assert_eq!(s.displayed().unwrap().as_bytes(), textured().as_bytes());
}
