// Deterministic stand-ins for hardware, for tests and headless hosts.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::camera::CaptureDevice;
use crate::error::{StudioError, StudioResult};
use crate::types::FrameBuffer;

/// Scripted camera: replays a queue of frames, or refuses to open.
///
/// Tracks open handles so tests can assert that nothing leaks.
#[derive(Debug)]
pub struct FakeCamera {
    frames: VecDeque<FrameBuffer>,
    available: bool,
    open: bool,
    open_calls: usize,
    handles: Rc<Cell<usize>>,
}

impl FakeCamera {
    pub fn with_frames(frames: impl IntoIterator<Item = FrameBuffer>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            available: true,
            open: false,
            open_calls: 0,
            handles: Rc::new(Cell::new(0)),
        }
    }

    /// A device whose `open` always fails.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::with_frames([])
        }
    }

    /// Queue another frame for a later read.
    pub fn push_frame(&mut self, frame: FrameBuffer) {
        self.frames.push_back(frame);
    }

    pub fn open_calls(&self) -> usize {
        self.open_calls
    }

    /// Handles currently held (0 or 1).
    pub fn open_handles(&self) -> usize {
        self.handles.get()
    }

    /// Shared view of the handle count that outlives the camera itself.
    pub fn handle_counter(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.handles)
    }
}

impl CaptureDevice for FakeCamera {
    fn open(&mut self, index: u32) -> StudioResult<()> {
        self.open_calls += 1;
        if !self.available {
            return Err(StudioError::device_unavailable(format!("fake camera {index} is unplugged")));
        }
        self.open = true;
        self.handles.set(1);
        Ok(())
    }

    fn read(&mut self) -> Option<FrameBuffer> {
        if !self.open {
            return None;
        }
        self.frames.pop_front()
    }

    fn release(&mut self) {
        self.open = false;
        self.handles.set(0);
    }
}
