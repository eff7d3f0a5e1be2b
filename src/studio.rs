// Single-owner execution context.
// UI events and capture ticks become `Command`s on one queue and run to
// completion in arrival order, so a tick never interleaves with a commit or
// an undo. The studio alone owns the session, live source and overlay.

use std::collections::VecDeque;
use std::path::PathBuf;

use crate::assets;
use crate::camera::{CaptureDevice, LiveSource};
use crate::config::StudioConfig;
use crate::draw::DrawOverlay;
use crate::error::{StudioError, StudioResult};
use crate::filters::{CpuFilters, FilterLibrary};
use crate::session::{EditSession, Operation};
use crate::types::{Color, FrameBuffer, Point};

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Decode a file and make it the new base.
    Load(PathBuf),
    /// Make an already decoded frame the new base.
    LoadFrame(FrameBuffer),
    /// Write the displayed frame (live frame while capturing).
    Save(PathBuf),
    Commit(Operation),
    Preview(Operation),
    CancelPreview,
    Undo,
    Redo,
    Reset,
    StartLive,
    StopLive,
    /// One scheduler tick for the live source.
    Tick,
    /// Load the latest live frame as the new base.
    FreezeLive,
    BeginStroke(Point),
    ExtendStroke(Point),
    EndStroke,
    SetColor(Color),
    SetPenWidth(u32),
    ClearOverlay,
    /// Paint the strokes into the displayed frame and commit the result.
    CommitOverlay,
}

pub struct Studio<D: CaptureDevice, F: FilterLibrary = CpuFilters> {
    session: EditSession<F>,
    live: LiveSource<D>,
    overlay: DrawOverlay,
    queue: VecDeque<Command>,
}

impl<D: CaptureDevice> Studio<D, CpuFilters> {
    pub fn new(device: D, config: &StudioConfig) -> Self {
        Self::with_session(EditSession::new(), device, config)
    }
}

impl<D: CaptureDevice, F: FilterLibrary> Studio<D, F> {
    pub fn with_session(session: EditSession<F>, device: D, config: &StudioConfig) -> Self {
        let mut overlay = DrawOverlay::default();
        overlay.set_color(config.pen.color);
        overlay.set_width(config.pen.width);
        Self {
            session,
            live: LiveSource::new(device, config.camera.index),
            overlay,
            queue: VecDeque::new(),
        }
    }

    pub fn session(&self) -> &EditSession<F> {
        &self.session
    }

    pub fn live(&self) -> &LiveSource<D> {
        &self.live
    }

    pub fn overlay(&self) -> &DrawOverlay {
        &self.overlay
    }

    /// Queue a command; nothing runs until [`Studio::drain`].
    pub fn submit(&mut self, cmd: Command) {
        self.queue.push_back(cmd);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run every queued command in arrival order. One result per command;
    /// a failure does not stop the commands queued behind it.
    pub fn drain(&mut self) -> Vec<StudioResult<()>> {
        let mut results = Vec::with_capacity(self.queue.len());
        while let Some(cmd) = self.queue.pop_front() {
            let res = self.execute(cmd);
            if let Err(e) = &res {
                tracing::debug!(error = %e, "command failed");
            }
            results.push(res);
        }
        results
    }

    /// Frame the display path is sourced from: the latest live frame while
    /// capturing, otherwise the session's displayed frame.
    pub fn source_frame(&self) -> Option<&FrameBuffer> {
        if self.live.is_active() {
            if let Some(frame) = self.live.last_frame() {
                return Some(frame);
            }
        }
        self.session.displayed().ok()
    }

    /// Source frame with the overlay strokes painted on a copy.
    pub fn frame_for_display(&self) -> Option<FrameBuffer> {
        self.source_frame().map(|f| self.overlay.render_onto(f))
    }

    /// Run one command immediately.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn execute(&mut self, cmd: Command) -> StudioResult<()> {
        match cmd {
            Command::Load(path) => {
                let frame = assets::load_image(&path)?;
                self.load_frame(frame);
            }
            Command::LoadFrame(frame) => self.load_frame(frame),
            Command::Save(path) => {
                let frame = self
                    .source_frame()
                    .ok_or_else(|| StudioError::invalid_state("nothing to save"))?;
                assets::save_image(&path, frame)?;
            }
            Command::Commit(op) => {
                self.session.commit_operation(op)?;
                self.overlay.clear();
            }
            Command::Preview(op) => {
                self.session.preview_operation(op)?;
            }
            Command::CancelPreview => {
                self.session.cancel_preview()?;
            }
            Command::Undo => {
                if self.session.undo()? {
                    self.overlay.clear();
                }
            }
            Command::Redo => {
                if self.session.redo()? {
                    self.overlay.clear();
                }
            }
            Command::Reset => {
                self.session.reset()?;
                self.overlay.clear();
            }
            Command::StartLive => {
                self.live.start()?;
            }
            Command::StopLive => self.live.stop(),
            Command::Tick => {
                // No frame this tick is not an error; the next tick tries again.
                let _ = self.live.tick();
            }
            Command::FreezeLive => {
                let frame = self
                    .live
                    .last_frame()
                    .cloned()
                    .ok_or_else(|| StudioError::invalid_state("no live frame to freeze"))?;
                self.load_frame(frame);
            }
            Command::BeginStroke(p) => {
                let (w, h) = self
                    .source_frame()
                    .map(|f| (f.width(), f.height()))
                    .ok_or_else(|| StudioError::invalid_state("nothing displayed to draw on"))?;
                self.overlay.fit_to(w, h);
                self.overlay.begin_stroke(p);
            }
            Command::ExtendStroke(p) => {
                self.overlay.extend_stroke(p);
            }
            Command::EndStroke => self.overlay.end_stroke(),
            Command::SetColor(c) => self.overlay.set_color(c),
            Command::SetPenWidth(w) => self.overlay.set_width(w),
            Command::ClearOverlay => self.overlay.clear(),
            Command::CommitOverlay => self.commit_overlay()?,
        }
        Ok(())
    }

    fn load_frame(&mut self, frame: FrameBuffer) {
        self.overlay.fit_to(frame.width(), frame.height());
        self.overlay.clear();
        self.session.load(frame);
    }

    fn commit_overlay(&mut self) -> StudioResult<()> {
        if self.live.is_active() {
            return Err(StudioError::invalid_state(
                "freeze the live frame before committing strokes",
            ));
        }
        if self.overlay.is_empty() {
            return Ok(());
        }
        let painted = self.overlay.render_onto(self.session.displayed()?);
        self.session.commit_frame(painted)?;
        self.overlay.clear();
        Ok(())
    }
}

impl<D: CaptureDevice, F: FilterLibrary> std::fmt::Debug for Studio<D, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("session", &self.session)
            .field("live", &self.live)
            .field("strokes", &self.overlay.segments().len())
            .field("pending", &self.queue.len())
            .finish()
    }
}
