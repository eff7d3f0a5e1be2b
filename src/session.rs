// Edit session: base image, linear undo/redo history and the displayed frame.
// Visual: buttons stack filters on what you see; sliders (brightness/contrast)
// always start again from the untouched base, so moving them never compounds.

use std::fmt;
use std::str::FromStr;

use crate::error::{StudioError, StudioResult};
use crate::filters::{CpuFilters, FilterLibrary};
use crate::types::FrameBuffer;

pub const BLUR_KERNEL_MAX: u32 = 49;
pub const HUE_MAX_DEGREES: i32 = 180;
pub const ADJUST_MAX: i32 = 100;

/// One edit, as produced by a button or slider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Grayscale,
    Blur { kernel: u32 },
    EdgeDetect { low: u8, high: u8 },
    Sharpen,
    HueShift { degrees: i32 },
    BrightnessContrast { brightness: i32, contrast: i32 },
}

/// Which frame an operation reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    /// Applied on top of the last committed frame; stacks with earlier filters.
    Compositional,
    /// Recomputed from the base frame on every parameter change; never stacks.
    SliderPreview,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::BrightnessContrast { .. } => OperationKind::SliderPreview,
            _ => OperationKind::Compositional,
        }
    }

    /// Check parameters against the ranges the controls can produce.
    pub fn validate(&self) -> StudioResult<()> {
        const HUE: std::ops::RangeInclusive<i32> = -HUE_MAX_DEGREES..=HUE_MAX_DEGREES;
        const ADJUST: std::ops::RangeInclusive<i32> = -ADJUST_MAX..=ADJUST_MAX;
        match *self {
            Operation::Blur { kernel } if kernel > BLUR_KERNEL_MAX => Err(StudioError::invalid_input(
                format!("blur kernel {kernel} exceeds {BLUR_KERNEL_MAX}"),
            )),
            Operation::HueShift { degrees } if !HUE.contains(&degrees) => Err(StudioError::invalid_input(
                format!("hue shift {degrees} outside -180..=180"),
            )),
            Operation::BrightnessContrast {
                brightness,
                contrast,
            } if !ADJUST.contains(&brightness) || !ADJUST.contains(&contrast) => {
                Err(StudioError::invalid_input(format!(
                    "brightness {brightness} / contrast {contrast} outside -100..=100"
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn apply<F: FilterLibrary + ?Sized>(&self, filters: &F, src: &FrameBuffer) -> FrameBuffer {
        match *self {
            Operation::Grayscale => filters.to_grayscale(src),
            Operation::Blur { kernel } => filters.gaussian_blur(src, kernel),
            Operation::EdgeDetect { low, high } => filters.edge_detect(src, low, high),
            Operation::Sharpen => filters.sharpen(src),
            Operation::HueShift { degrees } => filters.hue_shift(src, degrees),
            Operation::BrightnessContrast {
                brightness,
                contrast,
            } => filters.brightness_contrast(src, brightness, contrast),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Grayscale => write!(f, "grayscale"),
            Operation::Blur { kernel } => write!(f, "blur:{kernel}"),
            Operation::EdgeDetect { low, high } => write!(f, "edge:{low}:{high}"),
            Operation::Sharpen => write!(f, "sharpen"),
            Operation::HueShift { degrees } => write!(f, "hue:{degrees}"),
            Operation::BrightnessContrast {
                brightness,
                contrast,
            } => write!(f, "bc:{brightness}:{contrast}"),
        }
    }
}

/// Parses the `Display` form, e.g. `blur:5`, `edge:50:150`, `bc:-20:35`.
impl FromStr for Operation {
    type Err = StudioError;

    fn from_str(s: &str) -> StudioResult<Self> {
        fn num<T: FromStr>(s: &str, what: &str) -> StudioResult<T> {
            s.trim()
                .parse()
                .map_err(|_| StudioError::invalid_input(format!("bad {what} value {s:?}")))
        }

        let mut parts = s.trim().split(':');
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();
        let arity = |n: usize| -> StudioResult<()> {
            if args.len() == n {
                Ok(())
            } else {
                Err(StudioError::invalid_input(format!(
                    "{name} takes {n} argument(s), got {}",
                    args.len()
                )))
            }
        };

        let op = match name.as_str() {
            "grayscale" | "gray" => {
                arity(0)?;
                Operation::Grayscale
            }
            "blur" => {
                arity(1)?;
                Operation::Blur {
                    kernel: num(args[0], "kernel")?,
                }
            }
            "edge" => {
                arity(2)?;
                Operation::EdgeDetect {
                    low: num(args[0], "low threshold")?,
                    high: num(args[1], "high threshold")?,
                }
            }
            "sharpen" => {
                arity(0)?;
                Operation::Sharpen
            }
            "hue" => {
                arity(1)?;
                Operation::HueShift {
                    degrees: num(args[0], "hue")?,
                }
            }
            "bc" => {
                arity(2)?;
                Operation::BrightnessContrast {
                    brightness: num(args[0], "brightness")?,
                    contrast: num(args[1], "contrast")?,
                }
            }
            other => return Err(StudioError::invalid_input(format!("unknown operation {other:?}"))),
        };
        op.validate()?;
        Ok(op)
    }
}

/// Linear history over immutable frames.
///
/// `history[0]` is the base and the last entry is the committed state, so the
/// cursor is always `history.len() - 1`; the undone future lives only in
/// `redo_tail`. `preview` holds a transient slider result that is never pushed.
pub struct EditSession<F = CpuFilters> {
    filters: F,
    history: Vec<FrameBuffer>,
    redo_tail: Vec<FrameBuffer>,
    preview: Option<FrameBuffer>,
}

impl EditSession<CpuFilters> {
    pub fn new() -> Self {
        Self::with_filters(CpuFilters)
    }
}

impl Default for EditSession<CpuFilters> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FilterLibrary> EditSession<F> {
    pub fn with_filters(filters: F) -> Self {
        Self {
            filters,
            history: Vec::new(),
            redo_tail: Vec::new(),
            preview: None,
        }
    }

    /// Replace everything with a fresh base frame.
    pub fn load(&mut self, buffer: FrameBuffer) {
        tracing::info!(
            width = buffer.width(),
            height = buffer.height(),
            "session loaded new base"
        );
        self.history.clear();
        self.history.push(buffer);
        self.redo_tail.clear();
        self.preview = None;
    }

    pub fn is_loaded(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn base(&self) -> StudioResult<&FrameBuffer> {
        self.history.first().ok_or_else(not_loaded)
    }

    /// The frame at the cursor.
    pub fn committed(&self) -> StudioResult<&FrameBuffer> {
        self.history.last().ok_or_else(not_loaded)
    }

    /// The frame to show: the preview if one is active, else the committed frame.
    pub fn displayed(&self) -> StudioResult<&FrameBuffer> {
        match &self.preview {
            Some(p) => Ok(p),
            None => self.committed(),
        }
    }

    pub fn cursor(&self) -> StudioResult<usize> {
        self.ensure_loaded()?;
        Ok(self.history.len() - 1)
    }

    pub fn history(&self) -> &[FrameBuffer] {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_tail.len()
    }

    pub fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }

    /// Compute `op` against its source frame, append the result and move the
    /// cursor onto it. Any redo future is discarded.
    ///
    /// All-or-nothing: on error, history, cursor and redo tail are untouched.
    pub fn commit_operation(&mut self, op: Operation) -> StudioResult<&FrameBuffer> {
        op.validate()?;
        let result = op.apply(&self.filters, self.source_for(op)?);
        tracing::debug!(%op, cursor = self.history.len(), "commit");
        Ok(self.push_commit(result))
    }

    /// Commit a frame produced outside the filter chain (e.g. a painted overlay).
    pub fn commit_frame(&mut self, buffer: FrameBuffer) -> StudioResult<&FrameBuffer> {
        self.ensure_loaded()?;
        tracing::debug!(cursor = self.history.len(), "commit external frame");
        Ok(self.push_commit(buffer))
    }

    /// Show `op` without touching history. Only slider-preview operations
    /// qualify; each call recomputes from the base, so it is idempotent.
    pub fn preview_operation(&mut self, op: Operation) -> StudioResult<&FrameBuffer> {
        if op.kind() != OperationKind::SliderPreview {
            return Err(StudioError::invalid_input(format!(
                "{op} stacks on committed state and cannot be previewed"
            )));
        }
        op.validate()?;
        let result = op.apply(&self.filters, self.base()?);
        tracing::debug!(%op, "preview");
        let shown: &FrameBuffer = self.preview.insert(result);
        Ok(shown)
    }

    /// Drop an active preview and show the committed frame again.
    pub fn cancel_preview(&mut self) -> StudioResult<&FrameBuffer> {
        self.ensure_loaded()?;
        self.preview = None;
        self.committed()
    }

    /// Step back one commit. Returns `false` when already at the base.
    pub fn undo(&mut self) -> StudioResult<bool> {
        self.ensure_loaded()?;
        if self.history.len() == 1 {
            return Ok(false);
        }
        self.preview = None;
        if let Some(top) = self.history.pop() {
            self.redo_tail.push(top);
        }
        tracing::debug!(cursor = self.history.len() - 1, redo = self.redo_tail.len(), "undo");
        Ok(true)
    }

    /// Re-apply the most recently undone commit. Returns `false` when there is none.
    pub fn redo(&mut self) -> StudioResult<bool> {
        self.ensure_loaded()?;
        let Some(next) = self.redo_tail.pop() else {
            return Ok(false);
        };
        self.preview = None;
        self.history.push(next);
        tracing::debug!(cursor = self.history.len() - 1, redo = self.redo_tail.len(), "redo");
        Ok(true)
    }

    /// Back to the base frame; all history and redo state is dropped.
    pub fn reset(&mut self) -> StudioResult<()> {
        self.ensure_loaded()?;
        self.history.truncate(1);
        self.redo_tail.clear();
        self.preview = None;
        tracing::debug!("reset to base");
        Ok(())
    }

    fn source_for(&self, op: Operation) -> StudioResult<&FrameBuffer> {
        match op.kind() {
            OperationKind::Compositional => self.committed(),
            OperationKind::SliderPreview => self.base(),
        }
    }

    fn push_commit(&mut self, result: FrameBuffer) -> &FrameBuffer {
        self.redo_tail.clear();
        self.preview = None;
        self.history.push(result);
        &self.history[self.history.len() - 1]
    }

    fn ensure_loaded(&self) -> StudioResult<()> {
        if self.history.is_empty() {
            Err(not_loaded())
        } else {
            Ok(())
        }
    }
}

impl<F> fmt::Debug for EditSession<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("history", &self.history.len())
            .field("redo_tail", &self.redo_tail.len())
            .field("previewing", &self.preview.is_some())
            .finish()
    }
}

fn not_loaded() -> StudioError {
    StudioError::invalid_state("no image loaded")
}
