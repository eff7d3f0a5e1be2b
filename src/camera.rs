// Live capture: a device behind a pull interface, driven by an external tick.
// The host event loop calls `tick()` at a fixed interval; no timers live here.

use crate::error::{StudioError, StudioResult};
use crate::types::FrameBuffer;

/// What the live source needs from a camera.
pub trait CaptureDevice {
    /// Open device `index`. Fails with [`StudioError::DeviceUnavailable`].
    fn open(&mut self, index: u32) -> StudioResult<()>;

    /// Next frame, or `None` when nothing is ready (transient; skip the tick).
    fn read(&mut self) -> Option<FrameBuffer>;

    /// Release the device. Must be safe to call repeatedly and after failures.
    fn release(&mut self);
}

/// Stand-in for builds without a capture backend: never opens.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDevice;

impl CaptureDevice for NoDevice {
    fn open(&mut self, index: u32) -> StudioResult<()> {
        Err(StudioError::device_unavailable(format!(
            "camera {index}: built without the `camera` feature"
        )))
    }

    fn read(&mut self) -> Option<FrameBuffer> {
        None
    }

    fn release(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveState {
    Closed,
    Open,
}

/// Proof that a read was started while the source was open.
///
/// A read that completes after `stop()` (or a later `start()`) carries a stale
/// ticket and its frame is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadTicket {
    generation: u64,
}

/// Exclusive owner of one capture device.
pub struct LiveSource<D: CaptureDevice> {
    device: D,
    index: u32,
    state: LiveState,
    generation: u64,
    last_frame: Option<FrameBuffer>,
}

impl<D: CaptureDevice> LiveSource<D> {
    pub fn new(device: D, index: u32) -> Self {
        Self {
            device,
            index,
            state: LiveState::Closed,
            generation: 0,
            last_frame: None,
        }
    }

    pub fn state(&self) -> LiveState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == LiveState::Open
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    /// Latest frame read since the last `start()`.
    pub fn last_frame(&self) -> Option<&FrameBuffer> {
        self.last_frame.as_ref()
    }

    /// Open the device. Already open is a no-op, never a second open.
    pub fn start(&mut self) -> StudioResult<LiveState> {
        if self.state == LiveState::Open {
            return Ok(self.state);
        }
        // 1) Ask the device for a stream.
        if let Err(e) = self.device.open(self.index) {
            // Partially opened backends still get released.
            self.device.release();
            tracing::warn!(index = self.index, error = %e, "camera open failed");
            return Err(match e {
                StudioError::DeviceUnavailable(_) => e,
                other => StudioError::device_unavailable(other.to_string()),
            });
        }
        // 2) New generation: anything read before this point is stale.
        //    Visual: the screen keeps the edited image until the first tick lands.
        self.generation += 1;
        self.last_frame = None;
        self.state = LiveState::Open;
        tracing::info!(index = self.index, "live capture started");
        Ok(self.state)
    }

    /// Release the device unconditionally. Safe at any time, including
    /// redundantly or while a read is outstanding.
    pub fn stop(&mut self) {
        self.device.release();
        self.generation += 1;
        self.last_frame = None;
        if self.state == LiveState::Open {
            tracing::info!(index = self.index, "live capture stopped");
        }
        self.state = LiveState::Closed;
    }

    /// One scheduler tick: read a frame if open. `None` means skip this tick.
    pub fn tick(&mut self) -> Option<FrameBuffer> {
        // 1) Take a ticket (closed sources stop here).
        let ticket = self.begin_read()?;
        // 2) Pull a frame; may block until the driver has one.
        let frame = self.device.read();
        // 3) Publish it. Visual: the live image advances by one frame.
        self.finish_read(ticket, frame)
    }

    /// Start a read; `None` while closed.
    pub fn begin_read(&self) -> Option<ReadTicket> {
        (self.state == LiveState::Open).then_some(ReadTicket {
            generation: self.generation,
        })
    }

    /// Publish a read result, unless the source was stopped or restarted
    /// since the ticket was issued.
    pub fn finish_read(&mut self, ticket: ReadTicket, frame: Option<FrameBuffer>) -> Option<FrameBuffer> {
        if self.state != LiveState::Open || ticket.generation != self.generation {
            if frame.is_some() {
                tracing::debug!(stale = ticket.generation, current = self.generation, "discarding late frame");
            }
            return None;
        }
        let frame = frame?;
        self.last_frame = Some(frame.clone());
        Some(frame)
    }
}

impl<D: CaptureDevice> Drop for LiveSource<D> {
    fn drop(&mut self) {
        self.device.release();
    }
}

impl<D: CaptureDevice> std::fmt::Debug for LiveSource<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveSource")
            .field("index", &self.index)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("has_frame", &self.last_frame.is_some())
            .finish()
    }
}

#[cfg(feature = "camera")]
pub use native::NokhwaDevice;

#[cfg(feature = "camera")]
mod native {
    use nokhwa::{
        Camera,
        pixel_format::RgbFormat,
        utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    };

    use super::CaptureDevice;
    use crate::config::CameraConfig;
    use crate::error::{StudioError, StudioResult};
    use crate::types::{FrameBuffer, PixelLayout};

    /// Camera backed by `nokhwa`, delivering RGB frames.
    pub struct NokhwaDevice {
        cam: Option<Camera>,
        config: CameraConfig,
    }

    impl NokhwaDevice {
        pub fn new(config: CameraConfig) -> Self {
            Self { cam: None, config }
        }
    }

    impl CaptureDevice for NokhwaDevice {
        fn open(&mut self, index: u32) -> StudioResult<()> {
            let fmt = CameraFormat::new(
                Resolution::new(self.config.width, self.config.height),
                FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
                self.config.frame_rate,
            );
            // Closest match; the stream may settle on a slightly different resolution
            // (logged below once the stream is up).
            let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

            let mut cam = Camera::new(CameraIndex::Index(index), req)
                .map_err(|e| StudioError::device_unavailable(format!("create camera {index}: {e}")))?;
            cam.open_stream()
                .map_err(|e| StudioError::device_unavailable(format!("open stream {index}: {e}")))?;

            let actual = cam.resolution();
            tracing::info!(
                index,
                width = actual.width(),
                height = actual.height(),
                fps = cam.frame_rate(),
                "camera opened"
            );
            self.cam = Some(cam);
            Ok(())
        }

        fn read(&mut self) -> Option<FrameBuffer> {
            let cam = self.cam.as_mut()?;
            // 1) Pull a frame (blocks until the driver hands one over).
            let frame = match cam.frame() {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(error = %e, "fetch frame failed");
                    return None;
                }
            };
            // 2) Decode whatever raw format the stream settled on into RGB8.
            let rgb = match frame.decode_image::<RgbFormat>() {
                Ok(img) => img,
                Err(e) => {
                    tracing::warn!(error = %e, "decode frame failed");
                    return None;
                }
            };
            // 3) Wrap the pixels; the window packing happens at presentation.
            let (w, h) = rgb.dimensions();
            FrameBuffer::new(w, h, PixelLayout::Rgb8, rgb.into_raw())
                .inspect_err(|e| tracing::warn!(error = %e, "camera produced malformed frame"))
                .ok()
        }

        fn release(&mut self) {
            if let Some(mut cam) = self.cam.take() {
                if let Err(e) = cam.stop_stream() {
                    tracing::warn!(error = %e, "stop stream failed");
                }
                tracing::info!("camera released");
            }
        }
    }
}
