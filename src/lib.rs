#![forbid(unsafe_code)]

pub mod assets;
pub mod camera;
pub mod config;
pub mod draw;
pub mod error;
pub mod filters;
pub mod present;
pub mod session;
pub mod studio;
pub mod testing;
pub mod types;

pub use camera::{CaptureDevice, LiveSource, LiveState, NoDevice, ReadTicket};
pub use config::StudioConfig;
pub use draw::{DrawOverlay, Segment};
pub use error::{StudioError, StudioResult};
pub use filters::{CpuFilters, FilterLibrary};
pub use session::{EditSession, Operation, OperationKind};
pub use studio::{Command, Studio};
pub use types::{Color, FrameBuffer, PixelLayout, Point};
