// Error taxonomy for the edit pipeline.
// Every variant states *where* things went wrong; none are retried by the core.

pub type StudioResult<T> = Result<T, StudioError>;

#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    /// Bad path, unreadable file, or an operation parameter outside its range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    /// Operation issued before anything was loaded.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Opening the capture device failed.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("i/o error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl StudioError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn device_unavailable(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable(msg.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
