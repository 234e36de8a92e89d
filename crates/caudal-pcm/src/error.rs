//! Error types for stream operations.

/// Errors surfaced by stream control and data operations.
///
/// Precondition violations (calling a data op before `hw_params`, mismatched
/// access modes, zero-length transfers) are programmer errors and panic via
/// assertion instead of returning one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parameter value or combination was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The operation needs a state the stream is not in.
    #[error("stream is not ready: {0}")]
    NotReady(&'static str),

    /// The backend lacks the capability.
    #[error("not supported: {0}")]
    NotSupported(&'static str),

    /// Non-blocking mode and the transfer would have to wait.
    #[error("operation would block")]
    WouldBlock,

    /// Underrun or overrun while the stream was running.
    #[error("underrun/overrun (broken pipe)")]
    Xrun,

    /// No stream or backend with the given name exists.
    #[error("no such entry: {0}")]
    NoEntry(String),

    /// WAV sink error in the file backend.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Propagated OS error.
    #[error("system error: {0}")]
    System(#[from] std::io::Error),
}

/// Convenience result type for stream operations.
pub type Result<T> = std::result::Result<T, Error>;
