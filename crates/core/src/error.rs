//! Error types for the streaming pipeline.

/// Errors that can occur while streaming.
///
/// Variants map to specific failure modes across the stack:
///
/// - **Input / network**: [`Io`](Self::Io) — the source file could not be
///   opened or mapped, or the UDP socket failed to bind or send.
/// - **Configuration**: [`InvalidFps`](Self::InvalidFps),
///   [`InvalidMtu`](Self::InvalidMtu) — rejected before any I/O happens.
/// - **Pipeline**: [`StagePanicked`](Self::StagePanicked) — a worker thread
///   died without reporting a proper error.
///
/// Queue closure is deliberately *not* an error: a closed, drained queue is
/// the clean end-of-stream signal between stages.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// Underlying I/O or socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame rate outside the 90 kHz clock's usable range.
    #[error("invalid fps {0}: must be between 1 and 90000")]
    InvalidFps(u32),

    /// MTU too small to carry an RTP header plus one FU-A fragment byte.
    #[error("invalid mtu {0}: must be at least 15 (12 RTP + 2 FU-A + payload)")]
    InvalidMtu(usize),

    /// A pipeline stage thread panicked.
    #[error("pipeline stage panicked: {0}")]
    StagePanicked(&'static str),
}

/// Convenience alias for `Result<T, StreamError>`.
pub type Result<T> = std::result::Result<T, StreamError>;
