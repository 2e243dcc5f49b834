use std::io;

/// Errors produced while turning GIF bytes into a [`crate::FrameStore`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("gif decode error: {0}")]
    Decode(#[from] gif::DecodingError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("gif has no frames")]
    EmptyAnimation,

    #[error("frame {index} patch {width}x{height}+{left}+{top} exceeds canvas {canvas_width}x{canvas_height}")]
    PatchOutOfBounds {
        index: usize,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
        canvas_width: u32,
        canvas_height: u32,
    },

    #[error("frame {index} has {actual} pixel bytes, expected {expected}")]
    PixelLength {
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// The worker running a load went away before delivering a result
    #[error("loader closed before the gif finished loading")]
    LoaderClosed,

    #[error("generic error: {0}")]
    Generic(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

/// A frame index outside of `[0, total_frames)`
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("frame index {index} out of range for {total} frames")]
pub struct OutOfRange {
    pub index: usize,
    pub total: usize,
}

pub type Result<T> = std::result::Result<T, Error>;
