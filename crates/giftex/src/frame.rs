use std::time::Duration;

use crate::error::{Error, OutOfRange};

/// What happens to the canvas once a frame has been shown
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Disposal {
    #[default]
    None,
    RestoreToBackground,
    /// Treated like [`Disposal::None`] by the compositor
    RestoreToPrevious,
}

/// One decoded patch of an animation
#[derive(Debug, Clone)]
pub struct Frame {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// RGBA8, `width * height * 4` bytes
    pub pixels: Vec<u8>,
    pub disposal: Disposal,
    pub delay: Duration,
}

impl Frame {
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    pub(crate) fn fits(&self, canvas_width: u32, canvas_height: u32) -> bool {
        self.left as u64 + self.width as u64 <= canvas_width as u64
            && self.top as u64 + self.height as u64 <= canvas_height as u64
    }
}

/// How many times the animation asks to be played
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum LoopCount {
    #[default]
    Infinite,
    Finite(u16),
}

/// An immutable, validated sequence of frames sharing one canvas size.
///
/// Construction checks that there is at least one frame, that every patch
/// lies within the canvas and that every pixel buffer has the right length,
/// so the compositor never has to deal with a half valid animation.
#[derive(Debug)]
pub struct FrameStore {
    width: u32,
    height: u32,
    frames: Vec<Frame>,
    loop_count: LoopCount,
}

impl FrameStore {
    pub fn new(width: u32, height: u32, frames: Vec<Frame>) -> Result<Self, Error> {
        if frames.is_empty() {
            return Err(Error::EmptyAnimation);
        }

        for (index, frame) in frames.iter().enumerate() {
            if !frame.fits(width, height) {
                return Err(Error::PatchOutOfBounds {
                    index,
                    left: frame.left,
                    top: frame.top,
                    width: frame.width,
                    height: frame.height,
                    canvas_width: width,
                    canvas_height: height,
                });
            }

            let expected = frame.expected_len();
            if frame.pixels.len() != expected {
                return Err(Error::PixelLength {
                    index,
                    expected,
                    actual: frame.pixels.len(),
                });
            }
        }

        Ok(Self {
            width,
            height,
            frames,
            loop_count: LoopCount::default(),
        })
    }

    pub fn with_loop_count(mut self, loop_count: LoopCount) -> Self {
        self.loop_count = loop_count;
        self
    }

    pub fn frame_at(&self, index: usize) -> Result<&Frame, OutOfRange> {
        self.frames.get(index).ok_or(OutOfRange {
            index,
            total: self.frames.len(),
        })
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn loop_count(&self) -> LoopCount {
        self.loop_count
    }

    /// Sum of every frame's authored delay
    pub fn total_duration(&self) -> Duration {
        self.frames.iter().map(|f| f.delay).sum()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Clamp a signed index into `[0, total_frames)`
    pub fn clamp_index(&self, index: isize) -> usize {
        let last = self.frames.len() - 1;
        if index <= 0 {
            0
        } else {
            (index as usize).min(last)
        }
    }
}
