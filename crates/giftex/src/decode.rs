use std::time::Duration;

use crate::frame::{Disposal, Frame, FrameStore, LoopCount};
use crate::Result;

/// Decode a whole GIF into a [`FrameStore`].
///
/// Frames keep their patch geometry; compositing them onto the canvas is the
/// compositor's job. Patches hanging over the logical screen are clipped, and
/// a zero-sized logical screen is grown to fit the frames.
#[profiling::function]
pub fn decode_gif(bytes: &[u8]) -> Result<FrameStore> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::RGBA);

    let mut decoder = options.read_info(bytes)?;
    let loop_count = match decoder.repeat() {
        gif::Repeat::Infinite => LoopCount::Infinite,
        gif::Repeat::Finite(n) => LoopCount::Finite(n),
    };

    let mut frames = Vec::new();
    while let Some(frame) = decoder.read_next_frame()? {
        frames.push(convert_frame(frame));
    }

    let (mut width, mut height) = (decoder.width() as u32, decoder.height() as u32);
    if width == 0 || height == 0 {
        width = frames.iter().map(|f| f.left + f.width).max().unwrap_or(0);
        height = frames.iter().map(|f| f.top + f.height).max().unwrap_or(0);
        tracing::debug!("gif has no logical screen size, using {width}x{height}");
    }

    let frames = frames
        .into_iter()
        .enumerate()
        .map(|(index, frame)| clip_to_canvas(index, frame, width, height))
        .collect();

    Ok(FrameStore::new(width, height, frames)?.with_loop_count(loop_count))
}

fn convert_frame(frame: &gif::Frame<'_>) -> Frame {
    let disposal = match frame.dispose {
        gif::DisposalMethod::Background => Disposal::RestoreToBackground,
        gif::DisposalMethod::Previous => Disposal::RestoreToPrevious,
        gif::DisposalMethod::Any | gif::DisposalMethod::Keep => Disposal::None,
    };

    Frame {
        left: frame.left as u32,
        top: frame.top as u32,
        width: frame.width as u32,
        height: frame.height as u32,
        pixels: frame.buffer.to_vec(),
        disposal,
        // gif delays are in hundredths of a second
        delay: Duration::from_millis(frame.delay as u64 * 10),
    }
}

fn clip_to_canvas(index: usize, mut frame: Frame, width: u32, height: u32) -> Frame {
    if frame.fits(width, height) {
        return frame;
    }

    let visible_w = width.saturating_sub(frame.left).min(frame.width);
    let visible_h = height.saturating_sub(frame.top).min(frame.height);
    tracing::warn!(
        "gif frame {index} ({}x{}+{}+{}) overhangs {width}x{height} canvas, clipping to {visible_w}x{visible_h}",
        frame.width,
        frame.height,
        frame.left,
        frame.top
    );

    let mut pixels = Vec::with_capacity(visible_w as usize * visible_h as usize * 4);
    if visible_w > 0 && visible_h > 0 {
        let row_len = visible_w as usize * 4;
        for row in frame
            .pixels
            .chunks_exact(frame.width as usize * 4)
            .take(visible_h as usize)
        {
            pixels.extend_from_slice(&row[..row_len]);
        }
    }

    frame.left = frame.left.min(width);
    frame.top = frame.top.min(height);
    frame.width = if visible_h > 0 { visible_w } else { 0 };
    frame.height = if visible_w > 0 { visible_h } else { 0 };
    frame.pixels = pixels;
    frame
}
