use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::config::PlaybackConfig;
use crate::frame::{Disposal, FrameStore};
use crate::pacer::FramePacer;
use crate::surface::CompositeSurface;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Disposed,
}

/// What the host should do after calling [`AnimationCompositor::tick`]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Tick {
    /// Call `tick` again on the first refresh at or after this instant
    Due(Instant),
    /// Paused, nothing scheduled until playback resumes
    Idle,
    /// Disposed, stop driving this compositor
    Stop,
}

/// Paints an animation frame by frame onto a persistent canvas.
///
/// The compositor is driven from the outside: the host calls [`Self::tick`]
/// from its refresh callback and gets back when the next frame is due. Frames
/// are only advanced on a tick, so rendering never outpaces the host's refresh
/// rate even when a frame's delay is zero.
pub struct AnimationCompositor {
    store: Arc<FrameStore>,
    surface: CompositeSurface,
    scratch: Option<RgbaImage>,
    cursor: usize,
    /// index and disposal of the frame currently on the canvas
    shown: Option<(usize, Disposal)>,
    state: PlaybackState,
    next_due: Option<Instant>,
    pacer: FramePacer,
    background: [u8; 4],
}

impl AnimationCompositor {
    pub fn new(store: Arc<FrameStore>, config: PlaybackConfig) -> Self {
        let surface = CompositeSurface::new(store.width(), store.height(), config.background);
        let mut compositor = Self {
            store,
            surface,
            scratch: None,
            cursor: 0,
            shown: None,
            state: PlaybackState::Idle,
            next_due: None,
            pacer: FramePacer::new(config.max_fps),
            background: config.background,
        };

        let started = Instant::now();
        let delay = compositor.composite();

        if config.autoplay {
            compositor.state = PlaybackState::Playing;
            compositor.next_due = Some(compositor.pacer.next_due(started, Instant::now(), delay));
        }

        compositor
    }

    /// Advance the animation if the current frame's time is up.
    ///
    /// `now` is when the host dispatched this tick. The next due time is
    /// measured from it, minus whatever compositing cost.
    pub fn tick(&mut self, now: Instant) -> Tick {
        match self.state {
            PlaybackState::Disposed => return Tick::Stop,
            PlaybackState::Idle => return Tick::Idle,
            PlaybackState::Playing => {}
        }

        if let Some(due) = self.next_due {
            if now < due {
                return Tick::Due(due);
            }
        }

        let started = Instant::now();
        self.cursor = (self.cursor + 1) % self.store.total_frames();
        let delay = self.composite();
        let elapsed = started.elapsed();

        let due = self.pacer.next_due(now, now + elapsed, delay);
        tracing::trace!(
            "gif frame {} took {elapsed:?}, next due in {:?}",
            self.cursor,
            due - now
        );
        self.next_due = Some(due);

        Tick::Due(due)
    }

    /// Seek. Out of range indices are clamped, the schedule is left alone.
    pub fn render_frame_at(&mut self, index: isize) -> usize {
        if self.state == PlaybackState::Disposed {
            return self.cursor;
        }

        self.cursor = self.store.clamp_index(index);
        self.composite();
        self.cursor
    }

    /// 1-based number of the frame on the canvas
    pub fn frame(&self) -> usize {
        self.cursor + 1
    }

    /// Seek to a 1-based frame number
    pub fn set_frame(&mut self, frame_number: isize) -> usize {
        self.render_frame_at(frame_number.saturating_sub(1)) + 1
    }

    pub fn set_playing(&mut self, playing: bool) {
        match (self.state, playing) {
            (PlaybackState::Idle, true) => {
                self.state = PlaybackState::Playing;
                self.next_due = None;
            }
            (PlaybackState::Playing, false) => {
                self.state = PlaybackState::Idle;
                self.next_due = None;
            }
            _ => {}
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Stop for good and hand the canvas back. Later calls return `None`.
    pub fn dispose(&mut self) -> Option<CompositeSurface> {
        if self.state == PlaybackState::Disposed {
            return None;
        }

        self.state = PlaybackState::Disposed;
        self.next_due = None;
        self.scratch = None;
        Some(std::mem::take(&mut self.surface))
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn store(&self) -> &Arc<FrameStore> {
        &self.store
    }

    pub fn surface(&self) -> &CompositeSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut CompositeSurface {
        &mut self.surface
    }

    pub fn scratch_size(&self) -> Option<(u32, u32)> {
        self.scratch.as_ref().map(|s| s.dimensions())
    }

    /// Paint the frame under the cursor and return its delay
    #[profiling::function]
    fn composite(&mut self) -> Duration {
        let frame = match self.store.frame_at(self.cursor) {
            Ok(frame) => frame,
            Err(err) => {
                if cfg!(debug_assertions) {
                    panic!("compositor cursor escaped its clamp: {err}");
                }
                tracing::error!("compositor cursor escaped its clamp: {err}");
                return Duration::ZERO;
            }
        };

        // disposal belongs to the frame being replaced, repainting the same
        // frame is not a transition
        if let Some((shown, Disposal::RestoreToBackground)) = self.shown {
            if shown != self.cursor {
                self.surface.clear(self.background);
            }
        }

        let dims = (frame.width, frame.height);
        if self.scratch.as_ref().is_some_and(|s| s.dimensions() != dims) {
            tracing::debug!("resizing gif scratch buffer to {}x{}", dims.0, dims.1);
            self.scratch = None;
        }
        let scratch = self
            .scratch
            .get_or_insert_with(|| RgbaImage::new(frame.width, frame.height));

        scratch.copy_from_slice(&frame.pixels);
        blit_keyed(self.surface.image_mut(), scratch, frame.left, frame.top);
        self.surface.mark_dirty();

        self.shown = Some((self.cursor, frame.disposal));
        frame.delay
    }
}

/// Copy `patch` onto `canvas` at (`left`, `top`) without blending.
///
/// Pixels with zero alpha are the gif transparency key and leave the canvas
/// alone; every other pixel overwrites its destination byte for byte.
fn blit_keyed(canvas: &mut RgbaImage, patch: &RgbaImage, left: u32, top: u32) {
    let (canvas_width, canvas_height) = canvas.dimensions();
    if left >= canvas_width || top >= canvas_height {
        return;
    }

    let cols = patch.width().min(canvas_width - left) as usize;
    let rows = patch.height().min(canvas_height - top) as usize;
    let src_stride = patch.width() as usize * 4;
    let dst_stride = canvas_width as usize * 4;

    let src: &[u8] = patch.as_raw();
    let dst: &mut [u8] = &mut **canvas;

    for y in 0..rows {
        let src_start = y * src_stride;
        let dst_start = (top as usize + y) * dst_stride + left as usize * 4;
        let src_row = &src[src_start..src_start + cols * 4];
        let dst_row = &mut dst[dst_start..dst_start + cols * 4];

        for (dst_px, src_px) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
            if src_px[3] != 0 {
                dst_px.copy_from_slice(src_px);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use pretty_assertions::assert_eq;

    const RED: [u8; 4] = [255, 0, 0, 255];
    const GREEN: [u8; 4] = [0, 255, 0, 255];
    const BLUE: [u8; 4] = [0, 0, 255, 255];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    fn patch(left: u32, top: u32, width: u32, height: u32, rgba: [u8; 4]) -> Frame {
        Frame {
            left,
            top,
            width,
            height,
            pixels: rgba.repeat((width * height) as usize),
            disposal: Disposal::None,
            delay: Duration::from_millis(100),
        }
    }

    fn disposing(mut frame: Frame, disposal: Disposal) -> Frame {
        frame.disposal = disposal;
        frame
    }

    fn store(width: u32, height: u32, frames: Vec<Frame>) -> Arc<FrameStore> {
        Arc::new(FrameStore::new(width, height, frames).unwrap())
    }

    fn paused(store: Arc<FrameStore>) -> AnimationCompositor {
        AnimationCompositor::new(store, PlaybackConfig::paused())
    }

    #[test]
    fn first_frame_is_painted_on_construction() {
        let compositor = paused(store(4, 4, vec![patch(0, 0, 4, 4, RED)]));

        assert_eq!(compositor.cursor(), 0);
        assert_eq!(compositor.state(), PlaybackState::Idle);
        assert!(compositor.surface().is_dirty());
        assert_eq!(compositor.surface().pixel(3, 3), RED);
    }

    #[test]
    fn patch_lands_at_its_offset() {
        let mut compositor = paused(store(
            32,
            16,
            vec![patch(0, 0, 32, 16, RED), patch(10, 5, 4, 4, GREEN)],
        ));
        let before = compositor.surface().image().clone();

        compositor.render_frame_at(1);
        let after = compositor.surface().image();

        for (x, y, pixel) in after.enumerate_pixels() {
            let inside = (10..14).contains(&x) && (5..9).contains(&y);
            if inside {
                assert_eq!(pixel.0, GREEN, "({x}, {y})");
            } else {
                assert_eq!(pixel, before.get_pixel(x, y), "({x}, {y})");
            }
        }
    }

    #[test]
    fn background_disposal_clears_before_next_frame() {
        let mut compositor = paused(store(
            8,
            8,
            vec![
                disposing(patch(0, 0, 8, 8, RED), Disposal::RestoreToBackground),
                patch(0, 0, 2, 2, BLUE),
            ],
        ));
        assert_eq!(compositor.surface().pixel(7, 7), RED);

        compositor.render_frame_at(1);

        for (x, y, pixel) in compositor.surface().image().enumerate_pixels() {
            let expected = if x < 2 && y < 2 { BLUE } else { CLEAR };
            assert_eq!(pixel.0, expected, "({x}, {y})");
        }
    }

    #[test]
    fn background_disposal_uses_configured_color() {
        let gray = [40, 40, 40, 255];
        let mut compositor = AnimationCompositor::new(
            store(
                4,
                4,
                vec![
                    disposing(patch(0, 0, 4, 4, RED), Disposal::RestoreToBackground),
                    patch(0, 0, 1, 1, BLUE),
                ],
            ),
            PlaybackConfig::paused().with_background(gray),
        );

        compositor.render_frame_at(1);
        assert_eq!(compositor.surface().pixel(3, 3), gray);
    }

    #[test]
    fn other_disposals_keep_leftovers() {
        let mut compositor = paused(store(
            4,
            4,
            vec![
                disposing(patch(0, 0, 4, 4, RED), Disposal::RestoreToPrevious),
                patch(0, 0, 1, 1, BLUE),
            ],
        ));

        compositor.render_frame_at(1);
        assert_eq!(compositor.surface().pixel(0, 0), BLUE);
        assert_eq!(compositor.surface().pixel(3, 3), RED);
    }

    #[test]
    fn transparent_patch_pixels_keep_canvas() {
        let mut hole = patch(0, 0, 2, 1, GREEN);
        hole.pixels[4..8].copy_from_slice(&CLEAR);
        let mut compositor = paused(store(2, 1, vec![patch(0, 0, 2, 1, RED), hole]));

        compositor.render_frame_at(1);
        assert_eq!(compositor.surface().pixel(0, 0), GREEN);
        assert_eq!(compositor.surface().pixel(1, 0), RED);
    }

    #[test]
    fn partial_alpha_is_copied_not_blended() {
        let canvas = [200, 10, 10, 255];
        let glass = [0, 0, 255, 128];
        let mut compositor = paused(store(
            2,
            1,
            vec![patch(0, 0, 2, 1, canvas), patch(1, 0, 1, 1, glass)],
        ));

        compositor.render_frame_at(1);
        assert_eq!(compositor.surface().pixel(1, 0), glass);
        compositor.render_frame_at(1);
        assert_eq!(compositor.surface().pixel(1, 0), glass);
        assert_eq!(compositor.surface().pixel(0, 0), canvas);
    }

    #[test]
    fn odd_opaque_colors_are_exact() {
        let odd = [37, 113, 201, 255];
        let mut compositor = paused(store(
            3,
            3,
            vec![patch(0, 0, 3, 3, RED), patch(2, 2, 1, 1, odd)],
        ));

        compositor.render_frame_at(1);
        assert_eq!(compositor.surface().pixel(2, 2), odd);
        assert_eq!(compositor.surface().pixel(1, 2), RED);
    }

    #[test]
    fn seeking_twice_is_idempotent() {
        let frames = vec![
            patch(0, 0, 6, 6, RED),
            disposing(patch(1, 1, 2, 2, GREEN), Disposal::RestoreToBackground),
            patch(3, 0, 3, 3, BLUE),
            disposing(patch(0, 4, 6, 2, GREEN), Disposal::RestoreToBackground),
        ];
        let mut compositor = paused(store(6, 6, frames));

        for k in [2isize, 1, 3, 0, 3, 1] {
            compositor.render_frame_at(k);
            let once = compositor.surface().as_raw().to_vec();
            compositor.render_frame_at(k);
            assert_eq!(once, compositor.surface().as_raw().to_vec(), "frame {k}");
        }
    }

    #[test]
    fn seek_is_clamped() {
        let frames = (0..5).map(|_| patch(0, 0, 2, 2, RED)).collect();
        let mut compositor = paused(store(2, 2, frames));

        assert_eq!(compositor.render_frame_at(-5), 0);
        assert_eq!(compositor.render_frame_at(15), 4);
        assert_eq!(compositor.cursor(), 4);
    }

    #[test]
    fn frame_numbers_are_one_based() {
        let frames = (0..3).map(|_| patch(0, 0, 2, 2, RED)).collect();
        let mut compositor = paused(store(2, 2, frames));

        assert_eq!(compositor.frame(), 1);
        assert_eq!(compositor.set_frame(2), 2);
        assert_eq!(compositor.cursor(), 1);
        assert_eq!(compositor.set_frame(0), 1);
        assert_eq!(compositor.set_frame(99), 3);
    }

    #[test]
    fn wraps_back_to_first_frame() {
        let frames = vec![
            patch(0, 0, 5, 5, RED),
            patch(1, 1, 3, 3, GREEN),
            disposing(patch(2, 2, 1, 1, BLUE), Disposal::RestoreToBackground),
        ];
        let store = store(5, 5, frames);
        let mut compositor = AnimationCompositor::new(store.clone(), PlaybackConfig::default());

        let mut now = Instant::now();
        for _ in 0..store.total_frames() {
            now += Duration::from_secs(1);
            assert!(matches!(compositor.tick(now), Tick::Due(_)));
        }
        assert_eq!(compositor.cursor(), 0);

        let mut fresh = paused(store);
        fresh.render_frame_at(0);
        assert_eq!(compositor.surface().as_raw(), fresh.surface().as_raw());
    }

    #[test]
    fn tick_waits_for_due_time() {
        let frames = vec![patch(0, 0, 2, 2, RED), patch(0, 0, 2, 2, GREEN)];
        let mut compositor = AnimationCompositor::new(store(2, 2, frames), Default::default());
        let now = Instant::now();

        let due = compositor.next_due().unwrap();
        assert_eq!(compositor.tick(now), Tick::Due(due));
        assert_eq!(compositor.cursor(), 0);

        let later = due + Duration::from_millis(1);
        let Tick::Due(next) = compositor.tick(later) else {
            panic!("expected a due time");
        };
        assert_eq!(compositor.cursor(), 1);
        assert!(next >= later + Duration::from_millis(100));
        assert_eq!(compositor.surface().pixel(0, 0), GREEN);
    }

    #[test]
    fn pause_keeps_canvas_and_resume_keeps_cursor() {
        let frames = vec![
            patch(0, 0, 2, 2, RED),
            patch(0, 0, 2, 2, GREEN),
            patch(0, 0, 2, 2, BLUE),
        ];
        let mut compositor = AnimationCompositor::new(store(2, 2, frames), Default::default());
        let mut now = Instant::now() + Duration::from_secs(1);
        compositor.tick(now);
        assert_eq!(compositor.cursor(), 1);

        compositor.set_playing(false);
        now += Duration::from_secs(1);
        assert_eq!(compositor.tick(now), Tick::Idle);
        assert_eq!(compositor.cursor(), 1);
        assert_eq!(compositor.surface().pixel(1, 1), GREEN);

        compositor.set_playing(true);
        assert!(compositor.is_playing());
        compositor.tick(now);
        assert_eq!(compositor.cursor(), 2);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut compositor = AnimationCompositor::new(
            store(3, 3, vec![patch(0, 0, 3, 3, RED)]),
            Default::default(),
        );

        let surface = compositor.dispose().expect("first dispose hands back the canvas");
        assert_eq!(surface.pixel(2, 2), RED);
        assert_eq!(compositor.scratch_size(), None);

        assert!(compositor.dispose().is_none());
        assert_eq!(compositor.tick(Instant::now()), Tick::Stop);
        compositor.set_playing(true);
        assert_eq!(compositor.state(), PlaybackState::Disposed);
        assert_eq!(compositor.render_frame_at(0), 0);
    }

    #[test]
    fn scratch_is_reused_for_equal_patch_sizes() {
        let frames = vec![
            patch(0, 0, 4, 4, RED),
            patch(0, 0, 2, 3, GREEN),
            patch(2, 1, 2, 3, BLUE),
        ];
        let mut compositor = paused(store(4, 4, frames));
        assert_eq!(compositor.scratch_size(), Some((4, 4)));

        compositor.render_frame_at(1);
        assert_eq!(compositor.scratch_size(), Some((2, 3)));
        compositor.render_frame_at(2);
        assert_eq!(compositor.scratch_size(), Some((2, 3)));
    }

    #[test]
    fn dirty_flag_is_consumed_by_reader() {
        let mut compositor = paused(store(1, 1, vec![patch(0, 0, 1, 1, RED)]));

        assert!(compositor.surface_mut().take_dirty());
        assert!(!compositor.surface().is_dirty());

        compositor.render_frame_at(0);
        assert!(compositor.surface_mut().take_dirty());
    }
}
