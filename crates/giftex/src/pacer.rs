use std::time::{Duration, Instant};

/// Works out when the next frame is due.
///
/// The time spent compositing is subtracted from the frame's delay, so a slow
/// tick shortens the following wait instead of pushing every later frame back.
/// The wait is clamped at zero; when compositing takes longer than the delay
/// the next frame is due as soon as the host refreshes again.
#[derive(Debug, Clone, Copy, Default)]
pub struct FramePacer {
    min_delay: Duration,
}

impl FramePacer {
    pub fn new(max_fps: Option<f32>) -> Self {
        let min_delay = match max_fps {
            Some(fps) if fps > 0.0 => Duration::from_millis((1000.0 / fps) as u64),
            _ => Duration::ZERO,
        };

        Self { min_delay }
    }

    /// The authored delay, raised to the fps cap if there is one
    pub fn frame_delay(&self, delay: Duration) -> Duration {
        delay.max(self.min_delay)
    }

    /// How long to wait after compositing finished
    pub fn wait(&self, elapsed: Duration, delay: Duration) -> Duration {
        self.frame_delay(delay).saturating_sub(elapsed)
    }

    /// `dispatched` is when the tick started, `finished` when compositing ended
    pub fn next_due(&self, dispatched: Instant, finished: Instant, delay: Duration) -> Instant {
        let elapsed = finished.saturating_duration_since(dispatched);
        finished + self.wait(elapsed, delay)
    }
}
