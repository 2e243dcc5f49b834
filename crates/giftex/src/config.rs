/// How a compositor plays its animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackConfig {
    /// Start in the playing state
    pub autoplay: bool,

    /// Never show a frame for less than `1 / max_fps` seconds
    pub max_fps: Option<f32>,

    /// Color painted by restore-to-background disposal
    pub background: [u8; 4],
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            max_fps: None,
            background: [0, 0, 0, 0],
        }
    }
}

impl PlaybackConfig {
    pub fn paused() -> Self {
        Self {
            autoplay: false,
            ..Default::default()
        }
    }

    pub fn with_max_fps(mut self, fps: f32) -> Self {
        self.max_fps = Some(fps);
        self
    }

    pub fn with_background(mut self, background: [u8; 4]) -> Self {
        self.background = background;
        self
    }
}
