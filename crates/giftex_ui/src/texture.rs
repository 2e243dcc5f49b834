use std::sync::Arc;
use std::time::Instant;

use egui::load::SizedTexture;
use egui::{ColorImage, TextureFilter, TextureHandle, TextureOptions, Vec2};
use giftex::{AnimationCompositor, CompositeSurface, FrameStore, PlaybackConfig, Tick};

/// An egui texture that follows a playing gif.
///
/// Call [`GifTexture::update`] (or [`GifTexture::show`]) once per egui frame.
/// Every egui repaint is a refresh opportunity: the compositor is ticked, a
/// repaint is requested for when the next frame is due, and the texture is
/// re-uploaded only when the composite changed.
pub struct GifTexture {
    name: String,
    compositor: AnimationCompositor,
    texture: Option<TextureHandle>,
    options: TextureOptions,
    generation: u64,
}

impl GifTexture {
    pub fn new(name: impl Into<String>, store: Arc<FrameStore>, config: PlaybackConfig) -> Self {
        Self {
            name: name.into(),
            compositor: AnimationCompositor::new(store, config),
            texture: None,
            options: TextureOptions::LINEAR,
            generation: 0,
        }
    }

    pub fn with_texture_options(mut self, options: TextureOptions) -> Self {
        self.options = options;
        self
    }

    pub fn compositor(&self) -> &AnimationCompositor {
        &self.compositor
    }

    pub fn compositor_mut(&mut self) -> &mut AnimationCompositor {
        &mut self.compositor
    }

    /// How many times pixels were uploaded to the texture
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn size(&self) -> Vec2 {
        let store = self.compositor.store();
        Vec2::new(store.width() as f32, store.height() as f32)
    }

    #[profiling::function]
    pub fn update(&mut self, ctx: &egui::Context) -> Option<&TextureHandle> {
        let now = Instant::now();
        match self.compositor.tick(now) {
            Tick::Due(due) => {
                let wait = due.saturating_duration_since(now);
                tracing::trace!("requesting repaint for gif {} after {wait:?}", self.name);
                ctx.request_repaint_after(wait);
            }
            Tick::Idle => {}
            Tick::Stop => return None,
        }

        self.upload(ctx);
        self.texture.as_ref()
    }

    fn upload(&mut self, ctx: &egui::Context) {
        let surface = self.compositor.surface_mut();
        if !surface.take_dirty() && self.texture.is_some() {
            return;
        }

        let image = ColorImage::from_rgba_unmultiplied(
            [surface.width() as usize, surface.height() as usize],
            surface.as_raw(),
        );

        match &mut self.texture {
            Some(existing) => existing.set(image, self.options),
            None => {
                self.texture = Some(ctx.load_texture(&self.name, image, self.options));
            }
        }
        self.generation += 1;
    }

    /// Draw the gif at [`display_size`] for the available space
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<egui::Response> {
        let native = self.size();
        let integer_scale = self.options.magnification == TextureFilter::Nearest;
        let texture = self.update(ui.ctx())?;

        let size = display_size(native, ui.available_size(), integer_scale);
        Some(ui.add(egui::Image::from_texture(SizedTexture::new(
            texture.id(),
            size,
        ))))
    }

    /// Stop playback, free the texture and hand back the last composite
    pub fn dispose(&mut self) -> Option<CompositeSurface> {
        self.texture = None;
        self.compositor.dispose()
    }
}

/// On-screen size for a gif of `native` pixels inside `available`.
///
/// Gifs are never stretched past their native size with smooth filtering.
/// With `integer_scale` (nearest filtering) they grow by whole multiples so
/// every source pixel stays a crisp square. Anything too big shrinks to fit,
/// keeping its aspect ratio.
pub fn display_size(native: Vec2, available: Vec2, integer_scale: bool) -> Vec2 {
    if native.x <= 0.0 || native.y <= 0.0 || available.x <= 0.0 || available.y <= 0.0 {
        return Vec2::ZERO;
    }

    let fit = (available.x / native.x).min(available.y / native.y);
    let scale = if fit < 1.0 {
        fit
    } else if integer_scale {
        fit.floor()
    } else {
        1.0
    };

    native * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftex::{Disposal, Frame};
    use std::time::Duration;

    fn store() -> Arc<FrameStore> {
        let frame = |rgba: [u8; 4]| Frame {
            left: 0,
            top: 0,
            width: 3,
            height: 2,
            pixels: rgba.repeat(6),
            disposal: Disposal::None,
            delay: Duration::from_millis(50),
        };
        Arc::new(FrameStore::new(3, 2, vec![frame([1, 2, 3, 255]), frame([4, 5, 6, 255])]).unwrap())
    }

    #[test]
    fn uploads_only_when_dirty() {
        let ctx = egui::Context::default();
        let mut gif = GifTexture::new("test-gif", store(), PlaybackConfig::paused());

        let size = gif.update(&ctx).map(|t| t.size()).unwrap();
        assert_eq!(size, [3, 2]);
        assert_eq!(gif.generation(), 1);

        gif.update(&ctx);
        assert_eq!(gif.generation(), 1);

        gif.compositor_mut().set_frame(2);
        gif.update(&ctx);
        assert_eq!(gif.generation(), 2);
    }

    #[test]
    fn disposed_texture_stops_updating() {
        let ctx = egui::Context::default();
        let mut gif = GifTexture::new("test-gif", store(), PlaybackConfig::default());
        assert!(gif.update(&ctx).is_some());

        let surface = gif.dispose().unwrap();
        assert_eq!((surface.width(), surface.height()), (3, 2));
        assert!(gif.update(&ctx).is_none());
        assert!(gif.dispose().is_none());
    }

    #[test]
    fn smooth_gifs_only_shrink() {
        let native = Vec2::new(40.0, 20.0);

        assert_eq!(display_size(native, Vec2::new(400.0, 400.0), false), native);
        assert_eq!(
            display_size(native, Vec2::new(20.0, 400.0), false),
            Vec2::new(20.0, 10.0)
        );
    }

    #[test]
    fn pixelated_gifs_grow_by_whole_steps() {
        let native = Vec2::new(16.0, 8.0);

        assert_eq!(
            display_size(native, Vec2::new(60.0, 100.0), true),
            Vec2::new(48.0, 24.0)
        );
        assert_eq!(
            display_size(native, Vec2::new(8.0, 100.0), true),
            Vec2::new(8.0, 4.0)
        );
    }

    #[test]
    fn empty_space_draws_nothing() {
        let native = Vec2::new(16.0, 8.0);
        assert_eq!(display_size(native, Vec2::new(0.0, 50.0), true), Vec2::ZERO);
        assert_eq!(display_size(Vec2::ZERO, Vec2::new(50.0, 50.0), false), Vec2::ZERO);
    }
}
