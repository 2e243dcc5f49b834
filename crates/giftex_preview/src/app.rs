use std::time::Duration;

use egui::{Color32, TextureOptions};
use giftex::{FileFetcher, GifCache, GifLoader, LoadState};
use giftex_ui::GifTexture;
use tracing::info;

use crate::args::{Args, PreviewOptions};

/// How often to poll an in-flight load
const LOAD_POLL: Duration = Duration::from_millis(50);

pub struct PreviewApp {
    args: Args,
    loader: GifLoader,
    cache: GifCache,
    texture: Option<GifTexture>,
}

impl PreviewApp {
    pub fn new(args: Args) -> Self {
        // relative paths resolve against the working directory
        let loader = GifLoader::new(FileFetcher::new("."));
        Self {
            args,
            loader,
            cache: GifCache::new(),
            texture: None,
        }
    }

    fn texture_options(&self) -> TextureOptions {
        if self.args.options.contains(PreviewOptions::Pixelated) {
            TextureOptions::NEAREST
        } else {
            TextureOptions::LINEAR
        }
    }

    /// Returns true once a texture is ready to show
    fn poll_load(&mut self, ui: &mut egui::Ui) -> bool {
        if self.texture.is_some() {
            return true;
        }

        let Some(url) = self.args.gif.clone() else {
            ui.label("usage: giftex_preview <file.gif> [--paused] [--max-fps N] [--pixelated]");
            return false;
        };

        let texture_options = self.texture_options();
        let config = self.args.playback_config();

        match self.cache.get_or_request(&self.loader, &url) {
            LoadState::Pending => {
                ui.spinner();
                ui.ctx().request_repaint_after(LOAD_POLL);
                false
            }

            LoadState::Failed(err) => {
                ui.colored_label(Color32::RED, format!("could not load {url}: {err}"));
                if ui.button("retry").clicked() {
                    self.cache.clear_failed();
                }
                false
            }

            LoadState::Ready(store) => {
                info!(
                    "loaded {url}: {}x{}, {} frames, {:?} per loop",
                    store.width(),
                    store.height(),
                    store.total_frames(),
                    store.total_duration()
                );
                let texture = GifTexture::new(url, store.clone(), config)
                    .with_texture_options(texture_options);
                self.texture = Some(texture);
                true
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let debug = self.args.options.contains(PreviewOptions::Debug);
        let Some(texture) = &mut self.texture else {
            return;
        };
        let generation = texture.generation();
        let compositor = texture.compositor_mut();

        ui.horizontal(|ui| {
            let mut playing = compositor.is_playing();
            if ui.checkbox(&mut playing, "play").changed() {
                compositor.set_playing(playing);
            }

            let total = compositor.store().total_frames();
            let mut frame = compositor.frame();
            let slider = egui::Slider::new(&mut frame, 1..=total).text("frame");
            if ui.add(slider).changed() {
                compositor.set_playing(false);
                compositor.set_frame(frame as isize);
            }
        });

        if debug {
            ui.label(format!(
                "state {:?}, cursor {}, next due {:?}, uploads {generation}",
                compositor.state(),
                compositor.cursor(),
                compositor
                    .next_due()
                    .map(|due| due.saturating_duration_since(std::time::Instant::now())),
            ));
        }
    }
}

impl eframe::App for PreviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        profiling::finish_frame!();

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.poll_load(ui) {
                return;
            }

            self.controls(ui);

            if let Some(texture) = &mut self.texture {
                texture.show(ui);
            }
        });
    }
}
