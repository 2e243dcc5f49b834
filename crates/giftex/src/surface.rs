use image::{Rgba, RgbaImage};

/// The full-canvas RGBA buffer a renderer samples from.
///
/// `dirty` is set every time the compositor paints and cleared by whoever
/// uploads the pixels, see [`CompositeSurface::take_dirty`].
#[derive(Debug, Clone)]
pub struct CompositeSurface {
    image: RgbaImage,
    dirty: bool,
}

impl Default for CompositeSurface {
    fn default() -> Self {
        Self {
            image: RgbaImage::new(0, 0),
            dirty: false,
        }
    }
}

impl CompositeSurface {
    pub fn new(width: u32, height: u32, background: [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, Rgba(background)),
            dirty: true,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raw RGBA8 bytes, row major
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the surface changed since the last call and resets the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub(crate) fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    pub(crate) fn clear(&mut self, background: [u8; 4]) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba(background);
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
