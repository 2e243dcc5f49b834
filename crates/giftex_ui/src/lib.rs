mod texture;

pub use texture::{display_size, GifTexture};
