mod cache;
mod compositor;
mod config;
pub mod decode;
mod error;
mod frame;
pub mod jobs;
mod loader;
mod pacer;
mod surface;
#[cfg(test)]
mod test_utils;

pub use cache::{GifCache, LoadState};
pub use compositor::{AnimationCompositor, PlaybackState, Tick};
pub use config::PlaybackConfig;
pub use decode::decode_gif;
pub use error::{Error, OutOfRange, Result};
pub use frame::{Disposal, Frame, FrameStore, LoopCount};
pub use jobs::JobPool;
pub use loader::{FileFetcher, GifFetcher, GifLoader, LoadPromise, MemoryFetcher};
pub use pacer::FramePacer;
pub use surface::CompositeSurface;
