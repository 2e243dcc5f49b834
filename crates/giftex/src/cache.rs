use std::collections::HashMap;
use std::sync::Arc;

use poll_promise::Promise;

use crate::frame::FrameStore;
use crate::loader::{GifLoader, LoadPromise};
use crate::Error;

pub enum LoadState<'a> {
    Pending,
    Failed(&'a Error),
    Ready(&'a Arc<FrameStore>),
}

impl<'a> LoadState<'a> {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }

    pub fn ready(&self) -> Option<&'a Arc<FrameStore>> {
        match self {
            LoadState::Ready(store) => Some(*store),
            _ => None,
        }
    }
}

impl std::fmt::Debug for LoadState<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
            Self::Ready(_) => f.debug_tuple("Ready").field(&"").finish(),
        }
    }
}

fn state_of(promise: &LoadPromise) -> LoadState<'_> {
    match promise.ready() {
        None => LoadState::Pending,
        Some(Ok(store)) => LoadState::Ready(store),
        Some(Err(e)) => LoadState::Failed(e),
    }
}

/// Url keyed gif loads, either in flight or finished.
///
/// Each url is requested at most once until it is evicted, so every
/// texture showing the same gif shares one [`FrameStore`].
#[derive(Default)]
pub struct GifCache {
    entries: HashMap<String, LoadPromise>,
}

impl GifCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<LoadState<'_>> {
        self.entries.get(url).map(state_of)
    }

    pub fn request(&mut self, loader: &GifLoader, url: &str) {
        let _ = self.get_or_request(loader, url);
    }

    pub fn get_or_request(&mut self, loader: &GifLoader, url: &str) -> LoadState<'_> {
        if !self.entries.contains_key(url) {
            tracing::debug!("requesting gif {url}");
            self.entries.insert(url.to_owned(), loader.load(url));
        }

        match self.entries.get(url) {
            Some(promise) => state_of(promise),
            None => LoadState::Pending,
        }
    }

    /// Request `url` if needed and block until its load resolves
    pub fn wait(&mut self, loader: &GifLoader, url: &str) -> LoadState<'_> {
        self.request(loader, url);

        match self.entries.get(url) {
            Some(promise) => {
                let _ = promise.block_until_ready();
                state_of(promise)
            }
            None => LoadState::Pending,
        }
    }

    /// Store an animation decoded elsewhere under `url`
    pub fn insert_ready(&mut self, url: impl Into<String>, store: Arc<FrameStore>) {
        self.entries
            .insert(url.into(), Promise::from_ready(Ok(store)));
    }

    /// Forget `url`. A later request loads it again.
    pub fn evict(&mut self, url: &str) -> bool {
        self.entries.remove(url).is_some()
    }

    /// Drop every failed load so they can be retried
    pub fn clear_failed(&mut self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, promise| !matches!(promise.ready(), Some(Err(_))));
        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!("cleared {removed} failed gif loads");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
