use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use poll_promise::Promise;

use crate::decode::decode_gif;
use crate::frame::FrameStore;
use crate::jobs::JobPool;
use crate::{Error, Result};

/// Resolves exactly once, to a decoded animation or the reason it failed
pub type LoadPromise = Promise<Result<Arc<FrameStore>>>;

/// Where gif bytes come from. Implementations run on loader worker threads.
pub trait GifFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Reads `file://` urls and plain paths, relative paths resolved against `root`
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> Result<PathBuf> {
        match url::Url::parse(url) {
            // single letter schemes are windows drive letters
            Ok(parsed) if parsed.scheme().len() > 1 => {
                if parsed.scheme() != "file" {
                    return Err(Error::Generic(format!(
                        "unsupported gif url scheme '{}' in {url}",
                        parsed.scheme()
                    )));
                }

                parsed
                    .to_file_path()
                    .map_err(|_| Error::Generic(format!("invalid file url {url}")))
            }
            _ => Ok(match &self.root {
                Some(root) => root.join(url),
                None => PathBuf::from(url),
            }),
        }
    }
}

impl GifFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let path = self.resolve(url)?;
        tracing::trace!("reading gif {url} from {}", path.display());
        Ok(std::fs::read(path)?)
    }
}

/// Serves bytes registered ahead of time, keyed by url
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Arc<[u8]>>,
}

impl MemoryFetcher {
    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.entries.insert(url.into(), bytes.into());
        self
    }
}

impl GifFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.entries
            .get(url)
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| Error::Generic(format!("no gif registered for {url}")))
    }
}

/// Fetches and decodes gifs off the calling thread
pub struct GifLoader {
    pool: JobPool,
    fetcher: Arc<dyn GifFetcher>,
}

impl GifLoader {
    pub fn new(fetcher: impl GifFetcher + 'static) -> Self {
        Self::with_pool(JobPool::default(), fetcher)
    }

    pub fn with_pool(pool: JobPool, fetcher: impl GifFetcher + 'static) -> Self {
        Self {
            pool,
            fetcher: Arc::new(fetcher),
        }
    }

    /// Start loading `url`. Poll the promise from the ui thread.
    pub fn load(&self, url: &str) -> LoadPromise {
        let (sender, promise) = Promise::new();
        let fetcher = Arc::clone(&self.fetcher);
        let url = url.to_owned();

        let spawned = self
            .pool
            .spawn(move || sender.send(load_guarded(fetcher.as_ref(), &url)));

        match spawned {
            Ok(()) => promise,
            Err(err) => Promise::from_ready(Err(err)),
        }
    }

    /// Decode bytes the caller already has
    pub fn load_bytes(&self, bytes: Vec<u8>) -> LoadPromise {
        let (sender, promise) = Promise::new();

        let spawned = self.pool.spawn(move || {
            let res = panic::catch_unwind(|| decode_gif(&bytes).map(Arc::new))
                .unwrap_or_else(|_| Err(Error::Generic("gif decoder panicked".to_owned())));
            sender.send(res);
        });

        match spawned {
            Ok(()) => promise,
            Err(err) => Promise::from_ready(Err(err)),
        }
    }

    /// Same as [`Self::load`] for async callers
    pub fn load_async(&self, url: &str) -> impl Future<Output = Result<Arc<FrameStore>>> {
        let fetcher = Arc::clone(&self.fetcher);
        let url = url.to_owned();
        let scheduled = self
            .pool
            .schedule(move || load_guarded(fetcher.as_ref(), &url));

        async move { scheduled.await? }
    }
}

fn load_guarded(fetcher: &dyn GifFetcher, url: &str) -> Result<Arc<FrameStore>> {
    panic::catch_unwind(AssertUnwindSafe(|| load_blocking(fetcher, url))).unwrap_or_else(|_| {
        tracing::error!("gif decoder panicked on {url}");
        Err(Error::Generic(format!("gif decoder panicked on {url}")))
    })
}

fn load_blocking(fetcher: &dyn GifFetcher, url: &str) -> Result<Arc<FrameStore>> {
    tracing::debug!("loading gif {url}");

    let bytes = fetcher.fetch(url).inspect_err(|e| {
        tracing::error!("could not fetch gif {url}: {e}");
    })?;

    match decode_gif(&bytes) {
        Ok(store) => {
            tracing::info!(
                "loaded gif {url}: {}x{}, {} frames",
                store.width(),
                store.height(),
                store.total_frames()
            );
            Ok(Arc::new(store))
        }
        Err(e) => {
            tracing::error!("could not decode gif {url}: {e}");
            Err(e)
        }
    }
}
