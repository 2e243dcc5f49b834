use std::{
    future::Future,
    sync::{
        mpsc::{self, Sender},
        Arc, Mutex,
    },
};
use tokio::sync::oneshot;

use crate::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A small fixed pool of worker threads for decode work
pub struct JobPool {
    tx: Sender<Job>,
}

impl Default for JobPool {
    fn default() -> Self {
        JobPool::new(2)
    }
}

impl JobPool {
    pub fn new(num_threads: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Job>();

        let arc_rx = Arc::new(Mutex::new(rx));
        for i in 0..num_threads.max(1) {
            let arc_rx_clone = arc_rx.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("giftex-job-{i}"))
                .spawn(move || loop {
                    let job = {
                        let Ok(unlocked) = arc_rx_clone.lock() else {
                            return;
                        };
                        let Ok(job) = unlocked.recv() else {
                            // pool dropped
                            return;
                        };

                        job
                    };

                    job();
                });

            if let Err(e) = spawned {
                tracing::error!("could not spawn job thread {i}: {e}");
            }
        }

        Self { tx }
    }

    /// Run `job` on a worker, ignoring its completion
    pub fn spawn<F>(&self, job: F) -> Result<(), Error>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Box::new(job))
            .map_err(|_| Error::LoaderClosed)
    }

    /// Run `job` on a worker and get its output back through a oneshot
    pub fn schedule<F, T>(&self, job: F) -> impl Future<Output = Result<T, Error>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx_result, rx_result) = oneshot::channel::<T>();

        let sent = self.spawn(move || {
            let output = job();
            let _ = tx_result.send(output);
        });

        async move {
            sent?;
            rx_result.await.map_err(|_| Error::LoaderClosed)
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::jobs::JobPool;
    use std::sync::mpsc;

    fn test_fn(a: u32, b: u32) -> u32 {
        a + b
    }

    #[tokio::test]
    async fn scheduled_jobs_resolve() {
        let pool = JobPool::default();

        let future_str = pool.schedule(|| -> String { "hello from string job".into() });

        let a = 5;
        let b = 6;
        let future_int = pool.schedule(move || -> u32 { test_fn(a, b) });

        assert_eq!(future_str.await.unwrap(), "hello from string job");
        assert_eq!(future_int.await.unwrap(), 11);
    }

    #[test]
    fn spawned_jobs_run() {
        let pool = JobPool::new(1);
        let (tx, rx) = mpsc::channel();

        for i in 0..4u32 {
            let tx = tx.clone();
            pool.spawn(move || {
                let _ = tx.send(i * 2);
            })
            .unwrap();
        }

        let mut got: Vec<u32> = rx.iter().take(4).collect();
        got.sort();
        assert_eq!(got, vec![0, 2, 4, 6]);
    }

    #[tokio::test]
    async fn panicking_job_reports_closed() {
        let pool = JobPool::new(1);
        let res = pool
            .schedule(|| -> u32 { panic!("job blew up") })
            .await;

        assert!(res.is_err());
    }
}
