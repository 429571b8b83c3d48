//! Execution contexts for delivering capture results.
//!
//! Read-back completions fire on whichever thread polls the GPU device. They
//! never call user code directly; they hand a job to the [`Executor`] the
//! caller supplied, typically the UI thread's [`JobQueue`].

use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// A unit of work to run on an executor.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs on a specific execution context.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Runs every job immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }
}

/// A queue of jobs drained by its owning thread.
pub struct JobQueue {
    sender: Sender<Job>,
    receiver: Receiver<Job>,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl JobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// An executor that enqueues onto this queue.
    pub fn executor(&self) -> Arc<QueueExecutor> {
        Arc::new(QueueExecutor {
            sender: self.sender.clone(),
        })
    }

    /// Run every queued job; returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Wait up to `timeout` for one job, run it and anything queued behind it.
    pub fn run_timeout(&self, timeout: Duration) -> usize {
        match self.receiver.recv_timeout(timeout) {
            Ok(job) => {
                job();
                1 + self.run_pending()
            }
            Err(_) => 0,
        }
    }

    /// Number of jobs waiting.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Sending half of a [`JobQueue`].
#[derive(Clone)]
pub struct QueueExecutor {
    sender: Sender<Job>,
}

impl Executor for QueueExecutor {
    fn execute(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!("Job queue closed, dropping job");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn inline_runs_immediately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        InlineExecutor.execute(Box::new(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn queue_defers_until_drained() {
        let queue = JobQueue::new();
        let executor = queue.executor();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let h = hits.clone();
            executor.execute(Box::new(move || {
                h.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.run_pending(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn jobs_from_other_threads_run_on_drainer() {
        let queue = JobQueue::new();
        let executor = queue.executor();
        let drainer = std::thread::current().id();
        let ran_on = Arc::new(parking_lot::Mutex::new(None));
        let slot = ran_on.clone();
        std::thread::spawn(move || {
            executor.execute(Box::new(move || {
                *slot.lock() = Some(std::thread::current().id());
            }));
        })
        .join()
        .unwrap();
        assert_eq!(queue.run_timeout(Duration::from_secs(1)), 1);
        assert_eq!(*ran_on.lock(), Some(drainer));
    }
}
