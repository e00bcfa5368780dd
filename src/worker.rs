//! Shared background context for parsing and privileged I/O.
//!
//! One thread drains a job queue in submission order. Each job answers on its
//! own `bounded(1)` channel, so the caller decides whether to block
//! ([`Pending::wait`]) or poll ([`Pending::try_take`]).
//!
//! A panicking job is contained: its caller sees [`WorkerError::Panicked`]
//! and the thread moves on to the next job.

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use thiserror::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("worker has shut down")]
    Stopped,
    #[error("job panicked")]
    Panicked,
}

pub struct Worker {
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Start the background thread.
    pub fn spawn(name: &str) -> std::io::Result<Self> {
        let (tx, rx) = channel::unbounded::<Job>();
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                for job in rx {
                    // The reply sender is dropped on unwind, which the
                    // waiting side reports as `Panicked`.
                    let _ = panic::catch_unwind(AssertUnwindSafe(job));
                }
            })?;

        Ok(Self {
            jobs: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue `f` and return a handle to its result.
    pub fn submit<T, F>(&self, f: F) -> Result<Pending<T>, WorkerError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (reply, rx) = channel::bounded(1);
        let job: Job = Box::new(move || {
            let _ = reply.send(f());
        });

        self.jobs
            .as_ref()
            .ok_or(WorkerError::Stopped)?
            .send(job)
            .map_err(|_| WorkerError::Stopped)?;
        Ok(Pending { rx })
    }

    /// Queue `f` and block until it finishes.
    pub fn run<T, F>(&self, f: F) -> Result<T, WorkerError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        self.submit(f)?.wait()
    }

    /// Stop accepting jobs, finish queued ones and join the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Result of a submitted job, not yet received.
#[must_use = "a pending job's result is lost unless waited on"]
pub struct Pending<T> {
    rx: Receiver<T>,
}

impl<T> Pending<T> {
    /// Block until the job finishes.
    pub fn wait(self) -> Result<T, WorkerError> {
        self.rx.recv().map_err(|_| WorkerError::Panicked)
    }

    /// The result if the job has finished. `Ok(None)` while it is running.
    pub fn try_take(&self) -> Result<Option<T>, WorkerError> {
        match self.rx.try_recv() {
            Ok(value) => Ok(Some(value)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(WorkerError::Panicked),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_run_returns_result() {
        let worker = Worker::spawn("test-worker").unwrap();
        assert_eq!(worker.run(|| 6 * 7), Ok(42));
        let parsed = worker
            .run(|| crate::settings::parse("<R>\n\t<A value=\"1\"/>\n</R>").map(|d| d.fields().len()))
            .unwrap();
        assert_eq!(parsed, Ok(1));
    }

    #[test]
    fn test_jobs_run_in_order() {
        let worker = Worker::spawn("test-worker").unwrap();
        let log: Arc<Mutex<Vec<i32>>> = Arc::new(Mutex::new(Vec::new()));

        let pending: Vec<_> = (0..10)
            .map(|i| {
                let log = Arc::clone(&log);
                worker
                    .submit(move || {
                        log.lock().push(i);
                        i * 2
                    })
                    .unwrap()
            })
            .collect();

        let results: Vec<i32> = pending.into_iter().map(|p| p.wait().unwrap()).collect();
        assert_eq!(results, (0..10).map(|i| i * 2).collect::<Vec<i32>>());
        assert_eq!(*log.lock(), (0..10).collect::<Vec<i32>>());
    }

    #[test]
    fn test_panic_is_contained() {
        let worker = Worker::spawn("test-worker").unwrap();
        let failed = worker.run(|| -> u8 { panic!("boom") });
        assert_eq!(failed, Err(WorkerError::Panicked));
        assert_eq!(worker.run(|| "still alive"), Ok("still alive"));
    }

    #[test]
    fn test_try_take() {
        let worker = Worker::spawn("test-worker").unwrap();
        let (gate_tx, gate_rx) = channel::bounded::<()>(0);
        let pending = worker
            .submit(move || {
                let _ = gate_rx.recv();
                "done"
            })
            .unwrap();

        assert_eq!(pending.try_take(), Ok(None));
        gate_tx.send(()).unwrap();

        let mut result = None;
        for _ in 0..200 {
            if let Some(value) = pending.try_take().unwrap() {
                result = Some(value);
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(result, Some("done"));
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let worker = Worker::spawn("test-worker").unwrap();
        let counter = Arc::new(Mutex::new(0_u32));
        for _ in 0..5 {
            let counter = Arc::clone(&counter);
            let _ = worker.submit(move || *counter.lock() += 1).unwrap();
        }
        worker.shutdown();
        assert_eq!(*counter.lock(), 5);
    }
}
