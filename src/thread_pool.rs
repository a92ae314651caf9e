use anyhow::{anyhow, bail, Context, Result};
use log::{trace, warn};
use std::{
    sync::{mpsc, Arc, Mutex},
    thread,
};

/// Fixed set of worker threads pulling connection jobs off one channel.
///
/// Dropping the pool closes the channel and joins every worker, so jobs
/// already queued still run to completion.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::Sender<Job>>,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

impl ThreadPool {
    /// Create a new ThreadPool with `size` workers. Zero is refused.
    pub fn new(size: usize) -> Result<ThreadPool> {
        if size == 0 {
            bail!("thread pool needs at least one worker");
        }

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| Worker::new(id, Arc::clone(&receiver)))
            .collect::<Result<Vec<_>>>()?;

        Ok(ThreadPool {
            workers,
            sender: Some(sender),
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn execute<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().context("thread pool is shut down")?;
        sender
            .send(Box::new(f))
            .map_err(|_| anyhow!("every worker has exited"))
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());

        for worker in self.workers.drain(..) {
            trace!("shutting down worker {}", worker.id);
            if worker.thread.join().is_err() {
                warn!("worker {} panicked", worker.id);
            }
        }
    }
}

struct Worker {
    id: usize,
    thread: thread::JoinHandle<()>,
}

impl Worker {
    fn new(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) -> Result<Worker> {
        let builder = thread::Builder::new().name(format!("worker-{id}"));
        let thread = builder.spawn(move || loop {
            let message = match receiver.lock() {
                Ok(receiver) => receiver.recv(),
                Err(_) => break,
            };

            match message {
                Ok(job) => {
                    trace!("worker {id} got a job; executing.");
                    job();
                }
                Err(_) => {
                    trace!("worker {id} disconnected; shutting down.");
                    break;
                }
            }
        })?;

        Ok(Worker { id, thread })
    }
}
