//! Background execution for commands marked asynchronous.
//!
//! Submission is fire-and-forget: nobody waits on a task and nothing it returns travels back to
//! the invoker. The dispatcher wraps every task so that errors and panics are logged inside the
//! task itself.

use std::{
    io,
    panic::{self, AssertUnwindSafe},
    sync::Mutex,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error};

use crate::error::{panic_message, ScheduleError};

/// A unit of background work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The host's background-task submission primitive.
pub trait Scheduler: Send + Sync {
    /// Queues `task` without waiting for it.
    fn run_async(&self, task: Task) -> Result<(), ScheduleError>;
}

/// Any `Fn(Task)` is a scheduler, which lets hosts hand over their own pool.
impl<F> Scheduler for F
where F: Fn(Task) + Send + Sync
{
    fn run_async(&self, task: Task) -> Result<(), ScheduleError> {
        self(task);
        Ok(())
    }
}

/// A fixed set of worker threads fed from one unbounded queue.
pub struct WorkerPool {
    sender: Mutex<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Spawns `threads` workers (at least one).
    pub fn new(threads: usize) -> io::Result<Self> {
        let (sender, receiver) = unbounded::<Task>();
        let mut workers = Vec::with_capacity(threads.max(1));
        for id in 0 .. threads.max(1) {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("command-worker-{}", id))
                .spawn(move || work(receiver))?;
            workers.push(handle);
        }

        Ok(WorkerPool {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
        })
    }

    /// Closes the queue and waits for the workers to drain it. Later submissions fail with
    /// [`ScheduleError::ShutDown`]. Called from a task on this pool, it waits for every worker
    /// but the calling one.
    pub fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut sender) => sender.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        let workers = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        let current = thread::current().id();
        for worker in workers {
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                error!("a command worker exited abnormally");
            }
        }
    }

    /// Whether [`WorkerPool::shutdown`] has run.
    pub fn is_shut_down(&self) -> bool {
        match self.sender.lock() {
            Ok(sender) => sender.is_none(),
            Err(_) => true,
        }
    }
}

impl Scheduler for WorkerPool {
    fn run_async(&self, task: Task) -> Result<(), ScheduleError> {
        let sender = self.sender.lock().map_err(|_| ScheduleError::ShutDown)?;
        match sender.as_ref() {
            Some(sender) => sender.send(task).map_err(|_| ScheduleError::ShutDown),
            None => Err(ScheduleError::ShutDown),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn work(receiver: Receiver<Task>) {
    for task in receiver.iter() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
            error!("background task panicked: {}", panic_message(payload.as_ref()));
        }
    }
    debug!("{} stopped", thread::current().name().unwrap_or("command worker"));
}
