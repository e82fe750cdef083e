//! Execution contexts the bridge can enqueue work onto.
//!
//! ## Thread Model
//!
//! - `WorkerPool`: tokio multi-thread runtime; jobs run on its blocking pool
//!   because foreign calls may block for an arbitrary duration
//! - `EventLoop`: one dedicated thread driving a current-thread runtime,
//!   jobs run in FIFO order
//!
//! Every thread owned by a context reports that context's label through
//! [`current_label`].

use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use tokio::runtime::{Builder, Runtime};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};

/// Unit of work enqueued onto an execution context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere code can be sent to run.
pub trait Executor: Send + Sync {
    fn label(&self) -> &str;

    /// Enqueue `job` without waiting for it. Fails with [`Error::Closed`] once
    /// the context stopped accepting work; the job is dropped in that case.
    fn execute(&self, job: Job) -> Result<()>;
}

thread_local! {
    static CURRENT_LABEL: RefCell<Option<Arc<str>>> = const { RefCell::new(None) };
}

/// Label of the execution context owning the calling thread, if any.
pub fn current_label() -> Option<Arc<str>> {
    CURRENT_LABEL.with(|label| label.borrow().clone())
}

fn mark_current(label: Arc<str>) {
    CURRENT_LABEL.with(|current| *current.borrow_mut() = Some(label));
}

fn run_guarded(label: &str, job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        error!(context = label, "job panicked");
    }
}

/// Parallel background context for blocking foreign calls.
pub struct WorkerPool {
    label: Arc<str>,
    runtime: Option<Runtime>,
}

impl WorkerPool {
    pub fn new(label: &str, worker_threads: usize, max_blocking_threads: usize) -> Result<Self> {
        let label: Arc<str> = Arc::from(label);
        let thread_label = Arc::clone(&label);
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .max_blocking_threads(max_blocking_threads)
            .thread_name(label.to_string())
            .on_thread_start(move || mark_current(Arc::clone(&thread_label)))
            .enable_all()
            .build()?;

        info!(
            context = %label,
            worker_threads,
            max_blocking_threads,
            "worker pool started"
        );

        Ok(Self {
            label,
            runtime: Some(runtime),
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Self::new(
            &config.background_label,
            config.worker_threads,
            config.max_blocking_threads,
        )
    }

}

impl Executor for WorkerPool {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self, job: Job) -> Result<()> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| Error::closed(&self.label))?;
        let label = Arc::clone(&self.label);
        runtime.spawn_blocking(move || run_guarded(&label, job));
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which is not allowed from async code.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
            info!(context = %self.label, "worker pool stopped");
        }
    }
}

/// Single-threaded target context.
pub struct EventLoop {
    handle: EventLoopHandle,
    stop: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

/// Cloneable sending side of an [`EventLoop`].
#[derive(Clone)]
pub struct EventLoopHandle {
    label: Arc<str>,
    sender: mpsc::UnboundedSender<Job>,
}

impl EventLoop {
    pub fn spawn(label: &str) -> Result<Self> {
        let label: Arc<str> = Arc::from(label);
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let (stop, mut stopped) = oneshot::channel::<()>();
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let thread_label = Arc::clone(&label);
        let thread = thread::Builder::new()
            .name(label.to_string())
            .spawn(move || {
                mark_current(Arc::clone(&thread_label));
                runtime.block_on(async move {
                    loop {
                        tokio::select! {
                            biased;
                            job = receiver.recv() => match job {
                                Some(job) => run_guarded(&thread_label, job),
                                None => break,
                            },
                            _ = &mut stopped => {
                                receiver.close();
                                while let Ok(job) = receiver.try_recv() {
                                    run_guarded(&thread_label, job);
                                }
                                break;
                            }
                        }
                    }
                });
            })?;

        info!(context = %label, "event loop started");

        Ok(Self {
            handle: EventLoopHandle { label, sender },
            stop: Some(stop),
            thread: Some(thread),
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self> {
        Self::spawn(&config.target_label)
    }

    pub fn handle(&self) -> EventLoopHandle {
        self.handle.clone()
    }

    pub fn label(&self) -> &str {
        &self.handle.label
    }

    /// Run the jobs already queued, then stop the loop and join its thread.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.thread().id() == thread::current().id() {
                warn!(context = %self.handle.label, "event loop dropped from its own thread");
                return;
            }
            if thread.join().is_err() {
                error!(context = %self.handle.label, "event loop thread panicked");
            }
            info!(context = %self.handle.label, "event loop stopped");
        }
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl Executor for EventLoopHandle {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self, job: Job) -> Result<()> {
        self.sender
            .send(job)
            .map_err(|_| Error::closed(&self.label))
    }
}
