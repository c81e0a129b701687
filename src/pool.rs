use std::sync::mpsc;

use crate::error::{PlotError, PlotResult};

/// Bounded pool of render workers.
///
/// Explicitly constructed and owned by its user (never ambient global
/// state). Submission never blocks; excess tasks queue inside rayon.
/// Ordering of the final output is the caller's job: collect handles in
/// submission order and `join` them in that order.
pub struct WorkerPool {
    inner: rayon::ThreadPool,
}

/// Handle to one submitted task. `join` blocks until that task finished,
/// surfacing its error, or a pool-side failure if the worker died.
pub struct TaskHandle<T> {
    rx: mpsc::Receiver<PlotResult<T>>,
}

impl<T> TaskHandle<T> {
    pub fn join(self) -> PlotResult<T> {
        self.rx
            .recv()
            .map_err(|_| PlotError::process("render worker terminated without a result"))?
    }
}

impl WorkerPool {
    pub fn new(threads: usize) -> PlotResult<Self> {
        if threads == 0 {
            return Err(PlotError::validation("worker pool size must be >= 1"));
        }
        let inner = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| PlotError::process(format!("failed to build worker pool: {e}")))?;
        Ok(Self { inner })
    }

    pub fn threads(&self) -> usize {
        self.inner.current_num_threads()
    }

    /// Submits a task and returns its handle immediately.
    ///
    /// Task failures (including panics) propagate to [`TaskHandle::join`],
    /// never to other tasks.
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> PlotResult<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        self.inner.spawn(move || {
            // Panics must not reach rayon's handler (which aborts for
            // detached tasks); they become an error on the handle instead.
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(task))
                .unwrap_or_else(|payload| {
                    Err(PlotError::process(format!(
                        "render task panicked: {}",
                        panic_message(&payload)
                    )))
                });
            let _ = tx.send(result);
        });
        TaskHandle { rx }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}
