//! Callback worker: runs application callbacks off the dispatch task.
//!
//! The dispatcher must keep draining the event stream no matter how slow
//! or broken a listener is. It pushes each callback invocation into a
//! bounded queue; one worker task runs them in FIFO order, which keeps
//! per-room delivery order intact. When the queue is full the dispatcher
//! waits, so events are delayed, never dropped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tokio::sync::mpsc;

use crate::RoomError;

/// Default queue size.
pub const DEFAULT_CALLBACK_QUEUE: usize = 128;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to the callback worker task. Cheap to clone.
#[derive(Clone)]
pub struct CallbackWorker {
    tx: mpsc::Sender<Job>,
}

impl CallbackWorker {
    /// Spawns the worker task. It stops once every handle is dropped.
    pub fn spawn(capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Job>(capacity.max(1));
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                run_isolated(job);
            }
            tracing::debug!("callback worker stopped");
        });
        Self { tx }
    }

    /// Queues one callback invocation.
    pub async fn submit(
        &self,
        job: impl FnOnce() + Send + 'static,
    ) -> Result<(), RoomError> {
        self.tx
            .send(Box::new(job))
            .await
            .map_err(|_| RoomError::WorkerStopped)
    }
}

/// Runs one callback, containing any panic. Returns `false` if it panicked.
pub(crate) fn run_isolated(job: Job) -> bool {
    match panic::catch_unwind(AssertUnwindSafe(job)) {
        Ok(()) => true,
        Err(payload) => {
            tracing::error!(
                panic = %panic_message(payload.as_ref()),
                "callback panicked"
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
