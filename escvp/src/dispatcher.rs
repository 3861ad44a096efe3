//! Per-device command queue
//!
//! Every projector gets one dispatcher task. Commands are queued in
//! submission order and the task runs them one at a time: a command starts
//! only after the previous one has finished and its completion handler has
//! returned. A failed command does not hold up the rest of the queue.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use escvp_types::Reply;

use crate::error::{Error, Result};

/// Executes a single command
#[async_trait]
pub trait CommandRunner: Send + Sync + 'static {
    async fn run(&self, command: &str) -> Result<Reply>;
}

/// Receives the outcome of a queued command
pub type Completion = Box<dyn FnOnce(Result<Reply>) + Send + 'static>;

/// Dispatcher state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing running
    Idle,

    /// One command in flight
    Running,
}

struct QueuedCommand {
    command: String,
    completion: Completion,
}

#[derive(Default)]
struct Shared {
    running: AtomicBool,
    queued: AtomicUsize,
}

/// Serializes commands for one device
///
/// Must be created inside a Tokio runtime. Dropping the dispatcher stops
/// intake; commands already queued still run.
pub struct Dispatcher {
    label: String,
    tx: mpsc::UnboundedSender<QueuedCommand>,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl Dispatcher {
    /// Start the dispatcher task
    pub fn spawn<R: CommandRunner>(label: impl Into<String>, runner: R) -> Self {
        let label = label.into();
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());

        let task = tokio::spawn(drain(label.clone(), runner, rx, Arc::clone(&shared)));

        Self {
            label,
            tx,
            shared,
            task,
        }
    }

    /// Queue `command`; `completion` is called exactly once with its outcome
    ///
    /// # Errors
    ///
    /// Returns [`Error::DispatcherClosed`] if the dispatcher task has
    /// stopped. The completion is not called in that case.
    pub fn enqueue(
        &self,
        command: impl Into<String>,
        completion: impl FnOnce(Result<Reply>) + Send + 'static,
    ) -> Result<()> {
        let entry = QueuedCommand {
            command: command.into(),
            completion: Box::new(completion),
        };

        self.shared.queued.fetch_add(1, Ordering::AcqRel);
        if self.tx.send(entry).is_err() {
            self.shared.queued.fetch_sub(1, Ordering::AcqRel);
            return Err(Error::DispatcherClosed {
                model: self.label.clone(),
            });
        }
        Ok(())
    }

    /// Get current state
    pub fn state(&self) -> DispatchState {
        if self.shared.running.load(Ordering::Acquire) {
            DispatchState::Running
        } else {
            DispatchState::Idle
        }
    }

    /// Commands queued but not yet started
    pub fn pending(&self) -> usize {
        self.shared.queued.load(Ordering::Acquire)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("label", &self.label)
            .field("state", &self.state())
            .field("pending", &self.pending())
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

async fn drain<R: CommandRunner>(
    label: String,
    runner: R,
    mut rx: mpsc::UnboundedReceiver<QueuedCommand>,
    shared: Arc<Shared>,
) {
    while let Some(QueuedCommand { command, completion }) = rx.recv().await {
        shared.queued.fetch_sub(1, Ordering::AcqRel);
        shared.running.store(true, Ordering::Release);
        debug!(device = %label, command = %command, "Running command");

        let result = runner.run(&command).await;
        match &result {
            Ok(reply) if reply.is_error() => {
                warn!(device = %label, command = %command, "Projector rejected command")
            }
            Ok(reply) => debug!(
                device = %label,
                command = %command,
                reply = %reply.lines().join("|"),
                "Command complete"
            ),
            Err(e) => warn!(device = %label, command = %command, "Command failed: {}", e),
        }

        completion(result);
        shared.running.store(false, Ordering::Release);
    }

    debug!(device = %label, "Command queue closed");
}
