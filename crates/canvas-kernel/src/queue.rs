//! Sequential job queue.
//!
//! Jobs run strictly one at a time, in the order they were pushed. Each push
//! returns its own [`JobHandle`], which settles once that job finishes. A job
//! that fails or panics rejects only its own handle; the queue moves on to
//! the next job either way.
//!
//! There is no cancellation and no timeout. A job that never completes stalls
//! every job queued behind it.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinError;

/// Boxed future for queued work.
type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Identifier assigned to each pushed job, in push order.
pub type JobId = u64;

/// Why a job's handle rejected.
#[derive(Debug, Error)]
pub enum JobError<E> {
    #[error("job failed: {0}")]
    Failed(E),
    #[error("job panicked: {0}")]
    Panicked(String),
    #[error("job was abandoned before it settled")]
    Abandoned,
}

impl<E> JobError<E> {
    /// The job's own error, if it returned one.
    pub fn into_failure(self) -> Option<E> {
        match self {
            JobError::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of awaiting a [`JobHandle`].
pub type JobResult<T, E> = Result<T, JobError<E>>;

struct QueuedJob {
    id: JobId,
    run: Job,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedJob>,
    running: bool,
    next_id: JobId,
}

/// FIFO queue that runs at most one job at a time.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct JobQueue {
    state: Arc<Mutex<QueueState>>,
    runtime: Handle,
}

impl JobQueue {
    /// Create a queue on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime. Use
    /// [`JobQueue::with_runtime`] to supply one explicitly.
    pub fn new() -> Self {
        Self::with_runtime(Handle::current())
    }

    /// Create a queue that spawns its work on `runtime`.
    pub fn with_runtime(runtime: Handle) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            runtime,
        }
    }

    /// Queue a job. It runs after every job pushed before it has settled.
    pub fn push<F, Fut, T, E>(&self, factory: F) -> JobHandle<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        self.push_with(move |()| factory(), ())
    }

    /// Queue a job whose factory receives `args` when it starts.
    pub fn push_with<A, F, Fut, T, E>(&self, factory: F, args: A) -> JobHandle<T, E>
    where
        A: Send + 'static,
        F: FnOnce(A) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let (sender, receiver) = oneshot::channel();
        let runtime = self.runtime.clone();
        let run: Job = Box::new(move || -> BoxFuture<'static, ()> {
            Box::pin(async move {
                // The factory runs inside its own task so a panic, whether
                // raised while building the future or while polling it, is
                // reported through the join handle.
                let outcome = match runtime.spawn(async move { factory(args).await }).await {
                    Ok(Ok(value)) => Ok(value),
                    Ok(Err(err)) => Err(JobError::Failed(err)),
                    Err(err) => Err(join_error(err)),
                };
                if sender.send(outcome).is_err() {
                    log::trace!("job handle dropped before settlement");
                }
            })
        });

        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.pending.push_back(QueuedJob { id, run });
            id
        };
        log::trace!("job {} queued", id);

        self.schedule();
        JobHandle { id, receiver }
    }

    /// Number of jobs waiting to start.
    pub fn pending(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether a job is currently in flight.
    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the head job unless one is already running.
    fn schedule(&self) {
        let job = {
            let mut state = self.lock();
            if state.running {
                return;
            }
            match state.pending.pop_front() {
                Some(job) => {
                    state.running = true;
                    job
                }
                None => return,
            }
        };

        let queue = self.clone();
        self.runtime.spawn(queue.drain(job));
    }

    /// Run `job`, then keep taking jobs off the head until the queue is empty.
    async fn drain(self, mut job: QueuedJob) {
        loop {
            log::debug!("job {} started", job.id);
            (job.run)().await;
            log::debug!("job {} settled", job.id);

            let next = {
                let mut state = self.lock();
                match state.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        state.running = false;
                        return;
                    }
                }
            };
            job = next;
        }
    }
}

/// Same as [`JobQueue::new`], including its panic outside a Tokio runtime.
impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("JobQueue")
            .field("pending", &state.pending.len())
            .field("running", &state.running)
            .finish()
    }
}

fn join_error<E>(err: JoinError) -> JobError<E> {
    if err.is_cancelled() {
        log::warn!("job task cancelled");
        return JobError::Abandoned;
    }
    let payload = err.into_panic();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    log::error!("job panicked: {}", message);
    JobError::Panicked(message)
}

/// Pending result of a queued job.
///
/// Await it to get the job's value or the reason it rejected. Dropping the
/// handle does not cancel the job.
#[derive(Debug)]
pub struct JobHandle<T, E> {
    id: JobId,
    receiver: oneshot::Receiver<JobResult<T, E>>,
}

impl<T, E> JobHandle<T, E> {
    pub fn id(&self) -> JobId {
        self.id
    }
}

impl<T, E> Future for JobHandle<T, E> {
    type Output = JobResult<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(JobError::Abandoned)))
    }
}
