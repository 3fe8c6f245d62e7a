//! Single-flight job serializer.
//!
//! Jobs pass through two gates:
//!
//! - **queue slot**: taken the instant `submit` (or `admit`) is polled and released when
//!   the job finishes (or is abandoned before running). The live slot count
//!   is the queue depth shown to users. It is an atomic that never touches
//!   the execution gate.
//! - **execution permit**: the only permit of a one-slot semaphore. The
//!   permit travels with the job to the compute worker and is released there
//!   after the compute call returns, so a submitter that stops waiting cannot
//!   let a second compute call start early.
//!
//! The compute call runs on one dedicated OS thread with its own
//! current-thread tokio runtime, so a blocking model never stalls the tasks
//! that are waiting for it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tokio::sync::{oneshot, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, info, warn};

use crate::config::SerializerConfig;
use crate::core::{
    build_audit_event, AuditSink, ComputeError, Image, ImageGenerator, Job, JobError, RedoToken,
};
use crate::util::clock::now_ms;
use crate::util::serde::{ActorId, UnixSeconds};

/// Actor id recorded for jobs the serializer submits on its own behalf.
pub const SYSTEM_ACTOR: ActorId = 0;

/// Lifecycle of a job inside the serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted by `submit`.
    Submitted,
    /// Counted in the queue depth, waiting for the execution permit.
    Queued,
    /// Holding the permit, compute call in progress.
    Running,
    /// Compute call returned an image.
    Completed,
    /// Compute call failed.
    Failed,
}

/// Snapshot of serializer counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SerializerStats {
    /// Jobs admitted but not yet completed.
    pub queue_depth: usize,
    /// Jobs handed to the compute worker. Jobs rejected before that point
    /// (shutdown, abandoned while waiting) are not counted.
    pub submitted: u64,
    /// Jobs whose compute call produced an image.
    pub completed: u64,
    /// Jobs whose compute call failed.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    queue_depth: AtomicUsize,
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// One unit of queue depth, released on drop.
struct QueueSlot {
    counters: Arc<Counters>,
}

impl QueueSlot {
    fn enter(counters: &Arc<Counters>) -> Self {
        counters.queue_depth.fetch_add(1, Ordering::AcqRel);
        Self {
            counters: Arc::clone(counters),
        }
    }
}

impl Drop for QueueSlot {
    fn drop(&mut self) {
        self.counters.queue_depth.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Proof of holding the single execution slot, obtained from
/// [`JobSerializer::admit`] and spent by [`JobSerializer::run`].
///
/// Only one exists per serializer at a time. The holder is also counted in
/// the queue depth until the permit is spent or dropped.
pub struct ExecutionPermit {
    // Field order matters: the queue slot is released before the gate opens.
    slot: QueueSlot,
    _permit: OwnedSemaphorePermit,
}

struct ComputeRequest {
    job: Job,
    permit: ExecutionPermit,
    reply: oneshot::Sender<Result<Image, ComputeError>>,
}

/// Admits jobs one at a time against a single scarce compute resource.
pub struct JobSerializer {
    gate: Arc<Semaphore>,
    counters: Arc<Counters>,
    inbox: Mutex<Option<Sender<ComputeRequest>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl JobSerializer {
    /// Start the compute worker for `generator`.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Internal` if the configuration is invalid or the
    /// worker thread or its runtime cannot be created.
    pub fn new<G: ImageGenerator>(config: SerializerConfig, generator: G) -> Result<Self, JobError> {
        Self::start(config, generator, None)
    }

    /// Start the compute worker and record lifecycle events to `audit`.
    ///
    /// # Errors
    ///
    /// Same as [`JobSerializer::new`].
    pub fn with_audit<G: ImageGenerator>(
        config: SerializerConfig,
        generator: G,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, JobError> {
        Self::start(config, generator, Some(audit))
    }

    fn start<G: ImageGenerator>(
        config: SerializerConfig,
        generator: G,
        audit: Option<Arc<dyn AuditSink>>,
    ) -> Result<Self, JobError> {
        config.validate().map_err(JobError::Internal)?;

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| JobError::Internal(format!("failed to build worker runtime: {e}")))?;

        // Only the permit holder sends, so one buffered request is enough.
        let (inbox_tx, inbox_rx) = bounded::<ComputeRequest>(1);
        let counters = Arc::new(Counters::default());

        let worker = spawn_worker(
            &config,
            generator,
            rt,
            inbox_rx,
            Arc::clone(&counters),
            audit.clone(),
        )
        .map_err(|e| JobError::Internal(format!("failed to spawn compute worker: {e}")))?;

        info!(thread = %config.thread_name, "job serializer started");

        Ok(Self {
            gate: Arc::new(Semaphore::new(1)),
            counters,
            inbox: Mutex::new(Some(inbox_tx)),
            worker: Mutex::new(Some(worker)),
            audit,
        })
    }

    /// Run `job` once the compute resource is free.
    ///
    /// The calling task is suspended, not its thread. The queue depth counts
    /// this job from the moment of the call until the compute call returns.
    ///
    /// # Errors
    ///
    /// `ComputeFailed` when the compute call fails, `Shutdown` after
    /// [`JobSerializer::shutdown`].
    pub async fn submit(&self, job: Job) -> Result<Image, JobError> {
        self.record(job.submitted_by, "queued", "ok");
        let permit = self.admit().await?;
        debug!(
            submitted_by = job.submitted_by,
            queue_depth = self.queue_depth(),
            "execution permit acquired"
        );
        self.run(permit, job).await
    }

    /// Enter the queue and wait for the single execution slot.
    ///
    /// The caller counts towards [`JobSerializer::queue_depth`] from the first
    /// poll until the returned permit is spent or dropped. Dropping the future
    /// while it waits leaves the queue.
    ///
    /// # Errors
    ///
    /// `Shutdown` once the serializer has been shut down.
    pub async fn admit(&self) -> Result<ExecutionPermit, JobError> {
        let slot = QueueSlot::enter(&self.counters);
        debug!(queue_depth = self.queue_depth(), status = ?JobStatus::Queued, "job queued");
        let permit = Arc::clone(&self.gate)
            .acquire_owned()
            .await
            .map_err(|_| JobError::Shutdown)?;
        Ok(ExecutionPermit {
            slot,
            _permit: permit,
        })
    }

    /// Spend `permit` to run `job` on the compute worker.
    ///
    /// The permit moves to the worker and is released there once the compute
    /// call returns, even if this future is dropped first.
    ///
    /// # Errors
    ///
    /// `ComputeFailed` when the compute call fails, `Shutdown` after
    /// [`JobSerializer::shutdown`], `Internal` for a permit issued by another
    /// serializer.
    pub async fn run(&self, permit: ExecutionPermit, job: Job) -> Result<Image, JobError> {
        if !Arc::ptr_eq(&permit.slot.counters, &self.counters) {
            return Err(JobError::Internal(
                "execution permit belongs to another serializer".into(),
            ));
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        {
            let inbox = self.inbox.lock();
            let Some(inbox) = inbox.as_ref() else {
                return Err(JobError::Shutdown);
            };
            let request = ComputeRequest {
                job,
                permit,
                reply: reply_tx,
            };
            self.counters.submitted.fetch_add(1, Ordering::Relaxed);
            if let Err(e) = inbox.try_send(request) {
                self.counters.submitted.fetch_sub(1, Ordering::Relaxed);
                return Err(match e {
                    TrySendError::Full(_) => JobError::Internal("compute inbox full".into()),
                    TrySendError::Disconnected(_) => JobError::Shutdown,
                });
            }
        }

        match reply_rx.await {
            Ok(result) => result.map_err(JobError::from),
            Err(_) => {
                error!("compute worker dropped a job without replying");
                Err(JobError::ComputeFailed("compute worker exited".into()))
            }
        }
    }

    /// Jobs admitted but not yet completed.
    ///
    /// For display only; says nothing about which waiting job runs next.
    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.counters.queue_depth.load(Ordering::Acquire)
    }

    /// Capture `job` for later resubmission.
    #[must_use]
    pub fn make_redo_token(&self, job: &Job) -> RedoToken {
        RedoToken::capture(job)
    }

    /// Submit a fresh job with the parameters captured in `token`.
    ///
    /// Always re-executes the compute call.
    ///
    /// # Errors
    ///
    /// Same as [`JobSerializer::submit`].
    pub async fn redo(
        &self,
        token: &RedoToken,
        by: ActorId,
        at: UnixSeconds,
    ) -> Result<Image, JobError> {
        debug!(token = %token.id, redone_by = by, "redo requested");
        self.submit(token.to_job(by, at)).await
    }

    /// Push one throwaway job through the model so the first real request
    /// does not pay for lazy initialization.
    ///
    /// # Errors
    ///
    /// Propagates the failure of the warm-up job.
    pub async fn warm_up(&self) -> Result<(), JobError> {
        let started = Instant::now();
        let job = Job::new("test", "test", SYSTEM_ACTOR, 0.0);
        match self.submit(job).await {
            Ok(_) => {
                info!(elapsed_ms = elapsed_ms(started), "model warm-up finished");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "model warm-up failed");
                Err(e)
            }
        }
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> SerializerStats {
        SerializerStats {
            queue_depth: self.queue_depth(),
            submitted: self.counters.submitted.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting jobs and wait for the worker to finish its current one.
    ///
    /// Joins the worker thread synchronously, so the calling thread is blocked
    /// until the running compute call returns. From async code call it through
    /// `tokio::task::spawn_blocking`.
    pub fn shutdown(&self) {
        self.gate.close();
        let inbox = self.inbox.lock().take();
        if inbox.is_none() {
            return;
        }
        drop(inbox);

        info!("shutting down job serializer");
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                warn!("compute worker panicked");
            }
        }
        info!("job serializer shut down");
    }

    fn record(&self, actor: ActorId, action: &str, outcome: &str) {
        if let Some(sink) = &self.audit {
            sink.record(build_audit_event(
                format!("job-{action}-{actor}-{}", now_ms()),
                actor,
                None,
                action,
                outcome,
            ));
        }
    }
}

impl Drop for JobSerializer {
    fn drop(&mut self) {
        // Closing the inbox lets the worker exit after its current job.
        // It is not joined here.
        self.gate.close();
        if self.inbox.lock().take().is_some() {
            debug!("JobSerializer dropped without explicit shutdown - worker will be detached");
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn spawn_worker<G: ImageGenerator>(
    config: &SerializerConfig,
    generator: G,
    rt: tokio::runtime::Runtime,
    inbox: Receiver<ComputeRequest>,
    counters: Arc<Counters>,
    audit: Option<Arc<dyn AuditSink>>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(config.thread_name.clone())
        .stack_size(config.thread_stack_size)
        .spawn(move || {
            debug!("compute worker started");

            // Blocks until a job arrives; exits once every sender is gone.
            while let Ok(request) = inbox.recv() {
                let ComputeRequest { job, permit, reply } = request;

                debug!(submitted_by = job.submitted_by, status = ?JobStatus::Running, "job running");
                let started = Instant::now();

                let result = catch_unwind(AssertUnwindSafe(|| {
                    rt.block_on(generator.generate(&job.positive_parameter, &job.negative_parameter))
                }))
                .unwrap_or_else(|_| Err(ComputeError::new("compute call panicked")));

                let elapsed_ms = elapsed_ms(started);
                let outcome = match &result {
                    Ok(image) => {
                        counters.completed.fetch_add(1, Ordering::Relaxed);
                        info!(
                            submitted_by = job.submitted_by,
                            bytes = image.len(),
                            elapsed_ms,
                            status = ?JobStatus::Completed,
                            "job completed"
                        );
                        ("completed", "ok".to_string())
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            submitted_by = job.submitted_by,
                            error = %e,
                            elapsed_ms,
                            status = ?JobStatus::Failed,
                            "job failed"
                        );
                        ("failed", e.to_string())
                    }
                };

                if let Some(sink) = &audit {
                    sink.record(build_audit_event(
                        format!("job-{}-{}-{}", outcome.0, job.submitted_by, now_ms()),
                        job.submitted_by,
                        None,
                        outcome.0,
                        outcome.1,
                    ));
                }

                // Release queue depth and the gate before the submitter wakes.
                drop(permit);

                if reply.send(result).is_err() {
                    debug!(submitted_by = job.submitted_by, "submitter gone, result discarded");
                }
            }

            debug!("compute worker exiting");
        })
}
