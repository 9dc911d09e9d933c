//! # Background Worker
//!
//! In-process task queue for work that runs after the response is sent:
//! simulated wire processing after a create, and a notification after a
//! status change. Jobs are fire-and-forget; outcomes are logged.
//!
//! ```text
//! WireService --enqueue--> TaskQueue --mpsc--> worker loop --JoinSet--> run_job
//! ```
//!
//! The queue is bounded at [`QUEUE_CAPACITY`]; a full queue drops the job
//! instead of blocking the request that produced it.
//!
//! Shutdown stops intake, aborts in-flight jobs and waits for the loop to exit.
//! After that, [`TaskQueue::enqueue`] reports `false`.

use std::time::Duration;

use lib_core::model::WireStatus;
use lib_core::Config;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

/// Jobs waiting for the worker loop before new ones are dropped.
pub const QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    ProcessWire {
        wire_id: i64,
    },
    SendWireNotification {
        wire_id: i64,
        email: String,
        status: WireStatus,
    },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::ProcessWire { .. } => "process_wire",
            Job::SendWireNotification { .. } => "send_wire_notification",
        }
    }
}

/// What a finished job reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    Completed { wire_id: i64 },
    Sent { wire_id: i64, email: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerDelays {
    pub process: Duration,
    pub notify: Duration,
}

impl WorkerDelays {
    pub fn from_config(config: &Config) -> Self {
        Self {
            process: Duration::from_millis(config.worker_process_delay_ms),
            notify: Duration::from_millis(config.worker_notify_delay_ms),
        }
    }
}

/// Run one job to completion. Both jobs are stubs that only wait.
pub async fn run_job(job: Job, delays: WorkerDelays) -> JobOutcome {
    match job {
        Job::ProcessWire { wire_id } => {
            info!(wire_id, "[WORKER] Processing wire");
            tokio::time::sleep(delays.process).await;
            JobOutcome::Completed { wire_id }
        }
        Job::SendWireNotification {
            wire_id,
            email,
            status,
        } => {
            info!(wire_id, email = %email, status = %status, "[WORKER] Sending wire notification");
            tokio::time::sleep(delays.notify).await;
            JobOutcome::Sent { wire_id, email }
        }
    }
}

/// Producer side of the queue. Cheap to clone.
#[derive(Clone, Debug)]
pub struct TaskQueue {
    tx: mpsc::Sender<Job>,
}

impl TaskQueue {
    /// Queue a job without waiting. `false` when the queue is full or the
    /// worker has stopped.
    pub fn enqueue(&self, job: Job) -> bool {
        let name = job.name();
        match self.tx.try_send(job) {
            Ok(()) => {
                debug!(job = name, "[WORKER] Job enqueued");
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(job = name, capacity = QUEUE_CAPACITY, "[WORKER] Queue full, job dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                warn!(job = name, "[WORKER] Queue closed, job dropped");
                false
            }
        }
    }
}

/// Owner of the running worker loop.
pub struct WorkerHandle {
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Stop the loop, abort in-flight jobs and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.join.await {
            error!(error = %e, "[WORKER] Worker task failed");
        }
        info!("[WORKER] Stopped");
    }
}

/// Start the worker loop. Finished outcomes are also sent to `reporter`.
pub fn spawn_worker(
    delays: WorkerDelays,
    reporter: Option<mpsc::UnboundedSender<JobOutcome>>,
) -> (TaskQueue, WorkerHandle) {
    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let join = tokio::spawn(worker_loop(rx, shutdown_rx, delays, reporter));
    info!("[WORKER] Started");

    (
        TaskQueue { tx },
        WorkerHandle {
            shutdown: shutdown_tx,
            join,
        },
    )
}

async fn worker_loop(
    mut rx: mpsc::Receiver<Job>,
    mut shutdown: oneshot::Receiver<()>,
    delays: WorkerDelays,
    reporter: Option<mpsc::UnboundedSender<JobOutcome>>,
) {
    let mut running: JoinSet<JobOutcome> = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            job = rx.recv() => match job {
                Some(job) => {
                    running.spawn(run_job(job, delays));
                }
                None => break,
            },
            Some(result) = running.join_next(), if !running.is_empty() => match result {
                Ok(outcome) => {
                    info!(outcome = ?outcome, "[WORKER] Job finished");
                    if let Some(reporter) = &reporter {
                        let _ = reporter.send(outcome);
                    }
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => error!(error = %e, "[WORKER] Job panicked"),
            },
        }
    }

    rx.close();
    if !running.is_empty() {
        warn!(in_flight = running.len(), "[WORKER] Aborting in-flight jobs");
    }
    running.shutdown().await;
}
