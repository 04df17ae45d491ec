//! Job dispatch actor.
//!
//! # Responsibilities
//! - Spawn the worker executable against a job's input file
//! - Collect the worker's stdout until it closes, which completes the job
//! - Route the result to the submitting channel through the registry
//!
//! # Design Decisions
//! - Only end-of-output counts as success; read and spawn failures abandon the
//!   job (optionally reporting an `error` message to the channel)
//! - Output is accumulated up to a limit; the rest is drained and dropped
//! - No retries and no execution timeout

use std::io;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::WorkerConfig;
use crate::dispatch::TempInput;
use crate::net::ActorGuard;
use crate::observability::metrics;
use crate::registry::{ChannelId, Delivery, JobId, Registry};

/// Read size for worker output.
const READ_CHUNK: usize = 1024;

/// A validated job submission.
#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    pub owner: ChannelId,
    /// Character handed to the worker with `-c`.
    pub operation: char,
    pub input: TempInput,
}

/// Errors that end a job without a result.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("failed to spawn worker: {0}")]
    Spawn(io::Error),

    #[error("worker stdout was not captured")]
    NoOutput,

    #[error("failed to read worker output: {0}")]
    Read(io::Error),
}

impl JobError {
    fn reason(&self) -> &'static str {
        match self {
            JobError::Spawn(_) => "spawn",
            JobError::NoOutput => "no_output",
            JobError::Read(_) => "read",
        }
    }
}

/// Worker output collected up to the configured limit.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectedOutput {
    pub bytes: Vec<u8>,
    pub truncated: bool,
}

/// Read `reader` to end-of-stream, keeping at most `limit` bytes.
pub async fn collect_output<R>(mut reader: R, limit: usize) -> io::Result<CollectedOutput>
where
    R: AsyncRead + Unpin,
{
    let mut output = CollectedOutput::default();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(output);
        }

        let room = limit.saturating_sub(output.bytes.len());
        if n > room {
            output.truncated = true;
        }
        output.bytes.extend_from_slice(&chunk[..n.min(room)]);
    }
}

/// Drop one trailing `\n` or `\r\n` written by the worker.
pub fn strip_line_terminator(output: &[u8]) -> &[u8] {
    match output.strip_suffix(b"\n") {
        Some(rest) => rest.strip_suffix(b"\r").unwrap_or(rest),
        None => output,
    }
}

/// One-shot actor running a single job.
#[derive(Debug)]
pub struct JobDispatch {
    job: Job,
    registry: Arc<Registry>,
    settings: WorkerConfig,
}

impl JobDispatch {
    pub fn new(job: Job, registry: Arc<Registry>, settings: WorkerConfig) -> Self {
        Self {
            job,
            registry,
            settings,
        }
    }

    /// Run the job on its own task. `guard` keeps shutdown waiting for it.
    pub fn spawn(self, guard: ActorGuard) -> JoinHandle<()> {
        let span = tracing::info_span!(
            "job",
            job_id = %self.job.id,
            channel_id = %self.job.owner,
        );
        tokio::spawn(
            async move {
                let _guard = guard;
                self.execute().await;
            }
            .instrument(span),
        )
    }

    /// Run the job to completion and handle its outcome.
    ///
    /// The input file is removed when this returns, whatever the outcome.
    pub async fn execute(self) -> Option<Delivery> {
        let Self {
            job,
            registry,
            settings,
        } = self;

        match run_worker(&job, &registry, settings.output_limit_bytes).await {
            Ok((child, result)) => {
                let outcome = registry.deliver_result(&job.owner, &job.id, &result);
                tracing::info!(outcome = outcome.as_str(), "Job finished");
                reap(child).await;
                Some(outcome)
            }
            Err(e) => {
                metrics::record_job_failed(e.reason());
                tracing::warn!(error = %e, "Job abandoned");
                settings
                    .report_failures
                    .then(|| registry.deliver_failure(&job.owner, &job.id, &e.to_string()))
            }
        }
    }
}

/// Wait for a worker whose output is already consumed.
async fn reap(mut child: Child) {
    match child.wait().await {
        Ok(status) if !status.success() => {
            tracing::warn!(%status, "Worker exited unsuccessfully")
        }
        Err(e) => tracing::warn!(error = %e, "Failed to reap worker"),
        Ok(_) => {}
    }
}

/// Run the worker until its stdout closes.
///
/// End of output completes the job; the still-running child is returned so
/// the caller can reap it after delivery.
async fn run_worker(
    job: &Job,
    registry: &Registry,
    limit: usize,
) -> Result<(Child, String), JobError> {
    let started = Instant::now();
    let mut child = Command::new(registry.worker_executable())
        .arg("-c")
        .arg(job.operation.to_string())
        .arg("-f")
        .arg(job.input.path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(JobError::Spawn)?;

    tracing::debug!(pid = ?child.id(), operation = %job.operation, "Worker started");

    let Some(stdout) = child.stdout.take() else {
        let _ = child.start_kill();
        return Err(JobError::NoOutput);
    };

    let output = match collect_output(stdout, limit).await {
        Ok(output) => output,
        Err(e) => {
            let _ = child.start_kill();
            return Err(JobError::Read(e));
        }
    };

    if output.truncated {
        tracing::warn!(limit, "Worker output truncated");
    }
    metrics::record_job_completed(started);

    let result = strip_line_terminator(&output.bytes);
    Ok((child, String::from_utf8_lossy(result).into_owned()))
}
