//! Bounded fan-out of chunks to workers and fan-in of their results
//!
//! Every chunk gets its own task. A semaphore caps how many tasks hold a
//! worker slot at once, each model call runs on the blocking pool under a
//! timeout, and results are collected in completion order. One chunk
//! failing, timing out or panicking never affects its siblings.
//!
//! A timed-out call can not be interrupted. The chunk is reported as failed
//! at the deadline, but the call keeps its slot until it returns and its
//! result is discarded, so abandoned calls never exceed the bound.

use crate::error::{ExtractorError, FailureKind, WorkerFailure};
use crate::parser::ParsedOutput;
use crate::types::{ChunkFailure, RecordRejection, SourcedRecord};
use crate::worker::ExtractionWorker;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use storyforge_domain::Chunk;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Lifecycle of a coordinator run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    /// Created, nothing dispatched yet
    Pending,

    /// Handing chunks to workers
    Dispatching,

    /// All chunks dispatched or cancelled, waiting for workers
    Collecting,

    /// Every dispatched chunk reached a terminal outcome
    Done,
}

/// Everything collected from the workers of one run
#[derive(Debug, Default)]
pub struct CollectedResults {
    /// Validated records, in completion order
    pub records: Vec<SourcedRecord>,

    /// Chunks that failed as a whole
    pub failures: Vec<ChunkFailure>,

    /// Items dropped by validation
    pub rejected: Vec<RecordRejection>,

    /// Chunks never dispatched
    pub cancelled: Vec<usize>,

    /// Number of chunks handed to a worker
    pub dispatched: usize,
}

impl CollectedResults {
    fn absorb(&mut self, index: usize, outcome: Result<ParsedOutput, WorkerFailure>) {
        match outcome {
            Ok(parsed) => {
                debug!(
                    "Chunk {} done: {} records, {} rejected",
                    index,
                    parsed.records.len(),
                    parsed.rejected.len()
                );
                self.records.extend(parsed.records.into_iter().map(|record| SourcedRecord {
                    chunk_index: index,
                    record,
                }));
                self.rejected.extend(parsed.rejected.into_iter().map(|item| RecordRejection {
                    chunk_index: index,
                    position: item.position,
                    reason: item.reason,
                }));
            }
            Err(failure) => {
                warn!("Chunk {} failed: {}", index, failure);
                self.failures.push(ChunkFailure {
                    chunk_index: index,
                    kind: failure.kind,
                    detail: failure.message,
                });
            }
        }
    }
}

/// Dispatches chunks to workers with bounded concurrency
pub struct FanOutCoordinator {
    max_concurrency: usize,
    worker_timeout: Duration,
    cancel: CancellationToken,
    state: watch::Sender<CoordinatorState>,
}

impl FanOutCoordinator {
    /// Create a coordinator
    pub fn new(max_concurrency: usize, worker_timeout: Duration, cancel: CancellationToken) -> Self {
        let (state, _) = watch::channel(CoordinatorState::Pending);
        Self {
            max_concurrency,
            worker_timeout,
            cancel,
            state,
        }
    }

    /// Current state
    pub fn state(&self) -> CoordinatorState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    fn transition(&self, next: CoordinatorState) {
        debug!("Coordinator {:?} -> {:?}", self.state(), next);
        self.state.send_replace(next);
    }

    /// Run every chunk through the worker
    ///
    /// Returns once every dispatched chunk has finished. The only error is
    /// a failure to allocate a worker slot, which ends the run.
    pub async fn run<I>(
        &self,
        chunks: I,
        worker: Arc<ExtractionWorker>,
    ) -> Result<CollectedResults, ExtractorError>
    where
        I: IntoIterator<Item = Chunk>,
    {
        if self.max_concurrency == 0 {
            return Err(ExtractorError::ResourceExhausted(
                "max_concurrency is 0".to_string(),
            ));
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<(usize, Result<ParsedOutput, WorkerFailure>)> = JoinSet::new();
        let mut in_flight = BTreeSet::new();
        let mut results = CollectedResults::default();
        let mut cancelled = false;

        self.transition(CoordinatorState::Dispatching);

        let mut chunks = chunks.into_iter();
        let mut next = chunks.next();
        while let Some(chunk) = next.take() {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    info!("Run cancelled, chunk {} and later not dispatched", chunk.index);
                    results.cancelled.push(chunk.index);
                    cancelled = true;
                }

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    Self::collect(joined, &mut in_flight, &mut results);
                    next = Some(chunk);
                }

                permit = Arc::clone(&semaphore).acquire_owned() => {
                    let permit = permit.map_err(|e| {
                        ExtractorError::ResourceExhausted(format!("worker slot unavailable: {}", e))
                    })?;

                    let index = chunk.index;
                    let worker = Arc::clone(&worker);
                    let timeout = self.worker_timeout;
                    in_flight.insert(index);
                    results.dispatched += 1;
                    debug!("Dispatching chunk {}", index);

                    tasks.spawn(async move {
                        // The slot stays taken until the model call returns, even past the deadline
                        let call = tokio::task::spawn_blocking(move || {
                            let _permit = permit;
                            worker.process(&chunk)
                        });
                        let outcome = match tokio::time::timeout(timeout, call).await {
                            Ok(Ok(outcome)) => outcome,
                            Ok(Err(e)) => Err(WorkerFailure::model_call(format!("worker panicked: {}", e))),
                            Err(_) => Err(WorkerFailure::model_call(format!("timed out after {:?}", timeout))),
                        };
                        (index, outcome)
                    });

                    next = chunks.next();
                }
            }
        }

        if cancelled {
            results.cancelled.extend(chunks.map(|c| c.index));
        }

        self.transition(CoordinatorState::Collecting);
        while let Some(joined) = tasks.join_next().await {
            Self::collect(joined, &mut in_flight, &mut results);
        }

        // Tasks never abort, but keep every dispatched chunk accounted for
        for index in in_flight {
            error!("Chunk {} finished without a result", index);
            results.failures.push(ChunkFailure {
                chunk_index: index,
                kind: FailureKind::ModelCallFailure,
                detail: "worker task lost".to_string(),
            });
        }

        self.transition(CoordinatorState::Done);
        info!(
            "Collected {} records from {} chunks ({} failed, {} cancelled)",
            results.records.len(),
            results.dispatched,
            results.failures.len(),
            results.cancelled.len()
        );

        Ok(results)
    }

    fn collect(
        joined: Result<(usize, Result<ParsedOutput, WorkerFailure>), tokio::task::JoinError>,
        in_flight: &mut BTreeSet<usize>,
        results: &mut CollectedResults,
    ) {
        match joined {
            Ok((index, outcome)) => {
                in_flight.remove(&index);
                results.absorb(index, outcome);
            }
            Err(e) => error!("Worker task failed to join: {}", e),
        }
    }
}
