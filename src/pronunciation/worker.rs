//! Runs comparisons off the calling thread.
//!
//! The engine keeps no mutable state, so workers never coordinate. A caller
//! that stops waiting simply drops the handle; the computation runs to
//! completion and its result is discarded.

use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, error, warn};

use super::engine::ensure_same_rate;
use super::{Comparison, PronunciationEngine, PronunciationError, Result};
use crate::types::{AudioBuffer, Level};

#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    pub user: AudioBuffer,
    pub reference: AudioBuffer,
    pub level: Level,
}

/// Handle to a comparison running on its own thread.
pub struct PendingComparison {
    result: Receiver<Result<Comparison>>,
    join: Option<JoinHandle<()>>,
}

pub fn spawn_comparison(
    engine: Arc<PronunciationEngine>,
    request: ComparisonRequest,
) -> Result<PendingComparison> {
    let (tx, rx) = channel();
    let join = thread::Builder::new()
        .name("pronunciation-worker".to_string())
        .spawn(move || {
            let outcome = engine.compare(&request.user, &request.reference, request.level);
            if tx.send(outcome).is_err() {
                debug!("comparison finished after the caller stopped waiting");
            }
        })
        .map_err(|err| {
            error!(error = %err, "failed to spawn pronunciation worker");
            worker_error(&err.to_string())
        })?;
    Ok(PendingComparison {
        result: rx,
        join: Some(join),
    })
}

impl PendingComparison {
    /// Blocks until the comparison finishes.
    pub fn wait(mut self) -> Result<Comparison> {
        let outcome = self.result.recv();
        self.join_worker()?;
        outcome.map_err(|_| worker_error("worker exited without a result"))?
    }

    /// Waits up to `timeout`. `Ok(None)` means the deadline passed; the
    /// worker keeps running and its result is dropped.
    pub fn wait_timeout(mut self, timeout: Duration) -> Result<Option<Comparison>> {
        match self.result.recv_timeout(timeout) {
            Ok(outcome) => {
                self.join_worker()?;
                outcome.map(Some)
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(?timeout, "comparison timed out; abandoning result");
                Ok(None)
            }
            Err(RecvTimeoutError::Disconnected) => {
                self.join_worker()?;
                Err(worker_error("worker exited without a result"))
            }
        }
    }

    /// Joins a worker that has already finished. A panic wins over whatever
    /// the worker sent before it.
    fn join_worker(&mut self) -> Result<()> {
        match self.join.take().map(|join| join.join()) {
            Some(Err(_)) => {
                error!("pronunciation worker panicked");
                Err(worker_error("pronunciation worker panicked"))
            }
            _ => Ok(()),
        }
    }
}

fn worker_error(message: &str) -> PronunciationError {
    PronunciationError::Worker(message.to_string())
}

/// Scores several learner takes against one reference in parallel.
/// Results keep the order of `takes`.
pub fn compare_batch(
    engine: &PronunciationEngine,
    reference: &AudioBuffer,
    takes: &[AudioBuffer],
    level: Level,
) -> Vec<Result<Comparison>> {
    let reference_features = match engine.analyze(reference) {
        Ok(features) => features,
        Err(err) => return takes.iter().map(|_| Err(err.clone())).collect(),
    };
    takes
        .par_iter()
        .map(|take| {
            ensure_same_rate(take, reference)?;
            let features = engine.analyze(take)?;
            engine.compare_features(&features, &reference_features, level)
        })
        .collect()
}
