//! A session handle that can be cloned into tasks.
//!
//! Oracle calls take seconds. A front end that keeps rendering while one
//! is outstanding needs to hand the engine to a background task and still
//! refuse a second call. [`SharedEngine`] does that with a per-session
//! mutex: every operation tries the lock and fails with
//! [`EngineError::Busy`] instead of queueing.
//!
//! [`SharedEngine::phase`] reports `AwaitingGeneration` only while a
//! `generate` call is in flight. While any other operation holds the lock
//! it reports the phase the session settled in after the last operation.

use crate::engine::{write_transcript, EngineError, EnginePhase, ScenarioEngine};
use crate::oracle::TextOracle;
use crate::state::{Scenario, Selection, SessionState};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Cloneable, non-blocking handle to one [`ScenarioEngine`].
pub struct SharedEngine<O> {
    inner: Arc<Mutex<ScenarioEngine<O>>>,
    generating: Arc<AtomicBool>,
    settled: Arc<AtomicU8>,
}

impl<O> Clone for SharedEngine<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            generating: Arc::clone(&self.generating),
            settled: Arc::clone(&self.settled),
        }
    }
}

/// Clears the generating flag even if the call is cancelled.
struct GeneratingFlag(Arc<AtomicBool>);

impl GeneratingFlag {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(Arc::clone(flag))
    }
}

impl Drop for GeneratingFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn encode(phase: EnginePhase) -> u8 {
    match phase {
        EnginePhase::Idle => 0,
        EnginePhase::AwaitingGeneration => 1,
        EnginePhase::Active => 2,
    }
}

fn decode(value: u8) -> EnginePhase {
    match value {
        1 => EnginePhase::AwaitingGeneration,
        2 => EnginePhase::Active,
        _ => EnginePhase::Idle,
    }
}

impl<O: TextOracle> SharedEngine<O> {
    pub fn new(engine: ScenarioEngine<O>) -> Self {
        let settled = Arc::new(AtomicU8::new(encode(engine.phase())));
        Self {
            inner: Arc::new(Mutex::new(engine)),
            generating: Arc::new(AtomicBool::new(false)),
            settled,
        }
    }

    fn settle(&self, engine: &ScenarioEngine<O>) {
        self.settled.store(encode(engine.phase()), Ordering::Release);
    }

    fn acquire(&self) -> Result<OwnedMutexGuard<ScenarioEngine<O>>, EngineError> {
        Arc::clone(&self.inner)
            .try_lock_owned()
            .map_err(|_| EngineError::Busy)
    }

    /// Generate a scenario, holding the session for the whole oracle call.
    pub async fn generate(&self) -> Result<Scenario, EngineError> {
        let mut engine = self.acquire()?;
        let _flag = GeneratingFlag::raise(&self.generating);
        let result = engine.generate().await.cloned();
        self.settle(&engine);
        result
    }

    /// Ask a question, holding the session for the whole oracle call.
    pub async fn ask(&self, question: &str) -> Result<String, EngineError> {
        let mut engine = self.acquire()?;
        engine.ask(question).await
    }

    pub fn choose(&self, index: usize) -> Result<Selection, EngineError> {
        self.acquire()?.choose(index)
    }

    pub fn clear(&self) -> Result<(), EngineError> {
        let mut engine = self.acquire()?;
        engine.clear();
        self.settle(&engine);
        Ok(())
    }

    pub fn reset_score(&self) -> Result<(), EngineError> {
        self.acquire()?.reset_score();
        Ok(())
    }

    /// Whether an operation currently holds the session.
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }

    pub fn phase(&self) -> EnginePhase {
        if self.generating.load(Ordering::Acquire) {
            return EnginePhase::AwaitingGeneration;
        }
        match self.inner.try_lock() {
            Ok(engine) => engine.phase(),
            Err(_) => decode(self.settled.load(Ordering::Acquire)),
        }
    }

    /// Copy of the session state for rendering.
    pub fn snapshot(&self) -> Result<SessionState, EngineError> {
        Ok(self.acquire()?.state().clone())
    }

    pub async fn export_transcript(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let state = self.snapshot()?;
        write_transcript(&state, path.as_ref()).await
    }
}
