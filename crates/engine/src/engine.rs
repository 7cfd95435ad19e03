//! The evolution engine - owns the live state and serializes submissions.

use std::sync::Arc;

use evotune_core::{EvolutionState, ParamVector};
use evotune_storage::{StateStore, StorageError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info};

use crate::mutator;

const COMMAND_BUFFER: usize = 64;

/// Configuration for the evolution engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of feedback submissions per evolution boundary.
    pub generation_duration: u64,
    /// Per-position mutation rates applied at each boundary.
    pub mutation_rates: Vec<f64>,
}

/// Errors surfaced by feedback submissions.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Persisting the updated state failed; the submission was not applied.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The engine task has shut down.
    #[error("engine unavailable")]
    Closed,
}

enum Command {
    Learn {
        score: f64,
        reply: oneshot::Sender<Result<EvolutionState, EngineError>>,
    },
}

/// The evolution engine worker.
///
/// Exclusively owns the live `EvolutionState` and processes feedback
/// submissions one at a time: a submission's full cycle (increment, mutate
/// at a boundary, persist) completes before the next one starts, so
/// concurrent submissions are applied in arrival order with no lost
/// updates. Committed snapshots are published on a watch channel for
/// non-blocking queries.
pub struct EvolutionEngine<S> {
    store: Arc<S>,
    config: EngineConfig,
    state: EvolutionState,
    rng: StdRng,
    commands: mpsc::Receiver<Command>,
    snapshot: watch::Sender<EvolutionState>,
}

impl<S: StateStore + 'static> EvolutionEngine<S> {
    /// Spawn the engine task, seeding its RNG from the OS.
    pub fn spawn(store: Arc<S>, config: EngineConfig, state: EvolutionState) -> EngineHandle {
        Self::spawn_with_rng(store, config, state, StdRng::from_entropy())
    }

    /// Spawn the engine task with a fixed RNG seed.
    pub fn spawn_seeded(
        store: Arc<S>,
        config: EngineConfig,
        state: EvolutionState,
        seed: u64,
    ) -> EngineHandle {
        Self::spawn_with_rng(store, config, state, StdRng::seed_from_u64(seed))
    }

    fn spawn_with_rng(
        store: Arc<S>,
        config: EngineConfig,
        state: EvolutionState,
        rng: StdRng,
    ) -> EngineHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.clone());
        let engine = Self {
            store,
            config,
            state,
            rng,
            commands: commands_rx,
            snapshot: snapshot_tx,
        };
        tokio::spawn(engine.run());
        EngineHandle {
            commands: commands_tx,
            snapshot: snapshot_rx,
        }
    }

    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Learn { score, reply } => {
                    let result = self.learn(score).await;
                    // a caller that dropped its reply end still had its
                    // update applied; nothing to roll back here
                    let _ = reply.send(result);
                }
            }
        }
        debug!("engine task stopping: all handles dropped");
    }

    /// Apply one feedback submission and persist the outcome.
    ///
    /// The in-memory state is replaced only after the save succeeded, so a
    /// storage failure leaves the engine consistent with the last durable
    /// record and the submission can be retried by the caller.
    async fn learn(&mut self, score: f64) -> Result<EvolutionState, EngineError> {
        let mut next = self.state.clone();
        next.generation += 1;
        info!("learn score={} generation={}", score, next.generation);

        if next.generation % self.config.generation_duration == 0 {
            if score > next.best_score {
                next.stable = next.current.clone();
                next.best_score = score;
                info!(
                    "promoted candidate at generation {} with score {}",
                    next.generation, score
                );
            }
            next.current = mutator::mutate(&next.current, &self.config.mutation_rates, &mut self.rng);
        }

        if let Err(e) = self.store.save(&next).await {
            error!("failed to persist generation {}: {}", next.generation, e);
            return Err(e.into());
        }

        self.state = next;
        let _ = self.snapshot.send(self.state.clone());
        Ok(self.state.clone())
    }
}

/// Clonable handle to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<EvolutionState>,
}

impl EngineHandle {
    /// Submit a fitness score; resolves once the update is durably applied.
    pub async fn learn(&self, score: f64) -> Result<EvolutionState, EngineError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Learn { score, reply })
            .await
            .map_err(|_| EngineError::Closed)?;
        response.await.map_err(|_| EngineError::Closed)?
    }

    /// Latest committed state snapshot.
    pub fn state(&self) -> EvolutionState {
        self.snapshot.borrow().clone()
    }

    /// Candidate vector currently being evaluated.
    pub fn current(&self) -> ParamVector {
        self.snapshot.borrow().current.clone()
    }

    /// Best-confirmed stable vector.
    pub fn stable(&self) -> ParamVector {
        self.snapshot.borrow().stable.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evotune_storage::MemoryStateStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn vector(pairs: &[(&str, f64)]) -> ParamVector {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn config(generation_duration: u64, mutation_rates: &[f64]) -> EngineConfig {
        EngineConfig {
            generation_duration,
            mutation_rates: mutation_rates.to_vec(),
        }
    }

    fn spawn_engine(
        generation_duration: u64,
        rates: &[f64],
        initial: &ParamVector,
    ) -> (Arc<MemoryStateStore>, EngineHandle) {
        let store = Arc::new(MemoryStateStore::new());
        let handle = EvolutionEngine::spawn_seeded(
            store.clone(),
            config(generation_duration, rates),
            EvolutionState::bootstrap(initial),
            7,
        );
        (store, handle)
    }

    /// Store whose saves can be switched to fail, for storage-error paths.
    struct FlakyStore {
        inner: MemoryStateStore,
        failing: AtomicBool,
    }

    impl FlakyStore {
        fn new(failing: bool) -> Self {
            Self {
                inner: MemoryStateStore::new(),
                failing: AtomicBool::new(failing),
            }
        }
    }

    #[async_trait::async_trait]
    impl StateStore for FlakyStore {
        async fn load(&self) -> evotune_storage::Result<Option<EvolutionState>> {
            self.inner.load().await
        }

        async fn save(&self, state: &EvolutionState) -> evotune_storage::Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Other("disk unavailable".to_string()));
            }
            self.inner.save(state).await
        }
    }

    #[tokio::test]
    async fn generation_increments_once_per_submission() {
        let initial = vector(&[("speed", 0.05)]);
        let (_store, handle) = spawn_engine(1000, &[0.1], &initial);

        for expected in 1..=10 {
            let state = handle.learn(1.0).await.unwrap();
            assert_eq!(state.generation, expected);
        }
        assert_eq!(handle.state().generation, 10);
    }

    #[tokio::test]
    async fn non_boundary_submissions_leave_vectors_and_score_alone() {
        let initial = vector(&[("speed", 0.05), ("angle", 1.5)]);
        let (_store, handle) = spawn_engine(1000, &[0.5, 0.5], &initial);

        for score in [5.0, 100.0, -3.0] {
            let state = handle.learn(score).await.unwrap();
            assert_eq!(state.stable, initial);
            assert_eq!(state.current, initial);
            assert_eq!(state.best_score, 0.0);
        }
    }

    #[tokio::test]
    async fn boundary_promotes_on_improvement_then_mutates() {
        let initial = vector(&[("speed", 0.05), ("angle", 1.5)]);
        let (_store, handle) = spawn_engine(3, &[0.1, 0.1], &initial);

        handle.learn(1.0).await.unwrap();
        handle.learn(2.0).await.unwrap();
        let state = handle.learn(10.0).await.unwrap();

        assert_eq!(state.generation, 3);
        assert_eq!(state.best_score, 10.0);
        // stable is the pre-mutation candidate, current a mutation of it
        assert_eq!(state.stable, initial);
        assert_eq!(
            state.current.keys().collect::<Vec<_>>(),
            initial.keys().collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn boundary_without_improvement_mutates_but_keeps_stable() {
        let initial = vector(&[("speed", 0.05)]);
        let (_store, handle) = spawn_engine(1, &[0.1], &initial);

        let state = handle.learn(-5.0).await.unwrap();

        assert_eq!(state.stable, initial);
        assert_eq!(state.best_score, 0.0);
        assert_eq!(
            state.current.keys().collect::<Vec<_>>(),
            initial.keys().collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn best_score_never_decreases_across_boundaries() {
        let initial = vector(&[("speed", 0.05)]);
        let (_store, handle) = spawn_engine(1, &[0.1], &initial);

        handle.learn(10.0).await.unwrap();
        let state = handle.learn(4.0).await.unwrap();

        assert_eq!(state.best_score, 10.0);
    }

    #[tokio::test]
    async fn concurrent_submissions_are_applied_exactly_once_in_order() {
        let initial = vector(&[("speed", 0.05)]);
        let (_store, handle) = spawn_engine(5, &[0.1], &initial);

        let mut joins = Vec::new();
        for i in 0..25 {
            let handle = handle.clone();
            joins.push(tokio::spawn(async move { handle.learn(i as f64).await }));
        }

        let mut generations: Vec<u64> = Vec::new();
        for join in joins {
            generations.push(join.await.unwrap().unwrap().generation);
        }
        generations.sort_unstable();

        // every submission observed a distinct, consecutive generation
        assert_eq!(generations, (1..=25).collect::<Vec<_>>());
        assert_eq!(handle.state().generation, 25);
    }

    #[tokio::test]
    async fn every_reply_matches_the_persisted_record() {
        let initial = vector(&[("speed", 0.05)]);
        let (store, handle) = spawn_engine(2, &[0.1], &initial);

        for score in [1.0, 3.0, 2.0] {
            let state = handle.learn(score).await.unwrap();
            assert_eq!(store.load().await.unwrap(), Some(state));
        }
    }

    #[tokio::test]
    async fn failed_save_leaves_state_at_last_persisted_snapshot() {
        let initial = vector(&[("speed", 0.05)]);
        let store = Arc::new(FlakyStore::new(true));
        let handle = EvolutionEngine::spawn_seeded(
            store.clone(),
            config(1, &[0.1]),
            EvolutionState::bootstrap(&initial),
            7,
        );

        let result = handle.learn(5.0).await;
        assert!(matches!(result, Err(EngineError::Storage(_))));
        assert_eq!(handle.state().generation, 0);
        assert_eq!(handle.state().current, initial);

        // once storage recovers, the retried submission applies exactly once
        store.failing.store(false, Ordering::SeqCst);
        let state = handle.learn(5.0).await.unwrap();
        assert_eq!(state.generation, 1);
        assert_eq!(state.best_score, 5.0);
        assert_eq!(store.inner.load().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn queries_see_bootstrap_state_before_any_submission() {
        let initial = vector(&[("speed", 0.05), ("angle", 1.5)]);
        let (_store, handle) = spawn_engine(3, &[0.1], &initial);

        assert_eq!(handle.current(), initial);
        assert_eq!(handle.stable(), initial);
        assert_eq!(handle.state().generation, 0);
    }
}
