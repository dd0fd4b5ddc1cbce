use crate::entry_points::EntryPointRegistry;
use crate::error::Result;
use crate::injector;
use crate::lattice::{Lattice, Snapshot};
use crate::settings::RunParams;
use crate::walker::{RandomWalker, WalkOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Particles between progress lines: roughly ten lines per run
fn progress_interval(total: usize) -> usize {
    (total / 10).max(1)
}

/// Tally of one `run` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Iterations that ran to completion
    pub completed: usize,
    /// Walks that ended on a successful stickiness trial
    pub stuck: usize,
    /// Walks that ended boxed in with no empty neighbor
    pub trapped: usize,
    /// Moves taken across all walks
    pub total_steps: u64,
}

impl RunReport {
    fn record(&mut self, outcome: &WalkOutcome) {
        self.completed += 1;
        self.total_steps += outcome.steps();
        if outcome.is_trapped() {
            self.trapped += 1;
        } else {
            self.stuck += 1;
        }
    }
}

/// DLA simulation state: one lattice, its entry points and the random source driving them
pub struct DlaSimulation<R = StdRng> {
    lattice: Lattice,
    entry_points: EntryPointRegistry,
    rng: R,
    /// Cells in the aggregate, seed included
    particles_stuck: usize,
}

impl DlaSimulation<StdRng> {
    /// New simulation seeded from OS entropy
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Self::with_rng(rows, cols, StdRng::from_entropy())
    }

    /// New simulation with a reproducible random sequence
    pub fn with_seed(rows: usize, cols: usize, seed: u64) -> Result<Self> {
        Self::with_rng(rows, cols, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DlaSimulation<R> {
    pub fn with_rng(rows: usize, cols: usize, rng: R) -> Result<Self> {
        let lattice = Lattice::new(rows, cols)?;
        let entry_points = EntryPointRegistry::build(rows, cols);
        Ok(Self {
            lattice,
            entry_points,
            rng,
            particles_stuck: 1,
        })
    }

    /// Grow the aggregate by `num_iterations` particles.
    ///
    /// Parameters are validated before any mutation. `EntryPointsExhausted`
    /// ends the run early; the lattice stays valid and can still be inspected.
    pub fn run(&mut self, num_iterations: i64, stickiness: f64) -> Result<RunReport> {
        let params = RunParams::new(num_iterations, stickiness)?;
        self.run_params(&params)
    }

    pub fn run_params(&mut self, params: &RunParams) -> Result<RunReport> {
        self.run_cancellable(params, &AtomicBool::new(false))
    }

    /// Like `run_params`, but checks `cancel` before each injection and stops
    /// early (with `Ok`) once it is set. A walk in progress always finishes.
    pub fn run_cancellable(&mut self, params: &RunParams, cancel: &AtomicBool) -> Result<RunReport> {
        let walker = RandomWalker::new(params.stickiness)?;
        let mut report = RunReport::default();

        debug!(
            rows = self.lattice.rows(),
            cols = self.lattice.cols(),
            iterations = params.num_iterations,
            stickiness = params.stickiness,
            "starting aggregation run"
        );

        let every = progress_interval(params.num_iterations);
        for _ in 0..params.num_iterations {
            if cancel.load(Ordering::Relaxed) {
                debug!(completed = report.completed, "run cancelled");
                break;
            }
            let outcome = self.step(&walker)?;
            report.record(&outcome);
            if report.completed % every == 0 {
                debug!(
                    completed = report.completed,
                    of = params.num_iterations,
                    entry_points = self.entry_points.len(),
                    "placed particles"
                );
            }
        }

        debug!(
            completed = report.completed,
            stuck = report.stuck,
            trapped = report.trapped,
            total_steps = report.total_steps,
            entry_points = self.entry_points.len(),
            "aggregation run finished"
        );
        Ok(report)
    }

    /// Inject one particle and walk it until it settles
    pub fn step(&mut self, walker: &RandomWalker) -> Result<WalkOutcome> {
        let start = injector::inject(&mut self.lattice, &self.entry_points, &mut self.rng)?;
        let outcome = walker.walk(&mut self.lattice, &mut self.entry_points, &mut self.rng, start)?;
        self.particles_stuck += 1;
        Ok(outcome)
    }

    /// Current occupancy as 0/1 values
    pub fn snapshot(&self) -> Snapshot {
        self.lattice.snapshot()
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn entry_points(&self) -> &EntryPointRegistry {
        &self.entry_points
    }

    pub fn particles_stuck(&self) -> usize {
        self.particles_stuck
    }
}
