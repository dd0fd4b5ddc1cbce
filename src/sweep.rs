use crate::config::{ArrayFormat, SweepConfig, SweepJob};
use crate::error::{DlaError, DriverError};
use crate::output::{self, MetadataRow, MetadataTable};
use crate::simulation::{DlaSimulation, RunReport};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Result of a whole sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSummary {
    /// One row per persisted run, in sweep order
    pub rows: Vec<MetadataRow>,
    /// Set when the cancel flag stopped the sweep before every job ran
    pub cancelled: bool,
    pub metadata_path: PathBuf,
}

/// What a single job produced
#[derive(Debug, Clone)]
pub struct JobResult {
    pub row: MetadataRow,
    pub report: Option<RunReport>,
    /// The cancel flag interrupted the run; nothing was written
    pub cancelled: bool,
}

/// Grow one lattice for `job` and persist it to `path`.
///
/// Running out of entry points is not fatal here: the partial lattice is
/// still written and the row is flagged `exhausted`.
pub fn run_job(
    job: &SweepJob,
    path: &Path,
    format: ArrayFormat,
    cancel: &AtomicBool,
) -> Result<JobResult, DriverError> {
    let params = job.params()?;
    let mut sim = match job.seed {
        Some(seed) => DlaSimulation::with_seed(job.shape, job.shape, seed)?,
        None => DlaSimulation::new(job.shape, job.shape)?,
    };

    let started = Instant::now();
    let (report, exhausted) = match sim.run_cancellable(&params, cancel) {
        Ok(report) => (Some(report), false),
        Err(DlaError::EntryPointsExhausted) => {
            warn!(
                shape = job.shape,
                iterations = job.iterations,
                stickiness = job.stickiness,
                particles_stuck = sim.particles_stuck(),
                "entry points exhausted before all particles were placed"
            );
            (None, true)
        }
        Err(err) => return Err(err.into()),
    };

    let row = MetadataRow {
        index: job.index,
        num_particles: job.iterations,
        stickiness: job.stickiness,
        filepath: path.to_path_buf(),
        shape: job.shape,
        particles_stuck: sim.particles_stuck(),
        exhausted,
    };

    let cancelled = report.is_some_and(|r| r.completed < params.num_iterations);
    if cancelled {
        return Ok(JobResult {
            row,
            report,
            cancelled,
        });
    }

    output::write_array(path, &sim.snapshot(), format)?;
    info!(
        shape = job.shape,
        iterations = job.iterations,
        stickiness = job.stickiness,
        elapsed_ms = started.elapsed().as_millis() as u64,
        path = %path.display(),
        "run persisted"
    );

    Ok(JobResult {
        row,
        report,
        cancelled,
    })
}

/// Run every combination in `config`, persisting each lattice and appending
/// a row to the metadata table after each run
pub fn run_sweep(config: &SweepConfig, cancel: &AtomicBool) -> Result<SweepSummary, DriverError> {
    config.validate()?;

    let images_dir = config.images_dir();
    fs::create_dir_all(&images_dir).map_err(|e| DriverError::io("create directory", &images_dir, e))?;
    let mut table = MetadataTable::create(&config.metadata_path())?;

    let jobs = config.jobs();
    let total = jobs.len();
    let mut summary = SweepSummary {
        metadata_path: table.path().to_path_buf(),
        ..SweepSummary::default()
    };

    info!(runs = total, output = %config.output_dir.display(), "starting sweep");

    for job in &jobs {
        if cancel.load(Ordering::Relaxed) {
            summary.cancelled = true;
            break;
        }

        info!(
            run = job.index + 1,
            of = total,
            shape = job.shape,
            iterations = job.iterations,
            stickiness = job.stickiness,
            "current config"
        );

        let path = images_dir.join(job.file_name(config.format));
        let result = run_job(job, &path, config.format, cancel)?;
        if result.cancelled {
            summary.cancelled = true;
            break;
        }
        table.append(&result.row)?;
        summary.rows.push(result.row);
    }

    if summary.cancelled {
        warn!(completed = summary.rows.len(), of = total, "sweep cancelled");
    } else {
        info!(runs = summary.rows.len(), table = %summary.metadata_path.display(), "sweep complete");
    }
    Ok(summary)
}
