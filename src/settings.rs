use crate::error::{DlaError, Result};
use serde::{Deserialize, Serialize};

/// Validated parameters for one `run` of the aggregation engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParams {
    /// Number of particles to inject
    pub num_iterations: usize,
    /// Per-contact sticking probability in (0, 1]
    pub stickiness: f64,
}

impl RunParams {
    /// Check the raw values before anything touches the lattice.
    /// The count is signed so that negative requests can be reported rather than wrapped.
    pub fn new(num_iterations: i64, stickiness: f64) -> Result<Self> {
        let num_iterations = usize::try_from(num_iterations).map_err(|_| {
            DlaError::InvalidParameter(format!(
                "num_iterations must be a non-negative integer, got {num_iterations}"
            ))
        })?;
        validate_stickiness(stickiness)?;
        Ok(Self {
            num_iterations,
            stickiness,
        })
    }
}

/// Stickiness must lie in the half-open interval (0, 1]
pub fn validate_stickiness(stickiness: f64) -> Result<()> {
    if stickiness > 0.0 && stickiness <= 1.0 {
        Ok(())
    } else {
        Err(DlaError::InvalidParameter(format!(
            "stickiness must be in (0.0, 1.0], got {stickiness}"
        )))
    }
}
