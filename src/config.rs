use crate::error::DriverError;
use crate::settings::RunParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk container for a persisted lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayFormat {
    /// NumPy `.npy` array of `u8`
    #[default]
    Npy,
    /// 8-bit grayscale PNG mask, occupied = 255
    Png,
}

impl ArrayFormat {
    pub fn extension(&self) -> &str {
        match self {
            ArrayFormat::Npy => "npy",
            ArrayFormat::Png => "png",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "npy" | "numpy" => Some(ArrayFormat::Npy),
            "png" => Some(ArrayFormat::Png),
            _ => None,
        }
    }
}

/// One point of the sweep grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepJob {
    /// Position in sweep order, starting at 0
    pub index: usize,
    /// Side length of the square lattice
    pub shape: usize,
    pub iterations: i64,
    pub stickiness: f64,
    pub seed: Option<u64>,
}

impl SweepJob {
    pub fn params(&self) -> Result<RunParams, DriverError> {
        Ok(RunParams::new(self.iterations, self.stickiness)?)
    }

    /// File name used when persisting this job's lattice
    pub fn file_name(&self, format: ArrayFormat) -> String {
        format!(
            "dla_shape{}_N{}_stick{:?}.{}",
            self.shape,
            self.iterations,
            self.stickiness,
            format.extension()
        )
    }
}

/// Complete sweep configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Side lengths of the square lattices to grow (odd, >= 3)
    pub shapes: Vec<usize>,
    /// Particle counts to inject per run
    pub iterations: Vec<i64>,
    /// Stickiness values in (0, 1]
    pub stickiness: Vec<f64>,
    /// Array files go to `<output_dir>/images`, the metadata table to `<output_dir>/output_data.csv`
    pub output_dir: PathBuf,
    #[serde(default)]
    pub format: ArrayFormat,
    /// Base seed; run `i` uses `seed + i`. Entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl SweepConfig {
    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), DriverError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| DriverError::io("write config file", path, e))
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, DriverError> {
        let content =
            fs::read_to_string(path).map_err(|e| DriverError::io("read config file", path, e))?;
        let config: SweepConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DriverError> {
        if self.shapes.is_empty() || self.iterations.is_empty() || self.stickiness.is_empty() {
            return Err(DriverError::InvalidConfig(
                "shapes, iterations and stickiness must each list at least one value".into(),
            ));
        }
        if let Some(&bad) = self.shapes.iter().find(|&&s| s < 3 || s % 2 == 0) {
            return Err(DriverError::InvalidConfig(format!(
                "shape {bad} must be odd and at least 3"
            )));
        }
        for &n in &self.iterations {
            for &s in &self.stickiness {
                RunParams::new(n, s)?;
            }
        }
        Ok(())
    }

    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.output_dir.join("output_data.csv")
    }

    pub fn total_runs(&self) -> usize {
        self.shapes.len() * self.iterations.len() * self.stickiness.len()
    }

    /// Every (shape, iterations, stickiness) combination, shape outermost
    pub fn jobs(&self) -> Vec<SweepJob> {
        let mut jobs = Vec::with_capacity(self.total_runs());
        for &shape in &self.shapes {
            for &iterations in &self.iterations {
                for &stickiness in &self.stickiness {
                    let index = jobs.len();
                    jobs.push(SweepJob {
                        index,
                        shape,
                        iterations,
                        stickiness,
                        seed: self.seed.map(|s| s.wrapping_add(index as u64)),
                    });
                }
            }
        }
        jobs
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            version: 1,
            shapes: vec![51, 101],
            iterations: vec![500, 250],
            stickiness: vec![1.0, 0.5, 0.1],
            output_dir: PathBuf::from("dla-output"),
            format: ArrayFormat::Npy,
            seed: None,
        }
    }
}
