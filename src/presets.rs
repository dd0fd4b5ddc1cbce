use crate::config::SweepConfig;
use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A named sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub config: SweepConfig,
}

impl Preset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, config: SweepConfig) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            config,
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the binary
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-ins plus whatever lives in the user's config directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Built-ins plus user presets from `dir`, if any
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    /// `<config_dir>/dla-aggregation/presets`
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("dla-aggregation").join("presets"))
    }

    fn load_user_presets(&mut self) {
        let Some(dir) = self.dir.as_deref() else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(|e| DriverError::io("read preset", &path, e))
                .and_then(|content| Ok(serde_json::from_str::<Preset>(&content)?))
            {
                Ok(preset) => self.user.push(preset),
                Err(err) => warn!(path = %path.display(), %err, "skipping unreadable preset"),
            }
        }
    }

    /// Save a preset to the user directory, replacing one with the same name
    pub fn save_preset(&mut self, preset: Preset) -> Result<PathBuf, DriverError> {
        let dir = self.dir.clone().ok_or(DriverError::NoConfigDir)?;
        fs::create_dir_all(&dir).map_err(|e| DriverError::io("create presets directory", &dir, e))?;

        let path = dir.join(format!("{}.json", sanitize_file_name(&preset.name)));
        let json = serde_json::to_string_pretty(&preset)?;
        fs::write(&path, json).map_err(|e| DriverError::io("write preset file", &path, e))?;

        self.user.retain(|p| p.name != preset.name);
        self.user.push(preset);
        Ok(path)
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name; user presets shadow built-ins of the same name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.user
            .iter()
            .chain(self.builtin.iter())
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Result<&Preset, DriverError> {
        self.find(name).ok_or_else(|| DriverError::UnknownPreset(name.to_string()))
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// The stickiness ladder 1.0, 0.95, 0.85, ..., 0.05
fn full_stickiness_range() -> Vec<f64> {
    let mut values: Vec<f64> = (5..100).step_by(10).map(|n| n as f64 / 100.0).collect();
    values.push(1.0);
    values.reverse();
    values
}

/// Particle counts 19500, 17000, ..., 2000
fn descending_iterations() -> Vec<i64> {
    let mut values: Vec<i64> = (2000..20000).step_by(2500).collect();
    values.reverse();
    values
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        Preset::new(
            "original",
            "Full parameter study: 251-1051 grids, 2000-19500 particles, stickiness 1.0 down to 0.05",
            SweepConfig {
                shapes: (251..=1051).step_by(200).collect(),
                iterations: descending_iterations(),
                stickiness: full_stickiness_range(),
                ..SweepConfig::default()
            },
        ),
        Preset::new(
            "quick",
            "Small grids for a fast smoke run",
            SweepConfig {
                shapes: vec![31, 51],
                iterations: vec![200, 100],
                stickiness: vec![1.0, 0.5, 0.1],
                seed: Some(0),
                ..SweepConfig::default()
            },
        ),
        Preset::new(
            "sticky",
            "One mid-size grid across the whole stickiness range",
            SweepConfig {
                shapes: vec![151],
                iterations: vec![3000],
                stickiness: full_stickiness_range(),
                ..SweepConfig::default()
            },
        ),
    ]
}
