//! Lattice Diffusion-Limited Aggregation.
//!
//! Particles enter through the perimeter of an odd-sized square lattice and
//! random-walk over the Moore neighborhood until they stick to the aggregate
//! growing from the center cell. The `sweep` module drives batches of runs
//! and persists their lattices.

pub mod config;
pub mod entry_points;
pub mod error;
pub mod injector;
pub mod lattice;
pub mod output;
pub mod presets;
pub mod settings;
pub mod simulation;
pub mod sweep;
pub mod walker;

pub use entry_points::EntryPointRegistry;
pub use error::{DlaError, DriverError};
pub use lattice::{Cell, Coord, Lattice, Snapshot};
pub use settings::RunParams;
pub use simulation::{DlaSimulation, RunReport};
pub use walker::{RandomWalker, WalkOutcome};
