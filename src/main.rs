use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dla_aggregation::config::{ArrayFormat, SweepConfig, SweepJob};
use dla_aggregation::presets::{Preset, PresetManager};
use dla_aggregation::sweep;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dla-sweep")]
#[command(about = "Diffusion-Limited Aggregation parameter sweeps on a square lattice")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a full sweep over grid sizes, particle counts and stickiness values
    Run {
        /// JSON sweep config; overrides --preset
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Named preset (see `presets`)
        #[arg(short, long, default_value = "quick")]
        preset: String,

        /// Output directory for arrays and the metadata table
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Array format (npy, png)
        #[arg(short, long)]
        format: Option<String>,

        /// Base random seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Grow a single lattice and write it to one array file
    Single {
        /// Odd side length of the square lattice (>= 3)
        #[arg(long, default_value = "251")]
        size: usize,

        /// Number of particles to inject
        #[arg(short = 'n', long, default_value = "2000", allow_negative_numbers = true)]
        particles: i64,

        /// Stickiness in (0.0, 1.0]
        #[arg(short, long, default_value = "1.0")]
        stickiness: f64,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output file; the extension picks the format
        #[arg(short, long, default_value = "dla.npy")]
        output: PathBuf,
    },

    /// List built-in and user presets
    Presets,

    /// Save a JSON sweep config as a named user preset
    SavePreset {
        name: String,
        config: PathBuf,
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Write a preset out as an editable JSON sweep config
    ExportPreset { name: String, file: PathBuf },
}

fn parse_format(s: &str) -> Result<ArrayFormat> {
    match ArrayFormat::from_name(s) {
        Some(format) => Ok(format),
        None => bail!("unknown array format '{s}' (expected npy or png)"),
    }
}

/// Set `flag` once `interrupt` resolves, so the sweep stops at the next particle boundary.
/// A second interrupt exits straight away.
fn watch_interrupts<F, S>(flag: Arc<AtomicBool>, mut interrupt: F) -> tokio::task::JoinHandle<()>
where
    F: FnMut() -> S + Send + 'static,
    S: Future<Output = std::io::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if interrupt().await.is_err() {
            return;
        }
        warn!("interrupt received, stopping after the current particle (press again to abort)");
        flag.store(true, Ordering::Relaxed);

        if interrupt().await.is_ok() {
            std::process::exit(130);
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cancel = Arc::new(AtomicBool::new(false));
    watch_interrupts(Arc::clone(&cancel), tokio::signal::ctrl_c);

    match cli.command {
        Commands::Run {
            config,
            preset,
            output,
            format,
            seed,
        } => {
            let mut sweep_config = match config {
                Some(path) => SweepConfig::load_from_file(&path)
                    .with_context(|| format!("loading sweep config {}", path.display()))?,
                None => PresetManager::new().get(&preset)?.config.clone(),
            };
            if let Some(output) = output {
                sweep_config.output_dir = output;
            }
            if let Some(format) = format {
                sweep_config.format = parse_format(&format)?;
            }
            if seed.is_some() {
                sweep_config.seed = seed;
            }

            let flag = Arc::clone(&cancel);
            let summary =
                tokio::task::spawn_blocking(move || sweep::run_sweep(&sweep_config, &flag)).await??;
            if summary.cancelled {
                println!("sweep interrupted; the table lists only completed runs");
            }
            let exhausted = summary.rows.iter().filter(|r| r.exhausted).count();
            println!(
                "{} runs written, {} exhausted, table at {}",
                summary.rows.len(),
                exhausted,
                summary.metadata_path.display()
            );
        }

        Commands::Single {
            size,
            particles,
            stickiness,
            seed,
            output,
        } => {
            let format = output
                .extension()
                .and_then(|e| e.to_str())
                .map(parse_format)
                .transpose()?
                .unwrap_or_default();
            let job = SweepJob {
                index: 0,
                shape: size,
                iterations: particles,
                stickiness,
                seed,
            };
            let flag = Arc::clone(&cancel);
            let path = output.clone();
            let result =
                tokio::task::spawn_blocking(move || sweep::run_job(&job, &path, format, &flag)).await??;
            if result.cancelled {
                println!("interrupted after {} cells; nothing written", result.row.particles_stuck);
            } else if result.row.exhausted {
                println!(
                    "entry points exhausted after {} cells; partial lattice written to {}",
                    result.row.particles_stuck,
                    output.display()
                );
            } else {
                println!("{} cells written to {}", result.row.particles_stuck, output.display());
            }
        }

        Commands::Presets => {
            let manager = PresetManager::new();
            for preset in manager.all_presets() {
                println!(
                    "{:<12} {:>5} runs  {}",
                    preset.name,
                    preset.config.total_runs(),
                    preset.description
                );
            }
            if let Some(dir) = manager.dir() {
                println!("\nuser presets: {}", dir.display());
            }
        }

        Commands::SavePreset {
            name,
            config,
            description,
        } => {
            let sweep_config = SweepConfig::load_from_file(&config)
                .with_context(|| format!("loading sweep config {}", config.display()))?;
            let mut manager = PresetManager::new();
            let path = manager.save_preset(Preset::new(name.as_str(), description, sweep_config))?;
            info!(preset = %name, path = %path.display(), "preset saved");
        }

        Commands::ExportPreset { name, file } => {
            let manager = PresetManager::new();
            manager.get(&name)?.config.save_to_file(&file)?;
            info!(preset = %name, file = %file.display(), "preset exported");
        }
    }

    Ok(())
}
