//! Command-line parsing for the dust SED fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Composition;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dustfit", version, about = "Bayesian dust mass + temperature SED fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit dust models to a photometry catalog and print/export the results.
    Fit(FitArgs),
    /// Generate a synthetic single-component catalog (useful for smoke tests).
    Synth(SynthArgs),
}

/// Options for fitting a catalog.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Photometry catalog CSV (`wavelength,flux,flux_err,is_limit[,filter]`).
    pub catalog: PathBuf,

    /// Object name used in output files and headers (defaults to the catalog stem).
    #[arg(long)]
    pub object_name: Option<String>,

    /// Source redshift.
    #[arg(short = 'z', long)]
    pub redshift: f64,

    /// Luminosity distance in Mpc (overrides the value derived from redshift).
    #[arg(long)]
    pub distance_mpc: Option<f64>,

    /// Grain composition of the opacity table.
    #[arg(long, value_enum, default_value_t = Composition::Carbon)]
    pub composition: Composition,

    /// Grain radius in μm (0.1 or 1.0).
    #[arg(long, default_value_t = 0.1)]
    pub grain_size: f64,

    /// Fit only this many components (1 or 2). Omit to fit both and compare.
    #[arg(long)]
    pub components: Option<u8>,

    /// Number of walkers in the ensemble (even, >= 2*n_dim + 2).
    #[arg(long, default_value_t = 32)]
    pub walkers: usize,

    /// Steps per MCMC run.
    #[arg(long, default_value_t = 1000)]
    pub steps: usize,

    /// Fraction of a single run discarded as burn-in.
    #[arg(long, default_value_t = 0.75)]
    pub burn_in: f64,

    /// Worker threads for likelihood evaluation.
    #[arg(long, default_value_t = 1)]
    pub cores: usize,

    /// Sigma-clipping threshold for walker repair between runs.
    #[arg(long, default_value_t = 2.0)]
    pub sigma_clip: f64,

    /// Number of MCMC runs (walkers are repaired between runs).
    #[arg(long, default_value_t = 3)]
    pub repeats: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Wavelength samples across the filter union when bandpasses are present.
    #[arg(long, default_value_t = 1000)]
    pub filter_samples: usize,

    /// Directory for exported tables and JSON.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Also write the full result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Suppress per-run progress output.
    #[arg(long)]
    pub no_progress: bool,
}

/// Options for generating a synthetic catalog.
#[derive(Debug, Parser)]
pub struct SynthArgs {
    /// Output catalog path.
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// log10 dust mass (solar masses).
    #[arg(long, default_value_t = -3.0)]
    pub log_mass: f64,

    /// Dust temperature (K).
    #[arg(long, default_value_t = 150.0)]
    pub temperature: f64,

    /// Source redshift.
    #[arg(short = 'z', long, default_value_t = 0.01)]
    pub redshift: f64,

    /// Fractional 1σ uncertainty applied to every point.
    #[arg(long, default_value_t = 0.05)]
    pub frac_err: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Grain composition.
    #[arg(long, value_enum, default_value_t = Composition::Carbon)]
    pub composition: Composition,

    /// Grain radius in μm.
    #[arg(long, default_value_t = 0.1)]
    pub grain_size: f64,

    /// Observer-frame wavelengths (μm) to sample.
    #[arg(long, value_delimiter = ',', default_value = "5,10,15,20,25,35,50,70")]
    pub wavelengths: Vec<f64>,
}
