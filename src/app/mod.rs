//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the catalog and opacity data
//! - runs the MCMC fits and model comparison
//! - prints reports
//! - writes exports

use clap::Parser;

use crate::cli::{Command, FitArgs, SynthArgs};
use crate::data::{generate_catalog, write_catalog_csv, SynthSpec};
use crate::domain::{ComponentCount, FitConfig, PriorConfig};
use crate::error::AppError;
use crate::io::export::{parameter_table_path, write_parameter_table, write_result_json, FullResult};
use crate::math::MPC_CM;
use crate::report::{format_comparison, format_fit_summary};

pub mod pipeline;

/// Entry point for the `dustfit` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;
    let run = pipeline::run_fit(&config)?;

    for outcome in [&run.one_component, &run.two_component].into_iter().flatten() {
        println!(
            "{}",
            format_fit_summary(&config.object_name, &outcome.summary, &run.stats, &config)
        );
        let path = parameter_table_path(&config.output_dir, &config.object_name, &outcome.summary);
        write_parameter_table(&path, &outcome.summary)?;
    }
    if let Some(cmp) = &run.comparison {
        println!("{}", format_comparison(cmp));
    }

    if config.export_json {
        let result = FullResult {
            object_name: config.object_name.clone(),
            one_component: run.one_component.as_ref().map(|o| o.summary.clone()),
            two_component: run.two_component.as_ref().map(|o| o.summary.clone()),
            comparison: run.comparison.clone(),
        };
        let path = write_result_json(&config.output_dir, &result)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let spec = SynthSpec {
        log_dust_mass: args.log_mass,
        temperature: args.temperature,
        redshift: args.redshift,
        wavelengths: args.wavelengths,
        frac_err: args.frac_err,
        seed: args.seed,
        composition: args.composition,
        grain_size_um: args.grain_size,
    };
    let points = generate_catalog(&spec)?;
    write_catalog_csv(&args.output, &points)?;
    println!("Wrote {} points to {}", points.len(), args.output.display());
    Ok(())
}

pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    let object_name = match &args.object_name {
        Some(name) => name.clone(),
        None => args
            .catalog
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "object".to_string()),
    };

    let components = args.components.map(ComponentCount::try_from).transpose()?;

    if !(args.burn_in >= 0.0 && args.burn_in < 1.0) {
        return Err(AppError::new(2, format!("--burn-in must be in [0, 1), got {}.", args.burn_in)));
    }
    if args.repeats == 0 || args.steps == 0 {
        return Err(AppError::new(2, "--repeats and --steps must be >= 1."));
    }
    if !(args.sigma_clip.is_finite() && args.sigma_clip > 0.0) {
        return Err(AppError::new(2, format!("--sigma-clip must be > 0, got {}.", args.sigma_clip)));
    }
    if args.cores == 0 {
        return Err(AppError::new(2, "--cores must be >= 1."));
    }

    Ok(FitConfig {
        catalog_path: args.catalog.clone(),
        object_name,
        redshift: args.redshift,
        distance_cm: args.distance_mpc.map(|d| d * MPC_CM),
        composition: args.composition,
        grain_size_um: args.grain_size,
        components,
        n_walkers: args.walkers,
        n_steps: args.steps,
        burn_in: args.burn_in,
        n_cores: args.cores,
        sigma_clip: args.sigma_clip,
        repeats: args.repeats,
        seed: args.seed,
        n_filter_samples: args.filter_samples,
        priors: PriorConfig::default(),
        initial: None,
        output_dir: args.output_dir.clone(),
        export_json: args.json,
        progress: !args.no_progress,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn parse_fit(argv: &[&str]) -> FitArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Command::Fit(args) => args,
            _ => panic!("expected fit command"),
        }
    }

    #[test]
    fn object_name_defaults_to_catalog_stem() {
        let args = parse_fit(&["dustfit", "fit", "data/sn2024abc.csv", "-z", "0.02"]);
        let config = fit_config_from_args(&args).unwrap();
        assert_eq!(config.object_name, "sn2024abc");
        assert!(config.distance_cm.is_none());
        assert!(config.progress);
    }

    #[test]
    fn distance_override_converts_mpc_to_cm() {
        let args = parse_fit(&[
            "dustfit", "fit", "obj.csv", "-z", "0.01", "--distance-mpc", "10",
        ]);
        let config = fit_config_from_args(&args).unwrap();
        let d = config.distance_cm.unwrap();
        assert!((d - 10.0 * MPC_CM).abs() < 1e10);
    }

    #[test]
    fn bad_burn_in_is_rejected() {
        let args = parse_fit(&["dustfit", "fit", "obj.csv", "-z", "0.01", "--burn-in", "1.5"]);
        let err = fit_config_from_args(&args).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
