//! Shared fitting pipeline used by the CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! catalog ingest -> opacity lookup -> posterior assembly -> MCMC ->
//! chain summary -> model comparison.

use crate::data::load_opacity;
use crate::domain::{ComponentCount, DatasetStats, FitConfig, FitSummary, ModelComparison};
use crate::error::AppError;
use crate::fit::compare::compare_models;
use crate::fit::controller::{ConvergenceController, McmcSettings};
use crate::fit::posterior::Posterior;
use crate::fit::sampler::Chain;
use crate::fit::summary::summarize;
use crate::io::catalog::load_catalog;
use crate::math::luminosity_distance_cm;

/// Everything produced by fitting one component count.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub summary: FitSummary,
    pub posterior: Posterior,
    pub chain: Chain,
}

/// All computed outputs of a single `dustfit fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: DatasetStats,
    pub one_component: Option<FitOutcome>,
    pub two_component: Option<FitOutcome>,
    pub comparison: Option<ModelComparison>,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let catalog = load_catalog(&config.catalog_path)?;
    for e in &catalog.row_errors {
        eprintln!("{}:{}: {}", config.catalog_path.display(), e.line, e.message);
    }

    let distance_cm = match config.distance_cm {
        Some(d) => d,
        None => luminosity_distance_cm(config.redshift)?,
    };
    let opacity = load_opacity(config.composition, config.grain_size_um)?;

    let fit_one = |components: ComponentCount| -> Result<FitOutcome, AppError> {
        let posterior = Posterior::build(
            catalog.obs.clone(),
            &opacity,
            config.redshift,
            distance_cm,
            components,
            config.priors.clone(),
            config.n_filter_samples,
        )?;
        fit_object(&posterior, config)
    };

    let (one_component, two_component) = match config.components {
        Some(ComponentCount::One) => (Some(fit_one(ComponentCount::One)?), None),
        Some(ComponentCount::Two) => (None, Some(fit_one(ComponentCount::Two)?)),
        None => (
            Some(fit_one(ComponentCount::One)?),
            Some(fit_one(ComponentCount::Two)?),
        ),
    };

    let comparison = match (&one_component, &two_component) {
        (Some(one), Some(two)) => Some(compare_models(
            &one.posterior,
            &two.posterior,
            &one.summary,
            &two.summary,
        )?),
        _ => None,
    };

    Ok(RunOutput {
        stats: catalog.stats,
        one_component,
        two_component,
        comparison,
    })
}

/// Run the sampler against one posterior and summarize the chain.
pub fn fit_object(posterior: &Posterior, config: &FitConfig) -> Result<FitOutcome, AppError> {
    let settings = McmcSettings {
        n_walkers: config.n_walkers,
        n_steps: config.n_steps,
        repeats: config.repeats,
        sigma_clip: config.sigma_clip,
        seed: config.seed,
        n_cores: config.n_cores,
        progress: config.progress,
    };
    let initial = config.initial.clone().unwrap_or_else(|| posterior.priors.clone());

    if config.progress {
        println!(
            "Fitting the {} model ({} walkers, {} steps, {} runs)...",
            posterior.components.display_name(),
            settings.n_walkers,
            settings.n_steps,
            settings.repeats
        );
    }

    let controller = ConvergenceController::new(posterior, settings, initial);
    let chain = controller.run()?;
    let summary = summarize(
        &chain,
        config.n_steps,
        config.repeats,
        config.burn_in,
        posterior.components,
    )?;

    Ok(FitOutcome {
        summary,
        posterior: posterior.clone(),
        chain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{generate_catalog, write_catalog_csv, SynthSpec};
    use crate::domain::{Composition, ParamRange, PriorConfig};
    use std::path::PathBuf;

    fn temp_catalog(name: &str, spec: &SynthSpec) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dustfit-pipeline-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let points = generate_catalog(spec).unwrap();
        write_catalog_csv(&path, &points).unwrap();
        path
    }

    #[test]
    fn recovers_the_temperature_of_a_synthetic_source() {
        // Clean single-component data; the 1-component fit should land near
        // the generating temperature.
        let truth_temp = 150.0;
        let spec = SynthSpec {
            log_dust_mass: -3.0,
            temperature: truth_temp,
            redshift: 0.01,
            wavelengths: vec![5.0, 10.0, 15.0, 20.0, 25.0],
            frac_err: 0.05,
            seed: 42,
            composition: Composition::Carbon,
            grain_size_um: 0.1,
        };
        let catalog = temp_catalog("recovery.csv", &spec);

        // Start walkers in a broad but plausible sub-box.
        let mut initial = PriorConfig::default();
        initial.log_mass_cold = ParamRange::new(-5.0, 0.0);
        initial.temp_cold = ParamRange::new(50.0, 600.0);

        let config = FitConfig {
            catalog_path: catalog,
            object_name: "recovery".into(),
            redshift: 0.01,
            distance_cm: None,
            composition: Composition::Carbon,
            grain_size_um: 0.1,
            components: Some(ComponentCount::One),
            n_walkers: 32,
            n_steps: 400,
            burn_in: 0.5,
            n_cores: 1,
            sigma_clip: 2.0,
            repeats: 3,
            seed: 7,
            n_filter_samples: 1000,
            priors: PriorConfig::default(),
            initial: Some(initial),
            output_dir: std::env::temp_dir(),
            export_json: false,
            progress: false,
        };

        let run = run_fit(&config).unwrap();
        let outcome = run.one_component.unwrap();
        assert!(run.two_component.is_none());
        assert!(run.comparison.is_none());

        let temp = outcome.summary.estimates[1].median;
        assert!(
            (temp - truth_temp).abs() < 0.2 * truth_temp,
            "recovered T = {temp}, expected ~{truth_temp}"
        );
        assert!(outcome.summary.total_dust_mass.median > 0.0);
    }
}
