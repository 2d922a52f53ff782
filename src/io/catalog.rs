//! CSV catalog ingest.
//!
//! Turns a photometry CSV into a validated [`ObsSet`] that is safe to fit.
//!
//! Design goals:
//! - **Strict schema** for required fields (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no hidden randomness)
//! - **Separation of concerns**: no fitting logic here
//!
//! Schema: `wavelength, flux, flux_err, is_limit[, filter]`.
//! Wavelengths are observer-frame μm, fluxes in Jy. `is_limit` accepts
//! `0/1`, `true/false`, `yes/no`. The optional `filter` column names a
//! bandpass CSV (`wavelength, transmission`) resolved relative to the
//! catalog file; either every used row carries one or none does.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::domain::{Band, DatasetStats, ObsSet};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: validated observations + stats + row errors.
#[derive(Debug, Clone)]
pub struct CatalogData {
    pub obs: ObsSet,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

struct CatalogRow {
    wavelength: f64,
    flux: f64,
    flux_err: f64,
    is_limit: bool,
    filter: Option<String>,
}

/// Load and validate a photometry catalog.
pub fn load_catalog(path: &Path) -> Result<CatalogData, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open catalog '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for required in ["wavelength", "flux", "flux_err", "is_limit"] {
        if !header_map.contains_key(required) {
            return Err(AppError::new(2, format!("Missing required column: `{required}`")));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError { line, message: format!("CSV parse error: {e}") });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if rows.is_empty() {
        return Err(AppError::new(3, "No valid rows remain after validation."));
    }

    let n_with_filter = rows.iter().filter(|r| r.filter.is_some()).count();
    let filters = if n_with_filter == 0 {
        None
    } else if n_with_filter == rows.len() {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let mut bands = Vec::with_capacity(rows.len());
        for name in rows.iter().filter_map(|r| r.filter.as_deref()) {
            bands.push(load_band(&resolve_band_path(base, name))?);
        }
        Some(bands)
    } else {
        return Err(AppError::new(
            2,
            format!(
                "`filter` must be set on all rows or none; found {n_with_filter} of {}.",
                rows.len()
            ),
        ));
    };

    let obs = ObsSet {
        wavelength: rows.iter().map(|r| r.wavelength).collect(),
        flux: rows.iter().map(|r| r.flux).collect(),
        flux_err: rows.iter().map(|r| r.flux_err).collect(),
        is_limit: rows.iter().map(|r| r.is_limit).collect(),
        filters,
    };
    obs.validate()?;

    let stats = DatasetStats {
        n_points: obs.len(),
        n_detections: obs.n_detections(),
        n_limits: obs.n_limits(),
        wave_min: obs.wavelength.iter().copied().fold(f64::INFINITY, f64::min),
        wave_max: obs.wavelength.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };

    let rows_used = obs.len();
    Ok(CatalogData { obs, stats, row_errors, rows_read, rows_used })
}

fn resolve_band_path(base: &Path, name: &str) -> PathBuf {
    let p = Path::new(name);
    if p.is_absolute() { p.to_path_buf() } else { base.join(p) }
}

/// Load a bandpass transmission curve (`wavelength, transmission` CSV).
pub fn load_band(path: &Path) -> Result<Band, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open filter '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut wavelength = Vec::new();
    let mut transmission = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| {
            AppError::new(2, format!("{}: CSV parse error at line {line}: {e}", path.display()))
        })?;
        let field = |i: usize| -> Result<f64, AppError> {
            record
                .get(i)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    AppError::new(2, format!("{}: invalid value at line {line}.", path.display()))
                })
        };
        wavelength.push(field(0)?);
        transmission.push(field(1)?);
    }

    let band = Band { wavelength, transmission };
    band.validate()
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))?;
    Ok(band)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM;
    // stripping it keeps schema validation honest.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<CatalogRow, String> {
    let wavelength = parse_f64(get_required(record, header_map, "wavelength")?, "wavelength")?;
    let flux = parse_f64(get_required(record, header_map, "flux")?, "flux")?;
    let flux_err = parse_f64(get_required(record, header_map, "flux_err")?, "flux_err")?;
    let is_limit = parse_bool(get_required(record, header_map, "is_limit")?)?;
    let filter = get_optional(record, header_map, "filter").map(str::to_string);

    if wavelength <= 0.0 {
        return Err(format!("Non-positive wavelength {wavelength}."));
    }
    if flux <= 0.0 {
        return Err(format!("Non-positive flux {flux}."));
    }
    if flux_err <= 0.0 {
        return Err(format!("Non-positive flux_err {flux_err}."));
    }

    Ok(CatalogRow { wavelength, flux, flux_err, is_limit, filter })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    s.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("Invalid `{name}` value '{s}'."))
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "0" | "false" | "no" => Ok(false),
        "1" | "true" | "yes" => Ok(true),
        other => Err(format!("Invalid `is_limit` value '{other}' (use 0/1, true/false, yes/no).")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dustfit-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_a_well_formed_catalog() {
        let path = write_temp(
            "ok.csv",
            "wavelength,flux,flux_err,is_limit\n\
             10.0,0.5,0.05,0\n\
             20.0,0.8,0.08,0\n\
             70.0,0.1,0.02,1\n",
        );
        let data = load_catalog(&path).unwrap();
        assert_eq!(data.rows_read, 3);
        assert_eq!(data.rows_used, 3);
        assert_eq!(data.obs.n_detections(), 2);
        assert_eq!(data.obs.n_limits(), 1);
        assert!(data.row_errors.is_empty());
        assert_eq!(data.stats.wave_min, 10.0);
        assert_eq!(data.stats.wave_max, 70.0);
    }

    #[test]
    fn skips_bad_rows_but_keeps_good_ones() {
        let path = write_temp(
            "mixed.csv",
            "wavelength,flux,flux_err,is_limit\n\
             10.0,0.5,0.05,0\n\
             -1.0,0.5,0.05,0\n\
             20.0,abc,0.05,0\n\
             30.0,0.2,0.02,maybe\n",
        );
        let data = load_catalog(&path).unwrap();
        assert_eq!(data.rows_read, 4);
        assert_eq!(data.rows_used, 1);
        assert_eq!(data.row_errors.len(), 3);
        assert_eq!(data.row_errors[0].line, 3);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let path = write_temp("noerr.csv", "wavelength,flux,is_limit\n10.0,0.5,0\n");
        let err = load_catalog(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("flux_err"));
    }

    #[test]
    fn all_rows_invalid_is_insufficient_data() {
        let path = write_temp("allbad.csv", "wavelength,flux,flux_err,is_limit\nx,y,z,w\n");
        let err = load_catalog(&path).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn partial_filter_column_is_rejected() {
        let path = write_temp(
            "partial.csv",
            "wavelength,flux,flux_err,is_limit,filter\n\
             10.0,0.5,0.05,0,band.csv\n\
             20.0,0.8,0.08,0,\n",
        );
        let err = load_catalog(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("filter"));
    }

    #[test]
    fn filter_paths_resolve_relative_to_the_catalog() {
        let band = write_temp(
            "band.csv",
            "wavelength,transmission\n9.0,0.0\n10.0,1.0\n11.0,0.0\n",
        );
        let band_name = band.file_name().unwrap().to_str().unwrap();
        let path = write_temp(
            "filtered.csv",
            &format!(
                "wavelength,flux,flux_err,is_limit,filter\n10.0,0.5,0.05,0,{band_name}\n"
            ),
        );
        let data = load_catalog(&path).unwrap();
        let bands = data.obs.filters.unwrap();
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].support(), (9.0, 11.0));
    }
}
