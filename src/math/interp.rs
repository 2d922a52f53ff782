//! 1-D interpolation over monotonically increasing grids.
//!
//! Two flavors are used in this crate:
//!
//! - `interp_linear`: plain linear interpolation (filter transmission curves)
//! - `interp_loglog`: linear in log–log space (opacity curves, which are close
//!   to power laws in wavelength, making log–log interpolation exact on the
//!   tabulated segments)
//!
//! Extrapolation policy: values outside the grid are **clamped** to the end
//! values. Silent power-law extrapolation over decades of wavelength is easy
//! to get badly wrong, and the clamped value keeps the likelihood finite.

/// Locate the segment index `i` such that `xs[i] <= x < xs[i + 1]`.
///
/// Assumes `xs` is strictly increasing with `len() >= 2` and
/// `xs[0] <= x <= xs[last]`; callers handle the clamped cases first.
fn segment_index(xs: &[f64], x: f64) -> usize {
    match xs.binary_search_by(|v| v.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Less)) {
        Ok(i) => i.min(xs.len() - 2),
        Err(i) => i.saturating_sub(1).min(xs.len() - 2),
    }
}

/// Linear interpolation with clamped extrapolation.
pub fn interp_linear(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    debug_assert!(xs.len() >= 2);

    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }

    let i = segment_index(xs, x);
    let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
    ys[i] + t * (ys[i + 1] - ys[i])
}

/// Log–log linear interpolation with clamped extrapolation.
///
/// Requires positive `xs` and `ys` (validated when the table is built).
pub fn interp_loglog(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    debug_assert_eq!(xs.len(), ys.len());
    debug_assert!(xs.len() >= 2);

    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }

    let i = segment_index(xs, x);
    let lx0 = xs[i].ln();
    let lx1 = xs[i + 1].ln();
    let ly0 = ys[i].ln();
    let ly1 = ys[i + 1].ln();
    let t = (x.ln() - lx0) / (lx1 - lx0);
    (ly0 + t * (ly1 - ly0)).exp()
}
