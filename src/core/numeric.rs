use serde::{Deserialize, Serialize};

/// Mantissa breakpoints used by [`nice`]: values below the limit snap to the step.
const NICE_STEPS: [(f64, f64); 6] = [
    (1.5, 1.0),
    (2.5, 2.0),
    (3.5, 3.0),
    (4.5, 4.0),
    (5.5, 5.0),
    (6.5, 6.0),
];
const NICE_TOP_STEP: f64 = 8.0;

/// Magnitudes outside `[SCIENTIFIC_BELOW, SCIENTIFIC_FROM)` print in scientific form.
const SCIENTIFIC_BELOW: f64 = 1e-6;
const SCIENTIFIC_FROM: f64 = 1e21;

/// Base-10 logarithm that maps `0` to `0` instead of `-inf`.
#[must_use]
pub fn log10(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value.log10() }
}

/// `10^exponent`.
#[must_use]
pub fn index10(exponent: f64) -> f64 {
    10_f64.powf(exponent)
}

/// Half-up rounding at `precision` decimal places.
///
/// Values whose scaled form would overflow are returned unchanged.
#[must_use]
pub fn round(value: f64, precision: u32) -> f64 {
    let pow = index10(f64::from(precision));
    let scaled = value * pow;
    if !pow.is_finite() || !scaled.is_finite() {
        return value;
    }
    (scaled + 0.5).floor() / pow
}

/// Snaps a raw tick step to a human-friendly value.
///
/// The mantissa is snapped to one of `1, 2, 3, 4, 5, 6, 8` and the result is
/// rounded to `|exponent|` decimals so that steps like `0.3` do not carry
/// binary noise. The sign of `value` is preserved; `0` maps to `1`.
#[must_use]
pub fn nice(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let magnitude = value.abs();
    let mut exponent = log10(magnitude).floor();
    let mut fraction = magnitude / index10(exponent);
    // log10 may land one ulp off an exact power of ten.
    if fraction >= 10.0 {
        exponent += 1.0;
        fraction /= 10.0;
    } else if magnitude > 0.0 && fraction < 1.0 {
        exponent -= 1.0;
        fraction *= 10.0;
    }
    let exp10 = index10(exponent);
    let step = NICE_STEPS
        .iter()
        .find(|(limit, _)| fraction < *limit)
        .map_or(NICE_TOP_STEP, |(_, step)| *step);

    let snapped = step * exp10;
    let snapped = if exponent < 0.0 {
        round(snapped, exponent.abs() as u32)
    } else {
        snapped
    };

    if value < 0.0 { -snapped } else { snapped }
}

/// Number of significant fractional digits in `value`.
///
/// Magnitudes below `1e-6` or from `1e21` up are read in scientific form:
/// a negative exponent gives its absolute value (`1.25e-7` yields `7`) and a
/// non-negative one gives `0`. Other values count the digits after the point
/// of the shortest round-trip decimal form, so `1e-5` yields `5`.
/// Non-finite values yield `0`.
#[must_use]
pub fn precision_of(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }

    let magnitude = value.abs();
    if magnitude != 0.0 && !(SCIENTIFIC_BELOW..SCIENTIFIC_FROM).contains(&magnitude) {
        let formatted = format!("{magnitude:e}");
        return formatted
            .split_once('e')
            .and_then(|(_, exponent)| exponent.parse::<i64>().ok())
            .map_or(0, |exponent| exponent.min(0).unsigned_abs() as u32);
    }

    format!("{magnitude}")
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len() as u32)
}

/// Result of a single-pass extrema scan.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extrema {
    pub max: Option<f64>,
    pub min: Option<f64>,
}

/// Scans `items` once, tracking the maximum of `max_key` and the minimum of
/// `min_key`.
///
/// Keys returning `None` (or NaN) do not constrain the respective extremum.
#[must_use]
pub fn max_min<T, FMax, FMin>(items: &[T], max_key: FMax, min_key: FMin) -> Extrema
where
    FMax: Fn(&T) -> Option<f64>,
    FMin: Fn(&T) -> Option<f64>,
{
    items.iter().fold(Extrema::default(), |acc, item| Extrema {
        max: fold_extreme(acc.max, max_key(item), f64::max),
        min: fold_extreme(acc.min, min_key(item), f64::min),
    })
}

fn fold_extreme(current: Option<f64>, candidate: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (current, candidate.filter(|value| !value.is_nan())) {
        (Some(current), Some(candidate)) => Some(pick(current, candidate)),
        (None, candidate) => candidate,
        (current, None) => current,
    }
}
