//! Continuous trait discretization
//!
//! Converts real-valued observations into an ordered set of half-open
//! `[min, max)` bins, either by equal-width partition of the (slightly
//! expanded) observed range or from user-supplied breakpoints.

use thiserror::Error;

/// Relative margin added on both ends of the observed range so that
/// every observation falls strictly inside some bin.
const RANGE_EPSILON: f64 = 1e-4;

/// Errors raised while discretizing continuous observations.
#[derive(Debug, Error, PartialEq)]
pub enum DiscretizeError {
    /// No observations were supplied.
    #[error("no observations to discretize")]
    EmptyObservations,

    /// The requested number of bins was zero.
    #[error("bin count must be at least 1")]
    InvalidBinCount,

    /// The breakpoint list has an odd number of entries.
    #[error("invalid number of breakpoints: {0} (must be even)")]
    OddBreakpointCount(usize),

    /// The breakpoints do not cover the observed value range.
    #[error("breakpoints do not span the range of observed values")]
    BreaksDoNotSpanRange,

    /// An observation falls in no bin.
    #[error("observation {0} falls in no bin")]
    ValueOutsideBins(f64),
}

/// A half-open interval `[min, max)` that becomes one discretized state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    /// Inclusive lower bound.
    pub min: f64,
    /// Exclusive upper bound.
    pub max: f64,
}

impl Bin {
    /// Whether `value` lies in `[min, max)`.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value < self.max
    }

    /// Representative value of the bin: its midpoint.
    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Display label, e.g. `[0.5,1.25)`.
    pub fn label(&self) -> String {
        format!("[{},{})", self.min, self.max)
    }
}

/// How continuous observations are cut into bins.
#[derive(Debug, Clone, PartialEq)]
pub enum Binning {
    /// Partition the expanded observed range into this many equal-width
    /// bins.
    EqualWidth(usize),

    /// User-supplied breakpoints, consumed as consecutive pairs
    /// `[b0,b1), [b1,b2), ...`.
    Breakpoints(Vec<f64>),
}

impl Binning {
    /// Derive the ordered bin set for the given observations.
    pub fn bins(&self, values: &[f64]) -> Result<Vec<Bin>, DiscretizeError> {
        match self {
            Binning::EqualWidth(count) => equal_width_bins(values, *count),
            Binning::Breakpoints(breaks) => breakpoint_bins(values, breaks),
        }
    }
}

/// Partition the observed range into `count` equal-width half-open bins.
///
/// The range is first expanded outward by `1e-4` of its width on both
/// ends so that the minimum and maximum observations land strictly
/// inside the first and last bin.
pub fn equal_width_bins(values: &[f64], count: usize) -> Result<Vec<Bin>, DiscretizeError> {
    if count == 0 {
        return Err(DiscretizeError::InvalidBinCount);
    }
    let (observed_min, observed_max) = observed_range(values)?;
    // The floor keeps both bounds strictly outside the observed range
    // even when the range itself underflows (e.g. all values equal).
    let scale = observed_max.abs().max(observed_min.abs()).max(1.0);
    let margin = (RANGE_EPSILON * (observed_max - observed_min)).max(f64::EPSILON * scale);
    let lo = observed_min - margin;
    let hi = observed_max + margin;
    let step = (hi - lo) / count as f64;

    let boundary = |i: usize| {
        if i == 0 {
            lo
        } else if i == count {
            hi
        } else {
            lo + step * i as f64
        }
    };
    Ok((0..count)
        .map(|i| Bin {
            min: boundary(i),
            max: boundary(i + 1),
        })
        .collect())
}

/// Build bins from a flat breakpoint list, consumed as consecutive
/// pairs sharing their inner endpoints.
///
/// Fails on an odd-length list and when the breakpoints do not cover
/// the observed range (largest breakpoint not above the observed
/// maximum, or smallest breakpoint above the observed minimum).
pub fn breakpoint_bins(values: &[f64], breaks: &[f64]) -> Result<Vec<Bin>, DiscretizeError> {
    if breaks.len() % 2 != 0 {
        return Err(DiscretizeError::OddBreakpointCount(breaks.len()));
    }
    let (observed_min, observed_max) = observed_range(values)?;
    let break_min = breaks.iter().copied().fold(f64::INFINITY, f64::min);
    let break_max = breaks.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if break_max <= observed_max || break_min > observed_min {
        return Err(DiscretizeError::BreaksDoNotSpanRange);
    }
    Ok(breaks
        .windows(2)
        .map(|pair| Bin {
            min: pair[0],
            max: pair[1],
        })
        .collect())
}

/// Index of the unique bin containing `value`.
pub fn bin_of(bins: &[Bin], value: f64) -> Result<usize, DiscretizeError> {
    bins.iter()
        .position(|bin| bin.contains(value))
        .ok_or(DiscretizeError::ValueOutsideBins(value))
}

fn observed_range(values: &[f64]) -> Result<(f64, f64), DiscretizeError> {
    if values.is_empty() {
        return Err(DiscretizeError::EmptyObservations);
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Ok((min, max))
}
