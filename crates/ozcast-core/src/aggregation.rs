//! Aggregation of clipped rule outputs and extraction of the forecast.
//!
//! The aggregated surface is the pointwise maximum of every rule's
//! consequent membership clipped at its firing strength. Two things are
//! read off it:
//!
//! - **Category possibilities.** The supremum of the surface over each
//!   category's own region (its core). Because each clipped set is
//!   piecewise linear, the supremum is computed exactly from breakpoints.
//! - **Percentiles.** The surface is integrated with the trapezoid rule on
//!   a regular grid. The cumulative curve is non-decreasing, so each cut
//!   point is found by binary search and linear interpolation. A surface
//!   with zero area has no percentiles.
//!
//! Aggregation is a maximum, never a sum: repeated weak rules do not add
//! up to a strong one.

use std::collections::BTreeMap;

use ozcast_types::Category;
use tracing::warn;

use crate::error::{ConfigurationError, InferenceError};
use crate::membership::{Interval, MembershipFunction};
use crate::registry::{Variable, VariableId};

/// Smallest accepted integration grid (number of intervals).
pub const MIN_RESOLUTION: u32 = 100;

/// Default integration grid for calibrations that do not set one.
pub const DEFAULT_RESOLUTION: u32 = 1200;

// ---------------------------------------------------------------------------
// Output space
// ---------------------------------------------------------------------------

/// One category of the output variable.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBand {
    /// The category.
    pub category: Category,
    /// Its membership function over the output universe.
    pub function: MembershipFunction,
    /// The category's own region: where its membership is 1.
    pub region: Interval,
}

/// The output variable resolved into its four category bands.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpace {
    variable: VariableId,
    universe: Interval,
    bands: Vec<CategoryBand>,
}

impl OutputSpace {
    /// Resolve a registered output variable into category bands.
    ///
    /// Term names must be category labels. Every category must be present
    /// with a support of positive width, and no category may be positive
    /// anywhere on another category's core.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingCategory`],
    /// [`ConfigurationError::EmptyCategorySupport`], or
    /// [`ConfigurationError::OverlappingCategoryCore`].
    pub fn new(id: VariableId, variable: &Variable) -> Result<Self, ConfigurationError> {
        let universe = variable.universe();
        let mut bands = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let term = variable
                .terms()
                .iter()
                .find(|t| t.name == category.as_str())
                .ok_or(ConfigurationError::MissingCategory { category })?;
            if term.function.support(universe).width() <= 0.0 {
                return Err(ConfigurationError::EmptyCategorySupport { category });
            }
            bands.push(CategoryBand {
                category,
                function: term.function,
                region: term.function.core(universe),
            });
        }

        for band in &bands {
            for other in bands.iter().filter(|o| o.category != band.category) {
                if other.function.sup_on(band.region) > 0.0 {
                    return Err(ConfigurationError::OverlappingCategoryCore {
                        category: band.category,
                        other: other.category,
                    });
                }
            }
        }

        Ok(Self {
            variable: id,
            universe,
            bands,
        })
    }

    /// Registry id of the output variable.
    pub const fn variable(&self) -> VariableId {
        self.variable
    }

    /// The output universe.
    pub const fn universe(&self) -> Interval {
        self.universe
    }

    /// Bands in severity order.
    pub fn bands(&self) -> &[CategoryBand] {
        &self.bands
    }

    /// The band of one category.
    pub fn band(&self, category: Category) -> Option<&CategoryBand> {
        self.bands.iter().find(|b| b.category == category)
    }

    /// Check that every category support spans more than one grid interval.
    ///
    /// A support wider than the grid spacing always holds a grid point in
    /// its interior, so any positive firing strength gives a positive area.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::CategorySupportTooNarrow`] for the first
    /// offending category.
    pub fn check_resolution(&self, resolution: u32) -> Result<(), ConfigurationError> {
        let spacing = self.universe.width() / f64::from(resolution.max(1));
        for band in &self.bands {
            let width = band.function.support(self.universe).width();
            if width <= spacing {
                return Err(ConfigurationError::CategorySupportTooNarrow {
                    category: band.category,
                    width,
                    spacing,
                });
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Clipped sets and the aggregated surface
// ---------------------------------------------------------------------------

/// A rule's consequent membership clipped at its firing strength.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedOutputSet {
    /// Rule that produced this contribution.
    pub rule_id: String,
    /// The rule's consequent.
    pub category: Category,
    /// Firing strength used as the clip height.
    pub strength: f64,
    /// The consequent's membership function.
    pub function: MembershipFunction,
}

impl ClippedOutputSet {
    /// `min(membership(x), strength)`.
    pub fn value(&self, x: f64) -> f64 {
        self.function.degree(x).min(self.strength)
    }

    /// Exact supremum over `interval`.
    pub fn sup_on(&self, interval: Interval) -> f64 {
        self.function.sup_on(interval).min(self.strength)
    }
}

/// Pointwise maximum of all rule contributions over the output universe.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedSurface {
    universe: Interval,
    resolution: u32,
    contributions: Vec<ClippedOutputSet>,
}

/// Combine clipped rule outputs by pointwise maximum.
///
/// Zero-strength contributions are kept so every rule is accounted for;
/// they add nothing to the surface.
pub const fn aggregate(
    universe: Interval,
    resolution: u32,
    contributions: Vec<ClippedOutputSet>,
) -> AggregatedSurface {
    AggregatedSurface {
        universe,
        resolution,
        contributions,
    }
}

impl AggregatedSurface {
    /// Output universe the surface lives on.
    pub const fn universe(&self) -> Interval {
        self.universe
    }

    /// Number of integration intervals.
    pub const fn resolution(&self) -> u32 {
        self.resolution
    }

    /// All contributions, one per rule, in rule order.
    pub fn contributions(&self) -> &[ClippedOutputSet] {
        &self.contributions
    }

    /// Surface height at `x`; 0 outside the universe.
    pub fn value(&self, x: f64) -> f64 {
        if !self.universe.contains(x) {
            return 0.0;
        }
        self.contributions
            .iter()
            .map(|c| c.value(x))
            .fold(0.0, f64::max)
    }

    /// Exact supremum over `interval`, restricted to the universe.
    pub fn sup_on(&self, interval: Interval) -> f64 {
        let lo = interval.lo.max(self.universe.lo);
        let hi = interval.hi.min(self.universe.hi);
        if lo > hi {
            return 0.0;
        }
        let clipped = Interval::new(lo, hi);
        self.contributions
            .iter()
            .map(|c| c.sup_on(clipped))
            .fold(0.0, f64::max)
    }

    /// `(x, height)` on the integration grid, `resolution + 1` points.
    pub fn samples(&self) -> Vec<(f64, f64)> {
        let n = f64::from(self.resolution.max(1));
        let width = self.universe.width();
        (0..=self.resolution.max(1))
            .map(|i| {
                let x = self.universe.clip(self.universe.lo + width * (f64::from(i) / n));
                (x, self.value(x))
            })
            .collect()
    }

    /// Running trapezoid integral at each grid point, starting from 0.
    fn cumulative(samples: &[(f64, f64)]) -> Vec<f64> {
        std::iter::once(0.0)
            .chain(samples.windows(2).scan(0.0, |total, pair| {
                if let [(x0, y0), (x1, y1)] = pair {
                    *total += 0.5 * (y0 + y1) * (x1 - x0);
                }
                Some(*total)
            }))
            .collect()
    }

    /// Total area under the surface.
    pub fn area(&self) -> f64 {
        Self::cumulative(&self.samples())
            .last()
            .copied()
            .unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Possibility of each band's category: the surface supremum over its region.
///
/// The returned map has an entry for every band, zeros included.
pub fn extract_category_possibilities(
    surface: &AggregatedSurface,
    bands: &[CategoryBand],
) -> BTreeMap<Category, f64> {
    bands
        .iter()
        .map(|band| (band.category, surface.sup_on(band.region).clamp(0.0, 1.0)))
        .collect()
}

/// Cut points `x_f` with `integral(lo..x_f) = f * area` for each fraction.
///
/// Returns `None` for every fraction when the surface has zero area: no
/// rule supports any concentration, and no numeric value is substituted.
///
/// # Errors
///
/// Returns [`InferenceError::InvalidFraction`] for a fraction outside `[0, 1]`.
pub fn extract_percentiles(
    surface: &AggregatedSurface,
    fractions: &[f64],
) -> Result<Vec<Option<f64>>, InferenceError> {
    if let Some(&bad) = fractions.iter().find(|f| !(0.0..=1.0).contains(*f)) {
        return Err(InferenceError::InvalidFraction(bad));
    }

    let samples = surface.samples();
    let cumulative = AggregatedSurface::cumulative(&samples);
    let area = cumulative.last().copied().unwrap_or(0.0);

    if area <= 0.0 {
        warn!(
            contributions = surface.contributions().len(),
            "aggregated surface has zero area, percentiles undefined"
        );
        return Ok(vec![None; fractions.len()]);
    }

    let universe = surface.universe();
    Ok(fractions
        .iter()
        .map(|&f| Some(cut_point(&samples, &cumulative, f * area, universe)))
        .collect())
}

/// Locate `target` on the cumulative curve and interpolate within its cell.
fn cut_point(samples: &[(f64, f64)], cumulative: &[f64], target: f64, universe: Interval) -> f64 {
    let idx = cumulative.partition_point(|&c| c < target);
    let Some(prev) = idx.checked_sub(1) else {
        return universe.lo;
    };
    let (Some(&(x0, _)), Some(&(x1, _)), Some(&c0), Some(&c1)) = (
        samples.get(prev),
        samples.get(idx),
        cumulative.get(prev),
        cumulative.get(idx),
    ) else {
        return universe.hi;
    };
    let rise = c1 - c0;
    let x = if rise > 0.0 {
        x0 + (target - c0) / rise * (x1 - x0)
    } else {
        x0
    };
    universe.clip(x)
}

/// `1 - max(possibility)`. An empty mapping has ignorance 1.
pub fn ignorance(possibilities: &BTreeMap<Category, f64>) -> f64 {
    let max = possibilities.values().copied().fold(0.0, f64::max);
    (1.0 - max).clamp(0.0, 1.0)
}
