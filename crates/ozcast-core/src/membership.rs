//! Piecewise-linear membership functions.
//!
//! Three shapes cover every term in the calibrations:
//!
//! ```text
//!  ramp_up [a, b]       ramp_down [a, b]     trapezoid [a, b, c, d]
//!
//!  1 |      ______      1 |____              1 |     ______
//!    |     /              |    \               |    /      \
//!  0 |____/             0 |     \______      0 |___/        \___
//!         a  b                 a  b               a  b    c  d
//! ```
//!
//! Equal adjacent breakpoints give a vertical edge. On an edge the
//! function takes the plateau value, so a `trapezoid [20, 20, 40, 55]`
//! is 1 at 20.
//!
//! Every shape is continuous between its breakpoints and linear on each
//! piece, so the supremum over any closed interval is reached at the
//! interval's endpoints or at a breakpoint inside it. [`MembershipFunction::sup_on`]
//! relies on that to return exact maxima without sampling.

use serde::Deserialize;

use crate::error::ConfigurationError;

/// A closed interval `[lo, hi]` on the real line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    /// Lower bound (inclusive).
    pub lo: f64,
    /// Upper bound (inclusive).
    pub hi: f64,
}

impl Interval {
    /// Create an interval. No validation is performed here.
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    /// `true` if `x` lies within the closed interval.
    pub const fn contains(&self, x: f64) -> bool {
        x >= self.lo && x <= self.hi
    }

    /// Clamp `x` to the nearest bound. `NaN` is returned unchanged.
    pub const fn clip(&self, x: f64) -> f64 {
        if x < self.lo {
            self.lo
        } else if x > self.hi {
            self.hi
        } else {
            x
        }
    }

    /// `hi - lo`.
    pub const fn width(&self) -> f64 {
        self.hi - self.lo
    }

    /// `true` if both bounds are finite and `lo < hi`.
    pub const fn is_proper(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite() && self.lo < self.hi
    }
}

/// A membership function over one variable's universe.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MembershipFunction {
    /// 0 at or below `a`, rising linearly to 1 at `b`, 1 above.
    RampUp {
        /// `[a, b]`
        points: [f64; 2],
    },
    /// 1 at or below `a`, falling linearly to 0 at `b`, 0 above.
    RampDown {
        /// `[a, b]`
        points: [f64; 2],
    },
    /// 0 below `a`, rising to 1 at `b`, 1 until `c`, falling to 0 at `d`.
    Trapezoid {
        /// `[a, b, c, d]`
        points: [f64; 4],
    },
}

impl MembershipFunction {
    /// Shorthand for [`MembershipFunction::RampUp`].
    pub const fn ramp_up(a: f64, b: f64) -> Self {
        Self::RampUp { points: [a, b] }
    }

    /// Shorthand for [`MembershipFunction::RampDown`].
    pub const fn ramp_down(a: f64, b: f64) -> Self {
        Self::RampDown { points: [a, b] }
    }

    /// Shorthand for [`MembershipFunction::Trapezoid`].
    pub const fn trapezoid(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self::Trapezoid {
            points: [a, b, c, d],
        }
    }

    /// Membership degree of `x`, in `[0, 1]`. `NaN` has degree 0.
    pub const fn degree(&self, x: f64) -> f64 {
        if x.is_nan() {
            return 0.0;
        }
        match *self {
            Self::RampUp { points: [a, b] } => {
                if x >= b {
                    1.0
                } else if x <= a {
                    0.0
                } else {
                    (x - a) / (b - a)
                }
            }
            Self::RampDown { points: [a, b] } => {
                if x <= a {
                    1.0
                } else if x >= b {
                    0.0
                } else {
                    (b - x) / (b - a)
                }
            }
            Self::Trapezoid {
                points: [a, b, c, d],
            } => {
                if x < a || x > d {
                    0.0
                } else if x >= b && x <= c {
                    1.0
                } else if x < b {
                    (x - a) / (b - a)
                } else {
                    (d - x) / (d - c)
                }
            }
        }
    }

    /// The ordered breakpoints of the shape.
    pub const fn breakpoints(&self) -> &[f64] {
        match self {
            Self::RampUp { points } | Self::RampDown { points } => points,
            Self::Trapezoid { points } => points,
        }
    }

    /// Closed hull of where the function is positive, within `universe`.
    pub const fn support(&self, universe: Interval) -> Interval {
        match *self {
            Self::RampUp { points: [a, _] } => Interval::new(a, universe.hi),
            Self::RampDown { points: [_, b] } => Interval::new(universe.lo, b),
            Self::Trapezoid {
                points: [a, _, _, d],
            } => Interval::new(a, d),
        }
    }

    /// Interval where the function equals 1, within `universe`.
    pub const fn core(&self, universe: Interval) -> Interval {
        match *self {
            Self::RampUp { points: [_, b] } => Interval::new(b, universe.hi),
            Self::RampDown { points: [a, _] } => Interval::new(universe.lo, a),
            Self::Trapezoid {
                points: [_, b, c, _],
            } => Interval::new(b, c),
        }
    }

    /// Exact supremum of the function over `interval`.
    pub fn sup_on(&self, interval: Interval) -> f64 {
        self.breakpoints()
            .iter()
            .copied()
            .filter(|&p| interval.contains(p))
            .chain([interval.lo, interval.hi])
            .map(|x| self.degree(x))
            .fold(0.0, f64::max)
    }

    /// Check the breakpoints are finite, non-decreasing, and inside `universe`.
    pub fn validate(
        &self,
        variable: &str,
        term: &str,
        universe: Interval,
    ) -> Result<(), ConfigurationError> {
        let points = self.breakpoints();
        if points.iter().any(|p| !p.is_finite()) {
            return Err(ConfigurationError::NonFiniteBreakpoint {
                variable: variable.to_owned(),
                term: term.to_owned(),
            });
        }
        if points.windows(2).any(|w| matches!(w, [x, y] if y < x)) {
            return Err(ConfigurationError::DecreasingBreakpoints {
                variable: variable.to_owned(),
                term: term.to_owned(),
            });
        }
        if let Some(&value) = points.iter().find(|&&p| !universe.contains(p)) {
            return Err(ConfigurationError::BreakpointOutsideUniverse {
                variable: variable.to_owned(),
                term: term.to_owned(),
                value,
                lo: universe.lo,
                hi: universe.hi,
            });
        }
        Ok(())
    }
}
