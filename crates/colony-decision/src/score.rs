//! Composite desirability scores.
//!
//! A [`Score`] is a pool of named base contributions multiplied by a chain
//! of named modifiers and finally clamped to a range:
//!
//! ```text
//! score = clamp(sum(bases) * product(modifiers), min, max)
//! ```
//!
//! Names exist only for diagnostics; they are kept in insertion order so a
//! logged score reads like the formula that produced it.
//!
//! # The ZERO sentinel
//!
//! A score that is zero is terminal. [`Score::ZERO`], a base pool that sums
//! to exactly zero, or a zero modifier all collapse the score, and once
//! collapsed every further base or modifier is ignored. Providers return [`Score::ZERO`] for "this
//! agent cannot do that right now", which is the common case and never an
//! error.
//!
//! # Preconditions
//!
//! Bases, factors and range bounds must be finite, factors must not be
//! negative, and `min <= max`. These are not checked at runtime because
//! scoring runs for every agent on every pulse.

use core::fmt;

/// Exact zero test for sentinel handling.
#[allow(clippy::float_cmp)]
fn is_nil(value: f64) -> bool {
    value == 0.0
}

/// A composite, clamped desirability value.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Named additive contributions, in insertion order.
    bases: Vec<(String, f64)>,
    /// Named multiplicative factors, in insertion order.
    modifiers: Vec<(String, f64)>,
    /// Sum of all bases.
    base_total: f64,
    /// Product of all modifiers.
    factor_total: f64,
    /// Composition of every clamp applied so far.
    range: Option<(f64, f64)>,
    /// Set once the score reaches zero; nothing revives it.
    collapsed: bool,
}

impl Score {
    /// The "not applicable" sentinel.
    pub const ZERO: Self = Self {
        bases: Vec::new(),
        modifiers: Vec::new(),
        base_total: 0.0,
        factor_total: 0.0,
        range: None,
        collapsed: true,
    };

    /// Start a score from a named base value.
    ///
    /// A base of exactly zero yields a collapsed score with the same
    /// semantics as [`Score::ZERO`].
    pub fn new(base_name: impl Into<String>, base_value: f64) -> Self {
        let name = base_name.into();
        Self {
            bases: vec![(name, base_value)],
            modifiers: Vec::new(),
            base_total: base_value,
            factor_total: 1.0,
            range: None,
            collapsed: is_nil(base_value),
        }
    }

    /// Multiply the score by a named factor.
    ///
    /// A factor of zero collapses the score.
    pub fn add_modifier(&mut self, name: impl Into<String>, factor: f64) -> &mut Self {
        if self.collapsed {
            return self;
        }
        self.modifiers.push((name.into(), factor));
        self.factor_total *= factor;
        if is_nil(factor) {
            self.collapsed = true;
        }
        self
    }

    /// Add a named contribution to the base pool.
    ///
    /// The pool is summed before any modifier is applied, so contributions
    /// added here are scaled by every modifier regardless of call order.
    /// A pool that cancels out to exactly zero collapses the score.
    pub fn add_base(&mut self, name: impl Into<String>, delta: f64) -> &mut Self {
        if self.collapsed {
            return self;
        }
        self.bases.push((name.into(), delta));
        self.base_total += delta;
        if is_nil(self.base_total) {
            self.collapsed = true;
        }
        self
    }

    /// Clamp the final value to `[min, max]`.
    ///
    /// Applied last, just before the score leaves provider code. A second
    /// clamp acts on the already clamped total, so applying the same range
    /// again changes nothing and a wider range never loosens a narrower one.
    pub fn apply_range(&mut self, min: f64, max: f64) -> &mut Self {
        self.range = Some(self.range.map_or((min, max), |(lo, hi)| {
            (lo.clamp(min, max), hi.clamp(min, max))
        }));
        self
    }

    /// The final value.
    pub fn score(&self) -> f64 {
        if self.collapsed {
            return 0.0;
        }
        let raw = self.base_total * self.factor_total;
        self.range.map_or(raw, |(min, max)| raw.clamp(min, max))
    }

    /// Whether this is the collapsed "not applicable" sentinel.
    pub const fn is_zero(&self) -> bool {
        self.collapsed
    }

    /// Whether the final value can take part in a weighted draw.
    pub fn is_positive(&self) -> bool {
        self.score() > 0.0
    }

    /// The named base contributions, in insertion order.
    pub fn bases(&self) -> &[(String, f64)] {
        &self.bases
    }

    /// The named modifiers, in insertion order.
    pub fn modifiers(&self) -> &[(String, f64)] {
        &self.modifiers
    }

    /// Value of a named modifier, if it was applied.
    pub fn modifier(&self, name: &str) -> Option<f64> {
        self.modifiers
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, factor)| factor)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.collapsed {
            return f.write_str("0 (n/a)");
        }
        write!(f, "{:.2} (", self.score())?;
        let mut first = true;
        for (name, value) in &self.bases {
            if !first {
                f.write_str(" + ")?;
            }
            write!(f, "{name}={value:.2}")?;
            first = false;
        }
        for (name, factor) in &self.modifiers {
            write!(f, ", {name} x{factor:.2}")?;
        }
        if let Some((min, max)) = self.range {
            write!(f, ", range [{min}, {max}]")?;
        }
        f.write_str(")")
    }
}
