//! Unit scaling for throughput values: picks a power-of-1024 tier from a
//! reference maximum and expresses a value in that tier.

use std::fmt;

/// Unit labels, one per tier.
pub const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];

const SIGNIFICANT_DIGITS: i32 = 3;

/// Power-of-1024 bucket used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Tier {
    #[default]
    Bytes,
    Kilo,
    Mega,
    Giga,
    Tera,
}

impl Tier {
    const ALL: [Tier; 5] = [Tier::Bytes, Tier::Kilo, Tier::Mega, Tier::Giga, Tier::Tera];

    /// Tier for a reference maximum. Zero, negative and non-finite maxima map to bytes.
    pub fn for_max(reference_max: f64) -> Self {
        if !(reference_max.is_finite() && reference_max > 0.0) {
            return Tier::Bytes;
        }
        // log base 1024; log2 keeps exact powers of two exact
        let groups = (reference_max.log2() / 10.0).floor();
        let idx = groups.clamp(0.0, (UNITS.len() - 1) as f64) as usize;
        Self::ALL[idx]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        UNITS[self.index()]
    }

    pub fn divisor(self) -> f64 {
        1024f64.powi(self.index() as i32)
    }
}

/// A value expressed in a display tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaled {
    pub value: f64,
    pub tier: Tier,
}

impl Scaled {
    pub fn unit(&self) -> &'static str {
        self.tier.label()
    }
}

impl fmt::Display for Scaled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit())
    }
}

/// Scale `value` into the tier chosen by `reference_max`.
///
/// All labels drawn for one frame pass the same `reference_max` (the buffer's
/// running maximum), so they share a unit even when `value` itself would fit a
/// smaller one.
pub fn scale(value: f64, reference_max: f64) -> Scaled {
    if !(reference_max.is_finite() && reference_max > 0.0) {
        return Scaled {
            value,
            tier: Tier::Bytes,
        };
    }
    let tier = Tier::for_max(reference_max);
    Scaled {
        value: round_significant(value / tier.divisor(), SIGNIFICANT_DIGITS),
        tier,
    }
}

/// Round to `digits` significant digits. Zero and non-finite values pass through.
pub fn round_significant(v: f64, digits: i32) -> f64 {
    if v == 0.0 || !v.is_finite() {
        return v;
    }
    let magnitude = v.abs().log10().floor() as i32;
    let exp = digits - 1 - magnitude;
    let factor = 10f64.powi(exp);
    if factor.is_finite() {
        return (v * factor).round() / factor;
    }
    // Subnormal input: 10^exp overflows, so apply it in two halves.
    let (a, b) = (10f64.powi(exp / 2), 10f64.powi(exp - exp / 2));
    (v * a * b).round() / a / b
}
