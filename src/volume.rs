//! Decibel gain values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// A level in decibels relative to full scale.
///
/// `0 dB` is unity gain; negative values attenuate. Amplitude ratios convert
/// with `10^(dB/20)` and power ratios with `10^(dB/10)`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volume(f64);

impl Volume {
    /// Unity gain.
    pub const UNITY: Self = Self(0.0);

    /// Creates a volume from a decibel value.
    pub const fn from_db(db: f64) -> Self {
        Self(db)
    }

    /// Creates a volume from a linear amplitude ratio. A ratio of zero maps to
    /// negative infinity.
    pub fn from_ratio(ratio: f64) -> Self {
        Self(20.0 * ratio.log10())
    }

    /// Creates a volume from a power ratio.
    pub fn from_power_ratio(ratio: f64) -> Self {
        Self(10.0 * ratio.log10())
    }

    /// The decibel value.
    pub const fn db(self) -> f64 {
        self.0
    }

    /// Linear amplitude ratio, `10^(dB/20)`.
    pub fn to_ratio(self) -> f64 {
        10f64.powf(self.0 / 20.0)
    }

    /// Power ratio, `10^(dB/10)`.
    pub fn to_power_ratio(self) -> f64 {
        10f64.powf(self.0 / 10.0)
    }

    /// True for exactly 0 dB.
    pub fn is_unity(self) -> bool {
        self.0 == 0.0
    }
}

impl From<f64> for Volume {
    fn from(db: f64) -> Self {
        Self(db)
    }
}

impl Add for Volume {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Volume {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Volume {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} dB", self.0)
    }
}
