use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Fixed-point quantity of work with four decimal places of precision.
///
/// Story progress accrues in fractional slices every tick; keeping the
/// arithmetic in scaled integers means two runs from the same seed agree
/// down to the last tick on every host.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Points(i64);

impl Points {
    pub const SCALE: i64 = 10_000;

    pub fn from_u32(value: u32) -> Self {
        Self((value as i64) * Self::SCALE)
    }

    pub fn from_f32(value: f32) -> Self {
        Self((value * Self::SCALE as f32).round() as i64)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn from_raw(value: i64) -> Self {
        Self(value)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / Self::SCALE as f32
    }

    /// Scales by an `f32` multiplier, rounding to the nearest raw unit.
    pub fn scaled(self, factor: f32) -> Self {
        Self((self.0 as f64 * factor as f64).round() as i64)
    }

    /// Splits evenly across `shares` recipients. Zero shares yields zero.
    pub fn split(self, shares: usize) -> Self {
        if shares == 0 {
            Self(0)
        } else {
            Self(self.0 / shares as i64)
        }
    }

    /// Adds `delta`, clamping the result into `[0, cap]`.
    pub fn accrue_clamped(self, delta: Points, cap: Points) -> Self {
        Self((self.0 + delta.0).clamp(0, cap.0.max(0)))
    }

    /// Fraction of `total` this quantity represents; zero when `total` is
    /// zero or negative.
    pub fn ratio_of(self, total: Points) -> f32 {
        if total.0 <= 0 {
            0.0
        } else {
            self.0 as f32 / total.0 as f32
        }
    }
}

impl Add for Points {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Points {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Points {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Points {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, value| acc + value)
    }
}

impl fmt::Debug for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.to_f32())
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.to_f32())
    }
}
