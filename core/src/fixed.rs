//! Q15 fixed-point arithmetic
//!
//! A signed 16-bit value with 15 fractional bits: raw 32767 is just under
//! +1.0, raw -32768 is -1.0. Every operation here is total - out-of-range
//! results saturate and the guarded divide degrades to zero rather than
//! faulting - so the per-block hot path has no panic or overflow cases.

/// Q15 fixed-point scalar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Q15(pub i16);

impl Q15 {
    pub const ZERO: Q15 = Q15(0);
    pub const MAX: Q15 = Q15(i16::MAX);
    pub const MIN: Q15 = Q15(i16::MIN);

    /// Convert from a float in [-1.0, 1.0]. Values outside the
    /// representable range saturate.
    pub fn from_f32(v: f32) -> Q15 {
        Q15((v * 32767.0) as i16)
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 32767.0
    }

    pub fn raw(self) -> i16 {
        self.0
    }

    /// Absolute value; `MIN` maps to `MAX` since +1.0 is not representable.
    pub fn abs(self) -> Q15 {
        if self.0 == i16::MIN {
            Q15::MAX
        } else {
            Q15(self.0.abs())
        }
    }

    /// Fractional multiply: `(a * b) >> 15`, with the `-1.0 * -1.0` case
    /// saturating to `MAX`.
    pub fn saturating_mul(self, rhs: Q15) -> Q15 {
        if self.0 == i16::MIN && rhs.0 == i16::MIN {
            return Q15::MAX;
        }
        Q15(((self.0 as i32 * rhs.0 as i32) >> 15) as i16)
    }

    /// Guarded fractional divide.
    ///
    /// Requires `|num| <= |den|`; when the precondition is violated (or the
    /// divisor is zero) the result is `ZERO`, never a fault. Equal operands
    /// divide to `MAX` (as close to 1.0 as Q15 gets). Callers arrange their
    /// comparisons so the divisor is always the larger of the two values.
    pub fn frac_div(num: Q15, den: Q15) -> Q15 {
        let n = num.0 as i32;
        let d = den.0 as i32;
        if d == 0 {
            return Q15::ZERO;
        }
        if n == d {
            return Q15::MAX;
        }
        if n == -d {
            return Q15(-i16::MAX);
        }
        if d.abs() > n.abs() {
            Q15(((n << 15) / d) as i16)
        } else {
            Q15::ZERO
        }
    }

    /// A dB power ratio (`10^(db/10)`) as a Q15 fraction. Setup-time only;
    /// intended for non-positive ratios.
    pub fn from_db_power(db: f32) -> Q15 {
        Q15::from_f32(10f32.powf(db / 10.0))
    }
}
