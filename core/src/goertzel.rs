//! Fixed-point Goertzel power estimator
//!
//! Estimates signal power at a single target frequency with a two-pole
//! recursive filter - one pass over the window, no FFT. The coefficient is
//! `2 * cos(2*pi*f/fs)` scaled by 32767; since `2*cos` reaches 2.0 the
//! coefficient needs 17 bits and is carried as an `i32`.

use crate::fixed::Q15;

/// Input samples are shifted down this far before entering the recursion
/// so the filter state stays in range over the full window. Tied to the
/// 136-sample window length; revisit if the window changes.
pub const SAMPLE_SHIFT: u32 = 7;

/// Power of `samples` at the frequency selected by `coeff`.
///
/// The return value is a squared magnitude ("MS" rather than RMS - the
/// final root is never taken), so callers compare powers against powers.
/// Pure: no state, no error cases, cost fixed by the window length.
pub fn goertzel_power(samples: &[i16], coeff: i32) -> Q15 {
    let c = coeff as i64;
    let mut s1: i64 = 0;
    let mut s2: i64 = 0;

    for &sample in samples {
        let x = (sample >> SAMPLE_SHIFT) as i64;
        // The product carries an extra factor of 32767 from the
        // coefficient scaling; the shift removes the one the multiply
        // introduced on top of it.
        let r = ((c * s1) >> 15) - s2 + x;
        s2 = s1;
        s1 = r;
    }

    // Squared magnitude out of the final filter state. Every term is
    // 32767^2 high from the coefficient scaling.
    let mut p = s1 * s1 + s2 * s2 - ((c * s1) >> 15) * s2;
    // Remove the coefficient bias (squared) and re-introduce the input
    // scaling (squared). One bit less than the nominal 15 + 15: the
    // recursion output sits a factor of two below the textbook scaling.
    p >>= 14 + 15 - 2 * SAMPLE_SHIFT;

    Q15(p.clamp(i16::MIN as i64, i16::MAX as i64) as i16)
}
