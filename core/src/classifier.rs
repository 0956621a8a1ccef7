//! Per-block symbol classification (the "valid signal condition")
//!
//! Runs the Goertzel estimator over the eight DTMF fundamentals plus the
//! second harmonics of the winning pair, then applies the validation
//! rules: signal floor, twist limits, in-group relative peak, and
//! harmonic rejection. One call per block; everything is fixed point and
//! fixed cost.

use crate::fixed::Q15;
use crate::goertzel::goertzel_power;
use crate::symbol::DtmfSymbol;
use crate::WINDOW_SAMPLES;

// Goertzel coefficients: 2 * cos(2*pi*f/8000) * 32767 for the row and
// column fundamentals (697/770/852/941 and 1209/1336/1477/1633 Hz).
const ROW_COEFFS: [i32; 4] = [55957, 53910, 51401, 48436];
const COL_COEFFS: [i32; 4] = [38144, 32648, 26168, 18629];

// Same, for twice each fundamental. Used to reject signals with strong
// second-order harmonic content (speech, clipped tones).
const ROW_HARMONIC_COEFFS: [i32; 4] = [30026, 23164, 15098, 6064];
const COL_HARMONIC_COEFFS: [i32; 4] = [-21130, -33004, -44635, -54942];

/// Acceptable reverse twist (row louder than column). Telephone lines and
/// de-emphasized FM audio attenuate the higher column group, so the limit
/// is the looser of the pair.
pub const REVERSE_TWIST_DB: f32 = -8.0;

/// Acceptable standard twist (column louder than row).
pub const STANDARD_TWIST_DB: f32 = -4.0;

/// A non-selected tone within a group must sit this far below the
/// selected one, or the pair is too ambiguous to call.
pub const RELATIVE_PEAK_DB: f32 = -8.0;

/// Column-harmonic rejection limit. The column harmonic bins (2418-3266
/// Hz) sit well clear of every fundamental, so the limit can be strict.
pub const COL_HARMONIC_LIMIT_DB: f32 = -20.0;

/// Row-harmonic rejection limit. The row harmonic bins (1394-1882 Hz) sit
/// inside the column band, and the 136-sample rectangular window leaks
/// the neighbouring column tone into them at about -11 dB, so this limit
/// must sit above that floor.
pub const ROW_HARMONIC_LIMIT_DB: f32 = -8.0;

/// Default minimum combined signal level.
pub const DEFAULT_SIGNAL_THRESHOLD_DBFS: f32 = -50.0;

/// The tunable rejection limits, precomputed to Q15 power ratios so the
/// per-block path never touches floating point.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Minimum combined row+column power (squared amplitude, Q15 scale).
    pub signal_floor: i32,
    pub reverse_twist: Q15,
    pub standard_twist: Q15,
    pub relative_peak: Q15,
    pub row_harmonic: Q15,
    pub col_harmonic: Q15,
}

impl Default for Thresholds {
    fn default() -> Thresholds {
        let mut thresholds = Thresholds {
            signal_floor: 0,
            reverse_twist: Q15::from_db_power(REVERSE_TWIST_DB),
            standard_twist: Q15::from_db_power(STANDARD_TWIST_DB),
            relative_peak: Q15::from_db_power(RELATIVE_PEAK_DB),
            row_harmonic: Q15::from_db_power(ROW_HARMONIC_LIMIT_DB),
            col_harmonic: Q15::from_db_power(COL_HARMONIC_LIMIT_DB),
        };
        thresholds.set_signal_floor_dbfs(DEFAULT_SIGNAL_THRESHOLD_DBFS);
        thresholds
    }
}

impl Thresholds {
    /// Reconfigure the minimum combined power from a dBFS level. The level
    /// is converted to an RMS amplitude and squared, so it compares
    /// directly against the estimator's power outputs.
    pub fn set_signal_floor_dbfs(&mut self, dbfs: f32) {
        let vrms = Q15::from_f32(dbfs_to_rms(dbfs));
        self.signal_floor = vrms.saturating_mul(vrms).raw() as i32;
    }
}

/// Full-scale sine reference: 0 dBFS is 1.0 peak-to-peak, 0.5 peak,
/// 0.354 RMS.
fn dbfs_to_rms(dbfs: f32) -> f32 {
    let vpp = 10f32.powf(dbfs / 20.0);
    (vpp / 2.0) * 0.707
}

/// Outcome of classifying one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// The symbol this window contains, if any.
    pub candidate: Option<DtmfSymbol>,
    /// Combined power of the winning pair, kept for diagnostics. Zero when
    /// the window never made it past the power scan.
    pub combined_power: i32,
}

impl Classification {
    fn none() -> Classification {
        Classification {
            candidate: None,
            combined_power: 0,
        }
    }

    fn rejected(combined_power: i32) -> Classification {
        Classification {
            candidate: None,
            combined_power,
        }
    }
}

/// Classify one full analysis window.
pub fn classify(window: &[i16; WINDOW_SAMPLES], thresholds: &Thresholds) -> Classification {
    // Normalize against the window's own peak so the validation ratios
    // are level-independent. The guarded divide holds by construction:
    // the peak is the largest magnitude in the window.
    let mut peak = Q15::ZERO;
    for &s in window.iter() {
        let mag = Q15(s).abs();
        if mag > peak {
            peak = mag;
        }
    }
    if peak == Q15::ZERO {
        return Classification::none();
    }
    let mut norm = [0i16; WINDOW_SAMPLES];
    for (dst, &s) in norm.iter_mut().zip(window.iter()) {
        *dst = Q15::frac_div(Q15(s), peak).raw();
    }

    let mut row_powers = [Q15::ZERO; 4];
    let mut col_powers = [Q15::ZERO; 4];
    let mut non_zero = false;
    for k in 0..4 {
        row_powers[k] = goertzel_power(&norm, ROW_COEFFS[k]);
        col_powers[k] = goertzel_power(&norm, COL_COEFFS[k]);
        if row_powers[k] > Q15::ZERO || col_powers[k] > Q15::ZERO {
            non_zero = true;
        }
    }
    // Degenerate input (DC, or a signal so small the bins quantize out)
    // is "no tone", not an error.
    if !non_zero {
        return Classification::none();
    }

    // The row and column winners are picked independently, each the
    // largest power within its own group.
    let (max_row, row_power) = peak_index(&row_powers);
    let (max_col, col_power) = peak_index(&col_powers);

    // The harmonic bins are measured before any of the reject checks so
    // every call costs the same worst case.
    let row_harmonic = goertzel_power(&norm, ROW_HARMONIC_COEFFS[max_row]);
    let col_harmonic = goertzel_power(&norm, COL_HARMONIC_COEFFS[max_col]);

    // The sum of the row and column peaks measures overall signal
    // strength better than either group alone; both are squared RMS
    // values so summing is sound.
    let combined = row_power.raw() as i32 + col_power.raw() as i32;
    if combined < thresholds.signal_floor {
        return Classification::rejected(combined);
    }

    // Twist checks. Each ratio puts the smaller power over the larger, so
    // the comparison against the limit is inverted.
    if row_power > col_power
        && Q15::frac_div(col_power, row_power) < thresholds.reverse_twist
    {
        return Classification::rejected(combined);
    }
    if col_power > row_power
        && Q15::frac_div(row_power, col_power) < thresholds.standard_twist
    {
        return Classification::rejected(combined);
    }

    // Within each group the winner must stand clear of its neighbours.
    for k in 0..4 {
        if k != max_row
            && Q15::frac_div(row_powers[k], row_power) > thresholds.relative_peak
        {
            return Classification::rejected(combined);
        }
        if k != max_col
            && Q15::frac_div(col_powers[k], col_power) > thresholds.relative_peak
        {
            return Classification::rejected(combined);
        }
    }

    // Harmonic rejection: genuine DTMF is a pair of clean sines, so
    // meaningful energy at twice either fundamental marks an imposter.
    if col_harmonic != Q15::ZERO
        && (col_harmonic > col_power
            || Q15::frac_div(col_harmonic, col_power) > thresholds.col_harmonic)
    {
        return Classification::rejected(combined);
    }
    if row_harmonic != Q15::ZERO
        && (row_harmonic > row_power
            || Q15::frac_div(row_harmonic, row_power) > thresholds.row_harmonic)
    {
        return Classification::rejected(combined);
    }

    Classification {
        candidate: Some(DtmfSymbol::from_grid(max_row, max_col)),
        combined_power: combined,
    }
}

/// Index and value of the largest strictly-positive power in the group;
/// `(0, ZERO)` when the group has none.
fn peak_index(powers: &[Q15; 4]) -> (usize, Q15) {
    let mut best = 0;
    let mut best_power = Q15::ZERO;
    for (k, &p) in powers.iter().enumerate() {
        if p > best_power {
            best_power = p;
            best = k;
        }
    }
    (best, best_power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{COL_FREQS, ROW_FREQS};
    use std::f64::consts::PI;

    fn to_q15(x: f64) -> i16 {
        (x * 32767.0) as i16
    }

    /// Steady two-tone window, phase-aligned, no envelope.
    fn pair_window(row_hz: f64, col_hz: f64, row_amp: f64, col_amp: f64) -> [i16; WINDOW_SAMPLES] {
        let mut out = [0i16; WINDOW_SAMPLES];
        for (i, s) in out.iter_mut().enumerate() {
            let t = i as f64 / 8000.0;
            *s = to_q15(
                row_amp * (2.0 * PI * row_hz * t).sin() + col_amp * (2.0 * PI * col_hz * t).sin(),
            );
        }
        out
    }

    fn db(d: f64) -> f64 {
        10f64.powf(d / 20.0)
    }

    #[test]
    fn test_coefficients_match_frequencies() {
        for k in 0..4 {
            let row = (2.0 * (2.0 * PI * ROW_FREQS[k] as f64 / 8000.0).cos() * 32767.0) as i32;
            assert_eq!(ROW_COEFFS[k], row);
            let col = (2.0 * (2.0 * PI * COL_FREQS[k] as f64 / 8000.0).cos() * 32767.0) as i32;
            assert_eq!(COL_COEFFS[k], col);
            let row_h =
                (2.0 * (2.0 * PI * 2.0 * ROW_FREQS[k] as f64 / 8000.0).cos() * 32767.0) as i32;
            assert_eq!(ROW_HARMONIC_COEFFS[k], row_h);
            let col_h =
                (2.0 * (2.0 * PI * 2.0 * COL_FREQS[k] as f64 / 8000.0).cos() * 32767.0) as i32;
            assert_eq!(COL_HARMONIC_COEFFS[k], col_h);
        }
    }

    #[test]
    fn test_all_sixteen_pairs_classify() {
        let thresholds = Thresholds::default();
        for row in 0..4 {
            for col in 0..4 {
                let window =
                    pair_window(ROW_FREQS[row] as f64, COL_FREQS[col] as f64, 0.25, 0.25);
                let result = classify(&window, &thresholds);
                assert_eq!(
                    result.candidate,
                    Some(DtmfSymbol::from_grid(row, col)),
                    "row {row} col {col}"
                );
                assert!(result.combined_power > 0);
            }
        }
    }

    #[test]
    fn test_silence_has_no_candidate() {
        let silence = [0i16; WINDOW_SAMPLES];
        let result = classify(&silence, &Thresholds::default());
        assert_eq!(result.candidate, None);
        assert_eq!(result.combined_power, 0);
    }

    #[test]
    fn test_dc_has_no_candidate() {
        let dc = [20000i16; WINDOW_SAMPLES];
        let result = classify(&dc, &Thresholds::default());
        assert_eq!(result.candidate, None);
    }

    #[test]
    fn test_excess_standard_twist_rejected() {
        // Column 9 dB above row: past the -4 dB standard twist limit
        let window = pair_window(697.0, 1209.0, 0.1, 0.1 * db(9.0));
        assert_eq!(classify(&window, &Thresholds::default()).candidate, None);
    }

    #[test]
    fn test_excess_reverse_twist_rejected() {
        // Row 9 dB above column: past the -8 dB reverse twist limit
        let window = pair_window(697.0, 1209.0, 0.1 * db(9.0), 0.1);
        assert_eq!(classify(&window, &Thresholds::default()).candidate, None);
    }

    #[test]
    fn test_tolerable_twist_accepted() {
        // 3 dB standard twist and 6 dB reverse twist are both within limits
        let window = pair_window(697.0, 1209.0, 0.2, 0.2 * db(3.0));
        assert_eq!(
            classify(&window, &Thresholds::default()).candidate,
            Some(DtmfSymbol::K1)
        );
        let window = pair_window(697.0, 1209.0, 0.2 * db(6.0), 0.2);
        assert_eq!(
            classify(&window, &Thresholds::default()).candidate,
            Some(DtmfSymbol::K1)
        );
    }

    fn harmonic_window(harmonic_hz: f64, harmonic_db: f64) -> [i16; WINDOW_SAMPLES] {
        let mut out = [0i16; WINDOW_SAMPLES];
        let level = 0.2;
        for (i, s) in out.iter_mut().enumerate() {
            let t = i as f64 / 8000.0;
            *s = to_q15(
                level * (2.0 * PI * 697.0 * t).sin()
                    + level * (2.0 * PI * 1209.0 * t).sin()
                    + level * db(harmonic_db) * (2.0 * PI * harmonic_hz * t).sin(),
            );
        }
        out
    }

    #[test]
    fn test_strong_row_harmonic_rejected() {
        // 1394 Hz is twice the 697 Hz row tone
        let window = harmonic_window(1394.0, -4.0);
        assert_eq!(classify(&window, &Thresholds::default()).candidate, None);
    }

    #[test]
    fn test_weak_row_harmonic_tolerated() {
        let window = harmonic_window(1394.0, -20.0);
        assert_eq!(
            classify(&window, &Thresholds::default()).candidate,
            Some(DtmfSymbol::K1)
        );
    }

    #[test]
    fn test_strong_col_harmonic_rejected() {
        // 2418 Hz is twice the 1209 Hz column tone
        let window = harmonic_window(2418.0, -10.0);
        assert_eq!(classify(&window, &Thresholds::default()).candidate, None);
    }

    #[test]
    fn test_weak_col_harmonic_tolerated() {
        let window = harmonic_window(2418.0, -30.0);
        assert_eq!(
            classify(&window, &Thresholds::default()).candidate,
            Some(DtmfSymbol::K1)
        );
    }

    #[test]
    fn test_signal_floor_rejects_when_raised() {
        let window = pair_window(697.0, 1209.0, 0.25, 0.25);
        let mut thresholds = Thresholds::default();
        assert!(classify(&window, &thresholds).candidate.is_some());
        // A floor above full scale rejects everything
        thresholds.set_signal_floor_dbfs(6.0);
        assert_eq!(classify(&window, &thresholds).candidate, None);
    }

    #[test]
    fn test_centered_short_block_classifies() {
        // An isolated 80-sample burst, zero-padded into the window center
        let mut block = [0i16; 80];
        for (i, s) in block.iter_mut().enumerate() {
            let t = i as f64 / 8000.0;
            *s = to_q15(
                0.25 * (2.0 * PI * 852.0 * t).sin() + 0.25 * (2.0 * PI * 1336.0 * t).sin(),
            );
        }
        let window = crate::window::HistoryWindow::centered(&block);
        let result = classify(&window, &Thresholds::default());
        assert_eq!(result.candidate, Some(DtmfSymbol::K8));
    }
}
