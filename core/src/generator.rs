//! DTMF tone synthesis
//!
//! Renders digit strings to 8 kHz sample buffers: one dual-tone burst per
//! digit with a silent gap between them, and a raised-cosine attack/decay
//! envelope on each burst to bound key-click splatter. Used by the CLI
//! generator and as the signal source for the detector's own tests.

use std::f32::consts::PI;

use crate::error::{DtmfError, Result};
use crate::symbol::DtmfSymbol;
use crate::SAMPLE_RATE;

/// ETSI-style default on/off cadence (ms).
const DEFAULT_ON_MS: usize = 80;
const DEFAULT_OFF_MS: usize = 80;

/// Attack/decay ramp length (ms).
const DEFAULT_ENVELOPE_MS: f32 = 3.0;

#[derive(Debug, Clone)]
pub struct DtmfGenerator {
    /// Peak amplitude of each tone, linear. The two tones sum, so full
    /// scale for the pair is twice this.
    tone_level: f32,
    /// Column tone level relative to the row tone, dB.
    twist_db: f32,
    on_ms: usize,
    off_ms: usize,
    envelope_ms: f32,
}

impl Default for DtmfGenerator {
    fn default() -> DtmfGenerator {
        DtmfGenerator {
            // -6 dBFS for the pair
            tone_level: 0.25,
            twist_db: 0.0,
            on_ms: DEFAULT_ON_MS,
            off_ms: DEFAULT_OFF_MS,
            envelope_ms: DEFAULT_ENVELOPE_MS,
        }
    }
}

impl DtmfGenerator {
    pub fn new() -> DtmfGenerator {
        DtmfGenerator::default()
    }

    /// Set the combined pair level in dBFS; each tone gets half the
    /// amplitude.
    pub fn set_level_dbfs(&mut self, dbfs: f32) {
        self.tone_level = 10f32.powf(dbfs / 20.0) / 2.0;
    }

    /// Set the column tone level relative to the row tone. Positive is
    /// standard twist (column louder), negative is reverse twist.
    pub fn set_twist(&mut self, db: f32) {
        self.twist_db = db;
    }

    /// Set the tone/silence cadence used by `generate`.
    pub fn set_timing(&mut self, on_ms: usize, off_ms: usize) {
        self.on_ms = on_ms;
        self.off_ms = off_ms;
    }

    /// Render one symbol as a `duration_ms` dual-tone burst.
    pub fn symbol_samples(&self, symbol: DtmfSymbol, duration_ms: usize) -> Vec<f32> {
        let n = SAMPLE_RATE * duration_ms / 1000;
        let (row_hz, col_hz) = symbol.frequencies();
        let col_level = self.tone_level * 10f32.powf(self.twist_db / 20.0);
        // Ramp no longer than half the burst
        let env_len = ((self.envelope_ms * SAMPLE_RATE as f32 / 1000.0) as usize).min(n / 2);

        let mut samples = Vec::with_capacity(n);
        for i in 0..n {
            let t = i as f32 / SAMPLE_RATE as f32;
            let mut s = self.tone_level * (2.0 * PI * row_hz as f32 * t).sin()
                + col_level * (2.0 * PI * col_hz as f32 * t).sin();
            if env_len > 0 {
                if i < env_len {
                    let p = i as f32 / env_len as f32;
                    s *= (PI / 2.0 * p).sin().powi(2);
                } else if i >= n - env_len {
                    let p = (n - 1 - i) as f32 / env_len as f32;
                    s *= (PI / 2.0 * p).sin().powi(2);
                }
            }
            samples.push(s);
        }
        samples
    }

    /// Render a digit string with the configured cadence.
    pub fn generate(&self, digits: &str) -> Result<Vec<f32>> {
        let mut samples = Vec::new();
        for c in digits.chars() {
            let symbol = DtmfSymbol::from_char(c).ok_or(DtmfError::InvalidDigit(c))?;
            samples.extend(self.symbol_samples(symbol, self.on_ms));
            samples.extend(std::iter::repeat(0.0).take(SAMPLE_RATE * self.off_ms / 1000));
        }
        Ok(samples)
    }
}
