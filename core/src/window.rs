//! Sliding sample history
//!
//! The classifier always sees exactly `WINDOW_SAMPLES` samples. Incoming
//! blocks are shorter than the window, so consecutive windows overlap;
//! the buffer shifts the old tail out and converts the new block to
//! 16-bit PCM in place. Fixed storage, no allocation.

use crate::fixed::Q15;
use crate::WINDOW_SAMPLES;

#[derive(Debug)]
pub struct HistoryWindow {
    samples: [i16; WINDOW_SAMPLES],
    block_size: usize,
}

impl HistoryWindow {
    /// # Panics
    /// Panics unless `0 < block_size < WINDOW_SAMPLES`.
    pub fn new(block_size: usize) -> HistoryWindow {
        assert!(
            block_size > 0 && block_size < WINDOW_SAMPLES,
            "block size {block_size} must be shorter than the {WINDOW_SAMPLES}-sample window"
        );
        HistoryWindow {
            samples: [0; WINDOW_SAMPLES],
            block_size,
        }
    }

    /// Shift the history left by one block and append `block` at the tail,
    /// converting float samples (nominally in [-1.0, 1.0]) to Q15 PCM.
    ///
    /// # Panics
    /// Panics if `block.len()` differs from the configured block size -
    /// that is a caller bug, not a runtime condition.
    pub fn push_block(&mut self, block: &[f32]) {
        assert_eq!(
            block.len(),
            self.block_size,
            "block length must match the configured block size"
        );
        let preserve = WINDOW_SAMPLES - self.block_size;
        self.samples.copy_within(self.block_size.., 0);
        for (dst, &s) in self.samples[preserve..].iter_mut().zip(block) {
            *dst = Q15::from_f32(s).raw();
        }
    }

    pub fn samples(&self) -> &[i16; WINDOW_SAMPLES] {
        &self.samples
    }

    /// A full window with `block` zero-padded into the center. For one-shot
    /// classification of an isolated short block, where there is no history
    /// to overlap with.
    ///
    /// # Panics
    /// Panics if `block` is longer than the window.
    pub fn centered(block: &[i16]) -> [i16; WINDOW_SAMPLES] {
        assert!(
            block.len() <= WINDOW_SAMPLES,
            "block length {} exceeds the window",
            block.len()
        );
        let mut out = [0i16; WINDOW_SAMPLES];
        let start = (WINDOW_SAMPLES - block.len()) / 2;
        out[start..start + block.len()].copy_from_slice(block);
        out
    }
}
