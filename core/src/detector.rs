//! The streaming detector: public per-block surface
//!
//! Owns the sliding window, the classifier thresholds, the debounce
//! machine, and a small queue of confirmed-but-unread symbols. One
//! instance per audio stream; single-threaded, no allocation after
//! construction.

use log::debug;

use crate::classifier::{classify, Thresholds};
use crate::clock::Clock;
use crate::debounce::{Debouncer, DebounceTiming, DetectorState};
use crate::symbol::DtmfSymbol;
use crate::window::HistoryWindow;
use crate::WINDOW_SAMPLES;

/// Confirmed symbols held until the caller polls them. Sized for a burst
/// of rapid-fire dialing; the oldest entry gives way if the caller falls
/// that far behind.
const DETECTION_QUEUE_CAPACITY: usize = 16;

#[derive(Debug)]
struct DetectionQueue {
    slots: [Option<DtmfSymbol>; DETECTION_QUEUE_CAPACITY],
    head: usize,
    len: usize,
}

impl DetectionQueue {
    fn new() -> DetectionQueue {
        DetectionQueue {
            slots: [None; DETECTION_QUEUE_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, symbol: DtmfSymbol) {
        if self.len == DETECTION_QUEUE_CAPACITY {
            debug!("detection queue full, dropping oldest symbol");
            self.head = (self.head + 1) % DETECTION_QUEUE_CAPACITY;
            self.len -= 1;
        }
        self.slots[(self.head + self.len) % DETECTION_QUEUE_CAPACITY] = Some(symbol);
        self.len += 1;
    }

    fn pop(&mut self) -> Option<DtmfSymbol> {
        if self.len == 0 {
            return None;
        }
        let symbol = self.slots[self.head].take();
        self.head = (self.head + 1) % DETECTION_QUEUE_CAPACITY;
        self.len -= 1;
        symbol
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Streaming DTMF detector for one 8 kHz audio stream.
pub struct DtmfDetector<C: Clock> {
    clock: C,
    window: HistoryWindow,
    thresholds: Thresholds,
    debouncer: Debouncer,
    detections: DetectionQueue,
    last_vsc_ms: Option<u32>,
    diag_power: i32,
}

impl<C: Clock> DtmfDetector<C> {
    /// Create a detector that consumes `block_size`-sample blocks.
    ///
    /// # Panics
    /// Panics unless `0 < block_size < WINDOW_SAMPLES`.
    pub fn new(clock: C, block_size: usize) -> DtmfDetector<C> {
        assert!(
            block_size > 0 && block_size < WINDOW_SAMPLES,
            "block size {block_size} must be shorter than the {WINDOW_SAMPLES}-sample window"
        );
        DtmfDetector {
            clock,
            window: HistoryWindow::new(block_size),
            thresholds: Thresholds::default(),
            debouncer: Debouncer::new(DebounceTiming::for_block_size(block_size)),
            detections: DetectionQueue::new(),
            last_vsc_ms: None,
            diag_power: 0,
        }
    }

    /// Reconfigure the minimum combined signal level. Activity below this
    /// level is never considered a symbol.
    pub fn set_signal_threshold(&mut self, dbfs: f32) {
        self.thresholds.set_signal_floor_dbfs(dbfs);
    }

    /// Feed the next block of samples, in temporal order.
    ///
    /// Advances the sliding window, classifies it, and steps the debounce
    /// machine; a newly confirmed symbol lands in the detection queue.
    ///
    /// # Panics
    /// Panics if `block.len()` differs from the configured block size.
    pub fn process_block(&mut self, block: &[f32]) {
        self.window.push_block(block);
        let result = classify(self.window.samples(), &self.thresholds);
        self.diag_power = result.combined_power;
        if result.candidate.is_some() {
            // Timestamp only; the clock stays off the classification path.
            self.last_vsc_ms = Some(self.clock.now_ms());
        }
        if let Some(symbol) = self.debouncer.step(result.candidate) {
            debug!("confirmed symbol '{symbol}'");
            self.detections.push(symbol);
        }
    }

    /// True when a confirmed symbol is waiting to be popped.
    pub fn is_detection_pending(&self) -> bool {
        !self.detections.is_empty()
    }

    /// Pop the oldest confirmed symbol. Returns `None`, and changes
    /// nothing, when no detection is pending.
    pub fn pop_detection(&mut self) -> Option<DtmfSymbol> {
        self.detections.pop()
    }

    /// The last time a block classified as a valid symbol, from the
    /// detector's clock. For tuning, not correctness.
    pub fn last_vsc_time(&self) -> Option<u32> {
        self.last_vsc_ms
    }

    /// Combined row+column power of the most recent block. For tuning.
    pub fn diag_power(&self) -> i32 {
        self.diag_power
    }

    /// Current debounce state, for diagnostics.
    pub fn state(&self) -> DetectorState {
        self.debouncer.state()
    }
}
