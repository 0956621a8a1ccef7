//! Detection debouncing (the "detected signal condition")
//!
//! The classifier's per-block candidate flickers at tone edges and under
//! noise; this state machine turns it into stable detection events per
//! the ETSI ES 201 235-3 timing rules: a symbol must persist for 40 ms to
//! be reported, symbols must be separated by a 40 ms gap, and a confirmed
//! symbol survives interruptions of up to 20 ms. The machine advances
//! exactly once per block and reports each symbol occurrence exactly once.

use log::trace;

use crate::symbol::DtmfSymbol;
use crate::{MAX_DROP_MS, MIN_GAP_MS, MIN_SYMBOL_MS, SAMPLE_RATE};

/// Where the machine is in the life of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// No symbol in progress; the inter-symbol gap is accumulating.
    Invalid,
    /// A candidate has appeared and is being confirmed.
    PreDetection {
        symbol: DtmfSymbol,
        valid_blocks: u32,
    },
    /// The symbol persisted long enough and has been reported.
    Detected { symbol: DtmfSymbol },
    /// The confirmed symbol stopped matching; waiting out the drop window.
    Dropping {
        symbol: DtmfSymbol,
        drop_blocks: u32,
    },
}

/// The ETSI timing limits expressed in whole blocks, derived from the
/// actual block duration in use.
#[derive(Debug, Clone, Copy)]
pub struct DebounceTiming {
    /// Blocks of silence required before a new symbol may start (40 ms).
    pub min_gap_blocks: u32,
    /// Consecutive matching blocks required to confirm a symbol (40 ms).
    pub min_symbol_blocks: u32,
    /// Blocks a confirmed symbol may drop out before it ends (20 ms).
    pub max_drop_blocks: u32,
}

impl DebounceTiming {
    pub fn for_block_size(block_size: usize) -> DebounceTiming {
        DebounceTiming {
            min_gap_blocks: blocks_for_ms(MIN_GAP_MS, block_size),
            min_symbol_blocks: blocks_for_ms(MIN_SYMBOL_MS, block_size),
            max_drop_blocks: blocks_for_ms(MAX_DROP_MS, block_size),
        }
    }
}

/// Blocks covering at least `ms` milliseconds, rounded up.
fn blocks_for_ms(ms: usize, block_size: usize) -> u32 {
    let samples = ms * SAMPLE_RATE / 1000;
    ((samples + block_size - 1) / block_size) as u32
}

/// One step of the machine, as a pure function of the inputs.
///
/// `prior_gap_blocks` is the count of consecutive no-candidate blocks
/// seen before this one; it gates entry into `PreDetection` so a new
/// symbol is only accepted after the minimum inter-symbol gap. The second
/// return value is the confirmed symbol, emitted exactly on the
/// transition into `Detected`.
pub fn transition(
    state: DetectorState,
    prior_gap_blocks: u32,
    candidate: Option<DtmfSymbol>,
    timing: &DebounceTiming,
) -> (DetectorState, Option<DtmfSymbol>) {
    match state {
        DetectorState::Invalid => match candidate {
            Some(symbol) if prior_gap_blocks >= timing.min_gap_blocks => (
                DetectorState::PreDetection {
                    symbol,
                    valid_blocks: 1,
                },
                None,
            ),
            // A candidate arriving before the gap has elapsed is ignored;
            // it cannot restart the gap either, that is the caller's
            // streak counter.
            _ => (DetectorState::Invalid, None),
        },
        DetectorState::PreDetection {
            symbol,
            valid_blocks,
        } => match candidate {
            Some(c) if c == symbol => {
                let valid_blocks = valid_blocks + 1;
                if valid_blocks >= timing.min_symbol_blocks {
                    (DetectorState::Detected { symbol }, Some(symbol))
                } else {
                    (
                        DetectorState::PreDetection {
                            symbol,
                            valid_blocks,
                        },
                        None,
                    )
                }
            }
            // Any mismatch during confirmation resets outright.
            _ => (DetectorState::Invalid, None),
        },
        DetectorState::Detected { symbol } => match candidate {
            Some(c) if c == symbol => (state, None),
            _ => (
                DetectorState::Dropping {
                    symbol,
                    drop_blocks: 1,
                },
                None,
            ),
        },
        DetectorState::Dropping {
            symbol,
            drop_blocks,
        } => match candidate {
            // Recovered; the symbol was already reported, so nothing is
            // emitted here.
            Some(c) if c == symbol => (DetectorState::Detected { symbol }, None),
            _ => {
                let drop_blocks = drop_blocks + 1;
                if drop_blocks > timing.max_drop_blocks {
                    (DetectorState::Invalid, None)
                } else {
                    (
                        DetectorState::Dropping {
                            symbol,
                            drop_blocks,
                        },
                        None,
                    )
                }
            }
        },
    }
}

/// Stateful wrapper that owns the machine state and the gap streak.
#[derive(Debug)]
pub struct Debouncer {
    state: DetectorState,
    gap_blocks: u32,
    timing: DebounceTiming,
}

impl Debouncer {
    pub fn new(timing: DebounceTiming) -> Debouncer {
        Debouncer {
            state: DetectorState::Invalid,
            gap_blocks: 0,
            timing,
        }
    }

    /// Advance one block. Returns the confirmed symbol on the block that
    /// confirms it, `None` otherwise.
    pub fn step(&mut self, candidate: Option<DtmfSymbol>) -> Option<DtmfSymbol> {
        let prior_gap = self.gap_blocks;
        // The gap streak runs across every state so that the silence
        // accumulated during a drop still counts toward the next symbol's
        // leading gap.
        self.gap_blocks = if candidate.is_none() {
            self.gap_blocks.saturating_add(1)
        } else {
            0
        };
        let (next, emitted) = transition(self.state, prior_gap, candidate, &self.timing);
        if next != self.state {
            trace!("debounce: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        emitted
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }
}
