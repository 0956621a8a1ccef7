//! Streaming DTMF symbol detector for 8 kHz audio
//!
//! Classifies short blocks of audio against the sixteen telephone keypad
//! tone pairs using a fixed-point Goertzel filter bank, then debounces the
//! raw per-block classification into stable, timed detection events per
//! ETSI ES 201 235-3.

pub mod classifier;
pub mod clock;
pub mod debounce;
pub mod detector;
pub mod error;
pub mod fixed;
pub mod generator;
pub mod goertzel;
pub mod symbol;
pub mod window;

pub use clock::{Clock, SystemClock};
pub use debounce::DetectorState;
pub use detector::DtmfDetector;
pub use error::{DtmfError, Result};
pub use generator::DtmfGenerator;
pub use symbol::DtmfSymbol;

// Configuration constants
pub const SAMPLE_RATE: usize = 8000;

/// Analysis window length (~17 ms at 8 kHz)
pub const WINDOW_SAMPLES: usize = 136;

/// Default block size handed to `process_block` (8 ms at 8 kHz)
pub const DEFAULT_BLOCK_SIZE: usize = 64;

// ETSI ES 201 235-3 timing requirements. A symbol must persist for at
// least MIN_SYMBOL_MS to be reported, the gap between symbols must be at
// least MIN_GAP_MS, and a confirmed symbol survives interruptions of up
// to MAX_DROP_MS.
pub const MIN_SYMBOL_MS: usize = 40;
pub const MIN_GAP_MS: usize = 40;
pub const MAX_DROP_MS: usize = 20;
