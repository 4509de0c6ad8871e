//! Frame synchronization
//!
//! Blind detection of the short training sequence by its periodicity.
//!
//! **Algorithm**:
//! 1. Correlate the buffer with itself one short-training period (nfft/4)
//!    later and sum the products over blocks of one period
//! 2. Moving sum of the block magnitudes over the expected number of
//!    repetitions gives one score per block
//! 3. Keep blocks whose score is a strict maximum of their neighbourhood and
//!    back off to the estimated frame start
//!
//! **Module Organization**:
//! - `score` - periodicity score
//! - `candidate` - peak picking and start offsets

mod score;
pub mod candidate;

pub use candidate::{find_peaks, synchronize};
pub use score::periodicity_score;

/// Peaks must beat every score within this many blocks on each side
pub const NEIGHBORHOOD: usize = 25;

/// Samples between the score peak and the frame start
pub const BACKOFF: usize = 64;

/// Zero blocks prepended before the cumulative sum
pub const LEADING_BLOCKS: usize = 5;

/// Configuration for the synchronizer
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Non-maximum suppression half width, in blocks
    pub neighborhood: usize,
    /// Samples subtracted from each peak position
    pub backoff: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            neighborhood: NEIGHBORHOOD,
            backoff: BACKOFF,
        }
    }
}
