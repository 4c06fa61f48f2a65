//! Splitting an article interval into scan chunks

use serde::{Deserialize, Serialize};

/// Inclusive article interval scanned by one worker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// First article number
    pub first: u64,
    /// Last article number (inclusive)
    pub last: u64,
}

impl Chunk {
    /// Number of article numbers in the chunk
    pub fn len(&self) -> u64 {
        self.last - self.first + 1
    }

    /// Always false; chunks hold at least one article number
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Split `[lower, upper]` into ascending chunks of at most `step` article numbers.
///
/// Chunks are contiguous and do not overlap; their union is exactly
/// `[lower, upper]`. A zero `step` is treated as one.
pub fn partition_range(lower: u64, upper: u64, step: u64) -> Vec<Chunk> {
    if lower > upper {
        return Vec::new();
    }
    let step = step.max(1);

    let mut chunks = Vec::with_capacity(((upper - lower) / step + 1) as usize);
    let mut first = lower;
    loop {
        let last = first.saturating_add(step - 1).min(upper);
        chunks.push(Chunk { first, last });
        if last == upper {
            break;
        }
        first = last + 1;
    }
    chunks
}
