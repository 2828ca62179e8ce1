//! Cost-oracle back-end (spec §4.5): turns a `CountingCoder`'s tallies into
//! a fixed per-context/bit fractional size table, used by the parser to
//! compare candidate parses without touching the real output bitstream.

use crate::entropy::counting::CountingCoder;
use crate::entropy::BIT_PRECISION;
use crate::lz_coder::{default_encode_number, number_k, Coder, NUM_CONTEXTS};

const MIN_SIZE: u32 = 2;
const MAX_SIZE: u32 = 12 << BIT_PRECISION;

fn size_for_count(count: u32, total: u32) -> u32 {
    // count-1 (Laplace) smoothing: every context/bit starts with one
    // phantom occurrence of each outcome so size() never sees count=0.
    let c = (count + 1) as f64;
    let t = (total + 2) as f64;
    let bits = (t / c).log2();
    let size = (bits * (1u32 << BIT_PRECISION) as f64).round() as i64;
    size.clamp(MIN_SIZE as i64, MAX_SIZE as i64) as u32
}

pub struct SizeMeasuringCoder {
    sizes: Vec<[u32; 2]>,
    number_cache: Option<NumberSizeCache>,
}

impl SizeMeasuringCoder {
    pub fn from_counts(counting: &CountingCoder) -> Self {
        let sizes = counting
            .contexts
            .iter()
            .map(|c| {
                let total = c.count0 + c.count1;
                [size_for_count(c.count0, total), size_for_count(c.count1, total)]
            })
            .collect();
        Self { sizes, number_cache: None }
    }

    /// Precompute `encode_number(base_context, n)` for `n = 2..=max_n` so
    /// repeated cost queries during parsing are O(1).
    pub fn with_number_cache(mut self, base_context: i32, max_n: u32) -> Self {
        self.number_cache = Some(NumberSizeCache::build(&self.sizes, base_context, max_n));
        self
    }
}

impl Coder for SizeMeasuringCoder {
    fn code(&mut self, context: i32, bit: u32) -> u32 {
        self.sizes[context as usize][bit as usize]
    }

    fn encode_number(&mut self, base_context: i32, n: u32) -> u32 {
        if let Some(cache) = &self.number_cache {
            if cache.base_context == base_context {
                if let Some(size) = cache.size_for(n) {
                    return size;
                }
            }
        }
        default_encode_number(self, base_context, n)
    }
}

struct NumberSizeCache {
    base_context: i32,
    /// `sizes[n - 2]` is the cost of encoding `n`.
    sizes: Vec<u32>,
}

impl NumberSizeCache {
    fn build(context_sizes: &[[u32; 2]], base_context: i32, max_n: u32) -> Self {
        let len = max_n.saturating_sub(1) as usize;
        let mut sizes = Vec::with_capacity(len);
        for n in 2..=max_n.max(2) {
            let k = number_k(n) as i32;
            let lowerbound = 2u32 << number_k(n);
            let payload = n - lowerbound;
            let mut size = 0u32;
            for i in 0..k {
                size += context_sizes[(base_context + 2 * i + 2) as usize][1];
            }
            size += context_sizes[(base_context + 2 * k + 2) as usize][0];
            for i in (0..=k).rev() {
                let bit = ((payload >> i) & 1) as usize;
                size += context_sizes[(base_context + 2 * (k - i) + 1) as usize][bit];
            }
            sizes.push(size);
        }
        Self { base_context, sizes }
    }

    fn size_for(&self, n: u32) -> Option<u32> {
        self.sizes.get((n as usize).checked_sub(2)?).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_shrinks_as_evidence_grows() {
        assert!(size_for_count(0, 0) >= size_for_count(100, 200));
    }

    #[test]
    fn uniform_counts_cost_about_one_bit() {
        let size = size_for_count(50, 100);
        let one_bit = 1u32 << BIT_PRECISION;
        assert!((size as i64 - one_bit as i64).abs() <= 2);
    }

    #[test]
    fn number_cache_matches_uncached_cost() {
        let counting = CountingCoder::new();
        let base = NUM_CONTEXTS as i32 - 32;
        let uncached = SizeMeasuringCoder::from_counts(&counting);
        let mut uncached = uncached;
        let cached = SizeMeasuringCoder::from_counts(&counting).with_number_cache(base, 64);
        let mut cached = cached;
        for n in 2..64u32 {
            assert_eq!(uncached.encode_number(base, n), cached.encode_number(base, n));
        }
    }
}
