//! Metrics calculation utilities.

use serde::Deserialize;

/// Expected hashes per unit of share difficulty for Blake2b pools.
pub const BLAKE2B_HASH_CONSTANT: f64 = 4_295_032_833_000.0;

/// Conversion from summed difficulty to hashrate. Both values depend on the mining
/// algorithm and on the unit scale the pool reports difficulty in.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HashrateParams {
    #[serde(default = "default_hash_constant")]
    pub hash_constant: f64,
    #[serde(default = "default_unit_divisor")]
    pub unit_divisor: f64,
}

fn default_hash_constant() -> f64 {
    BLAKE2B_HASH_CONSTANT
}

fn default_unit_divisor() -> f64 {
    1000.0
}

impl Default for HashrateParams {
    fn default() -> Self {
        Self {
            hash_constant: default_hash_constant(),
            unit_divisor: default_unit_divisor(),
        }
    }
}

/// Calculate hashrate from summed share difficulty.
///
/// Hashrate = sum_difficulty * hash_constant / window_seconds / unit_divisor
///
/// A zero window or zero divisor yields 0.0.
pub fn derive_hashrate(sum_difficulty: f64, window_seconds: u64, params: &HashrateParams) -> f64 {
    if window_seconds == 0 || params.unit_divisor == 0.0 {
        0.0
    } else {
        sum_difficulty * params.hash_constant / window_seconds as f64 / params.unit_divisor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_hashrate_basic() {
        // 2 * 1000 * 4295032833000 / 300 / 1000 = 28,633,552,220
        let hashrate = derive_hashrate(2000.0, 300, &HashrateParams::default());
        assert!((hashrate - 28_633_552_220.0).abs() < 1e-3);
    }

    #[test]
    fn test_derive_hashrate_zero_window() {
        assert_eq!(derive_hashrate(100.0, 0, &HashrateParams::default()), 0.0);
    }

    #[test]
    fn test_derive_hashrate_zero_divisor() {
        let params = HashrateParams {
            hash_constant: 1.0,
            unit_divisor: 0.0,
        };
        assert_eq!(derive_hashrate(100.0, 10, &params), 0.0);
    }

    #[test]
    fn test_derive_hashrate_custom_params() {
        // Bitcoin style: 2^32 hashes per difficulty, no unit scaling
        let params = HashrateParams {
            hash_constant: 4_294_967_296.0,
            unit_divisor: 1.0,
        };
        assert_eq!(derive_hashrate(100.0, 10, &params), 42_949_672_960.0);
    }
}
