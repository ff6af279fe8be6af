//! Mutation operators.
//!
//! - [`flip_bits`] mutates an 8-bit gene by flipping each bit independently
//! - [`gaussian`] perturbs a real-valued gene with normal noise

use crate::GaRng;

/// Flips each of the 8 bits of `gene` with probability `rate`.
///
/// A rate of `0` returns the gene unchanged and a rate of `1` returns its
/// complement.
///
/// # Examples
///
/// ```
/// use evorobot_ga::{GaRng, mutation};
///
/// let mut rng = GaRng::with_seed(3);
/// assert_eq!(mutation::flip_bits(0b1010_0101, 0.0, &mut rng), 0b1010_0101);
/// assert_eq!(mutation::flip_bits(0b1010_0101, 1.0, &mut rng), 0b0101_1010);
/// ```
pub fn flip_bits(gene: u8, rate: f64, rng: &mut GaRng) -> u8 {
    let mut mask = 0_u8;
    for bit in 0..8 {
        if rng.drand() < rate {
            mask |= 1 << bit;
        }
    }
    gene ^ mask
}

/// Adds `N(0, std_dev)` noise to `value` with probability `rate`.
#[expect(clippy::cast_possible_truncation)]
pub fn gaussian(value: f32, rate: f64, std_dev: f64, rng: &mut GaRng) -> f32 {
    if rng.drand() < rate {
        value + rng.normal(0.0, std_dev) as f32
    } else {
        value
    }
}
