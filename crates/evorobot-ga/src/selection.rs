//! Selection operators.

use crate::GaRng;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum SelectionError {
    #[display("cannot select from an empty set of candidates")]
    Empty,
}

/// Picks an index with probability proportional to `max(fitness, 0) + 1`.
///
/// Negative fitness counts as zero, so every candidate keeps a chance of
/// being chosen and a flat vector is sampled uniformly.
///
/// # Examples
///
/// ```
/// use evorobot_ga::{GaRng, selection};
///
/// let mut rng = GaRng::with_seed(9);
/// let chosen = selection::roulette_wheel(&[0.0, 4.0, 1.0], &mut rng).unwrap();
/// assert!(chosen < 3);
/// assert!(selection::roulette_wheel(&[], &mut rng).is_err());
/// ```
pub fn roulette_wheel(candidates: &[f64], rng: &mut GaRng) -> Result<usize, SelectionError> {
    if candidates.is_empty() {
        return Err(SelectionError::Empty);
    }
    let weight = |f: f64| f.max(0.0) + 1.0;
    let total: f64 = candidates.iter().copied().map(weight).sum();
    let mut raffle = rng.drand() * total;
    for (i, &f) in candidates.iter().enumerate() {
        raffle -= weight(f);
        if raffle < 0.0 {
            return Ok(i);
        }
    }
    Ok(candidates.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[expect(clippy::cast_precision_loss)]
    fn frequencies(candidates: &[f64], draws: usize, seed: u64) -> Vec<f64> {
        let mut rng = GaRng::with_seed(seed);
        let mut counts = vec![0_usize; candidates.len()];
        for _ in 0..draws {
            counts[roulette_wheel(candidates, &mut rng).unwrap()] += 1;
        }
        counts
            .into_iter()
            .map(|c| c as f64 / draws as f64)
            .collect()
    }

    #[test]
    fn test_proportional_to_shifted_fitness() {
        let freq = frequencies(&[0.0, 1.0, 2.0], 60_000, 1234);
        for (f, expected) in freq.iter().zip([1.0 / 6.0, 2.0 / 6.0, 3.0 / 6.0]) {
            assert!((f - expected).abs() < 0.01, "{freq:?}");
        }
    }

    #[test]
    fn test_flat_vector_is_uniform() {
        let freq = frequencies(&[3.0; 4], 40_000, 77);
        for f in &freq {
            assert!((f - 0.25).abs() < 0.01, "{freq:?}");
        }
    }

    #[test]
    fn test_negative_fitness_counts_as_zero() {
        let freq = frequencies(&[-50.0, 0.0], 20_000, 5);
        assert!((freq[0] - 0.5).abs() < 0.02, "{freq:?}");
    }

    #[test]
    fn test_empty() {
        let mut rng = GaRng::with_seed(1);
        assert!(matches!(roulette_wheel(&[], &mut rng), Err(SelectionError::Empty)));
    }
}
