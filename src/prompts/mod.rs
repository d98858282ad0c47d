//! Prompt source: a deterministic, seeded sample of the prompt pool.
//!
//! # Example
//!
//! ```rust
//! use ai_music_pipeline::prompts::sample;
//!
//! let first = sample(5, 42);
//! assert_eq!(first, sample(5, 42));
//! assert_eq!(first.len(), 5);
//! ```

pub mod pool;

pub use pool::PROMPT_POOL;

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Draw `n` prompts from [`PROMPT_POOL`].
///
/// The sequence depends only on `(n, seed)`. While `n` fits in the pool the
/// draw is without replacement; beyond that prompts repeat.
pub fn sample(n: usize, seed: u64) -> Vec<&'static str> {
    let mut rng = Pcg32::seed_from_u64(seed);

    if n <= PROMPT_POOL.len() {
        index::sample(&mut rng, PROMPT_POOL.len(), n)
            .into_iter()
            .map(|i| PROMPT_POOL[i])
            .collect()
    } else {
        (0..n)
            .map(|_| PROMPT_POOL[rng.gen_range(0..PROMPT_POOL.len())])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn zero_yields_empty() {
        assert!(sample(0, 7).is_empty());
    }

    #[test]
    fn same_arguments_same_sequence() {
        for n in [1, 10, 30, 45] {
            assert_eq!(sample(n, 42), sample(n, 42), "n = {n}");
        }
    }

    #[test]
    fn different_seeds_differ() {
        assert_ne!(sample(30, 1), sample(30, 2));
    }

    #[test]
    fn no_duplicates_up_to_pool_size() {
        for n in 0..=PROMPT_POOL.len() {
            let drawn = sample(n, 1234);
            let unique: HashSet<_> = drawn.iter().collect();
            assert_eq!(drawn.len(), n);
            assert_eq!(unique.len(), n, "duplicate prompt for n = {n}");
            assert!(drawn.iter().all(|p| PROMPT_POOL.contains(p)));
        }
    }

    #[test]
    fn full_pool_is_a_permutation() {
        let drawn: HashSet<_> = sample(PROMPT_POOL.len(), 9).into_iter().collect();
        let pool: HashSet<_> = PROMPT_POOL.iter().copied().collect();
        assert_eq!(drawn, pool);
    }

    #[test]
    fn oversized_request_samples_with_replacement() {
        let drawn = sample(100, 42);
        assert_eq!(drawn.len(), 100);
        assert!(drawn.iter().all(|p| PROMPT_POOL.contains(p)));
        let unique: HashSet<_> = drawn.iter().collect();
        assert!(unique.len() < 100);
    }
}
