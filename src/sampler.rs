/*!

Reproducible binomial sampling. Every replica owns its own [`Sampler`]; there
is no process-global generator anywhere in the crate, so two runs with the
same seed and the same call sequence produce bit-identical draws no matter
what else is running.

*/

use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Binomial, Distribution};

use crate::error::WardsimError;

/// A seeded binomial sampler for one replica.
pub struct Sampler {
    seed: u64,
    rng: StdRng,
}

impl Sampler {
    /// Creates a sampler from an explicit seed, or from system entropy when
    /// `seed` is `None`. The realized seed is logged and always available
    /// through [`Sampler::seed`], so an entropy-seeded run can be repeated.
    pub fn new(seed: Option<u64>) -> Sampler {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        info!("using random number seed {seed}");
        Sampler {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// The realized seed this sampler draws from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derives the sampler for one replica of a batch: a deterministic
    /// stream that differs from the master's and from every other replica's,
    /// so concurrent replicas never share generator state.
    pub fn replica(&self, replica: u64) -> Sampler {
        let seed = self.seed ^ replica.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Sampler {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draws the number of successes in `trials` independent events of the
    /// given `probability`. The result is always in `[0, trials]`.
    pub fn draw(&mut self, trials: u64, probability: f64) -> Result<u64, WardsimError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(WardsimError::InvalidParameter(format!(
                "binomial probability {probability} must lie in [0, 1]"
            )));
        }

        let binomial = Binomial::new(trials, probability).map_err(|error| {
            WardsimError::InvalidParameter(format!("binomial({trials}, {probability}): {error}"))
        })?;
        Ok(binomial.sample(&mut self.rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Sampler::new(Some(12345));
        let mut b = Sampler::new(Some(12345));

        for round in 0_u64..50 {
            let trials = 10 + round * 3;
            let probability = f64::from(u32::try_from(round).unwrap() % 10) / 10.0;
            assert_eq!(
                a.draw(trials, probability).unwrap(),
                b.draw(trials, probability).unwrap()
            );
        }
    }

    #[test]
    fn explicit_seed_is_reported() {
        assert_eq!(Sampler::new(Some(7)).seed(), 7);
    }

    #[test]
    fn entropy_seed_is_reported_and_repeatable() {
        let mut original = Sampler::new(None);
        let mut repeat = Sampler::new(Some(original.seed()));

        for _ in 0..20 {
            assert_eq!(
                original.draw(100, 0.25).unwrap(),
                repeat.draw(100, 0.25).unwrap()
            );
        }
    }

    #[test]
    fn draws_stay_within_bounds() {
        let mut sampler = Sampler::new(Some(99));

        for trials in [0, 1, 10, 1000] {
            assert_eq!(sampler.draw(trials, 0.0).unwrap(), 0);
            assert_eq!(sampler.draw(trials, 1.0).unwrap(), trials);
            assert!(sampler.draw(trials, 0.3).unwrap() <= trials);
        }
    }

    #[test]
    fn invalid_probabilities_are_rejected() {
        let mut sampler = Sampler::new(Some(1));

        for probability in [-0.1, 1.1, f64::NAN] {
            let error = sampler.draw(10, probability).unwrap_err();
            assert!(matches!(error, WardsimError::InvalidParameter(_)));
        }
    }

    #[test]
    fn sample_mean_tracks_the_expectation() {
        let mut sampler = Sampler::new(Some(2024));
        let draws = 100_000_u64;

        let mut total = 0_u64;
        for _ in 0..draws {
            total += sampler.draw(100, 0.5).unwrap();
        }
        let mean = total as f64 / draws as f64;
        assert!((mean - 50.0).abs() < 0.5, "mean drifted to {mean}");
    }

    #[test]
    fn replica_streams_are_distinct_and_reproducible() {
        let master = Sampler::new(Some(42));

        let sequence = |mut sampler: Sampler| -> Vec<u64> {
            (0..20).map(|_| sampler.draw(1000, 0.5).unwrap()).collect()
        };

        let master_draws = sequence(Sampler::new(Some(42)));
        let first = sequence(master.replica(0));
        let second = sequence(master.replica(1));
        assert_ne!(first, master_draws);
        assert_ne!(first, second);

        let first_again = sequence(master.replica(0));
        assert_eq!(first, first_again);
    }
}
