use rand::rngs::{StdRng, ThreadRng};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Chooses which of an intent's responses is returned.
pub trait ResponsePicker {
    fn pick<'a>(&mut self, pool: &'a [String]) -> Option<&'a str>;
}

/// Always the first response in the pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstResponse;

impl ResponsePicker for FirstResponse {
    fn pick<'a>(&mut self, pool: &'a [String]) -> Option<&'a str> {
        pool.first().map(String::as_str)
    }
}

/// Uniformly random response drawn from the wrapped generator.
#[derive(Debug, Clone)]
pub struct RandomResponse<R> {
    rng: R,
}

impl<R: Rng> RandomResponse<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomResponse<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl RandomResponse<ThreadRng> {
    pub fn from_thread_rng() -> Self {
        Self::new(rand::thread_rng())
    }
}

impl<R: Rng> ResponsePicker for RandomResponse<R> {
    fn pick<'a>(&mut self, pool: &'a [String]) -> Option<&'a str> {
        pool.choose(&mut self.rng).map(String::as_str)
    }
}
