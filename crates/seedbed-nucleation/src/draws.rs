//! Per-point uniform draws.
//!
//! A draw is a pure function of `(step, point)`, where `point` is the
//! global support-point id. The same physical point therefore sees the same
//! sample whichever partition owns it.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform samples in `[0, 1)`.
///
/// # Contract
///
/// `draw` must be deterministic in its arguments and must not depend on
/// call order.
pub trait UniformDraws: Send + Sync {
    /// Sample for global point `point` at step `step`.
    fn draw(&self, step: u64, point: u64) -> f64;
}

/// ChaCha8 keyed by `seed XOR step`, one stream per point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChaChaDraws {
    seed: u64,
}

impl ChaChaDraws {
    /// Draws keyed by `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl UniformDraws for ChaChaDraws {
    fn draw(&self, step: u64, point: u64) -> f64 {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed ^ step.rotate_left(32));
        rng.set_stream(point);
        rng.random::<f64>()
    }
}
