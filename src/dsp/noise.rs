//! White-noise buffer shared by every percussion hit.

use rand::Rng;

/// Length of the noise buffer in seconds.
pub const NOISE_SECONDS: usize = 2;

/// An immutable mono buffer of uniform white noise in [-1, 1).
///
/// Generated once per graph lifetime and shared read-only (behind an `Arc`)
/// by every one-shot source that plays it.
#[derive(Debug, Clone)]
pub struct NoiseBuffer {
    data: Vec<f32>,
    sample_rate: u32,
}

impl NoiseBuffer {
    /// Generate `2 × sample_rate` samples from the thread-local RNG.
    pub fn generate(sample_rate: u32) -> Self {
        Self::generate_with(sample_rate, &mut rand::thread_rng())
    }

    /// Generate from a caller-supplied RNG.
    pub fn generate_with<R: Rng + ?Sized>(sample_rate: u32, rng: &mut R) -> Self {
        let len = NOISE_SECONDS * sample_rate as usize;
        let data = (0..len).map(|_| rng.gen_range(-1.0_f32..1.0)).collect();
        NoiseBuffer { data, sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.sample_rate as f64
    }

    /// Sample at `index`, or silence past the end.
    pub fn sample(&self, index: usize) -> f64 {
        self.data.get(index).map_or(0.0, |&s| s as f64)
    }

    pub fn samples(&self) -> &[f32] {
        &self.data
    }
}
