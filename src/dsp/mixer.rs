//! Mixer — the output stage that accumulates one render quantum from the destination.

/// A simple summing mixer that accumulates one block of destination samples.
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    buffer: Vec<f64>,
}

impl Mixer {
    pub fn new() -> Self {
        Mixer { buffer: Vec::new() }
    }

    /// Prepare a buffer of `num_samples` filled with zeros.
    pub fn clear(&mut self, num_samples: usize) {
        self.buffer.clear();
        self.buffer.resize(num_samples, 0.0);
    }

    /// Add a sample at the given index.
    pub fn add(&mut self, index: usize, sample: f64) {
        if let Some(slot) = self.buffer.get_mut(index) {
            *slot += sample;
        }
    }

    /// Write the block into `out` with soft clipping applied.
    pub fn write_to(&self, out: &mut [f32]) {
        for (dst, &s) in out.iter_mut().zip(&self.buffer) {
            *dst = soft_clip(s) as f32;
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Soft clipper using tanh to prevent harsh digital clipping.
fn soft_clip(x: f64) -> f64 {
    x.tanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer() {
        let mut m = Mixer::new();
        m.clear(128);
        let mut out = vec![1.0_f32; 128];
        m.write_to(&mut out);
        assert_eq!(m.len(), 128);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn accumulates_samples() {
        let mut m = Mixer::new();
        m.clear(4);
        m.add(0, 0.5);
        m.add(0, 0.3);
        m.add(1, 1.0);
        m.add(9, 1.0); // out of range, ignored
        let mut out = vec![0.0_f32; 4];
        m.write_to(&mut out);
        assert!((out[0] as f64 - soft_clip(0.8)).abs() < 1e-6);
        assert!((out[1] as f64 - soft_clip(1.0)).abs() < 1e-6);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn soft_clip_prevents_overflow() {
        let mut m = Mixer::new();
        m.clear(1);
        m.add(0, 100.0);
        let mut out = [0.0_f32; 1];
        m.write_to(&mut out);
        assert!(out[0].abs() <= 1.0, "Soft clip should keep output <= 1.0, got {}", out[0]);
    }
}
