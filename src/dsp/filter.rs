//! Biquad lowpass and highpass filters.
//!
//! Q is a resonance in dB, as on a browser BiquadFilterNode: the gain at
//! the cutoff frequency is `10^(Q/20)`.

use std::f64::consts::PI;

/// Filter type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterType {
    Lowpass,
    Highpass,
}

/// A biquad IIR filter (2nd order).
///
/// Implements the standard Direct Form II Transposed structure.
/// Coefficient formulas from the Audio EQ Cookbook (Robert Bristow-Johnson).
/// Cutoff is clamped below Nyquist so a modulated or high cutoff never
/// produces an unstable filter at low sample rates.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    pub filter_type: FilterType,
    frequency: f64,
    q: f64,

    // Coefficients
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    // State (Direct Form II Transposed)
    z1: f64,
    z2: f64,

    sample_rate: f64,
    dirty: bool,
}

impl BiquadFilter {
    pub fn new(filter_type: FilterType, sample_rate: f64) -> Self {
        let mut f = BiquadFilter {
            filter_type,
            frequency: 350.0,
            q: 1.0,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
            sample_rate,
            dirty: true,
        };
        f.update_coefficients();
        f
    }

    /// Recompute filter coefficients from current parameters.
    pub fn update_coefficients(&mut self) {
        let nyquist = self.sample_rate / 2.0;
        let freq = self.frequency.clamp(1.0, nyquist * 0.999);
        let q_linear = 10.0_f64.powf(self.q / 20.0);

        let w0 = 2.0 * PI * freq / self.sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q_linear);

        let (b0, b1, b2, a0, a1, a2) = match self.filter_type {
            FilterType::Lowpass => {
                let b1 = 1.0 - cos_w0;
                let b0 = b1 / 2.0;
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
            FilterType::Highpass => {
                let b0 = (1.0 + cos_w0) / 2.0;
                let b1 = -(1.0 + cos_w0);
                (b0, b1, b0, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
            }
        };

        // Normalize by a0
        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = a1 / a0;
        self.a2 = a2 / a0;
        self.dirty = false;
    }

    /// Process a single sample through the filter.
    pub fn process(&mut self, input: f64) -> f64 {
        if self.dirty {
            self.update_coefficients();
        }

        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }

    /// Set frequency; coefficients are only recomputed when it actually changes.
    pub fn set_frequency(&mut self, freq: f64) {
        if freq != self.frequency {
            self.frequency = freq;
            self.dirty = true;
        }
    }

    pub fn set_q(&mut self, q: f64) {
        if q != self.q {
            self.q = q;
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine_peak(f: &mut BiquadFilter, freq: f64, sample_rate: f64) -> f64 {
        let mut max_out = 0.0_f64;
        for i in 0..4410 {
            let t = i as f64 / sample_rate;
            let out = f.process((2.0 * PI * freq * t).sin());
            if i > 1000 {
                // skip transient
                max_out = max_out.max(out.abs());
            }
        }
        max_out
    }

    #[test]
    fn lowpass_passes_dc() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 44100.0);
        f.set_frequency(5000.0);

        let mut output = 0.0;
        for _ in 0..1000 {
            output = f.process(1.0);
        }
        assert!(
            (output - 1.0).abs() < 0.001,
            "Lowpass should pass DC, got {output}"
        );
    }

    #[test]
    fn highpass_blocks_dc() {
        let mut f = BiquadFilter::new(FilterType::Highpass, 44100.0);
        f.set_frequency(1000.0);

        let mut output = 0.0;
        for _ in 0..1000 {
            output = f.process(1.0);
        }
        assert!(output.abs() < 0.001, "Highpass should block DC, got {output}");
    }

    #[test]
    fn lowpass_attenuates_high_freq() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 44100.0);
        f.set_frequency(200.0);
        f.set_q(2.0);

        let max_out = sine_peak(&mut f, 10000.0, 44100.0);
        assert!(
            max_out < 0.01,
            "Lowpass@200Hz should strongly attenuate 10kHz, got amplitude {max_out}"
        );
    }

    #[test]
    fn highpass_attenuates_low_freq() {
        let mut f = BiquadFilter::new(FilterType::Highpass, 44100.0);
        f.set_frequency(5000.0);

        let max_out = sine_peak(&mut f, 100.0, 44100.0);
        assert!(
            max_out < 0.01,
            "Highpass@5kHz should strongly attenuate 100Hz, got amplitude {max_out}"
        );
    }

    #[test]
    fn cutoff_above_nyquist_stays_stable() {
        let mut f = BiquadFilter::new(FilterType::Highpass, 8000.0);
        f.set_frequency(5000.0);

        for i in 0..10000 {
            let input = if i % 100 == 0 { 1.0 } else { 0.0 };
            let out = f.process(input);
            assert!(out.is_finite() && out.abs() < 10.0, "Unstable at sample {i}: {out}");
        }
    }

    #[test]
    fn resonance_is_in_decibels() {
        // Bass and pad settings: gain at cutoff is 10^(Q/20)
        for (cutoff, q) in [(200.0, 2.0), (400.0, 5.0)] {
            let mut f = BiquadFilter::new(FilterType::Lowpass, 44100.0);
            f.set_frequency(cutoff);
            f.set_q(q);

            let gain = sine_peak(&mut f, cutoff, 44100.0);
            let expected = 10.0_f64.powf(q / 20.0);
            assert!(
                (gain - expected).abs() < 0.02,
                "Q={q} dB at {cutoff} Hz: expected gain {expected:.3}, got {gain:.3}"
            );
        }
    }

    #[test]
    fn zero_db_q_is_flat_at_cutoff() {
        let mut f = BiquadFilter::new(FilterType::Highpass, 44100.0);
        f.set_frequency(1000.0);
        f.set_q(0.0);

        let gain = sine_peak(&mut f, 1000.0, 44100.0);
        assert!((gain - 1.0).abs() < 0.02, "expected unity at cutoff, got {gain:.3}");
    }

    #[test]
    fn negative_q_stays_stable() {
        let mut f = BiquadFilter::new(FilterType::Lowpass, 44100.0);
        f.set_frequency(1000.0);
        f.set_q(-40.0);

        for i in 0..10000 {
            let input = if i % 100 == 0 { 1.0 } else { 0.0 };
            let out = f.process(input);
            assert!(out.is_finite(), "Filter output not finite at sample {i}");
        }
    }
}
