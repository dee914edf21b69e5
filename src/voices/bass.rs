//! Bassline — one sawtooth through a resonant lowpass, re-pitched per step.

use crate::dsp::filter::FilterType;
use crate::dsp::graph::{AudioContext, NodeId, Param};
use crate::dsp::oscillator::Waveform;
use crate::error::GraphError;

use super::{BEAT_DURATION, Voice};

/// Step frequencies in Hz: A1 root with its fourth and fifth in just intonation.
pub const BASS_NOTES: [f64; 8] = [55.0, 55.0, 82.5, 55.0, 73.5, 55.0, 82.5, 73.5];

pub const CUTOFF_HZ: f64 = 200.0;
/// Resonance in dB.
pub const RESONANCE_Q: f64 = 2.0;
pub const STEP_GAIN: f64 = 0.4;
pub const DECAY_FLOOR: f64 = 0.01;
/// Fraction of a step over which each pluck decays to the floor.
pub const DECAY_FRACTION: f64 = 0.8;

/// Node handles created for one bassline iteration.
#[derive(Debug, Clone, Copy)]
pub struct BassNodes {
    pub oscillator: NodeId,
    pub filter: NodeId,
    pub gain: NodeId,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BasslineVoice;

impl BasslineVoice {
    /// Build the oscillator → filter → gain chain and automate every step.
    ///
    /// The oscillator spans the whole iteration; only its frequency and the
    /// gain envelope change per step.
    pub fn build(
        &self,
        ctx: &mut AudioContext,
        output: NodeId,
        start_time: f64,
        duration: f64,
    ) -> Result<BassNodes, GraphError> {
        let gain = ctx.create_gain(STEP_GAIN);
        ctx.connect(gain, output)?;

        let oscillator = ctx.create_oscillator(Waveform::Sawtooth);

        let filter = ctx.create_biquad_filter(FilterType::Lowpass);
        ctx.param_mut(filter, Param::Frequency)?.set_value(CUTOFF_HZ)?;
        ctx.param_mut(filter, Param::Q)?.set_value(RESONANCE_Q)?;

        ctx.connect(oscillator, filter)?;
        ctx.connect(filter, gain)?;

        for (i, &freq) in BASS_NOTES.iter().enumerate() {
            let time = start_time + i as f64 * BEAT_DURATION;
            ctx.param_mut(oscillator, Param::Frequency)?
                .set_value_at_time(freq, time)?;
            let env = ctx.param_mut(gain, Param::Gain)?;
            env.set_value_at_time(STEP_GAIN, time)?;
            env.exponential_ramp_to_value_at_time(DECAY_FLOOR, time + BEAT_DURATION * DECAY_FRACTION)?;
        }

        ctx.start_source(oscillator, start_time)?;
        ctx.stop_source(oscillator, start_time + duration)?;

        Ok(BassNodes {
            oscillator,
            filter,
            gain,
        })
    }
}

impl Voice for BasslineVoice {
    fn name(&self) -> &'static str {
        "bassline"
    }

    fn schedule(
        &self,
        ctx: &mut AudioContext,
        output: NodeId,
        start_time: f64,
        duration: f64,
    ) -> Result<(), GraphError> {
        self.build(ctx, output, start_time, duration).map(|_| ())
    }
}
