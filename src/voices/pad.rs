//! Dark pad — two detuned saws under a slowly swept lowpass.

use crate::dsp::filter::FilterType;
use crate::dsp::graph::{AudioContext, NodeId, Param};
use crate::dsp::oscillator::Waveform;
use crate::error::GraphError;

use super::Voice;

/// The 0.5 Hz difference beats slowly against itself.
pub const PAD_FREQUENCIES: [f64; 2] = [110.0, 110.5];
pub const CUTOFF_HZ: f64 = 400.0;
/// Resonance in dB.
pub const RESONANCE_Q: f64 = 5.0;
pub const LFO_HZ: f64 = 0.3;
/// Cutoff sweep depth in Hz (± around `CUTOFF_HZ`).
pub const LFO_DEPTH_HZ: f64 = 50.0;
pub const PAD_LEVEL: f64 = 0.15;
pub const FADE_IN_SECONDS: f64 = 2.0;

/// Node handles created for one pad iteration.
#[derive(Debug, Clone, Copy)]
pub struct PadNodes {
    pub oscillators: [NodeId; 2],
    pub lfo: NodeId,
    pub lfo_depth: NodeId,
    pub filter: NodeId,
    pub gain: NodeId,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DarkPadVoice;

impl DarkPadVoice {
    /// Build a fresh oscillator triple for one iteration.
    pub fn build(
        &self,
        ctx: &mut AudioContext,
        output: NodeId,
        start_time: f64,
        duration: f64,
    ) -> Result<PadNodes, GraphError> {
        let gain = ctx.create_gain(0.0);
        {
            let fade = ctx.param_mut(gain, Param::Gain)?;
            fade.set_value_at_time(0.0, start_time)?;
            fade.linear_ramp_to_value_at_time(PAD_LEVEL, start_time + FADE_IN_SECONDS)?;
        }
        ctx.connect(gain, output)?;

        let filter = ctx.create_biquad_filter(FilterType::Lowpass);
        ctx.param_mut(filter, Param::Frequency)?.set_value(CUTOFF_HZ)?;
        ctx.param_mut(filter, Param::Q)?.set_value(RESONANCE_Q)?;
        ctx.connect(filter, gain)?;

        let mut oscillators = Vec::with_capacity(PAD_FREQUENCIES.len());
        for &freq in &PAD_FREQUENCIES {
            let osc = ctx.create_oscillator(Waveform::Sawtooth);
            ctx.param_mut(osc, Param::Frequency)?.set_value(freq)?;
            ctx.connect(osc, filter)?;
            oscillators.push(osc);
        }

        let lfo = ctx.create_oscillator(Waveform::Sine);
        ctx.param_mut(lfo, Param::Frequency)?.set_value(LFO_HZ)?;
        let lfo_depth = ctx.create_gain(LFO_DEPTH_HZ);
        ctx.connect(lfo, lfo_depth)?;
        ctx.connect_param(lfo_depth, filter, Param::Frequency)?;

        let sources = [oscillators[0], oscillators[1], lfo];
        for &src in &sources {
            ctx.start_source(src, start_time)?;
        }
        for &src in &sources {
            ctx.stop_source(src, start_time + duration)?;
        }

        Ok(PadNodes {
            oscillators: [oscillators[0], oscillators[1]],
            lfo,
            lfo_depth,
            filter,
            gain,
        })
    }
}

impl Voice for DarkPadVoice {
    fn name(&self) -> &'static str {
        "dark pad"
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
