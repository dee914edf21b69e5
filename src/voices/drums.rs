//! Drum sequencer — kick, snare and hi-hat one-shots on a fixed beat grid.
//!
//! Every hit builds its own source node. Snare and hi-hat players all read
//! the same noise buffer; the data is shared, the player never is.

use std::sync::Arc;

use crate::dsp::filter::FilterType;
use crate::dsp::graph::{AudioContext, NodeId, Param};
use crate::dsp::noise::NoiseBuffer;
use crate::dsp::oscillator::Waveform;
use crate::error::GraphError;

use super::{BEAT_DURATION, Voice};

/// Percussion instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Drum {
    Kick,
    Snare,
    HiHat,
}

/// Shape of one percussive hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitShape {
    pub peak_gain: f64,
    /// Seconds for the gain to decay to `DECAY_FLOOR`; the source stops here too.
    pub decay: f64,
    /// Highpass cutoff for noise hits.
    pub highpass_hz: Option<f64>,
}

pub const DECAY_FLOOR: f64 = 0.01;
pub const KICK_START_HZ: f64 = 150.0;
/// Exponential ramps cannot reach zero; the sweep ends just above it.
pub const KICK_END_HZ: f64 = 0.01;

impl Drum {
    /// Which drums fire on beat `index` (kick, snare, hi-hat order).
    pub fn hits_on_beat(index: usize) -> Vec<Drum> {
        let mut hits = Vec::with_capacity(2);
        if index % 4 == 0 {
            hits.push(Drum::Kick);
        }
        if index % 4 == 2 {
            hits.push(Drum::Snare);
        }
        if index % 2 == 1 {
            hits.push(Drum::HiHat);
        }
        hits
    }

    pub fn shape(self) -> HitShape {
        match self {
            Drum::Kick => HitShape {
                peak_gain: 0.8,
                decay: 0.5,
                highpass_hz: None,
            },
            Drum::Snare => HitShape {
                peak_gain: 0.5,
                decay: 0.2,
                highpass_hz: Some(1000.0),
            },
            Drum::HiHat => HitShape {
                peak_gain: 0.15,
                decay: 0.1,
                highpass_hz: Some(5000.0),
            },
        }
    }
}

/// Number of whole beats that fit in `duration`.
pub fn beat_count(duration: f64, beat: f64) -> usize {
    (duration / beat).floor().max(0.0) as usize
}

/// Every (beat index, drum) trigger for one iteration, in beat order.
pub fn drum_pattern(duration: f64, beat: f64) -> Vec<(usize, Drum)> {
    (0..beat_count(duration, beat))
        .flat_map(|i| Drum::hits_on_beat(i).into_iter().map(move |d| (i, d)))
        .collect()
}

/// Node handles created for one hit.
#[derive(Debug, Clone, Copy)]
pub struct HitNodes {
    pub drum: Drum,
    pub source: NodeId,
    pub filter: Option<NodeId>,
    pub gain: NodeId,
}

/// Triggers fresh one-shots against a shared noise buffer.
#[derive(Debug, Clone)]
pub struct DrumSequencer {
    noise: Arc<NoiseBuffer>,
}

impl DrumSequencer {
    pub fn new(noise: Arc<NoiseBuffer>) -> Self {
        DrumSequencer { noise }
    }

    pub fn noise(&self) -> &Arc<NoiseBuffer> {
        &self.noise
    }

    /// Schedule every hit of one iteration and return the nodes built.
    pub fn build(
        &self,
        ctx: &mut AudioContext,
        output: NodeId,
        start_time: f64,
        duration: f64,
    ) -> Result<Vec<HitNodes>, GraphError> {
        drum_pattern(duration, BEAT_DURATION)
            .into_iter()
            .map(|(i, drum)| {
                let time = start_time + i as f64 * BEAT_DURATION;
                self.trigger(ctx, output, drum, time)
            })
            .collect()
    }

    /// Build one single-use hit at absolute `time`.
    pub fn trigger(
        &self,
        ctx: &mut AudioContext,
        output: NodeId,
        drum: Drum,
        time: f64,
    ) -> Result<HitNodes, GraphError> {
        let shape = drum.shape();
        let end = time + shape.decay;

        let gain = ctx.create_gain(1.0);
        {
            let env = ctx.param_mut(gain, Param::Gain)?;
            env.set_value_at_time(shape.peak_gain, time)?;
            env.exponential_ramp_to_value_at_time(DECAY_FLOOR, end)?;
        }
        ctx.connect(gain, output)?;

        let (source, filter) = match shape.highpass_hz {
            None => {
                let osc = ctx.create_oscillator(Waveform::Sine);
                let sweep = ctx.param_mut(osc, Param::Frequency)?;
                sweep.set_value_at_time(KICK_START_HZ, time)?;
                sweep.exponential_ramp_to_value_at_time(KICK_END_HZ, end)?;
                ctx.connect(osc, gain)?;
                (osc, None)
            }
            Some(cutoff) => {
                let player = ctx.create_buffer_source(Arc::clone(&self.noise));
                let hp = ctx.create_biquad_filter(FilterType::Highpass);
                ctx.param_mut(hp, Param::Frequency)?.set_value(cutoff)?;
                ctx.connect(player, hp)?;
                ctx.connect(hp, gain)?;
                (player, Some(hp))
            }
        };

        ctx.start_source(source, time)?;
        ctx.stop_source(source, end)?;

        Ok(HitNodes {
            drum,
            source,
            filter,
            gain,
        })
    }
}

impl Voice for DrumSequencer {
    fn name(&self) -> &'static str {
        "drums"
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
