//! Voices — the instruments of the looping score.
//!
//! Each voice builds fresh nodes for one loop iteration and submits all of
//! its automation against absolute context times.

pub mod bass;
pub mod drums;
pub mod pad;

pub use bass::BasslineVoice;
pub use drums::DrumSequencer;
pub use pad::DarkPadVoice;

use crate::dsp::graph::{AudioContext, NodeId};
use crate::error::GraphError;

/// Spacing of the beat grid shared by bass steps and drum hits, in seconds.
pub const BEAT_DURATION: f64 = 0.5;

/// A voice that schedules one loop iteration into a context.
pub trait Voice {
    fn name(&self) -> &'static str;

    /// Build this voice's nodes and automation for the iteration starting at
    /// `start_time` (absolute) and lasting `duration` seconds, routed into `output`.
    fn schedule(
        &self,
        ctx: &mut AudioContext,
        output: NodeId,
        start_time: f64,
        duration: f64,
    ) -> Result<(), GraphError>;
}
