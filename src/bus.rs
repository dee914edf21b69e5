//! Master bus — the single summing gain every voice feeds.

use crate::dsp::graph::{AudioContext, NodeId, Param};
use crate::error::GraphError;

/// The master gain stage. Pinned so it outlives every transient voice.
#[derive(Debug, Clone, Copy)]
pub struct MasterBus {
    node: NodeId,
}

impl MasterBus {
    /// Create the bus at `gain` and route it to the context destination.
    pub fn new(ctx: &mut AudioContext, gain: f32) -> Result<Self, GraphError> {
        let node = ctx.create_gain(gain as f64);
        ctx.pin(node)?;
        ctx.connect(node, ctx.destination())?;
        Ok(MasterBus { node })
    }

    /// The node voices connect into.
    pub fn input(&self) -> NodeId {
        self.node
    }

    /// Set the gain instantly.
    ///
    /// The output stage soft-clips with `tanh`, so perceived level is not
    /// strictly linear in `value`: a full-scale signal at 0.3 comes out
    /// about 3% quieter.
    pub fn set_volume(&self, ctx: &mut AudioContext, value: f32) -> Result<(), GraphError> {
        ctx.param_mut(self.node, Param::Gain)?.set_value(value as f64)
    }

    pub fn volume(&self, ctx: &AudioContext) -> Result<f32, GraphError> {
        let gain = ctx.param(self.node, Param::Gain)?;
        Ok(gain.value_at(ctx.current_time()) as f32)
    }
}
