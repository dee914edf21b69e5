//! DSP — pure Rust synthesis primitives and the node graph that runs them.
//!
//! The graph stands in for a platform audio context: control code submits
//! nodes and timestamped automation, and `AudioContext::render` produces
//! mono samples for an AudioWorklet or an offline renderer.

pub mod filter;
pub mod graph;
pub mod mixer;
pub mod noise;
pub mod oscillator;
pub mod param;
