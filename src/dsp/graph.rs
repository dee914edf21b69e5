//! Audio context — a node graph rendered on demand, one quantum at a time.
//!
//! Control code builds nodes, connects them, and submits parameter automation
//! against absolute context times. The render path only consumes what has
//! already been submitted. Source nodes are single-use: once started they
//! cannot be started again, and once finished they are discarded together
//! with any processing nodes left without inputs.

use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::{ContextError, GraphError};

use super::filter::{BiquadFilter, FilterType};
use super::mixer::Mixer;
use super::noise::NoiseBuffer;
use super::oscillator::{Oscillator, Waveform};
use super::param::AudioParam;

/// Frames rendered per block; control-side timers fire at this granularity.
pub const RENDER_QUANTUM: usize = 128;

/// Sample rates a context can be created with.
pub const MIN_SAMPLE_RATE: u32 = 3000;
pub const MAX_SAMPLE_RATE: u32 = 768_000;

const DEFAULT_OSC_FREQUENCY: f64 = 440.0;
const DEFAULT_FILTER_FREQUENCY: f64 = 350.0;
const DEFAULT_FILTER_Q: f64 = 1.0;

/// Handle to a node. Stale handles (to discarded nodes) are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// Automatable parameters a node may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Gain,
    Frequency,
    Q,
}

impl Param {
    pub fn name(self) -> &'static str {
        match self {
            Param::Gain => "gain",
            Param::Frequency => "frequency",
            Param::Q => "Q",
        }
    }
}

/// Node kind tag, for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Destination,
    Gain,
    Filter,
    Oscillator,
    BufferSource,
}

/// Where a source node is in its one-shot lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Unscheduled,
    Scheduled,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Default)]
struct SourceTimes {
    start: Option<f64>,
    stop: Option<f64>,
}

impl SourceTimes {
    fn state_at(&self, time: f64) -> PlaybackState {
        match self.start {
            None => PlaybackState::Unscheduled,
            Some(start) if time < start => PlaybackState::Scheduled,
            Some(_) => match self.stop {
                Some(stop) if time >= stop => PlaybackState::Finished,
                _ => PlaybackState::Playing,
            },
        }
    }
}

#[derive(Debug)]
enum NodeKind {
    Destination,
    Gain {
        gain: AudioParam,
    },
    Filter {
        filter: BiquadFilter,
        frequency: AudioParam,
        q: AudioParam,
    },
    Oscillator {
        osc: Oscillator,
        frequency: AudioParam,
        times: SourceTimes,
    },
    BufferSource {
        buffer: Arc<NoiseBuffer>,
        position: usize,
        times: SourceTimes,
    },
}

impl NodeKind {
    fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Destination => NodeType::Destination,
            NodeKind::Gain { .. } => NodeType::Gain,
            NodeKind::Filter { .. } => NodeType::Filter,
            NodeKind::Oscillator { .. } => NodeType::Oscillator,
            NodeKind::BufferSource { .. } => NodeType::BufferSource,
        }
    }

    fn param(&self, which: Param) -> Option<&AudioParam> {
        match (self, which) {
            (NodeKind::Gain { gain }, Param::Gain) => Some(gain),
            (NodeKind::Filter { frequency, .. }, Param::Frequency) => Some(frequency),
            (NodeKind::Filter { q, .. }, Param::Q) => Some(q),
            (NodeKind::Oscillator { frequency, .. }, Param::Frequency) => Some(frequency),
            _ => None,
        }
    }

    fn param_mut(&mut self, which: Param) -> Option<&mut AudioParam> {
        match (self, which) {
            (NodeKind::Gain { gain }, Param::Gain) => Some(gain),
            (NodeKind::Filter { frequency, .. }, Param::Frequency) => Some(frequency),
            (NodeKind::Filter { q, .. }, Param::Q) => Some(q),
            (NodeKind::Oscillator { frequency, .. }, Param::Frequency) => Some(frequency),
            _ => None,
        }
    }

    fn times_mut(&mut self) -> Option<&mut SourceTimes> {
        match self {
            NodeKind::Oscillator { times, .. } | NodeKind::BufferSource { times, .. } => {
                Some(times)
            }
            _ => None,
        }
    }

    fn playback_state(&self, time: f64) -> Option<PlaybackState> {
        match self {
            NodeKind::Oscillator { times, .. } => Some(times.state_at(time)),
            NodeKind::BufferSource {
                buffer,
                position,
                times,
            } => {
                if *position >= buffer.len() {
                    Some(PlaybackState::Finished)
                } else {
                    Some(times.state_at(time))
                }
            }
            _ => None,
        }
    }
}

#[derive(Debug)]
struct NodeEntry {
    kind: NodeKind,
    /// Audio inputs (slot indices), summed.
    inputs: Vec<usize>,
    /// Modulation inputs, summed into the named parameter.
    modulators: Vec<(Param, usize)>,
    /// Pinned nodes are never discarded.
    pinned: bool,
}

impl NodeEntry {
    fn is_discardable(&self, time: f64) -> bool {
        if self.pinned {
            return false;
        }
        match &self.kind {
            NodeKind::Destination => false,
            NodeKind::Gain { .. } | NodeKind::Filter { .. } => self.inputs.is_empty(),
            source => source.playback_state(time) == Some(PlaybackState::Finished),
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<NodeEntry>,
}

/// The software audio context: node arena, clock, and renderer.
#[derive(Debug)]
pub struct AudioContext {
    sample_rate: u32,
    /// Frames rendered so far; the clock.
    frame: u64,
    slots: Vec<Slot>,
    free: Vec<usize>,
    destination: NodeId,
    /// Processing order (sources first), rebuilt when the topology changes.
    order: Vec<usize>,
    order_dirty: bool,
    /// Latest output of every slot.
    outputs: Vec<f64>,
    mixer: Mixer,
}

impl AudioContext {
    pub fn new(sample_rate: u32) -> Result<Self, ContextError> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(ContextError::UnsupportedSampleRate {
                rate: sample_rate,
                min: MIN_SAMPLE_RATE,
                max: MAX_SAMPLE_RATE,
            });
        }

        let mut ctx = AudioContext {
            sample_rate,
            frame: 0,
            slots: Vec::new(),
            free: Vec::new(),
            destination: NodeId {
                index: 0,
                generation: 0,
            },
            order: Vec::new(),
            order_dirty: true,
            outputs: Vec::new(),
            mixer: Mixer::new(),
        };
        ctx.destination = ctx.insert(NodeKind::Destination, true);
        Ok(ctx)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Seconds of audio rendered so far.
    pub fn current_time(&self) -> f64 {
        self.frame as f64 / self.sample_rate as f64
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    // ── Node construction ───────────────────────────────────

    pub fn create_gain(&mut self, value: f64) -> NodeId {
        let gain = AudioParam::new(value, self.current_time());
        self.insert(NodeKind::Gain { gain }, false)
    }

    pub fn create_biquad_filter(&mut self, filter_type: FilterType) -> NodeId {
        let now = self.current_time();
        let kind = NodeKind::Filter {
            filter: BiquadFilter::new(filter_type, self.sample_rate as f64),
            frequency: AudioParam::new(DEFAULT_FILTER_FREQUENCY, now),
            q: AudioParam::new(DEFAULT_FILTER_Q, now),
        };
        self.insert(kind, false)
    }

    pub fn create_oscillator(&mut self, waveform: Waveform) -> NodeId {
        let kind = NodeKind::Oscillator {
            osc: Oscillator::new(waveform, self.sample_rate as f64),
            frequency: AudioParam::new(DEFAULT_OSC_FREQUENCY, self.current_time()),
            times: SourceTimes::default(),
        };
        self.insert(kind, false)
    }

    /// A one-shot player over a shared buffer. The buffer is not copied.
    pub fn create_buffer_source(&mut self, buffer: Arc<NoiseBuffer>) -> NodeId {
        let kind = NodeKind::BufferSource {
            buffer,
            position: 0,
            times: SourceTimes::default(),
        };
        self.insert(kind, false)
    }

    /// Exempt a node from automatic discard.
    pub fn pin(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.entry_mut(id)?.pinned = true;
        Ok(())
    }

    // ── Routing ─────────────────────────────────────────────

    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.entry(from)?;
        let target = self.entry_mut(to)?;
        if !target.inputs.contains(&from.index) {
            target.inputs.push(from.index);
        }
        self.order_dirty = true;
        Ok(())
    }

    /// Route `from`'s output into a parameter of `to`; it is summed with the
    /// parameter's automated value.
    pub fn connect_param(&mut self, from: NodeId, to: NodeId, param: Param) -> Result<(), GraphError> {
        self.entry(from)?;
        let target = self.entry_mut(to)?;
        if target.kind.param(param).is_none() {
            return Err(GraphError::NoSuchParam(to.to_string(), param.name()));
        }
        if !target.modulators.contains(&(param, from.index)) {
            target.modulators.push((param, from.index));
        }
        self.order_dirty = true;
        Ok(())
    }

    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        match (self.entry(from), self.entry(to)) {
            (Ok(_), Ok(target)) => target.inputs.contains(&from.index),
            _ => false,
        }
    }

    pub fn is_param_connected(&self, from: NodeId, to: NodeId, param: Param) -> bool {
        match (self.entry(from), self.entry(to)) {
            (Ok(_), Ok(target)) => target.modulators.contains(&(param, from.index)),
            _ => false,
        }
    }

    // ── Parameters ──────────────────────────────────────────

    pub fn param(&self, id: NodeId, param: Param) -> Result<&AudioParam, GraphError> {
        self.entry(id)?
            .kind
            .param(param)
            .ok_or_else(|| GraphError::NoSuchParam(id.to_string(), param.name()))
    }

    pub fn param_mut(&mut self, id: NodeId, param: Param) -> Result<&mut AudioParam, GraphError> {
        self.entry_mut(id)?
            .kind
            .param_mut(param)
            .ok_or_else(|| GraphError::NoSuchParam(id.to_string(), param.name()))
    }

    // ── Source lifecycle ────────────────────────────────────

    pub fn start_source(&mut self, id: NodeId, when: f64) -> Result<(), GraphError> {
        check_when(when)?;
        let times = self
            .entry_mut(id)?
            .kind
            .times_mut()
            .ok_or_else(|| GraphError::NotASource(id.to_string()))?;
        if times.start.is_some() {
            return Err(GraphError::AlreadyStarted(id.to_string()));
        }
        times.start = Some(when);
        Ok(())
    }

    pub fn stop_source(&mut self, id: NodeId, when: f64) -> Result<(), GraphError> {
        check_when(when)?;
        let times = self
            .entry_mut(id)?
            .kind
            .times_mut()
            .ok_or_else(|| GraphError::NotASource(id.to_string()))?;
        if times.start.is_none() {
            return Err(GraphError::NotStarted(id.to_string()));
        }
        times.stop = Some(when);
        Ok(())
    }

    pub fn playback_state(&self, id: NodeId) -> Result<PlaybackState, GraphError> {
        self.entry(id)?
            .kind
            .playback_state(self.current_time())
            .ok_or_else(|| GraphError::NotASource(id.to_string()))
    }

    // ── Inspection ──────────────────────────────────────────

    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_ok()
    }

    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.entry(id).ok().map(|e| e.kind.node_type())
    }

    /// Number of live nodes, destination included.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn count_of(&self, node_type: NodeType) -> usize {
        self.slots
            .iter()
            .filter_map(|s| s.node.as_ref())
            .filter(|e| e.kind.node_type() == node_type)
            .count()
    }

    // ── Rendering ───────────────────────────────────────────

    /// Render mono samples into `out`, advancing the clock by `out.len()` frames.
    pub fn render(&mut self, out: &mut [f32]) {
        for block in out.chunks_mut(RENDER_QUANTUM) {
            self.render_quantum(block);
            self.collect_finished();
        }
    }

    fn render_quantum(&mut self, out: &mut [f32]) {
        if self.order_dirty {
            self.rebuild_order();
        }

        let sample_rate = self.sample_rate as f64;
        let dest = self.destination.index;
        self.mixer.clear(out.len());

        for i in 0..out.len() {
            let time = (self.frame + i as u64) as f64 / sample_rate;
            for k in 0..self.order.len() {
                let idx = self.order[k];
                let value = self.process_node(idx, time);
                self.outputs[idx] = value;
            }
            self.mixer.add(i, self.outputs[dest]);
        }

        self.mixer.write_to(out);
        self.frame += out.len() as u64;
    }

    fn process_node(&mut self, idx: usize, time: f64) -> f64 {
        let outputs = &self.outputs;
        let Some(entry) = self.slots[idx].node.as_mut() else {
            return 0.0;
        };

        let input: f64 = entry.inputs.iter().map(|&j| outputs[j]).sum();
        let modulation = |param: Param| -> f64 {
            entry
                .modulators
                .iter()
                .filter(|(p, _)| *p == param)
                .map(|&(_, j)| outputs[j])
                .sum()
        };
        let gain_mod = modulation(Param::Gain);
        let freq_mod = modulation(Param::Frequency);
        let q_mod = modulation(Param::Q);

        match &mut entry.kind {
            NodeKind::Destination => input,
            NodeKind::Gain { gain } => input * (gain.value_at(time) + gain_mod),
            NodeKind::Filter {
                filter,
                frequency,
                q,
            } => {
                filter.set_frequency(frequency.value_at(time) + freq_mod);
                filter.set_q(q.value_at(time) + q_mod);
                filter.process(input)
            }
            NodeKind::Oscillator {
                osc,
                frequency,
                times,
            } => {
                if times.state_at(time) == PlaybackState::Playing {
                    osc.next_sample(frequency.value_at(time) + freq_mod)
                } else {
                    0.0
                }
            }
            NodeKind::BufferSource {
                buffer,
                position,
                times,
            } => {
                if times.state_at(time) == PlaybackState::Playing && *position < buffer.len() {
                    let s = buffer.sample(*position);
                    *position += 1;
                    s
                } else {
                    0.0
                }
            }
        }
    }

    /// Post-order walk from the destination so every node runs after its inputs.
    fn rebuild_order(&mut self) {
        let mut order = Vec::with_capacity(self.slots.len());
        let mut visited = vec![false; self.slots.len()];
        let mut stack = vec![(self.destination.index, false)];

        while let Some((idx, expanded)) = stack.pop() {
            if expanded {
                order.push(idx);
                continue;
            }
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            stack.push((idx, true));
            if let Some(entry) = &self.slots[idx].node {
                let upstream = entry
                    .inputs
                    .iter()
                    .copied()
                    .chain(entry.modulators.iter().map(|&(_, j)| j));
                for j in upstream {
                    if !visited[j] {
                        stack.push((j, false));
                    }
                }
            }
        }

        self.order = order;
        self.order_dirty = false;
    }

    /// Discard finished sources, then processing nodes left without inputs.
    fn collect_finished(&mut self) {
        let now = self.current_time();
        let mut removed = 0;
        loop {
            let doomed: Vec<usize> = self
                .slots
                .iter()
                .enumerate()
                .filter_map(|(i, slot)| {
                    let entry = slot.node.as_ref()?;
                    entry.is_discardable(now).then_some(i)
                })
                .collect();
            if doomed.is_empty() {
                break;
            }
            for &i in &doomed {
                self.remove(i);
            }
            removed += doomed.len();
        }
        if removed > 0 {
            debug!(
                "discarded {removed} finished nodes at t={now:.3}s, {} live",
                self.node_count()
            );
            self.order_dirty = true;
        }
    }

    fn remove(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        slot.node = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.outputs[index] = 0.0;
        self.free.push(index);
        for entry in self.slots.iter_mut().filter_map(|s| s.node.as_mut()) {
            entry.inputs.retain(|&j| j != index);
            entry.modulators.retain(|&(_, j)| j != index);
        }
    }

    // ── Arena ───────────────────────────────────────────────

    fn insert(&mut self, kind: NodeKind, pinned: bool) -> NodeId {
        let entry = NodeEntry {
            kind,
            inputs: Vec::new(),
            modulators: Vec::new(),
            pinned,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index].node = Some(entry);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(entry),
                });
                self.outputs.push(0.0);
                self.slots.len() - 1
            }
        };
        NodeId {
            index,
            generation: self.slots[index].generation,
        }
    }

    fn entry(&self, id: NodeId) -> Result<&NodeEntry, GraphError> {
        self.slots
            .get(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, GraphError> {
        self.slots
            .get_mut(id.index)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }
}

fn check_when(when: f64) -> Result<(), GraphError> {
    if !when.is_finite() {
        return Err(GraphError::NonFinite);
    }
    if when < 0.0 {
        return Err(GraphError::NegativeTime(when));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 8000;

    fn ctx() -> AudioContext {
        AudioContext::new(SR).unwrap()
    }

    fn peak(samples: &[f32]) -> f32 {
        samples.iter().fold(0.0_f32, |m, &s| m.max(s.abs()))
    }

    #[test]
    fn rejects_unsupported_sample_rate() {
        let err = AudioContext::new(0).unwrap_err();
        assert_eq!(
            err,
            ContextError::UnsupportedSampleRate {
                rate: 0,
                min: MIN_SAMPLE_RATE,
                max: MAX_SAMPLE_RATE
            }
        );
        assert!(AudioContext::new(1_000_000).is_err());
    }

    #[test]
    fn empty_context_renders_silence_and_advances_clock() {
        let mut c = ctx();
        let mut out = vec![1.0_f32; 800];
        c.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!((c.current_time() - 0.1).abs() < 1e-12);
        assert_eq!(c.node_count(), 1);
    }

    #[test]
    fn oscillator_plays_between_start_and_stop() {
        let mut c = ctx();
        let osc = c.create_oscillator(Waveform::Sawtooth);
        let gain = c.create_gain(0.5);
        c.connect(osc, gain).unwrap();
        c.connect(gain, c.destination()).unwrap();
        c.start_source(osc, 0.1).unwrap();
        c.stop_source(osc, 0.2).unwrap();

        let mut out = vec![0.0_f32; 2400]; // 0.3s
        c.render(&mut out);

        assert_eq!(peak(&out[..790]), 0.0, "silent before start");
        assert!(peak(&out[800..1600]) > 0.3, "audible while playing");
        assert_eq!(peak(&out[1610..]), 0.0, "silent after stop");
    }

    #[test]
    fn finished_sources_and_orphans_are_discarded() {
        let mut c = ctx();
        let bus = c.create_gain(1.0);
        c.pin(bus).unwrap();
        c.connect(bus, c.destination()).unwrap();

        let osc = c.create_oscillator(Waveform::Sine);
        let filter = c.create_biquad_filter(FilterType::Lowpass);
        let gain = c.create_gain(1.0);
        c.connect(osc, filter).unwrap();
        c.connect(filter, gain).unwrap();
        c.connect(gain, bus).unwrap();
        c.start_source(osc, 0.0).unwrap();
        c.stop_source(osc, 0.05).unwrap();
        assert_eq!(c.node_count(), 5);

        let mut out = vec![0.0_f32; 800];
        c.render(&mut out);

        assert!(!c.contains(osc));
        assert!(!c.contains(filter));
        assert!(!c.contains(gain));
        assert!(c.contains(bus), "pinned bus survives");
        assert_eq!(c.node_count(), 2);
    }

    #[test]
    fn stale_handle_rejected_after_slot_reuse() {
        let mut c = ctx();
        let osc = c.create_oscillator(Waveform::Sine);
        c.start_source(osc, 0.0).unwrap();
        c.stop_source(osc, 0.0).unwrap();
        let mut out = vec![0.0_f32; 128];
        c.render(&mut out);

        let reused = c.create_gain(1.0);
        assert!(!c.contains(osc));
        assert!(c.contains(reused));
        assert!(matches!(
            c.start_source(osc, 1.0),
            Err(GraphError::UnknownNode(_))
        ));
    }

    #[test]
    fn sources_are_single_use() {
        let mut c = ctx();
        let osc = c.create_oscillator(Waveform::Sine);
        c.start_source(osc, 0.0).unwrap();
        assert!(matches!(
            c.start_source(osc, 1.0),
            Err(GraphError::AlreadyStarted(_))
        ));

        let other = c.create_oscillator(Waveform::Sine);
        assert!(matches!(
            c.stop_source(other, 1.0),
            Err(GraphError::NotStarted(_))
        ));

        let gain = c.create_gain(1.0);
        assert!(matches!(
            c.start_source(gain, 0.0),
            Err(GraphError::NotASource(_))
        ));
    }

    #[test]
    fn buffer_sources_share_data() {
        let mut c = ctx();
        let noise = Arc::new(NoiseBuffer::generate(SR));
        let a = c.create_buffer_source(Arc::clone(&noise));
        let b = c.create_buffer_source(Arc::clone(&noise));
        assert_ne!(a, b);
        assert_eq!(Arc::strong_count(&noise), 3);
    }

    #[test]
    fn buffer_source_reads_noise() {
        let mut c = ctx();
        let noise = Arc::new(NoiseBuffer::generate(SR));
        let src = c.create_buffer_source(Arc::clone(&noise));
        c.connect(src, c.destination()).unwrap();
        c.start_source(src, 0.0).unwrap();
        c.stop_source(src, 0.1).unwrap();

        let mut out = vec![0.0_f32; 800];
        c.render(&mut out);
        assert!(peak(&out) > 0.1);
        assert!(!c.contains(src));
        assert_eq!(Arc::strong_count(&noise), 1, "discarded player drops its buffer handle");
    }

    #[test]
    fn param_modulation_is_summed() {
        let mut c = ctx();
        let lfo = c.create_oscillator(Waveform::Sine);
        let depth = c.create_gain(50.0);
        let filter = c.create_biquad_filter(FilterType::Lowpass);
        c.connect(lfo, depth).unwrap();
        c.connect_param(depth, filter, Param::Frequency).unwrap();
        assert!(c.is_param_connected(depth, filter, Param::Frequency));

        assert!(matches!(
            c.connect_param(depth, filter, Param::Gain),
            Err(GraphError::NoSuchParam(_, "gain"))
        ));
    }

    #[test]
    fn automation_drives_gain() {
        let mut c = ctx();
        let osc = c.create_oscillator(Waveform::Sawtooth);
        let gain = c.create_gain(0.0);
        c.connect(osc, gain).unwrap();
        c.connect(gain, c.destination()).unwrap();
        c.param_mut(gain, Param::Gain)
            .unwrap()
            .set_value_at_time(0.5, 0.05)
            .unwrap();
        c.start_source(osc, 0.0).unwrap();
        c.stop_source(osc, 0.1).unwrap();

        let mut out = vec![0.0_f32; 800];
        c.render(&mut out);
        assert_eq!(peak(&out[..390]), 0.0);
        assert!(peak(&out[410..790]) > 0.3);
    }

    #[test]
    fn playback_state_follows_clock() {
        let mut c = ctx();
        let osc = c.create_oscillator(Waveform::Sine);
        assert_eq!(c.playback_state(osc), Ok(PlaybackState::Unscheduled));
        c.start_source(osc, 0.05).unwrap();
        c.stop_source(osc, 1.0).unwrap();
        assert_eq!(c.playback_state(osc), Ok(PlaybackState::Scheduled));
        let mut out = vec![0.0_f32; 800];
        c.render(&mut out);
        assert_eq!(c.playback_state(osc), Ok(PlaybackState::Playing));
    }
}
