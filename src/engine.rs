//! Music engine — lifecycle and look-ahead loop scheduling.
//!
//! The engine owns the whole audio graph through an explicit state tag:
//!
//! ```text
//! Uninitialized ──init──▶ Ready ──start──▶ Playing
//!       ▲                   │                 │
//!       └──────── stop ─────┴─────────────────┘
//! ```
//!
//! While playing, each loop iteration is scheduled `lookahead` seconds ahead
//! of the context clock, and the next iteration's timer is armed to fire
//! `rearmMarginMs` before the current one ends. The timer runs on the
//! context clock and is polled by `tick()`; `process()` polls it once per
//! render quantum, so hosts that pull audio get continuous playback for free.
//!
//! Dropping the engine tears the graph down exactly like `stop()`: playback
//! never outlives the engine value.

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::bus::MasterBus;
use crate::config::EngineConfig;
use crate::dsp::graph::{AudioContext, RENDER_QUANTUM};
use crate::dsp::noise::NoiseBuffer;
use crate::error::{ConfigError, EngineError, GraphError};
use crate::scheduler::{LoopTask, rearm_interval_ms};
use crate::voices::{BasslineVoice, DarkPadVoice, DrumSequencer, Voice};

/// Lifecycle state, as observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    /// Graph built, nothing scheduled.
    Ready,
    Playing,
}

/// Everything that lives exactly as long as one audio graph.
struct Session {
    ctx: AudioContext,
    master: MasterBus,
    noise: Arc<NoiseBuffer>,
    voices: Vec<Box<dyn Voice>>,
}

impl Session {
    fn open(config: &EngineConfig) -> Result<Self, EngineError> {
        let mut ctx = AudioContext::new(config.sample_rate)?;
        let master = MasterBus::new(&mut ctx, config.master_gain)?;
        let noise = Arc::new(NoiseBuffer::generate(ctx.sample_rate()));
        let voices: Vec<Box<dyn Voice>> = vec![
            Box::new(BasslineVoice),
            Box::new(DarkPadVoice),
            Box::new(DrumSequencer::new(Arc::clone(&noise))),
        ];
        debug!(
            "opened audio graph at {} Hz with {} noise samples",
            ctx.sample_rate(),
            noise.len()
        );
        Ok(Session {
            ctx,
            master,
            noise,
            voices,
        })
    }

    /// Every voice is submitted before the caller arms the next timer.
    fn schedule_iteration(&mut self, start_time: f64, duration: f64) -> Result<(), GraphError> {
        let output = self.master.input();
        for voice in &self.voices {
            voice.schedule(&mut self.ctx, output, start_time, duration)?;
            debug!("scheduled {} at t={start_time:.3}s", voice.name());
        }
        Ok(())
    }

    fn close(self) {
        debug!(
            "closing audio graph at t={:.3}s with {} live nodes",
            self.ctx.current_time(),
            self.ctx.node_count()
        );
    }
}

enum State {
    Uninitialized,
    Ready(Session),
    Playing(Session, LoopTask),
}

/// The procedural score engine.
pub struct MusicEngine {
    config: EngineConfig,
    state: State,
}

impl Default for MusicEngine {
    fn default() -> Self {
        MusicEngine {
            config: EngineConfig::default(),
            state: State::Uninitialized,
        }
    }
}

impl MusicEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(MusicEngine {
            config,
            state: State::Uninitialized,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        match self.state {
            State::Uninitialized => EngineState::Uninitialized,
            State::Ready(_) => EngineState::Ready,
            State::Playing(..) => EngineState::Playing,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, State::Playing(..))
    }

    /// Build the graph (master bus and noise buffer) if it does not exist yet.
    ///
    /// Fails only if the audio context itself cannot be created; the engine
    /// then stays uninitialized.
    pub fn init(&mut self) -> Result<(), EngineError> {
        if !matches!(self.state, State::Uninitialized) {
            return Ok(());
        }
        let session = Session::open(&self.config).inspect_err(|e| {
            warn!("audio graph could not be created: {e}");
        })?;
        self.state = State::Ready(session);
        Ok(())
    }

    /// Begin the continuous loop. No-op if already playing.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.is_playing() {
            return Ok(());
        }
        self.init()?;

        self.state = match std::mem::replace(&mut self.state, State::Uninitialized) {
            State::Ready(session) => State::Playing(session, LoopTask::new()),
            other => other,
        };
        info!(
            "playback started ({} s loop, {} ms re-arm)",
            self.config.loop_duration,
            rearm_interval_ms(self.config.loop_duration, self.config.rearm_margin_ms)
        );
        self.run_cycle()
    }

    /// Halt playback and tear the graph down. The next `start()` rebuilds
    /// the bus and noise buffer from scratch.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.state, State::Uninitialized) {
            State::Playing(session, task) => {
                info!("playback stopped after {} iterations", task.iterations());
                session.close();
            }
            State::Ready(session) => session.close(),
            State::Uninitialized => {}
        }
    }

    /// Set the master gain instantly. Ignored while no graph exists.
    pub fn set_volume(&mut self, value: f32) {
        if !value.is_finite() {
            warn!("ignoring non-finite volume {value}");
            return;
        }
        if let State::Ready(session) | State::Playing(session, _) = &mut self.state {
            if let Err(e) = session.master.set_volume(&mut session.ctx, value) {
                warn!("volume change failed: {e}");
            }
        }
    }

    /// Timer callback: schedule the next iteration if its timer has come due.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        let due = match &mut self.state {
            State::Playing(session, task) => task.take_due(session.ctx.current_time()),
            _ => false,
        };
        if due { self.run_cycle() } else { Ok(()) }
    }

    /// Host pull: render mono samples into `out`, firing the loop timer
    /// between render quanta. Writes silence while no graph exists.
    pub fn process(&mut self, out: &mut [f32]) -> Result<(), EngineError> {
        for block in out.chunks_mut(RENDER_QUANTUM) {
            self.tick()?;
            match &mut self.state {
                State::Ready(session) | State::Playing(session, _) => session.ctx.render(block),
                State::Uninitialized => block.fill(0.0),
            }
        }
        Ok(())
    }

    /// Schedule one iteration against a shared start time and re-arm.
    fn run_cycle(&mut self) -> Result<(), EngineError> {
        let State::Playing(session, task) = &mut self.state else {
            return Ok(());
        };

        let now = session.ctx.current_time();
        let start_time = now + self.config.lookahead;
        let scheduled = session.schedule_iteration(start_time, self.config.loop_duration);

        match scheduled {
            Ok(()) => {
                let n = task.record_iteration();
                task.arm(
                    now,
                    rearm_interval_ms(self.config.loop_duration, self.config.rearm_margin_ms),
                );
                debug!("loop iteration {n} starts at t={start_time:.3}s");
                Ok(())
            }
            Err(e) => {
                error!("loop iteration failed to schedule: {e}");
                self.stop();
                Err(e.into())
            }
        }
    }

    // ── Inspection ──────────────────────────────────────────

    /// Current master gain, if the graph exists.
    pub fn master_volume(&self) -> Option<f32> {
        self.session()
            .and_then(|s| s.master.volume(&s.ctx).ok())
    }

    /// The noise buffer of the current graph, if any.
    pub fn noise_buffer(&self) -> Option<Arc<NoiseBuffer>> {
        self.session().map(|s| Arc::clone(&s.noise))
    }

    /// Iterations scheduled since the last `start()`.
    pub fn iterations(&self) -> u64 {
        match &self.state {
            State::Playing(_, task) => task.iterations(),
            _ => 0,
        }
    }

    /// When the loop timer fires next, on the context clock.
    pub fn next_iteration_due(&self) -> Option<f64> {
        match &self.state {
            State::Playing(_, task) => task.due_at(),
            _ => None,
        }
    }

    /// Seconds of audio rendered by the current graph.
    pub fn current_time(&self) -> Option<f64> {
        self.session().map(|s| s.ctx.current_time())
    }

    pub fn context(&self) -> Option<&AudioContext> {
        self.session().map(|s| &s.ctx)
    }

    fn session(&self) -> Option<&Session> {
        match &self.state {
            State::Ready(session) | State::Playing(session, _) => Some(session),
            State::Uninitialized => None,
        }
    }
}

impl Drop for MusicEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
