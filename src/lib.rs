pub mod bus;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod renderer;
pub mod scheduler;
pub mod voices;

pub use config::EngineConfig;
pub use engine::{EngineState, MusicEngine};
pub use error::EngineError;

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the loopsynth-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn config_from_js(config: JsValue) -> Result<EngineConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(EngineConfig::default());
    }
    serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&format!("{e}")))
}

fn to_js(e: EngineError) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: the looping score engine, pulled from an AudioWorklet.
#[wasm_bindgen]
pub struct SynthEngine {
    inner: MusicEngine,
}

#[wasm_bindgen]
impl SynthEngine {
    /// `config` may be omitted for the default 44.1 kHz setup.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<SynthEngine, JsValue> {
        let config = config_from_js(config)?;
        let inner = MusicEngine::new(config).map_err(|e| to_js(e.into()))?;
        Ok(SynthEngine { inner })
    }

    pub fn init(&mut self) -> Result<(), JsValue> {
        self.inner.init().map_err(to_js)
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        self.inner.start().map_err(to_js)
    }

    pub fn stop(&mut self) {
        self.inner.stop();
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&mut self, value: f32) {
        self.inner.set_volume(value);
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.inner.is_playing()
    }

    /// Fill `out` with the next mono samples.
    pub fn render(&mut self, out: &mut [f32]) -> Result<(), JsValue> {
        self.inner.process(out).map_err(to_js)
    }
}

/// WASM-exposed: render `loops` loops to a WAV byte array.
#[wasm_bindgen]
pub fn render_loops_wav(config: JsValue, loops: u32) -> Result<Vec<u8>, JsValue> {
    let config = config_from_js(config)?;
    renderer::render_loops_wav(&config, loops).map_err(to_js)
}
