use thiserror::Error;

/// Top-level error for engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Audio context error: {0}")]
    Context(#[from] ContextError),
    #[error("Audio graph error: {0}")]
    Graph(#[from] GraphError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Failure to bring up the audio context itself.
#[derive(Debug, Error, PartialEq)]
pub enum ContextError {
    #[error("Unsupported sample rate {rate} Hz (expected {min}..={max})")]
    UnsupportedSampleRate { rate: u32, min: u32, max: u32 },
}

/// Misuse of the node graph or its parameter automation.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Node {0} does not exist (discarded or never created)")]
    UnknownNode(String),
    #[error("Node {0} has no parameter '{1}'")]
    NoSuchParam(String, &'static str),
    #[error("Node {0} is not a source")]
    NotASource(String),
    #[error("Source {0} has already been started")]
    AlreadyStarted(String),
    #[error("Source {0} was stopped before being started")]
    NotStarted(String),
    #[error("Non-finite automation value or time")]
    NonFinite,
    #[error("Automation time {0} is negative")]
    NegativeTime(f64),
    #[error("Exponential ramp target must be non-zero")]
    ExponentialRampToZero,
}

/// Rejected engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
