/// Error types for configuration and the frame loop lifecycle

/// Errors raised while reading a stage configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("line {line}: expected `key = value`")]
    Syntax { line: usize },

    #[error("line {line}: unknown key `{key}`")]
    UnknownKey { line: usize, key: String },

    #[error("line {line}: invalid value `{value}` for `{key}`")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },

    #[error("camera near plane {near} must be closer than far plane {far}")]
    ClippingPlanes { near: f32, far: f32 },

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

/// Misuse of the frame loop lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoopError {
    #[error("frame loop is already running")]
    AlreadyRunning,

    #[error("frame loop was stopped and cannot be restarted")]
    Stopped,
}
