//! Error types for the engine binary.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: outpost_core::ConfigError,
    },

    /// A colony operation failed.
    #[error("colony error: {source}")]
    Colony {
        /// The underlying colony error.
        #[from]
        source: outpost_core::ColonyError,
    },

    /// The final snapshot could not be rendered.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying serializer error.
        #[from]
        source: serde_json::Error,
    },
}
