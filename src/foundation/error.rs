/// Convenience result type used across tickerfx.
pub type TickerResult<T> = Result<T, TickerError>;

/// Top-level error taxonomy used by filter APIs.
///
/// Per-frame compositing never returns these: they surface only from construction,
/// configuration loading and the command line front-end.
#[derive(thiserror::Error, Debug)]
pub enum TickerError {
    /// Invalid user-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Failures spawning or talking to the text source process.
    #[error("source error: {0}")]
    Source(String),

    /// Failures while shaping or rasterizing text.
    #[error("raster error: {0}")]
    Raster(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TickerError {
    /// Build a [`TickerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TickerError::Source`] value.
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Build a [`TickerError::Raster`] value.
    pub fn raster(msg: impl Into<String>) -> Self {
        Self::Raster(msg.into())
    }

    /// Build a [`TickerError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
