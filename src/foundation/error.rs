/// Convenience result type used across tokenforge.
pub type TokenResult<T> = Result<T, TokenError>;

/// Top-level error taxonomy used by the compositing APIs.
#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    /// An overlay source could not be read, was not a recognised format, or lacked the
    /// requested layer.
    #[error("decode error: {0}")]
    Decode(String),

    /// The layer rendering capability failed to rasterise a transformed layer.
    #[error("effects rendering error: {0}")]
    EffectsRendering(String),

    /// Invalid caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A composite could not be encoded for export.
    #[error("encode error: {0}")]
    Encode(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TokenError {
    /// Build a [`TokenError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`TokenError::EffectsRendering`] value.
    pub fn effects(msg: impl Into<String>) -> Self {
        Self::EffectsRendering(msg.into())
    }

    /// Build a [`TokenError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TokenError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// True for failures a preview caller should absorb by keeping its last good composite.
    pub fn is_recoverable_render_failure(&self) -> bool {
        matches!(self, Self::EffectsRendering(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
