/// Convenience result type used across the crate.
pub type LyricDanceResult<T> = Result<T, LyricDanceError>;

/// Top-level error taxonomy for the I/O-adjacent parts of the pipeline.
///
/// Pure derivations (frame state, grades, kinetic effects, lighting) never produce these; they are
/// total over their input domain and fall back to documented defaults instead.
#[derive(thiserror::Error, Debug)]
pub enum LyricDanceError {
    /// Invalid user-provided or upstream data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while decoding or analysing audio.
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Errors while acquiring a drawing context or rasterizing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LyricDanceError {
    /// Build a [`LyricDanceError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LyricDanceError::Analysis`] value.
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }

    /// Build a [`LyricDanceError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LyricDanceError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for LyricDanceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
