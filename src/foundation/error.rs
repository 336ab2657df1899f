/// Convenience result type used across tokenflow.
pub type FlowResult<T> = Result<T, FlowError>;

/// Top-level error taxonomy used by the public APIs.
///
/// Most of the pipeline is total by construction (empty token lists, unknown substeps and
/// selectors that match nothing are all silent no-ops), so errors only surface at the
/// boundaries: configuration, JSON input, rasterization and file IO.
#[derive(thiserror::Error, Debug)]
pub enum FlowError {
    /// Invalid user-provided configuration or step data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while computing token or block geometry.
    #[error("layout error: {0}")]
    Layout(String),

    /// Errors while serializing or rasterizing a scene.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while building or running animation scripts.
    #[error("timeline error: {0}")]
    Timeline(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowError {
    /// Build a [`FlowError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FlowError::Layout`] value.
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    /// Build a [`FlowError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`FlowError::Timeline`] value.
    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline(msg.into())
    }

    /// Build a [`FlowError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
