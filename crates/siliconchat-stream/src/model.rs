use std::fmt;

/// Model identifier for the DeepSeek reasoning variant.
///
/// This is the only model that streams reasoning tokens ahead of its answer.
pub const DEEPSEEK_R1: &str = "deepseek-ai/DeepSeek-R1";

/// Model identifier for the DeepSeek chat variant (answer tokens only).
pub const DEEPSEEK_V3: &str = "deepseek-ai/DeepSeek-V3";

/// Identifier for the model variant serving a stream.
#[derive(Clone, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ModelId(pub String);

impl ModelId {
    /// Creates a model id from any string-like value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the model id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when this model streams reasoning tokens before its answer.
    ///
    /// Only the reasoning variant triggers the boundary-marker sub-protocol;
    /// every other model streams plain answer deltas.
    pub fn supports_reasoning(&self) -> bool {
        self.0 == DEEPSEEK_R1
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModelId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Generic stream behavior options.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StreamOptions {
    /// Bounded event buffer size used by the streaming channel.
    pub stream_buffer_capacity: usize,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            stream_buffer_capacity: 128,
        }
    }
}
