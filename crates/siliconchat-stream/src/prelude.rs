//! Common imports for typical client usage.
//!
//! This module intentionally exports the most frequently used types so
//! examples and application code need fewer import lines.
pub use crate::{
    AbortHandle, ChatClient, ChatClientConfig, ChatStream, ClientError, DEEPSEEK_R1, DEEPSEEK_V3,
    ModelId, StopReason, StreamEvent, StreamFailure, StreamOptions, decode_chunk_stream,
};
