//! Streaming client for SiliconFlow-style chat completion APIs.
//!
//! The crate decodes the server's line-delimited `data: <json>` token stream
//! into an ordered sequence of text deltas. On the DeepSeek reasoning model
//! it detects the reasoning sub-protocol and injects a single boundary
//! marker where the model stops thinking and starts answering.
//!
//! Two transports implement the same decoding contract: a decoder for an
//! already-open byte stream (`decode_chunk_stream`) and a dedicated SSE
//! client (`ChatClient::stream_message`).
//!
//! # Streaming usage
//!
//! ```no_run
//! use siliconchat_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = ChatClient::from_env()?;
//! let mut stream = client.stream_message(ModelId::new(DEEPSEEK_R1), "Why is the sky blue?");
//!
//! while let Some(event) = stream.next_event().await {
//!     match event {
//!         StreamEvent::TextDelta { text, .. } => print!("{text}"),
//!         StreamEvent::Completed { .. } => println!(),
//!         StreamEvent::Failed { error } => eprintln!("stream error: {error}"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

/// HTTP client and endpoint configuration.
pub mod client;
/// Public error types used by the client API.
pub mod errors;
/// Model identifiers and stream options.
pub mod model;
/// Reasoning/answer phase classification shared by both transports.
pub mod phase;
/// Common imports for typical usage.
pub mod prelude;
/// Stream session, consumer handle, and cancellation handle.
pub mod session;
/// Normalized public stream events.
pub mod stream;
/// Transport decoders (raw chunk reader and SSE client).
pub mod transport;
/// Wire-format payload types.
pub mod wire;

pub use client::{ChatClient, ChatClientConfig, CompletionsByteStream};
pub use errors::{ClientError, StreamFailure};
pub use model::{DEEPSEEK_R1, DEEPSEEK_V3, ModelId, StreamOptions};
pub use phase::{PhaseTracker, THINKING_ENDED_MARKER};
pub use session::{AbortHandle, ChatStream};
pub use stream::{StopReason, StreamEvent};
pub use transport::{decode_chunk_stream, decode_chunk_stream_with_options};
pub use wire::DeltaPayload;
