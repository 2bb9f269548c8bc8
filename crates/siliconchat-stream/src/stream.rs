use crate::errors::StreamFailure;

/// Reason a stream reached its successful terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StopReason {
    /// The underlying reader reported end-of-stream.
    EndOfStream,
    /// The server sent its `[DONE]` record (event-source transport only).
    Done,
    /// The caller aborted the stream.
    Cancelled,
}

/// Normalized stream events exposed by `ChatStream`.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// Incremental text chunk: reasoning text, the boundary marker, or answer
    /// text, in arrival order. `seq` is contiguous from 0.
    TextDelta { seq: u64, text: String },
    /// Terminal success event. Exactly one terminal event is delivered per
    /// stream; cancellation counts as success with `StopReason::Cancelled`.
    Completed { reason: StopReason },
    /// Terminal failure event.
    Failed { error: StreamFailure },
}

impl StreamEvent {
    /// True for the events that end a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StreamEvent::Completed { .. } | StreamEvent::Failed { .. }
        )
    }
}
