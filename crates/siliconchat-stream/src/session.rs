use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::errors::{ClientError, StreamFailure};
use crate::model::{ModelId, StreamOptions};
use crate::phase::PhaseTracker;
use crate::stream::{StopReason, StreamEvent};
use crate::wire::DeltaPayload;

/// Handle used to request cancellation of a running stream.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation.
    ///
    /// Cancellation is best-effort and becomes visible as a terminal
    /// `StreamEvent::Completed` with `StopReason::Cancelled`.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Outcome of dispatching one data payload to a session.
pub(crate) enum Dispatch {
    /// Payload consumed; any resulting text events were delivered.
    Forwarded,
    /// Payload was the `[DONE]` terminator; the transport decides what that
    /// means (no-op line for the chunk reader, terminal for the SSE client).
    Terminal,
    /// The abort flag was raised; no further events may be delivered.
    Aborted,
    /// The event receiver was dropped; processing should stop.
    Disconnected,
}

/// Live decoding context for one in-flight stream.
///
/// Owns the phase tracker and the sending half of the event channel.
/// Transports feed it decoded `data:` payload strings; it forwards
/// normalized text events in arrival order. The phase flag is only ever
/// touched here, from the single stream task.
pub(crate) struct StreamSession {
    session_id: uuid::Uuid,
    model: ModelId,
    phase: PhaseTracker,
    seq: u64,
    tx: mpsc::Sender<StreamEvent>,
    abort: watch::Receiver<bool>,
}

impl StreamSession {
    /// Creates the session, its abort channel, and the consumer-facing
    /// stream handle.
    pub(crate) fn open(
        model: ModelId,
        options: &StreamOptions,
    ) -> (StreamSession, watch::Receiver<bool>, ChatStream) {
        let (tx, rx) = mpsc::channel(options.stream_buffer_capacity.max(1));
        let (abort_tx, abort_rx) = watch::channel(false);
        let abort_handle = AbortHandle { tx: abort_tx };

        let session_id = uuid::Uuid::new_v4();
        debug!(session_id = %session_id, model = %model, "stream session opened");
        let session = StreamSession {
            session_id,
            model: model.clone(),
            phase: PhaseTracker::new(model.supports_reasoning()),
            seq: 0,
            tx,
            abort: abort_rx.clone(),
        };
        let stream = ChatStream {
            session_id,
            model,
            rx,
            abort_handle,
        };
        (session, abort_rx, stream)
    }

    /// Decodes one `data:` payload and forwards the resulting text events.
    ///
    /// Malformed JSON is logged and swallowed so a single bad record never
    /// ends the stream. The abort flag is re-checked before every delivery,
    /// so records already framed when the caller cancels are dropped rather
    /// than delivered.
    pub(crate) async fn dispatch_data(&mut self, data: &str) -> Dispatch {
        let payload = match DeltaPayload::from_data(data) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(session_id = %self.session_id, %err, "skipping malformed stream record");
                return Dispatch::Forwarded;
            }
        };
        if payload.is_terminal {
            return Dispatch::Terminal;
        }
        for text in self.phase.apply(&payload) {
            if *self.abort.borrow() {
                return Dispatch::Aborted;
            }
            debug!(session_id = %self.session_id, model = %self.model, seq = self.seq, "text delta");
            let event = StreamEvent::TextDelta {
                seq: self.seq,
                text,
            };
            self.seq = self.seq.saturating_add(1);
            if self.tx.send(event).await.is_err() {
                return Dispatch::Disconnected;
            }
        }
        Dispatch::Forwarded
    }

    /// Delivers the terminal success event.
    ///
    /// Consumes the session, so each stream task can send at most one
    /// terminal event no matter which exit path it takes.
    pub(crate) async fn complete(self, reason: StopReason) {
        debug!(session_id = %self.session_id, ?reason, "stream session completed");
        let _ = self.tx.send(StreamEvent::Completed { reason }).await;
    }

    /// Delivers the terminal failure event. Consumes the session.
    pub(crate) async fn fail(self, error: StreamFailure) {
        debug!(session_id = %self.session_id, %error, "stream session failed");
        let _ = self.tx.send(StreamEvent::Failed { error }).await;
    }
}

/// Streaming handle returned by the decoder entry points.
///
/// Use `next_event()` to consume events as they arrive, `abort_handle()` to
/// cancel mid-stream, and `collect_text()` to drain to completion.
pub struct ChatStream {
    session_id: uuid::Uuid,
    model: ModelId,
    rx: mpsc::Receiver<StreamEvent>,
    abort_handle: AbortHandle,
}

impl ChatStream {
    /// Returns the session id for this stream.
    pub fn session_id(&self) -> uuid::Uuid {
        self.session_id
    }

    /// Returns the model serving this stream.
    pub fn model(&self) -> &ModelId {
        &self.model
    }

    /// Returns a handle that can cancel the stream.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for and returns the next normalized stream event.
    ///
    /// The terminal event is always the last one delivered; afterwards the
    /// channel closes and this returns `None`.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.rx.recv().await
    }

    /// Drains the stream and returns the concatenated text output.
    ///
    /// Cancellation counts as successful early termination and returns the
    /// text delivered so far; a terminal failure is returned as an error.
    pub async fn collect_text(mut self) -> Result<String, ClientError> {
        let mut text = String::new();
        loop {
            match self.next_event().await {
                Some(StreamEvent::TextDelta { text: delta, .. }) => text.push_str(&delta),
                Some(StreamEvent::Completed { .. }) => return Ok(text),
                Some(StreamEvent::Failed { error }) => {
                    return Err(ClientError::StreamFailed(error));
                }
                None => {
                    return Err(ClientError::Protocol(
                        "stream task ended without a terminal event".into(),
                    ));
                }
            }
        }
    }
}
