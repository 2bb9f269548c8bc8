//! Dedicated SSE client transport for the chat-completions endpoint.

use eventsource_stream::{Event, EventStreamError, Eventsource};
use futures::{Stream, StreamExt as _};
use serde_json::json;
use tokio::sync::watch;

use crate::errors::StreamFailure;
use crate::model::{ModelId, StreamOptions};
use crate::session::{ChatStream, Dispatch, StreamSession};
use crate::stream::StopReason;

/// Builds the single-turn chat-completions request body.
pub(crate) fn build_request_body(model: &ModelId, user_message: &str) -> serde_json::Value {
    json!({
        "model": model.as_str(),
        "messages": [{ "role": "user", "content": user_message }],
        "stream": true,
    })
}

/// Spawns the SSE stream task and returns the consumer handle immediately.
///
/// Connection setup happens on the task, so the caller holds the abort
/// handle before the first byte is requested; connection failures arrive as
/// a terminal `Failed` event.
pub(crate) fn start(
    request: reqwest::RequestBuilder,
    model: ModelId,
    options: StreamOptions,
) -> ChatStream {
    let (session, abort_rx, stream) = StreamSession::open(model, &options);
    tokio::spawn(run_sse(request, session, abort_rx));
    stream
}

async fn run_sse(
    request: reqwest::RequestBuilder,
    session: StreamSession,
    mut abort_rx: watch::Receiver<bool>,
) {
    let connect = connect(request);
    tokio::pin!(connect);

    let mut abort_open = true;
    let response = loop {
        tokio::select! {
            biased;
            changed = abort_rx.changed(), if abort_open => match changed {
                Ok(()) if *abort_rx.borrow() => {
                    session.complete(StopReason::Cancelled).await;
                    return;
                }
                Ok(()) => {}
                Err(_) => abort_open = false,
            },
            result = &mut connect => match result {
                Ok(response) => break response,
                Err(failure) => {
                    session.fail(failure).await;
                    return;
                }
            },
        }
    };

    let events = Box::pin(response.bytes_stream()).eventsource();
    run_events(events, session, abort_rx).await;
}

async fn connect(request: reqwest::RequestBuilder) -> Result<reqwest::Response, StreamFailure> {
    let response = request
        .send()
        .await
        .map_err(|err| StreamFailure::transport(format!("completions request failed: {err}")))?;
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(StreamFailure::api(
            Some(status.as_u16()),
            format!("completions request failed with status {status}: {body}"),
        ));
    }
    Ok(response)
}

/// Event loop shared with tests: consumes parsed server-sent events.
///
/// Unlike the chunk-reader transport, a `[DONE]` payload terminates this
/// stream; dropping the event stream tears the connection down.
async fn run_events<S, E>(
    mut events: S,
    mut session: StreamSession,
    mut abort_rx: watch::Receiver<bool>,
) where
    S: Stream<Item = Result<Event, EventStreamError<E>>> + Unpin,
    E: std::fmt::Display,
{
    let mut abort_open = true;
    loop {
        tokio::select! {
            biased;
            changed = abort_rx.changed(), if abort_open => match changed {
                Ok(()) if *abort_rx.borrow() => {
                    session.complete(StopReason::Cancelled).await;
                    return;
                }
                Ok(()) => {}
                Err(_) => abort_open = false,
            },
            next = events.next() => match next {
                Some(Ok(event)) => match session.dispatch_data(&event.data).await {
                    Dispatch::Terminal => {
                        session.complete(StopReason::Done).await;
                        return;
                    }
                    Dispatch::Aborted => {
                        session.complete(StopReason::Cancelled).await;
                        return;
                    }
                    Dispatch::Disconnected => return,
                    Dispatch::Forwarded => {}
                },
                Some(Err(err)) => {
                    session
                        .fail(StreamFailure::transport(format!("event source failed: {err}")))
                        .await;
                    return;
                }
                None => {
                    session.complete(StopReason::EndOfStream).await;
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StreamFailure;
    use crate::model::{DEEPSEEK_R1, DEEPSEEK_V3};
    use crate::phase::THINKING_ENDED_MARKER;
    use crate::stream::StreamEvent;
    use bytes::Bytes;
    use futures::stream;
    use std::convert::Infallible;

    fn spawn_with_frames(
        model: &str,
        frames: &[&str],
    ) -> ChatStream {
        let body = frames
            .iter()
            .map(|frame| format!("data: {frame}\n\n"))
            .collect::<String>();
        let chunks: Vec<Result<Bytes, Infallible>> = vec![Ok(Bytes::from(body))];
        let events = Box::pin(stream::iter(chunks)).eventsource();
        let (session, abort_rx, stream) =
            StreamSession::open(ModelId::new(model), &StreamOptions::default());
        tokio::spawn(run_events(events, session, abort_rx));
        stream
    }

    async fn drain(mut stream: ChatStream) -> (Vec<String>, StreamEvent) {
        let mut deltas = Vec::new();
        loop {
            let event = stream.next_event().await.expect("terminal event");
            match event {
                StreamEvent::TextDelta { text, .. } => deltas.push(text),
                terminal => return (deltas, terminal),
            }
        }
    }

    #[test]
    fn request_body_has_single_user_turn_and_stream_flag() {
        let body = build_request_body(&ModelId::new(DEEPSEEK_V3), "hello");
        assert_eq!(body.get("model").and_then(|v| v.as_str()), Some(DEEPSEEK_V3));
        assert_eq!(body.get("stream").and_then(|v| v.as_bool()), Some(true));
        let messages = body.get("messages").and_then(|v| v.as_array()).expect("messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].get("role").and_then(|v| v.as_str()),
            Some("user")
        );
        assert_eq!(
            messages[0].get("content").and_then(|v| v.as_str()),
            Some("hello")
        );
    }

    #[tokio::test]
    async fn done_event_terminates_the_stream() {
        let stream = spawn_with_frames(
            DEEPSEEK_V3,
            &[
                r#"{"choices":[{"delta":{"content":"x"}}]}"#,
                r#"{"choices":[{"delta":{"content":"y"}}]}"#,
                "[DONE]",
                r#"{"choices":[{"delta":{"content":"never"}}]}"#,
            ],
        );
        let (deltas, terminal) = drain(stream).await;
        assert_eq!(deltas, vec!["x", "y"]);
        assert_eq!(
            terminal,
            StreamEvent::Completed {
                reason: StopReason::Done
            }
        );
    }

    #[tokio::test]
    async fn reasoning_marker_is_injected_on_this_transport_too() {
        let stream = spawn_with_frames(
            DEEPSEEK_R1,
            &[
                r#"{"choices":[{"delta":{"reasoning_content":"a"}}]}"#,
                r#"{"choices":[{"delta":{"content":"c"}}]}"#,
                "[DONE]",
            ],
        );
        let (deltas, _) = drain(stream).await;
        assert_eq!(deltas, vec!["a", THINKING_ENDED_MARKER, "c"]);
    }

    #[tokio::test]
    async fn malformed_event_is_skipped_and_stream_continues() {
        let stream = spawn_with_frames(
            DEEPSEEK_V3,
            &[
                r#"{"choices":[{"delta":{"content":"x"}}]}"#,
                "{not json",
                r#"{"choices":[{"delta":{"content":"y"}}]}"#,
                "[DONE]",
            ],
        );
        let (deltas, terminal) = drain(stream).await;
        assert_eq!(deltas, vec!["x", "y"]);
        assert!(terminal.is_terminal());
    }

    #[tokio::test]
    async fn close_without_done_still_completes_exactly_once() {
        let stream = spawn_with_frames(
            DEEPSEEK_V3,
            &[r#"{"choices":[{"delta":{"content":"x"}}]}"#],
        );
        let (deltas, terminal) = drain(stream).await;
        assert_eq!(deltas, vec!["x"]);
        assert_eq!(
            terminal,
            StreamEvent::Completed {
                reason: StopReason::EndOfStream
            }
        );
    }

    #[tokio::test]
    async fn transport_error_surfaces_as_terminal_failure() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(
                b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\n",
            )),
            Err(std::io::Error::other("connection reset")),
        ];
        let events = Box::pin(stream::iter(chunks)).eventsource();
        let (session, abort_rx, stream) =
            StreamSession::open(ModelId::new(DEEPSEEK_V3), &StreamOptions::default());
        tokio::spawn(run_events(events, session, abort_rx));

        let (deltas, terminal) = drain(stream).await;
        assert_eq!(deltas, vec!["x"]);
        assert!(matches!(
            terminal,
            StreamEvent::Failed {
                error: StreamFailure::Transport { .. }
            }
        ));
    }

    #[tokio::test]
    async fn cancellation_before_any_event_completes_with_cancelled() {
        let pending: futures::stream::Pending<Result<Bytes, Infallible>> = stream::pending();
        let events = Box::pin(pending).eventsource();
        let (session, abort_rx, mut stream) =
            StreamSession::open(ModelId::new(DEEPSEEK_V3), &StreamOptions::default());
        tokio::spawn(run_events(events, session, abort_rx));

        stream.abort_handle().abort();
        assert_eq!(
            stream.next_event().await,
            Some(StreamEvent::Completed {
                reason: StopReason::Cancelled
            })
        );
        assert_eq!(stream.next_event().await, None);
    }
}
