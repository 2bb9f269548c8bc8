//! Decoder for already-open chat-completions byte streams.

use bytes::Bytes;
use futures::{Stream, StreamExt as _};
use tokio::sync::watch;

use super::framing::DataLineDecoder;
use crate::errors::StreamFailure;
use crate::model::{ModelId, StreamOptions};
use crate::session::{ChatStream, Dispatch, StreamSession};
use crate::stream::StopReason;

/// Decodes a pull-based chat-completions byte stream into text events.
///
/// The reader is any stream of raw response bytes, for example the body
/// stream returned by [`crate::ChatClient::open_completions_stream`]. On
/// this transport a `[DONE]` record is a no-op line; termination is driven
/// by the reader's own end-of-stream signal.
pub fn decode_chunk_stream<S, E>(model: ModelId, reader: S) -> ChatStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::fmt::Display + Send + 'static,
{
    decode_chunk_stream_with_options(model, reader, StreamOptions::default())
}

/// `decode_chunk_stream` with explicit stream options.
pub fn decode_chunk_stream_with_options<S, E>(
    model: ModelId,
    reader: S,
    options: StreamOptions,
) -> ChatStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + Unpin + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let (session, abort_rx, stream) = StreamSession::open(model, &options);
    tokio::spawn(run_chunk_reader(reader, session, abort_rx));
    stream
}

async fn run_chunk_reader<S, E>(
    mut reader: S,
    mut session: StreamSession,
    mut abort_rx: watch::Receiver<bool>,
) where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut decoder = DataLineDecoder::default();
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
            next = reader.next() => match next {
                Some(Ok(chunk)) => {
                    for data in decoder.push_chunk(&chunk) {
                        match session.dispatch_data(&data).await {
                            // [DONE] does not end this transport.
                            Dispatch::Terminal => continue,
                            Dispatch::Aborted => {
                                session.complete(StopReason::Cancelled).await;
                                return;
                            }
                            Dispatch::Disconnected => return,
                            Dispatch::Forwarded => {}
                        }
                    }
                }
                Some(Err(err)) => {
                    session
                        .fail(StreamFailure::transport(format!("stream read failed: {err}")))
                        .await;
                    return;
                }
                None => {
                    if let Some(data) = decoder.flush()
                        && matches!(session.dispatch_data(&data).await, Dispatch::Disconnected)
                    {
                        return;
                    }
                    session.complete(StopReason::EndOfStream).await;
                    return;
                }
            },
        }
    }
}
