use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;

use crate::errors::{ClientError, StreamFailure};
use crate::model::{ModelId, StreamOptions};
use crate::session::ChatStream;
use crate::transport::sse;

/// Raw chat-completions response body stream, ready for
/// [`decode_chunk_stream`](crate::decode_chunk_stream).
pub type CompletionsByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static>>;

/// Configuration for the chat client.
#[derive(Clone, Debug)]
pub struct ChatClientConfig {
    /// API key used for bearer auth.
    pub api_key: String,
    /// Base URL for the chat-completions endpoint.
    ///
    /// Useful for proxies or local test servers.
    pub base_url: String,
    /// Optional HTTP timeout applied to each streaming request.
    ///
    /// `None` leaves the stream unbounded, which matches the server's
    /// open-ended generation time.
    pub timeout: Option<Duration>,
}

impl ChatClientConfig {
    /// Creates a config with the production endpoint and a provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.siliconflow.cn".to_string(),
            timeout: None,
        }
    }

    /// Builds a config from `SILICONFLOW_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("SILICONFLOW_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "missing SILICONFLOW_API_KEY for chat client".into(),
            ));
        }
        Ok(Self::new(api_key))
    }

    /// Overrides the API base URL (for proxies or test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the per-request HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// Client for streaming chat completions.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatClientConfig,
}

impl ChatClient {
    /// Creates a client from explicit configuration.
    pub fn new(config: ChatClientConfig) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "chat client api_key must not be empty".into(),
            ));
        }
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| ClientError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, config })
    }

    /// Creates a client using `SILICONFLOW_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ChatClientConfig::from_env()?)
    }

    /// Opens an SSE stream for a single-turn user message.
    ///
    /// Returns the stream handle (and with it the abort handle) immediately;
    /// connection setup happens on the stream task, and connection failures
    /// arrive as a terminal `Failed` event.
    pub fn stream_message(&self, model: ModelId, user_message: impl Into<String>) -> ChatStream {
        self.stream_message_with_options(model, user_message, StreamOptions::default())
    }

    /// `stream_message` with explicit stream options.
    pub fn stream_message_with_options(
        &self,
        model: ModelId,
        user_message: impl Into<String>,
        options: StreamOptions,
    ) -> ChatStream {
        let request = self.completions_request(&model, &user_message.into());
        sse::start(request, model, options)
    }

    /// Issues the completions POST and returns the raw body byte stream.
    ///
    /// For callers that drive the chunk-reader decoder themselves: feed the
    /// result to [`decode_chunk_stream`](crate::decode_chunk_stream).
    pub async fn open_completions_stream(
        &self,
        model: &ModelId,
        user_message: &str,
    ) -> Result<CompletionsByteStream, ClientError> {
        let response = self
            .completions_request(model, user_message)
            .send()
            .await
            .map_err(|err| {
                StreamFailure::transport(format!("completions request failed: {err}"))
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::StreamFailed(StreamFailure::api(
                Some(status.as_u16()),
                format!("completions request failed with status {status}: {body}"),
            )));
        }
        Ok(Box::pin(response.bytes_stream()))
    }

    fn completions_request(&self, model: &ModelId, user_message: &str) -> reqwest::RequestBuilder {
        let body = sse::build_request_body(model, user_message);
        let mut request = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body);
        if let Some(timeout) = self.config.timeout {
            request = request.timeout(timeout);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEEPSEEK_V3;
    use crate::stream::StreamEvent;

    #[test]
    fn empty_api_key_is_rejected() {
        let result = ChatClient::new(ChatClientConfig::new("  "));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let config = ChatClientConfig::new("key").base_url("http://localhost:8080/");
        assert_eq!(
            config.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails_the_stream_not_the_call() {
        // Port 9 is discard; the connection attempt fails fast and must be
        // delivered as a terminal event rather than a panic or a hang.
        let config = ChatClientConfig::new("key")
            .base_url("http://127.0.0.1:9")
            .timeout(Duration::from_secs(2));
        let client = ChatClient::new(config).expect("client");
        let mut stream = client.stream_message(ModelId::new(DEEPSEEK_V3), "hello");
        loop {
            match stream.next_event().await.expect("terminal event") {
                StreamEvent::TextDelta { .. } => {}
                StreamEvent::Failed { error } => {
                    assert!(matches!(error, StreamFailure::Transport { .. }));
                    break;
                }
                StreamEvent::Completed { .. } => panic!("connection cannot succeed"),
            }
        }
    }

    #[tokio::test]
    async fn non_success_status_surfaces_as_api_failure() {
        use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let _ = socket
                    .write_all(
                        b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                    )
                    .await;
            }
        });

        let config = ChatClientConfig::new("bad-key").base_url(format!("http://{addr}"));
        let client = ChatClient::new(config).expect("client");
        let mut stream = client.stream_message(ModelId::new(DEEPSEEK_V3), "hello");
        loop {
            match stream.next_event().await.expect("terminal event") {
                StreamEvent::Failed { error } => {
                    assert!(matches!(
                        error,
                        StreamFailure::Api {
                            status_code: Some(401),
                            ..
                        }
                    ));
                    break;
                }
                StreamEvent::Completed { .. } => panic!("request must fail"),
                StreamEvent::TextDelta { .. } => {}
            }
        }
    }

    #[tokio::test]
    async fn env_gated_smoke_collect_text_if_key_present() {
        if std::env::var("SILICONFLOW_API_KEY")
            .unwrap_or_default()
            .trim()
            .is_empty()
        {
            eprintln!("skipping live smoke test (SILICONFLOW_API_KEY missing)");
            return;
        }

        let client = ChatClient::from_env().expect("client");
        let result = client
            .stream_message(ModelId::new(DEEPSEEK_V3), "Reply with the word: ok")
            .collect_text()
            .await;
        assert!(result.is_ok(), "live smoke failed: {result:?}");
    }
}
