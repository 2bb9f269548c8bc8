use serde::Deserialize;

/// Literal payload the server sends as its end-of-stream record.
pub(crate) const DONE_PAYLOAD: &str = "[DONE]";

/// One streamed chat-completions record: `{"choices":[{"delta":{...}}]}`.
///
/// Unknown fields (`id`, `usage`, `finish_reason`, ...) are ignored; decoding
/// is best-effort by design.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub reasoning_content: Option<String>,
}

/// One decoded unit from the wire, normalized for phase classification.
///
/// Ephemeral: constructed per record, consumed by the classifier, dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaPayload {
    /// Reasoning ("thinking") text, when present and non-empty.
    pub reasoning_text: Option<String>,
    /// Answer text, when present and non-empty.
    pub answer_text: Option<String>,
    /// True when the record is the literal `[DONE]` terminator.
    pub is_terminal: bool,
}

impl DeltaPayload {
    /// Decodes one `data:` payload string.
    ///
    /// `[DONE]` maps to a terminal payload; everything else is parsed as a
    /// JSON chunk and reduced to the first choice's delta fields. Empty
    /// strings are normalized to `None` so the classifier only ever sees
    /// text worth delivering.
    pub fn from_data(data: &str) -> Result<Self, serde_json::Error> {
        if data.trim() == DONE_PAYLOAD {
            return Ok(Self {
                is_terminal: true,
                ..Self::default()
            });
        }
        let chunk: StreamChunk = serde_json::from_str(data)?;
        let delta = chunk
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.delta)
            .unwrap_or_default();
        Ok(Self {
            reasoning_text: delta.reasoning_content.filter(|text| !text.is_empty()),
            answer_text: delta.content.filter(|text| !text.is_empty()),
            is_terminal: false,
        })
    }
}
