use crate::wire::DeltaPayload;

/// Marker emitted once at the reasoning-to-answer boundary.
pub const THINKING_ENDED_MARKER: &str = "\n\n---thinking ended---\n\n";

/// Two-state reasoning/answer classifier shared by both transport decoders.
///
/// The tracker starts in the answering state. A reasoning delta on a
/// reasoning-capable model moves it to the reasoning state; the first answer
/// delta after that emits [`THINKING_ENDED_MARKER`] and moves it back. Once
/// it has left the reasoning state it never re-enters, so the marker is
/// emitted at most once per session.
///
/// `apply` is pure with respect to I/O: it only mutates the tracker and
/// returns the text to deliver, which keeps both transports trivially
/// aligned on classification semantics.
#[derive(Debug)]
pub struct PhaseTracker {
    reasoning_supported: bool,
    in_reasoning: bool,
    left_reasoning: bool,
}

impl PhaseTracker {
    /// Creates a tracker; `reasoning_supported` gates the whole sub-protocol.
    pub fn new(reasoning_supported: bool) -> Self {
        Self {
            reasoning_supported,
            in_reasoning: false,
            left_reasoning: false,
        }
    }

    /// True while reasoning deltas are being streamed.
    pub fn in_reasoning(&self) -> bool {
        self.in_reasoning
    }

    /// Classifies one payload and returns the text events to deliver, in order.
    ///
    /// Terminal payloads and payloads with no usable text produce nothing.
    /// Reasoning text on a model without the sub-protocol is dropped, matching
    /// the wire contract: such models never populate that field, so anything
    /// in it is noise.
    pub fn apply(&mut self, payload: &DeltaPayload) -> Vec<String> {
        let mut out = Vec::new();
        if payload.is_terminal {
            return out;
        }
        if let Some(reasoning) = payload.reasoning_text.as_deref()
            && self.reasoning_supported
        {
            if !self.left_reasoning {
                self.in_reasoning = true;
            }
            out.push(reasoning.to_string());
        } else if let Some(answer) = payload.answer_text.as_deref() {
            if self.in_reasoning {
                out.push(THINKING_ENDED_MARKER.to_string());
                self.in_reasoning = false;
                self.left_reasoning = true;
            }
            out.push(answer.to_string());
        }
        out
    }
}
