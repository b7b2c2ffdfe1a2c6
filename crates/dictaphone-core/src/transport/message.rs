//! JSON envelopes exchanged with the transcription backend.
//!
//! Control traffic uses RTVI-style text frames; audio travels separately as
//! binary PCM frames.

use crate::{CoreResult, transport::TransportEvent};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

const RTVI_LABEL: &str = "rtvi-ai";

/// Named control messages the client sends over an active stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFrame {
    /// Ask the backend to flush its buffer and produce the final transcript.
    StopRecording,
}

impl ControlFrame {
    /// Wire name of the control message.
    pub fn name(self) -> &'static str {
        match self {
            ControlFrame::StopRecording => "stop-recording",
        }
    }

    /// Payload carried with the control message.
    pub fn payload(self) -> Value {
        match self {
            ControlFrame::StopRecording => Value::Object(Map::new()),
        }
    }
}

#[derive(Serialize)]
struct ClientMessage<'a> {
    label: &'static str,
    #[serde(rename = "type")]
    msg_type: &'static str,
    id: String,
    data: ClientMessageData<'a>,
}

#[derive(Serialize)]
struct ClientMessageData<'a> {
    t: &'a str,
    d: Value,
}

/// Encode a control frame as a JSON text message.
pub fn encode_control(frame: ControlFrame) -> CoreResult<String> {
    let message = ClientMessage {
        label: RTVI_LABEL,
        msg_type: "client-message",
        id: Uuid::new_v4().to_string(),
        data: ClientMessageData {
            t: frame.name(),
            d: frame.payload(),
        },
    };

    Ok(serde_json::to_string(&message)?)
}

#[derive(Deserialize, Debug)]
struct InboundEnvelope {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    data: Value,
}

/// Decode an inbound text message into a transport event.
///
/// Returns `None` for messages the session does not care about (unknown
/// types, empty transcripts, text that is not JSON).
pub fn decode_inbound(text: &str) -> Option<TransportEvent> {
    let envelope: InboundEnvelope = serde_json::from_str(text).ok()?;

    match envelope.msg_type.as_str() {
        "bot-transcription" => {
            let text = envelope.data.get("text")?.as_str()?;
            if text.is_empty() {
                return None;
            }
            Some(TransportEvent::TranscriptReceived {
                text: text.to_string(),
            })
        }
        "server-message" => Some(TransportEvent::ServerMessage {
            payload: envelope.data,
        }),
        "error" => {
            let reason = envelope
                .data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unspecified server error");
            Some(TransportEvent::ConnectionError {
                reason: reason.to_string(),
            })
        }
        _ => None,
    }
}

/// Extract transcript text from a server message payload.
///
/// Only `{"type": "transcript", "text": <string>}` qualifies; anything else
/// is not a transcript.
pub fn parse_transcript(payload: &Value) -> Option<&str> {
    let object = payload.as_object()?;

    if object.get("type")?.as_str()? != "transcript" {
        return None;
    }

    object.get("text")?.as_str()
}
