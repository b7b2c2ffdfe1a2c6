use crate::transport::{
    ControlFrame, TransportEvent,
    message::{decode_inbound, encode_control},
    parse_transcript,
};

use serde_json::{Value, json};

/// WHAT: Stop frame is wrapped in an RTVI client-message envelope
/// WHY: The backend dispatches on label, type and the inner message name
#[test]
#[allow(clippy::unwrap_used)]
fn given_stop_recording_when_encoding_then_rtvi_client_message() {
    // Given: The stop control frame

    // When: Encoding it
    let text = encode_control(ControlFrame::StopRecording).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();

    // Then: Envelope fields match what the backend expects
    assert_eq!(value["label"], "rtvi-ai");
    assert_eq!(value["type"], "client-message");
    assert_eq!(value["data"]["t"], "stop-recording");
    assert_eq!(value["data"]["d"], json!({}));
    assert!(value["id"].as_str().is_some_and(|id| !id.is_empty()));
}

/// WHAT: Each encoded frame carries a fresh message id
/// WHY: The backend correlates replies by id
#[test]
#[allow(clippy::unwrap_used)]
fn given_two_encodings_when_comparing_ids_then_distinct() {
    // Given/When: The same frame encoded twice
    let a: Value = serde_json::from_str(&encode_control(ControlFrame::StopRecording).unwrap()).unwrap();
    let b: Value = serde_json::from_str(&encode_control(ControlFrame::StopRecording).unwrap()).unwrap();

    // Then: Ids differ
    assert_ne!(a["id"], b["id"]);
}

/// WHAT: bot-transcription decodes to TranscriptReceived
/// WHY: This is the primary way the backend returns the final text
#[test]
fn given_bot_transcription_when_decoding_then_transcript_received() {
    // Given: A transcription message
    let text = r#"{"label":"rtvi-ai","type":"bot-transcription","data":{"text":"hello world"}}"#;

    // When: Decoding
    let event = decode_inbound(text);

    // Then: The transcript is extracted verbatim
    assert_eq!(
        event,
        Some(TransportEvent::TranscriptReceived {
            text: "hello world".to_string()
        })
    );
}

/// WHAT: Empty transcripts are dropped
/// WHY: An empty string must not end the session or paste nothing
#[test]
fn given_empty_bot_transcription_when_decoding_then_none() {
    // Given: A transcription with no text
    let text = r#"{"type":"bot-transcription","data":{"text":""}}"#;

    // When/Then: Nothing is produced
    assert_eq!(decode_inbound(text), None);
}

/// WHAT: server-message passes its data through untouched
/// WHY: The controller decides whether the payload is a transcript
#[test]
fn given_server_message_when_decoding_then_payload_preserved() {
    // Given: A server message carrying a transcript payload
    let text = r#"{"type":"server-message","data":{"type":"transcript","text":"hi"}}"#;

    // When: Decoding
    let event = decode_inbound(text);

    // Then: Payload is the inner data object
    assert_eq!(
        event,
        Some(TransportEvent::ServerMessage {
            payload: json!({"type": "transcript", "text": "hi"})
        })
    );
}

/// WHAT: error messages decode to ConnectionError with the server's reason
/// WHY: Backend failures must end the session instead of waiting for the watchdog
#[test]
fn given_error_message_when_decoding_then_connection_error() {
    // Given: A backend error
    let text = r#"{"type":"error","data":{"message":"pipeline crashed"}}"#;

    // When/Then: Reason is carried through
    assert_eq!(
        decode_inbound(text),
        Some(TransportEvent::ConnectionError {
            reason: "pipeline crashed".to_string()
        })
    );
}

/// WHAT: Unknown types and non-JSON text are ignored
/// WHY: Backends send chatter (metrics, bot-ready) the session does not use
#[test]
fn given_unknown_or_invalid_message_when_decoding_then_none() {
    // Given: Messages the session does not handle
    let unknown = r#"{"type":"bot-ready","data":{}}"#;
    let garbage = "not json at all";

    // When/Then: Both are ignored
    assert_eq!(decode_inbound(unknown), None);
    assert_eq!(decode_inbound(garbage), None);
}

/// WHAT: Only {"type":"transcript","text":<string>} parses as a transcript
/// WHY: Other server messages must not end the session
#[test]
fn given_server_payloads_when_parsing_transcript_then_only_exact_shape_accepted() {
    // Given: One valid payload and several near misses
    let valid = json!({"type": "transcript", "text": "hello"});
    let wrong_type = json!({"type": "status", "text": "hello"});
    let missing_text = json!({"type": "transcript"});
    let numeric_text = json!({"type": "transcript", "text": 42});
    let not_object = json!("transcript");

    // Then: Only the valid payload yields text
    assert_eq!(parse_transcript(&valid), Some("hello"));
    assert_eq!(parse_transcript(&wrong_type), None);
    assert_eq!(parse_transcript(&missing_text), None);
    assert_eq!(parse_transcript(&numeric_text), None);
    assert_eq!(parse_transcript(&not_object), None);
}
