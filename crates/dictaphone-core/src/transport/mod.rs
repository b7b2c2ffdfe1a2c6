mod connection;
mod event;
pub(crate) mod message;
mod websocket;

pub use {
    connection::{Connection, Transport},
    event::{EventSink, TaggedEvent, TransportEvent},
    message::{ControlFrame, parse_transcript},
    websocket::{WsConnection, WsTransport},
};
