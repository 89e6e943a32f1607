//! Wire format for the local rich-presence IPC protocol.
//!
//! This crate is shared by the daemon and any future clients to prevent schema
//! drift. A frame is an 8-byte little-endian header (opcode, payload length)
//! followed by exactly that many bytes of UTF-8 JSON. There is no
//! partial-frame recovery: a short read invalidates the connection.

use serde::Serialize;
use serde_json::Value;
use std::io::{Read, Write};

pub const PROTOCOL_VERSION: u32 = 1;
pub const HEADER_BYTES: usize = 8;
pub const MAX_FRAME_BYTES: usize = 1024 * 1024; // 1MB

/// Number of well-known endpoints probed during connect (`discord-ipc-0..9`).
pub const ENDPOINT_CANDIDATES: u32 = 10;

/// Activity payloads may carry at most this many buttons.
pub const MAX_BUTTONS: usize = 2;

pub const SET_ACTIVITY: &str = "SET_ACTIVITY";

/// Name of the `n`-th well-known local endpoint.
pub fn endpoint_name(index: u32) -> String {
    format!("discord-ipc-{}", index)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Handshake,
    Command,
}

impl Opcode {
    pub fn as_u32(self) -> u32 {
        match self {
            Opcode::Handshake => 0,
            Opcode::Command => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub opcode: u32,
    pub len: u32,
}

impl FrameHeader {
    pub fn encode(&self) -> [u8; HEADER_BYTES] {
        let mut buf = [0u8; HEADER_BYTES];
        buf[..4].copy_from_slice(&self.opcode.to_le_bytes());
        buf[4..].copy_from_slice(&self.len.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8; HEADER_BYTES]) -> Self {
        let opcode = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let len = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
        Self { opcode, len }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame payload of {0} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    TooLarge(usize),

    #[error("frame payload was not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Serialize `payload` as JSON and write it as one frame.
pub fn write_frame<W: Write>(
    writer: &mut W,
    opcode: Opcode,
    payload: &impl Serialize,
) -> Result<(), FrameError> {
    let body = serde_json::to_vec(payload)?;
    if body.len() > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge(body.len()));
    }
    let header = FrameHeader {
        opcode: opcode.as_u32(),
        len: body.len() as u32,
    };
    writer.write_all(&header.encode())?;
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}

/// Read one frame, returning the raw opcode and the decoded JSON payload.
///
/// Replies from the peer may carry opcodes this crate does not send; callers
/// decide whether the opcode matters.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<(u32, Value), FrameError> {
    let mut header_buf = [0u8; HEADER_BYTES];
    reader.read_exact(&mut header_buf)?;
    let header = FrameHeader::decode(&header_buf);
    if header.len as usize > MAX_FRAME_BYTES {
        return Err(FrameError::TooLarge(header.len as usize));
    }
    let mut body = vec![0u8; header.len as usize];
    reader.read_exact(&mut body)?;
    let value = serde_json::from_slice(&body)?;
    Ok((header.opcode, value))
}

#[derive(Debug, Serialize)]
pub struct Handshake {
    pub v: u32,
    pub client_id: String,
}

impl Handshake {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            client_id: client_id.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityCommand {
    pub cmd: String,
    pub args: ActivityArgs,
    pub nonce: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityArgs {
    pub pid: u32,
    pub activity: Option<Activity>,
}

impl ActivityCommand {
    pub fn set_activity(pid: u32, activity: Option<Activity>, nonce: impl Into<String>) -> Self {
        Self {
            cmd: SET_ACTIVITY.to_string(),
            args: ActivityArgs { pid, activity },
            nonce: nonce.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Activity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Assets>,
    pub timestamps: Timestamps,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Button>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Assets {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_text: Option<String>,
}

impl Assets {
    pub fn is_empty(&self) -> bool {
        self.large_image.is_none()
            && self.large_text.is_none()
            && self.small_image.is_none()
            && self.small_text.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Timestamps {
    pub start: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Button {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Extract the peer's error code and message from a reply whose `evt` field is
/// the error marker. Returns `None` for any other reply.
pub fn error_in_reply(reply: &Value) -> Option<ErrorInfo> {
    if reply.get("evt").and_then(Value::as_str) != Some("ERROR") {
        return None;
    }
    let data = reply.get("data");
    let code = data
        .and_then(|d| d.get("code"))
        .map(|c| match c {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| "?".to_string());
    let message = data
        .and_then(|d| d.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string();
    Some(ErrorInfo::new(&code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn header_round_trips_for_all_opcodes_and_lengths() {
        for opcode in [0u32, 1] {
            for len in [0u32, 1, 65_535] {
                let header = FrameHeader { opcode, len };
                let decoded = FrameHeader::decode(&header.encode());
                assert_eq!(decoded, header);
            }
        }
    }

    #[test]
    fn header_encoding_is_little_endian() {
        let header = FrameHeader { opcode: 1, len: 258 };
        assert_eq!(header.encode(), [1, 0, 0, 0, 2, 1, 0, 0]);
    }

    #[test]
    fn frame_round_trips_through_a_buffer() {
        let mut buf = Vec::new();
        let payload = json!({"v": 1, "client_id": "12345"});
        write_frame(&mut buf, Opcode::Handshake, &payload).expect("write frame");

        let (opcode, value) = read_frame(&mut Cursor::new(buf)).expect("read frame");
        assert_eq!(opcode, 0);
        assert_eq!(value, payload);
    }

    #[test]
    fn short_header_read_is_a_transport_error() {
        let mut cursor = Cursor::new(vec![0u8; 4]);
        assert!(matches!(read_frame(&mut cursor), Err(FrameError::Io(_))));
    }

    #[test]
    fn short_payload_read_is_a_transport_error() {
        let header = FrameHeader { opcode: 1, len: 64 };
        let mut bytes = header.encode().to_vec();
        bytes.extend_from_slice(b"{}");
        assert!(matches!(
            read_frame(&mut Cursor::new(bytes)),
            Err(FrameError::Io(_))
        ));
    }

    #[test]
    fn oversized_frame_is_rejected_without_reading_the_body() {
        let header = FrameHeader {
            opcode: 1,
            len: (MAX_FRAME_BYTES + 1) as u32,
        };
        let mut cursor = Cursor::new(header.encode().to_vec());
        assert!(matches!(
            read_frame(&mut cursor),
            Err(FrameError::TooLarge(_))
        ));
    }

    #[test]
    fn error_reply_exposes_code_and_message() {
        let reply = json!({
            "evt": "ERROR",
            "data": {"code": 4000, "message": "Invalid client id"}
        });
        let info = error_in_reply(&reply).expect("error info");
        assert_eq!(info.code, "4000");
        assert_eq!(info.message, "Invalid client id");
    }

    #[test]
    fn non_error_reply_yields_none() {
        let reply = json!({"evt": "READY", "data": {"user": {}}});
        assert!(error_in_reply(&reply).is_none());
    }

    #[test]
    fn error_reply_without_data_falls_back_to_placeholders() {
        let reply = json!({"evt": "ERROR"});
        let info = error_in_reply(&reply).expect("error info");
        assert_eq!(info.code, "?");
        assert_eq!(info.message, "Unknown error");
    }

    #[test]
    fn activity_serialization_skips_unset_fields() {
        let activity = Activity {
            state: Some("Listening".to_string()),
            timestamps: Timestamps { start: 1_700_000_000 },
            ..Default::default()
        };
        let value = serde_json::to_value(&activity).expect("serialize");
        assert_eq!(value["state"], "Listening");
        assert_eq!(value["timestamps"]["start"], 1_700_000_000);
        assert!(value.get("details").is_none());
        assert!(value.get("assets").is_none());
        assert!(value.get("buttons").is_none());
    }

    #[test]
    fn set_activity_command_has_the_expected_shape() {
        let command = ActivityCommand::set_activity(4242, None, "4242-1");
        let value = serde_json::to_value(&command).expect("serialize");
        assert_eq!(value["cmd"], "SET_ACTIVITY");
        assert_eq!(value["args"]["pid"], 4242);
        assert!(value["args"]["activity"].is_null());
        assert_eq!(value["nonce"], "4242-1");
    }

    #[test]
    fn endpoint_names_are_sequential() {
        assert_eq!(endpoint_name(0), "discord-ipc-0");
        assert_eq!(endpoint_name(9), "discord-ipc-9");
    }
}
