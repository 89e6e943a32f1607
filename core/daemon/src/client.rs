//! Synchronous presence protocol client.
//!
//! A small state machine over a local transport: disconnected → connected →
//! closed. The daemon owns the session handle exclusively; no other component
//! may touch the transport. Any framing error invalidates the connection —
//! there is no partial-frame recovery.

use beacon_core::error::{BeaconError, Result};
use beacon_presence_protocol::{
    endpoint_name, error_in_reply, read_frame, write_frame, Activity, ActivityCommand, Assets,
    Button, Handshake, Opcode, Timestamps, ENDPOINT_CANDIDATES, MAX_BUTTONS,
};
use chrono::Utc;
use std::io::{Read, Write};
use tracing::debug;

/// Directory override for the endpoint scan; used by tests and unusual setups.
pub const IPC_DIR_ENV: &str = "BEACON_IPC_DIR";

trait Transport: Read + Write {}
impl<T: Read + Write> Transport for T {}

/// What the orchestrator wants shown, transport-agnostic.
#[derive(Debug, Clone, Default)]
pub struct PresenceUpdate {
    pub state: Option<String>,
    pub details: Option<String>,
    pub large_image: Option<String>,
    pub large_text: Option<String>,
    pub small_image: Option<String>,
    pub small_text: Option<String>,
    pub buttons: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Disconnected,
    Connected,
    Closed,
}

pub struct PresenceClient {
    client_id: String,
    transport: Option<Box<dyn Transport>>,
    state: SessionState,
    session_start: i64,
}

impl PresenceClient {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            transport: None,
            state: SessionState::Disconnected,
            session_start: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// The session's elapsed-time origin. Fixed at handshake time and never
    /// refreshed, so the peer's elapsed counter stays monotonic across
    /// updates; it resets only on reconnect.
    pub fn session_start(&self) -> i64 {
        self.session_start
    }

    /// Probe the well-known endpoints in order and perform the handshake.
    pub fn connect(&mut self) -> Result<()> {
        let mut transport = (0..ENDPOINT_CANDIDATES)
            .find_map(open_endpoint)
            .ok_or(BeaconError::EndpointUnavailable)?;

        write_frame(
            &mut transport,
            Opcode::Handshake,
            &Handshake::new(&self.client_id),
        )?;
        let (_, reply) = read_frame(&mut transport)?;

        if let Some(info) = error_in_reply(&reply) {
            // Transport drops here; no session was established.
            return Err(BeaconError::HandshakeRejected {
                code: info.code,
                message: info.message,
            });
        }

        debug!(reply = %reply, "Handshake accepted");
        self.transport = Some(transport);
        self.state = SessionState::Connected;
        self.session_start = Utc::now().timestamp();
        Ok(())
    }

    /// Publish an activity. Calling this while disconnected is a usage error,
    /// not a retry condition.
    pub fn update(&mut self, update: &PresenceUpdate) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(BeaconError::NotConnected);
        }
        let activity = self.build_activity(update);
        let command = ActivityCommand::set_activity(std::process::id(), Some(activity), nonce());

        let transport = self.transport.as_mut().ok_or(BeaconError::NotConnected)?;
        if let Err(err) = write_frame(transport, Opcode::Command, &command) {
            self.invalidate();
            return Err(err.into());
        }
        let reply = match read_frame(transport) {
            Ok((_, reply)) => reply,
            Err(err) => {
                self.invalidate();
                return Err(err.into());
            }
        };

        if let Some(info) = error_in_reply(&reply) {
            return Err(BeaconError::UpdateRejected(info.message));
        }
        Ok(())
    }

    /// Clear the published activity. Best-effort: this typically runs during
    /// shutdown, so transport errors are swallowed.
    pub fn clear(&mut self) {
        if self.state != SessionState::Connected {
            return;
        }
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        let command = ActivityCommand::set_activity(std::process::id(), None, nonce());
        if write_frame(transport, Opcode::Command, &command).is_ok() {
            let _ = read_frame(transport);
        }
    }

    /// Clear, then release the transport unconditionally. Idempotent.
    pub fn close(&mut self) {
        self.clear();
        self.transport = None;
        self.state = SessionState::Closed;
    }

    fn invalidate(&mut self) {
        self.transport = None;
        self.state = SessionState::Disconnected;
    }

    fn build_activity(&self, update: &PresenceUpdate) -> Activity {
        let assets = Assets {
            large_image: update.large_image.clone(),
            large_text: update.large_text.clone(),
            small_image: update.small_image.clone(),
            small_text: update.small_text.clone(),
        };
        let buttons: Vec<Button> = update
            .buttons
            .iter()
            .take(MAX_BUTTONS)
            .map(|(label, url)| Button {
                label: label.clone(),
                url: url.clone(),
            })
            .collect();

        Activity {
            state: update.state.clone(),
            details: update.details.clone(),
            assets: if assets.is_empty() { None } else { Some(assets) },
            timestamps: Timestamps {
                start: self.session_start,
            },
            buttons: if buttons.is_empty() { None } else { Some(buttons) },
        }
    }
}

/// Nonce for command correlation; not verified on the reply.
fn nonce() -> String {
    format!("{}-{}", std::process::id(), Utc::now().timestamp_millis())
}

#[cfg(unix)]
fn open_endpoint(index: u32) -> Option<Box<dyn Transport>> {
    use std::os::unix::net::UnixStream;
    use std::path::PathBuf;

    let mut dirs: Vec<PathBuf> = Vec::new();
    if let Ok(dir) = std::env::var(IPC_DIR_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    for var in ["XDG_RUNTIME_DIR", "TMPDIR", "TMP", "TEMP"] {
        if let Ok(dir) = std::env::var(var) {
            dirs.push(PathBuf::from(dir));
        }
    }
    dirs.push(PathBuf::from("/tmp"));

    for dir in dirs {
        if let Ok(stream) = UnixStream::connect(dir.join(endpoint_name(index))) {
            return Some(Box::new(stream));
        }
    }
    None
}

#[cfg(windows)]
fn open_endpoint(index: u32) -> Option<Box<dyn Transport>> {
    let path = format!(r"\\.\pipe\{}", endpoint_name(index));
    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .ok()
        .map(|pipe| Box::new(pipe) as Box<dyn Transport>)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_while_disconnected_is_a_usage_error() {
        let mut client = PresenceClient::new("12345");
        let result = client.update(&PresenceUpdate::default());
        assert!(matches!(result, Err(BeaconError::NotConnected)));
    }

    #[test]
    fn close_before_connect_is_a_no_op() {
        let mut client = PresenceClient::new("12345");
        client.close();
        client.close();
        assert!(!client.is_connected());
    }

    #[test]
    fn excess_buttons_are_truncated_to_two() {
        let client = PresenceClient::new("12345");
        let update = PresenceUpdate {
            buttons: vec![
                ("one".to_string(), "https://one.example".to_string()),
                ("two".to_string(), "https://two.example".to_string()),
                ("three".to_string(), "https://three.example".to_string()),
            ],
            ..Default::default()
        };
        let activity = client.build_activity(&update);
        assert_eq!(activity.buttons.expect("buttons").len(), 2);
    }

    #[test]
    fn empty_assets_and_buttons_are_omitted() {
        let client = PresenceClient::new("12345");
        let activity = client.build_activity(&PresenceUpdate {
            state: Some("idle".to_string()),
            ..Default::default()
        });
        assert!(activity.assets.is_none());
        assert!(activity.buttons.is_none());
    }
}
