//! Recording sink for exercising the hub without sockets.

use crate::domain::registry::ConnectionId;
use crate::ports::outbound::{FrameSink, SinkError};
use parking_lot::Mutex;
use shared_types::HubFrame;
use std::collections::HashSet;

/// A [`FrameSink`] that records every frame instead of delivering it.
///
/// Connections can be detached to make subsequent sends fail the way a
/// closed socket would.
#[derive(Default)]
pub struct RecordingSink {
    frames: Mutex<Vec<(ConnectionId, HubFrame)>>,
    detached: Mutex<HashSet<ConnectionId>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every frame sent so far, in send order.
    pub fn all_frames(&self) -> Vec<(ConnectionId, HubFrame)> {
        self.frames.lock().clone()
    }

    /// Frames sent to one connection, in send order.
    pub fn sent_to(&self, connection: ConnectionId) -> Vec<HubFrame> {
        self.frames
            .lock()
            .iter()
            .filter(|(conn, _)| *conn == connection)
            .map(|(_, frame)| frame.clone())
            .collect()
    }

    /// Make subsequent sends to `connection` fail as disconnected.
    pub fn detach(&self, connection: ConnectionId) {
        self.detached.lock().insert(connection);
    }
}

impl FrameSink for RecordingSink {
    fn send(&self, connection: ConnectionId, frame: &HubFrame) -> Result<(), SinkError> {
        if self.detached.lock().contains(&connection) {
            return Err(SinkError::Disconnected);
        }
        self.frames.lock().push((connection, frame.clone()));
        Ok(())
    }
}
