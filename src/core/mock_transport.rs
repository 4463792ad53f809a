//! A scripted in-memory [`Transport`] used by tests in place of a real BLE adapter.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::core::frame::Frame;
use crate::core::transport::Transport;
use crate::error::CoreError;

const INBOUND_CAPACITY: usize = 32;

/// Answers each outbound frame with zero or more canned reply frames, broadcast on
/// [`MockTransport::subscribe`] for a test's pump loop to feed into the owning session.
pub struct MockTransport {
    connected: bool,
    pub sent: Vec<Vec<u8>>,
    pub sent_raw_pairing: Vec<Vec<u8>>,
    script: Vec<(u32, Vec<Frame>)>,
    inbound_tx: broadcast::Sender<Vec<u8>>,
}

impl MockTransport {
    pub fn new() -> Self {
        let (inbound_tx, _) = broadcast::channel(INBOUND_CAPACITY);
        Self {
            connected: false,
            sent: Vec::new(),
            sent_raw_pairing: Vec::new(),
            script: Vec::new(),
            inbound_tx,
        }
    }

    /// Registers that an outbound frame of `trigger_message_type` should enqueue `replies`. Each
    /// registered entry is consumed at most once, in registration order: if two outbound frames
    /// share a `message_type` (as the protocol's prepare-stage2 advance and its final start
    /// command do), register one entry per occurrence and they are matched in the order the
    /// frames are actually written.
    pub fn on(mut self, trigger_message_type: u32, replies: Vec<Frame>) -> Self {
        self.script.push((trigger_message_type, replies));
        self
    }

    /// A receiver a test's pump task reads from and forwards into
    /// [`crate::core::session::DeviceSession::handle_notification`].
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<u8>> {
        self.inbound_tx.subscribe()
    }

    /// Pushes an unsolicited notification (not triggered by any outbound frame).
    pub fn push_unsolicited(&self, frame: Frame) {
        let _ = self.inbound_tx.send(frame.serialize());
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> Result<(), CoreError> {
        self.connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), CoreError> {
        self.connected = false;
        Ok(())
    }

    async fn write(&mut self, data: &[u8], _no_response: bool) -> Result<(), CoreError> {
        self.sent.push(data.to_vec());
        if let Ok(frame) = Frame::parse(data) {
            if let Some(index) = self.script.iter().position(|(trigger, _)| *trigger == frame.message_type) {
                let (_, replies) = self.script.remove(index);
                for reply in replies {
                    let _ = self.inbound_tx.send(reply.serialize());
                }
            }
        }
        Ok(())
    }

    async fn write_cccd(&mut self, data: &[u8]) -> Result<(), CoreError> {
        self.sent_raw_pairing.push(data.to_vec());
        Ok(())
    }
}
