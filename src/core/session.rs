//! Owns the transport and the three subsystems for a single connected device.

use tokio::sync::broadcast;

use crate::core::action::OutboundAction;
use crate::core::configurer::{Configurer, ConfigurerOutcome};
use crate::core::constants::{CHARACTERISTIC_PAIRING_REQUESTOR, CHARACTERISTIC_RECEIVER, CHARACTERISTIC_SENDER};
use crate::core::frame::Frame;
use crate::core::pairer::{Pairer, PairerEvent};
use crate::core::streamer::{Fps, Resolution, Streamer, StreamerEvent};
use crate::core::transport::Transport;
use crate::core::variant::DeviceVariant;
use crate::error::CoreError;
use crate::logging::{log_debug, log_error, log_info};

const EVENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    ServicesDiscovered,
    Initialized,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    Receiver,
    Sender,
    PairingRequestor,
}

impl CharacteristicKind {
    fn uuid(self) -> u16 {
        match self {
            CharacteristicKind::Receiver => CHARACTERISTIC_RECEIVER,
            CharacteristicKind::Sender => CHARACTERISTIC_SENDER,
            CharacteristicKind::PairingRequestor => CHARACTERISTIC_PAIRING_REQUESTOR,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    Initialized,
    MessageReceived(Frame),
    Error(String),
}

/// A single device's transport binding plus its three subsystems. The sole writer of the
/// transport: subsystems only ever return the actions they want performed.
pub struct DeviceSession {
    transport: Box<dyn Transport + Send>,
    link_state: LinkState,
    receiver_bound: bool,
    sender_bound: bool,
    pairing_requestor_bound: bool,

    pairer: Pairer,
    streamer: Streamer,
    configurer: Configurer,

    session_tx: broadcast::Sender<SessionEvent>,
    pairer_tx: broadcast::Sender<PairerEvent>,
    streamer_tx: broadcast::Sender<StreamerEvent>,
}

impl DeviceSession {
    pub fn new(transport: Box<dyn Transport + Send>, variant: DeviceVariant) -> Self {
        Self {
            transport,
            link_state: LinkState::Disconnected,
            receiver_bound: false,
            sender_bound: false,
            pairing_requestor_bound: false,
            pairer: Pairer::new(),
            streamer: Streamer::new(variant),
            configurer: Configurer::new(variant),
            session_tx: broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
            streamer_tx: broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
            pairer_tx: broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link_state
    }

    pub fn is_initialized(&self) -> bool {
        self.receiver_bound && self.sender_bound && self.pairing_requestor_bound
    }

    pub fn subscribe_session(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_tx.subscribe()
    }

    pub fn subscribe_pairer(&self) -> broadcast::Receiver<PairerEvent> {
        self.pairer_tx.subscribe()
    }

    pub fn subscribe_streamer(&self) -> broadcast::Receiver<StreamerEvent> {
        self.streamer_tx.subscribe()
    }

    pub async fn connect(&mut self) -> Result<(), CoreError> {
        self.link_state = LinkState::Connecting;
        self.transport.connect().await?;
        self.link_state = LinkState::ServicesDiscovered;
        log_info("transport connected");
        let _ = self.session_tx.send(SessionEvent::Connected);
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), CoreError> {
        self.transport.disconnect().await?;
        self.link_state = LinkState::Disconnected;
        self.receiver_bound = false;
        self.sender_bound = false;
        self.pairing_requestor_bound = false;
        let _ = self.session_tx.send(SessionEvent::Disconnected);
        Ok(())
    }

    /// Records that a characteristic's presence has been confirmed. Once all three are bound the
    /// session becomes initialized.
    pub fn bind_characteristic(&mut self, kind: CharacteristicKind) {
        match kind {
            CharacteristicKind::Receiver => self.receiver_bound = true,
            CharacteristicKind::Sender => self.sender_bound = true,
            CharacteristicKind::PairingRequestor => self.pairing_requestor_bound = true,
        }
        log_debug(&format!("characteristic bound: 0x{:04X}", kind.uuid()));

        if self.is_initialized() && self.link_state != LinkState::Initialized {
            self.link_state = LinkState::Initialized;
            log_info("device session initialized");
            let _ = self.session_tx.send(SessionEvent::Initialized);
        }
    }

    /// Reports the transport link as gone. Called by the transport adapter, not by the core.
    pub fn notify_link_lost(&mut self) {
        self.link_state = LinkState::Lost;
        self.receiver_bound = false;
        self.sender_bound = false;
        self.pairing_requestor_bound = false;
        let _ = self.session_tx.send(SessionEvent::Disconnected);
    }

    pub async fn send_frame(&mut self, frame: Frame, no_response: bool) -> Result<(), CoreError> {
        if !self.is_initialized() {
            let _ = self
                .session_tx
                .send(SessionEvent::Error("send attempted before initialization".into()));
            return Err(CoreError::SendWhileUninitialized);
        }
        self.transport.write(&frame.serialize(), no_response).await
    }

    pub async fn send_raw_pairing(&mut self, bytes: &[u8]) -> Result<(), CoreError> {
        if !self.is_initialized() {
            let _ = self
                .session_tx
                .send(SessionEvent::Error("send attempted before initialization".into()));
            return Err(CoreError::SendWhileUninitialized);
        }
        self.transport.write_cccd(bytes).await
    }

    async fn execute_actions(&mut self, actions: Vec<OutboundAction>) -> Result<(), CoreError> {
        for action in actions {
            match action {
                OutboundAction::Frame { frame, no_response } => {
                    self.send_frame(frame, no_response).await?;
                }
                OutboundAction::RawPairing(bytes) => {
                    self.send_raw_pairing(&bytes).await?;
                }
            }
        }
        Ok(())
    }

    /// Parses an inbound notification and dispatches it to every subsystem, in fixed order
    /// (Pairer, Streamer, Configurer), executing and publishing each one's outcome.
    pub async fn handle_notification(&mut self, bytes: &[u8]) {
        let frame = match Frame::parse(bytes) {
            Ok(frame) => frame,
            Err(_) => {
                log_debug("dropped unparseable notification");
                return;
            }
        };
        let _ = self.session_tx.send(SessionEvent::MessageReceived(frame.clone()));

        let pairer_outcome = self.pairer.handle_incoming(&frame);
        if let Err(e) = self.execute_actions(pairer_outcome.actions).await {
            log_error(&format!("failed executing pairer outcome: {e}"));
        }
        for event in pairer_outcome.events {
            let _ = self.pairer_tx.send(event);
        }

        let streamer_outcome = self.streamer.handle_incoming(&frame);
        if let Err(e) = self.execute_actions(streamer_outcome.actions).await {
            log_error(&format!("failed executing streamer outcome: {e}"));
        }
        for event in streamer_outcome.events {
            let _ = self.streamer_tx.send(event);
        }

        let ConfigurerOutcome { actions } = self.configurer.handle_incoming(&frame);
        if let Err(e) = self.execute_actions(actions).await {
            log_error(&format!("failed executing configurer outcome: {e}"));
        }
    }

    pub async fn pair(&mut self) -> Result<(), CoreError> {
        let outcome = self.pairer.pair();
        self.execute_actions(outcome.actions).await?;
        for event in outcome.events {
            let _ = self.pairer_tx.send(event);
        }
        Ok(())
    }

    pub async fn connect_to_wifi(&mut self, ssid: &str, psk: &str) -> Result<(), CoreError> {
        let outcome = self.pairer.connect_to_wifi(ssid, psk)?;
        self.execute_actions(outcome.actions).await
    }

    pub async fn start_scanning_wifi(&mut self) -> Result<(), CoreError> {
        let outcome = self.pairer.start_scanning_wifi();
        self.execute_actions(outcome.actions).await
    }

    pub async fn prepare_to_live_stream(&mut self) -> Result<(), CoreError> {
        let outcome = self.streamer.prepare_to_live_stream();
        self.execute_actions(outcome.actions).await
    }

    pub async fn start_live_stream(
        &mut self,
        resolution: Resolution,
        bitrate_kbps: u16,
        fps: Fps,
        rtmp_url: &str,
    ) -> Result<(), CoreError> {
        let outcome = self
            .streamer
            .start_live_stream(resolution, bitrate_kbps, fps, rtmp_url)?;
        self.execute_actions(outcome.actions).await
    }

    pub async fn stop_live_stream(&mut self) -> Result<(), CoreError> {
        let outcome = self.streamer.stop_live_stream();
        self.execute_actions(outcome.actions).await
    }

    pub async fn set_image_stabilization(
        &mut self,
        mode: crate::core::configurer::StabilizationMode,
    ) -> Result<(), CoreError> {
        let outcome = self.configurer.set_image_stabilization(mode);
        self.execute_actions(outcome.actions).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock_transport::MockTransport;

    #[tokio::test]
    async fn send_before_initialization_is_rejected() {
        let mut session = DeviceSession::new(Box::new(MockTransport::new()), DeviceVariant::OsmoAction4);
        let result = session.pair().await;
        assert!(matches!(result, Err(CoreError::SendWhileUninitialized)));
    }

    #[tokio::test]
    async fn binding_all_three_characteristics_initializes_the_session() {
        let mut session = DeviceSession::new(Box::new(MockTransport::new()), DeviceVariant::OsmoAction4);
        let mut events = session.subscribe_session();
        session.bind_characteristic(CharacteristicKind::Receiver);
        assert!(!session.is_initialized());
        session.bind_characteristic(CharacteristicKind::Sender);
        session.bind_characteristic(CharacteristicKind::PairingRequestor);
        assert!(session.is_initialized());
        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::Initialized
        ));
    }

    #[tokio::test]
    async fn pair_after_initialization_writes_through_the_transport() {
        let mut session = DeviceSession::new(Box::new(MockTransport::new()), DeviceVariant::OsmoAction4);
        session.bind_characteristic(CharacteristicKind::Receiver);
        session.bind_characteristic(CharacteristicKind::Sender);
        session.bind_characteristic(CharacteristicKind::PairingRequestor);
        assert!(session.pair().await.is_ok());
    }
}
