//! Pairing handshake and Wi-Fi provisioning.

use crate::core::action::OutboundAction;
use crate::core::constants::{
    CLIENT_IDENTIFIER, DEFAULT_PIN, SubsystemId, START_PAIRING_REQUEST, message_id, message_type,
};
use crate::core::frame::{Frame, pack_short_string};
use crate::error::CoreError;
use crate::logging::{log_debug, log_info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairerState {
    Idle,
    WaitingForStatus,
    WaitingForApproval,
    Finalizing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairerEvent {
    PairingComplete,
    WifiConnected,
    WifiScanReport(Vec<u8>),
    Error(String),
}

/// What a [`Pairer`] operation produced: outbound actions to execute, in order, and events to
/// publish once they have been executed.
#[derive(Debug, Clone, Default)]
pub struct PairerOutcome {
    pub actions: Vec<OutboundAction>,
    pub events: Vec<PairerEvent>,
}

impl PairerOutcome {
    fn empty() -> Self {
        Self::default()
    }
}

/// The pairing/Wi-Fi subsystem. Holds only state; it never touches the transport directly (see
/// SPEC_FULL.md §9 "Back-references").
pub struct Pairer {
    state: PairerState,
}

impl Pairer {
    pub fn new() -> Self {
        Self {
            state: PairerState::Idle,
        }
    }

    pub fn state(&self) -> PairerState {
        self.state
    }

    /// Idempotent in `Idle`; a no-op otherwise.
    pub fn pair(&mut self) -> PairerOutcome {
        if self.state != PairerState::Idle {
            return PairerOutcome::empty();
        }
        log_info("starting pairing process");
        self.state = PairerState::WaitingForStatus;

        let payload = [
            pack_short_string(CLIENT_IDENTIFIER)
                .expect("client identifier fits in a short string"),
            pack_short_string(DEFAULT_PIN).expect("default PIN fits in a short string"),
        ]
        .concat();

        PairerOutcome {
            actions: vec![
                OutboundAction::RawPairing(START_PAIRING_REQUEST.to_vec()),
                OutboundAction::Frame {
                    frame: Frame::new(
                        SubsystemId::Pairer,
                        message_id::SET_PAIRING_PIN,
                        message_type::SET_PAIRING_PIN,
                        payload,
                    ),
                    no_response: true,
                },
            ],
            events: vec![],
        }
    }

    pub fn connect_to_wifi(&mut self, ssid: &str, psk: &str) -> Result<PairerOutcome, CoreError> {
        log_info(&format!("connecting to WiFi SSID: {ssid}"));
        let payload = [pack_short_string(ssid)?, pack_short_string(psk)?].concat();
        Ok(PairerOutcome {
            actions: vec![OutboundAction::Frame {
                frame: Frame::new(
                    SubsystemId::Pairer,
                    message_id::CONNECT_TO_WIFI,
                    message_type::CONNECT_TO_WIFI,
                    payload,
                ),
                no_response: true,
            }],
            events: vec![],
        })
    }

    pub fn start_scanning_wifi(&mut self) -> PairerOutcome {
        log_info("starting WiFi scan");
        PairerOutcome {
            actions: vec![OutboundAction::Frame {
                frame: Frame::new(
                    SubsystemId::Pairer,
                    message_id::START_SCANNING_WIFI,
                    message_type::START_SCANNING_WIFI,
                    vec![],
                ),
                no_response: true,
            }],
            events: vec![],
        }
    }

    pub fn handle_incoming(&mut self, frame: &Frame) -> PairerOutcome {
        match frame.message_type {
            message_type::PAIRING_STATUS => self.handle_pairing_status(frame),
            message_type::PAIRING_PIN_APPROVED => self.handle_pin_approved(),
            message_type::CONNECT_TO_WIFI_RESULT => self.handle_connect_to_wifi_result(frame),
            message_type::WIFI_SCAN_REPORT => PairerOutcome {
                actions: vec![],
                events: vec![PairerEvent::WifiScanReport(frame.payload.clone())],
            },
            _ => PairerOutcome::empty(),
        }
    }

    fn handle_pairing_status(&mut self, frame: &Frame) -> PairerOutcome {
        if frame.payload.len() >= 2 && frame.payload[1] == 0x01 {
            log_info("device is already paired");
            self.state = PairerState::Idle;
            PairerOutcome {
                actions: vec![],
                events: vec![PairerEvent::PairingComplete],
            }
        } else {
            PairerOutcome::empty()
        }
    }

    fn handle_pin_approved(&mut self) -> PairerOutcome {
        log_info("PIN approved, finalizing pairing");
        self.state = PairerState::Finalizing;

        let stage1 = Frame::new(
            SubsystemId::Pairer,
            message_id::PAIRING_STAGE1,
            message_type::PAIRING_STAGE1,
            vec![0x00],
        );
        let stage2 = Frame::new(
            SubsystemId::OneMorePairer,
            message_id::PAIRING_STAGE2,
            message_type::PAIRING_STAGE2,
            vec![0x31, 0x31, 0x00, 0x00, 0x00],
        );

        self.state = PairerState::Idle;
        PairerOutcome {
            actions: vec![
                OutboundAction::Frame {
                    frame: stage1,
                    no_response: true,
                },
                OutboundAction::Frame {
                    frame: stage2,
                    no_response: true,
                },
            ],
            events: vec![PairerEvent::PairingComplete],
        }
    }

    fn handle_connect_to_wifi_result(&mut self, frame: &Frame) -> PairerOutcome {
        if frame.payload.starts_with(&[0x00, 0x00]) {
            log_info("WiFi connected successfully");
            PairerOutcome {
                actions: vec![],
                events: vec![PairerEvent::WifiConnected],
            }
        } else {
            let hex = hex::encode(&frame.payload);
            log_debug(&format!("WiFi connection failed, payload: {hex}"));
            PairerOutcome {
                actions: vec![],
                events: vec![PairerEvent::Error(format!(
                    "WiFi connection failed, payload: {hex}"
                ))],
            }
        }
    }
}

impl Default for Pairer {
    fn default() -> Self {
        Self::new()
    }
}
