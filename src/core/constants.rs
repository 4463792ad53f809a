//! Wire-level constants: subsystem ids, message ids, message types, characteristic UUIDs.

/// Always the first byte of a frame.
pub const FRAME_MAGIC: u8 = 0x55;
/// Always the third byte of a frame.
pub const FRAME_VERSION: u8 = 0x04;
/// Fixed overhead of a frame (magic, length, version, header crc, subsystem, message id,
/// message type, full crc) not counting the payload.
pub const FRAME_OVERHEAD: usize = 13;
/// Largest payload a frame can carry (`255 - FRAME_OVERHEAD`, but the wire length byte tops out
/// at `13 + 242 == 255`).
pub const MAX_PAYLOAD_LEN: usize = 242;

/// GATT characteristic UUIDs (16-bit, within a single service).
pub const CHARACTERISTIC_RECEIVER: u16 = 0xFFF4;
pub const CHARACTERISTIC_SENDER: u16 = 0xFFF5;
pub const CHARACTERISTIC_PAIRING_REQUESTOR: u16 = 0xFFF3;

/// Fixed ASCII client identifier sent during pairing.
pub const CLIENT_IDENTIFIER: &str = "001749319286102";
/// Default 4-digit pairing PIN.
pub const DEFAULT_PIN: &str = "5160";

/// Bytes written to the Receiver characteristic's CCCD to kick off pairing.
pub const START_PAIRING_REQUEST: [u8; 2] = [0x01, 0x00];

/// Logical subsystem selector carried in a frame's `subsystem_id` field.
///
/// The set is closed for every subsystem this crate talks to, but `Unknown` keeps parsing total
/// over arbitrary 16-bit values so a round-tripped frame never loses information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsystemId {
    Status,
    Configurer,
    Pairer,
    Streamer,
    PrePairer,
    OneMorePairer,
    Unknown(u16),
}

impl SubsystemId {
    pub const STATUS: u16 = 0x0000;
    pub const CONFIGURER: u16 = 0x0201;
    pub const PAIRER: u16 = 0x0207;
    pub const STREAMER: u16 = 0x0208;
    pub const PRE_PAIRER: u16 = 0x0402;
    pub const ONE_MORE_PAIRER: u16 = 0x0288;
}

impl From<u16> for SubsystemId {
    fn from(value: u16) -> Self {
        match value {
            Self::STATUS => SubsystemId::Status,
            Self::CONFIGURER => SubsystemId::Configurer,
            Self::PAIRER => SubsystemId::Pairer,
            Self::STREAMER => SubsystemId::Streamer,
            Self::PRE_PAIRER => SubsystemId::PrePairer,
            Self::ONE_MORE_PAIRER => SubsystemId::OneMorePairer,
            other => SubsystemId::Unknown(other),
        }
    }
}

impl From<SubsystemId> for u16 {
    fn from(value: SubsystemId) -> Self {
        match value {
            SubsystemId::Status => SubsystemId::STATUS,
            SubsystemId::Configurer => SubsystemId::CONFIGURER,
            SubsystemId::Pairer => SubsystemId::PAIRER,
            SubsystemId::Streamer => SubsystemId::STREAMER,
            SubsystemId::PrePairer => SubsystemId::PRE_PAIRER,
            SubsystemId::OneMorePairer => SubsystemId::ONE_MORE_PAIRER,
            SubsystemId::Unknown(raw) => raw,
        }
    }
}

/// Per-subsystem command codes (the frame's `message_id` field).
pub mod message_id {
    pub const PAIRING_STARTED: u16 = 0x7911;
    pub const SET_PAIRING_PIN: u16 = 0x72AA;
    pub const PAIRING_STAGE1: u16 = 0x0400;
    pub const PAIRING_STAGE2: u16 = 0x74AA;
    pub const PREPARE_TO_LIVE_STREAM_STAGE1: u16 = 0xFEAB;
    pub const START_SCANNING_WIFI: u16 = 0x8EBB;
    pub const CONNECT_TO_WIFI: u16 = 0x98BB;
    pub const CONFIGURE_STREAMING: u16 = 0xB3BB;
    pub const START_STREAMING: u16 = 0xB4BB;
    pub const STOP_STREAMING: u16 = 0xB5BB;
}

/// Semantic message-type codes (the frame's 24-bit `message_type` field, stored in a u32).
pub mod message_type {
    pub const CONFIGURE: u32 = 0x40028E;
    pub const START_STOP_STREAMING: u32 = 0x40028E;

    pub const MAYBE_STATUS: u32 = 0x000405;
    pub const MAYBE_KEEP_ALIVE: u32 = 0x000427;

    pub const PAIRING_STAGE2: u32 = 0x400032;
    pub const PAIRING_STARTED: u32 = 0x000280;
    pub const SET_PAIRING_PIN: u32 = 0x400745;
    pub const PAIRING_STATUS: u32 = 0xC00745;
    pub const PAIRING_PIN_APPROVED: u32 = 0x400746;
    pub const PAIRING_STAGE1: u32 = 0xC00746;
    pub const CONNECT_TO_WIFI: u32 = 0x400747;
    pub const CONNECT_TO_WIFI_RESULT: u32 = 0xC00747;
    pub const START_SCANNING_WIFI: u32 = 0x4007AB;
    pub const START_SCANNING_WIFI_RESULT: u32 = 0xC007AB;
    pub const WIFI_SCAN_REPORT: u32 = 0x4007AC;

    pub const START_STOP_STREAMING_RESULT: u32 = 0x80028E;
    pub const PREPARE_TO_LIVE_STREAM: u32 = 0x4002E1;
    pub const PREPARE_TO_LIVE_STREAM_RESULT: u32 = 0xC002E1;
    pub const CONFIGURE_STREAMING: u32 = 0x400878;
    pub const STREAMING_STATUS: u32 = 0x000D02;

    pub const UNKNOWN0: u32 = 0x400081;
    pub const UNKNOWN1: u32 = 0x0000F1;
    pub const UNKNOWN2: u32 = 0x0002DC;
    pub const UNKNOWN3: u32 = 0x00041C;
    pub const UNKNOWN4: u32 = 0x000438;
    pub const UNKNOWN5: u32 = 0x000745;

    /// Human-readable name for logging an otherwise-unrecognized message type. `None` for codes
    /// this crate never constructs itself (forward compatibility with device firmware revisions).
    pub fn name(code: u32) -> Option<&'static str> {
        Some(match code {
            CONFIGURE => "Configure/StartStopStreaming",
            MAYBE_STATUS => "MaybeStatus",
            MAYBE_KEEP_ALIVE => "MaybeKeepAlive",
            PAIRING_STAGE2 => "PairingStage2",
            PAIRING_STARTED => "PairingStarted",
            SET_PAIRING_PIN => "SetPairingPIN",
            PAIRING_STATUS => "PairingStatus",
            PAIRING_PIN_APPROVED => "PairingPINApproved",
            PAIRING_STAGE1 => "PairingStage1",
            CONNECT_TO_WIFI => "ConnectToWiFi",
            CONNECT_TO_WIFI_RESULT => "ConnectToWiFiResult",
            START_SCANNING_WIFI => "StartScanningWiFi",
            START_SCANNING_WIFI_RESULT => "StartScanningWiFiResult",
            WIFI_SCAN_REPORT => "WiFiScanReport",
            START_STOP_STREAMING_RESULT => "StartStopStreamingResult",
            PREPARE_TO_LIVE_STREAM => "PrepareToLiveStream",
            PREPARE_TO_LIVE_STREAM_RESULT => "PrepareToLiveStreamResult",
            CONFIGURE_STREAMING => "ConfigureStreaming",
            STREAMING_STATUS => "StreamingStatus",
            UNKNOWN0 => "Unknown0",
            UNKNOWN1 => "Unknown1",
            UNKNOWN2 => "Unknown2",
            UNKNOWN3 => "Unknown3",
            UNKNOWN4 => "Unknown4",
            UNKNOWN5 => "Unknown5",
            _ => return None,
        })
    }
}
