//! Error taxonomy for the device-control core.

use thiserror::Error;

/// Errors surfaced by the frame codec, subsystem state machines, transport, and discovery layers.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A received buffer failed frame validation (magic, length, version, or either CRC).
    #[error("received buffer failed frame validation")]
    ParseReject,

    /// A send was attempted before all three characteristics were bound.
    #[error("attempted to send before the device session was initialized")]
    SendWhileUninitialized,

    /// The device rejected a pairing attempt.
    #[error("pairing rejected: {0}")]
    PairingRejected(String),

    /// A live-stream prepare stage failed.
    #[error("prepare stage failed: {0}")]
    PrepareStageFailed(String),

    /// A flow phase did not observe its expected event before its deadline.
    #[error("timed out waiting for: {0}")]
    StepTimeout(String),

    /// The transport reported the link as gone mid-operation.
    #[error("transport link lost")]
    TransportLost,

    /// A string argument (client identifier, PIN, SSID, PSK, RTMP URL) does not fit in its
    /// wire-format length prefix.
    #[error("string of {0} bytes does not fit its length prefix")]
    StringTooLong(usize),

    /// A transport-level failure (connect, disconnect, write, or CCCD write).
    #[error("transport error: {0}")]
    Transport(String),

    /// A discovery-layer failure (scan start/stop, advertisement decoding).
    #[error("discovery error: {0}")]
    Discovery(String),
}
