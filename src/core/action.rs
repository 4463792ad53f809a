//! The outbound side of a subsystem [`crate::core::frame::Frame`] exchange.
//!
//! Subsystems never touch the transport themselves; an operation returns the actions it wants
//! performed, and the owning [`crate::core::session::DeviceSession`] executes them in order. See
//! SPEC_FULL.md §9 "Back-references" for why.

use crate::core::frame::Frame;

#[derive(Debug, Clone)]
pub enum OutboundAction {
    Frame { frame: Frame, no_response: bool },
    RawPairing(Vec<u8>),
}
