//! The BLE link a [`crate::core::session::DeviceSession`] drives. Kept behind a trait so tests
//! can substitute a mock instead of a real adapter.

use async_trait::async_trait;

use crate::error::CoreError;

/// A single GATT connection's write surface.
///
/// Implementors own the platform-specific central-role plumbing (scanning, connecting, service
/// discovery). This crate only ever calls the four methods below.
#[async_trait]
pub trait Transport: Send {
    /// Opens the link and discovers the characteristics this crate talks to.
    async fn connect(&mut self) -> Result<(), CoreError>;

    /// Closes the link. Idempotent.
    async fn disconnect(&mut self) -> Result<(), CoreError>;

    /// Writes `data` to the Sender characteristic (0xFFF5).
    async fn write(&mut self, data: &[u8], no_response: bool) -> Result<(), CoreError>;

    /// Writes `data` to the Receiver characteristic's CCCD (0xFFF4), the
    /// abuse-the-descriptor trick that opens pairing.
    async fn write_cccd(&mut self, data: &[u8]) -> Result<(), CoreError>;
}
