//! # dji-action-link — drive DJI Osmo action cameras and gimbals over BLE into a live stream
//!
//! This crate encapsulates the proprietary BLE framing, pairing handshake, Wi-Fi provisioning,
//! and live-stream configuration needed to take a freshly-discovered device from idle to actively
//! streaming to an RTMP endpoint. BLE transport (scanning, GATT connect, characteristic I/O) is an
//! external collaborator supplied by the caller through the [`core::Transport`] trait; this crate
//! owns only the protocol core and orchestration above it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dji_action_link::core::{DeviceSession, Flow, FlowOptions, DeviceVariant};
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//!
//! # async fn example(transport: Box<dyn dji_action_link::core::Transport + Send>) {
//! let session = Arc::new(Mutex::new(DeviceSession::new(transport, DeviceVariant::OsmoAction4)));
//! let flow = Flow::start(session, FlowOptions {
//!     ssid: "my-wifi".into(),
//!     psk: "hunter2".into(),
//!     rtmp_url: "rtmp://ingest.example.com/live/key".into(),
//!     ..FlowOptions::default()
//! });
//! let outcome = flow.wait().await;
//! # let _ = outcome;
//! # }
//! ```

pub mod core;
pub mod device_manager;
pub mod error;
pub mod logging;

pub use crate::device_manager::{ConnectionOptions, DeviceManager, DeviceState};
pub use crate::error::CoreError;
pub use crate::logging::{init_logger, log_info};
