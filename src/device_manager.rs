//! Owns a set of device sessions, runs (and replaces) flows, and aggregates per-device state for
//! a caller driving more than one device at once.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::flow::{Flow, FlowOptions, FlowOutcome};
use crate::core::session::DeviceSession;
use crate::core::streamer::{Fps, Resolution};
use crate::core::variant::DeviceVariant;
use crate::error::CoreError;
use crate::logging::{log_info, log_warn};

/// Caller-supplied parameters for driving one device from idle to streaming.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub ssid: String,
    pub psk: String,
    pub rtmp_url: String,
    pub resolution: Resolution,
    pub bitrate_kbps: u16,
    pub fps: Fps,
    pub device_addr_filter: Option<String>,
    pub device_name_filter: Option<String>,
}

impl From<&ConnectionOptions> for FlowOptions {
    fn from(options: &ConnectionOptions) -> Self {
        FlowOptions {
            ssid: options.ssid.clone(),
            psk: options.psk.clone(),
            rtmp_url: options.rtmp_url.clone(),
            resolution: options.resolution,
            bitrate_kbps: options.bitrate_kbps,
            fps: options.fps,
            ..FlowOptions::default()
        }
    }
}

/// Aggregate per-device state, independent of whether a flow is currently driving the device.
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    pub is_paired: bool,
    pub is_wifi_connected: bool,
    pub is_prepared: bool,
    pub is_streaming: bool,
}

struct ManagedDevice {
    session: Arc<Mutex<DeviceSession>>,
    state: DeviceState,
    active_flow: Option<Flow>,
}

/// Owns every device this process currently knows about, keyed by BLE address.
#[derive(Default)]
pub struct DeviceManager {
    devices: HashMap<String, ManagedDevice>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly connected device under `device_id` (its BLE address). Replaces any
    /// prior registration for the same id.
    pub fn register(&mut self, device_id: impl Into<String>, transport: Box<dyn crate::core::transport::Transport + Send>, variant: DeviceVariant) {
        let session = Arc::new(Mutex::new(DeviceSession::new(transport, variant)));
        self.devices.insert(
            device_id.into(),
            ManagedDevice {
                session,
                state: DeviceState::default(),
                active_flow: None,
            },
        );
    }

    pub fn device_state(&self, device_id: &str) -> Option<DeviceState> {
        self.devices.get(device_id).map(|d| d.state.clone())
    }

    /// Stops any flow already running for `device_id`, then starts a new one. The replaced flow
    /// is stopped, never merely abandoned: it is returned so the caller can await its outcome
    /// (which resolves to [`FlowOutcome::Cancelled`] or a failure, never silently dropped).
    pub async fn run_flow(&mut self, device_id: &str, options: &ConnectionOptions) -> Result<Option<Flow>, CoreError> {
        let device = self
            .devices
            .get_mut(device_id)
            .ok_or_else(|| CoreError::Discovery(format!("unknown device id: {device_id}")))?;

        let replaced = if let Some(prior) = device.active_flow.take() {
            log_info(&format!("replacing active flow for device {device_id}"));
            prior.stop().await;
            Some(prior)
        } else {
            None
        };

        let flow = Flow::start(device.session.clone(), FlowOptions::from(options));
        device.active_flow = Some(flow);
        Ok(replaced)
    }

    /// Best-effort-stops every device's active flow. Aggregates failures rather than stopping at
    /// the first one.
    pub async fn stop_all(&mut self) {
        for (device_id, device) in self.devices.iter_mut() {
            if let Some(flow) = device.active_flow.take() {
                flow.stop().await;
                log_info(&format!("stopped flow for device {device_id}"));
            }
        }
    }

    /// Awaits completion of `device_id`'s active flow, updating aggregate state on success.
    pub async fn wait_flow(&mut self, device_id: &str) -> Option<FlowOutcome> {
        let device = self.devices.get_mut(device_id)?;
        let flow = device.active_flow.take()?;
        let outcome = flow.wait().await;
        match &outcome {
            FlowOutcome::Success => {
                device.state.is_paired = true;
                device.state.is_wifi_connected = true;
                device.state.is_prepared = true;
                device.state.is_streaming = true;
            }
            FlowOutcome::Failure(reason) => {
                log_warn(&format!("flow for device {device_id} failed: {reason}"));
            }
            FlowOutcome::Cancelled => {}
        }
        Some(outcome)
    }
}
