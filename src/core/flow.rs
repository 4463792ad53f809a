//! Drives a device session from idle to live-streaming: connect, initialize, pair, prepare,
//! provision Wi-Fi, start.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;

use crate::core::pairer::PairerEvent;
use crate::core::session::{DeviceSession, LinkState, SessionEvent};
use crate::core::streamer::{Fps, Resolution, StreamerEvent};
use crate::error::CoreError;
use crate::logging::{log_info, log_warn};

#[derive(Debug, Clone)]
pub struct FlowOptions {
    pub ssid: String,
    pub psk: String,
    pub rtmp_url: String,
    pub resolution: Resolution,
    pub bitrate_kbps: u16,
    pub fps: Fps,
    pub step_timeout: Duration,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            psk: String::new(),
            rtmp_url: String::new(),
            resolution: Resolution::Res1080p,
            bitrate_kbps: 5000,
            fps: Fps::Fps25,
            step_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    Success,
    Failure(String),
    Cancelled,
}

/// A single idle-to-streaming run. Only one should be active per device; starting a new one for
/// the same device is the caller's (or [`crate::device_manager::DeviceManager`]'s) job to enforce.
pub struct Flow {
    cancel: Arc<AtomicBool>,
    session: Arc<Mutex<DeviceSession>>,
    handle: JoinHandle<FlowOutcome>,
}

impl Flow {
    pub fn start(session: Arc<Mutex<DeviceSession>>, options: FlowOptions) -> Flow {
        let cancel = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(run(session.clone(), options, cancel.clone()));
        Flow {
            cancel,
            session,
            handle,
        }
    }

    /// Awaits completion of the flow task.
    pub async fn wait(self) -> FlowOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => FlowOutcome::Failure(format!("flow task panicked: {e}")),
        }
    }

    /// Flips the cancellation flag and issues a best-effort stop. Does not interrupt an inflight
    /// transport write; a late completion after this call is simply discarded by the flow task.
    pub async fn stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
        let mut guard = self.session.lock().await;
        if let Err(e) = guard.stop_live_stream().await {
            log_warn(&format!("best-effort stop_live_stream failed: {e}"));
        }
    }
}

async fn run(session: Arc<Mutex<DeviceSession>>, options: FlowOptions, cancel: Arc<AtomicBool>) -> FlowOutcome {
    match run_inner(&session, &options, &cancel).await {
        _ if cancel.load(Ordering::SeqCst) => FlowOutcome::Cancelled,
        Ok(()) => FlowOutcome::Success,
        Err(e) => FlowOutcome::Failure(e.to_string()),
    }
}

async fn run_inner(
    session: &Arc<Mutex<DeviceSession>>,
    options: &FlowOptions,
    cancel: &Arc<AtomicBool>,
) -> Result<(), CoreError> {
    let (mut session_rx, mut pairer_rx, mut streamer_rx) = {
        let guard = session.lock().await;
        (
            guard.subscribe_session(),
            guard.subscribe_pairer(),
            guard.subscribe_streamer(),
        )
    };

    let (initialized, link_state) = {
        let guard = session.lock().await;
        (guard.is_initialized(), guard.link_state())
    };

    if !initialized {
        if link_state == LinkState::Disconnected {
            session.lock().await.connect().await?;
            wait_for_session(&mut session_rx, options.step_timeout, "link up", |e| {
                matches!(e, SessionEvent::Connected)
            })
            .await?;
        }
        wait_for_session(&mut session_rx, options.step_timeout, "link initialized", |e| {
            matches!(e, SessionEvent::Initialized)
        })
        .await?;
    }
    if cancel.load(Ordering::SeqCst) {
        return Ok(());
    }

    log_info("flow: pairing");
    session.lock().await.pair().await?;
    wait_for_pairer(&mut pairer_rx, options.step_timeout, "pairing", |e| {
        matches!(e, PairerEvent::PairingComplete)
    })
    .await?;
    if cancel.load(Ordering::SeqCst) {
        return Ok(());
    }

    log_info("flow: preparing to live stream");
    session.lock().await.prepare_to_live_stream().await?;
    wait_for_streamer(&mut streamer_rx, options.step_timeout, "prepare", |e| {
        matches!(e, StreamerEvent::PrepareComplete)
    })
    .await?;
    if cancel.load(Ordering::SeqCst) {
        return Ok(());
    }

    log_info("flow: connecting to WiFi");
    session
        .lock()
        .await
        .connect_to_wifi(&options.ssid, &options.psk)
        .await?;
    wait_for_pairer(&mut pairer_rx, options.step_timeout, "wifi connect", |e| {
        matches!(e, PairerEvent::WifiConnected)
    })
    .await?;
    if cancel.load(Ordering::SeqCst) {
        return Ok(());
    }

    log_info("flow: starting live stream");
    session
        .lock()
        .await
        .start_live_stream(options.resolution, options.bitrate_kbps, options.fps, &options.rtmp_url)
        .await?;
    wait_for_streamer(&mut streamer_rx, options.step_timeout, "start", |e| {
        matches!(e, StreamerEvent::StartComplete)
    })
    .await?;

    log_info("flow: done");
    Ok(())
}

async fn wait_for_session(
    rx: &mut broadcast::Receiver<SessionEvent>,
    timeout: Duration,
    phase: &str,
    matches: impl Fn(&SessionEvent) -> bool,
) -> Result<(), CoreError> {
    let sleep = tokio::time::sleep(timeout);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return Err(CoreError::StepTimeout(phase.to_string())),
            received = rx.recv() => match received {
                Ok(SessionEvent::Disconnected) => return Err(CoreError::TransportLost),
                Ok(SessionEvent::Error(msg)) => return Err(CoreError::PairingRejected(msg)),
                Ok(ref event) if matches(event) => return Ok(()),
                Ok(_) => continue,
                Err(_) => return Err(CoreError::TransportLost),
            },
        }
    }
}

async fn wait_for_pairer(
    rx: &mut broadcast::Receiver<PairerEvent>,
    timeout: Duration,
    phase: &str,
    matches: impl Fn(&PairerEvent) -> bool,
) -> Result<(), CoreError> {
    let sleep = tokio::time::sleep(timeout);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return Err(CoreError::StepTimeout(phase.to_string())),
            received = rx.recv() => match received {
                Ok(PairerEvent::Error(msg)) => return Err(CoreError::PairingRejected(msg)),
                Ok(ref event) if matches(event) => return Ok(()),
                Ok(_) => continue,
                Err(_) => return Err(CoreError::TransportLost),
            },
        }
    }
}

async fn wait_for_streamer(
    rx: &mut broadcast::Receiver<StreamerEvent>,
    timeout: Duration,
    phase: &str,
    matches: impl Fn(&StreamerEvent) -> bool,
) -> Result<(), CoreError> {
    let sleep = tokio::time::sleep(timeout);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return Err(CoreError::StepTimeout(phase.to_string())),
            received = rx.recv() => match received {
                Ok(StreamerEvent::Error(msg)) => return Err(CoreError::PrepareStageFailed(msg)),
                Ok(ref event) if matches(event) => return Ok(()),
                Ok(_) => continue,
                Err(_) => return Err(CoreError::TransportLost),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{SubsystemId, message_id, message_type};
    use crate::core::frame::Frame;
    use crate::core::mock_transport::MockTransport;
    use crate::core::session::CharacteristicKind;
    use crate::core::variant::DeviceVariant;

    fn reply(message_id: u16, message_type: u32, payload: Vec<u8>) -> Frame {
        Frame::new(SubsystemId::Streamer, message_id, message_type, payload)
    }

    #[tokio::test]
    async fn full_mock_flow_reaches_success_seed_scenario_e() {
        let transport = MockTransport::new()
            .on(
                message_type::SET_PAIRING_PIN,
                vec![reply(0, message_type::PAIRING_STATUS, vec![0x00, 0x01])],
            )
            .on(
                message_type::PREPARE_TO_LIVE_STREAM,
                vec![reply(0, message_type::PREPARE_TO_LIVE_STREAM_RESULT, vec![0x00])],
            )
            // The prepare-stage2 advance and the final start command share a message_type
            // (and message_id, see streamer.rs's handle_prepare_result comment); registering
            // one entry per occurrence lets MockTransport answer each write in turn instead of
            // re-matching the same reply for both.
            .on(
                message_type::START_STOP_STREAMING,
                vec![reply(0, message_type::START_STOP_STREAMING_RESULT, vec![0x00])],
            )
            .on(
                message_type::START_STOP_STREAMING,
                vec![
                    reply(message_id::START_STREAMING, message_type::START_STOP_STREAMING_RESULT, vec![0x00]),
                ],
            )
            .on(
                message_type::CONNECT_TO_WIFI,
                vec![reply(0, message_type::CONNECT_TO_WIFI_RESULT, vec![0x00, 0x00])],
            );
        let mut inbound = transport.subscribe();

        // An unsolicited battery reading, as the device sends around the start command.
        let mut battery_status = vec![0u8; 21];
        battery_status[20] = 100;
        transport.push_unsolicited(reply(0, message_type::STREAMING_STATUS, battery_status));

        let session = Arc::new(Mutex::new(DeviceSession::new(
            Box::new(transport),
            DeviceVariant::OsmoAction4,
        )));
        {
            let mut guard = session.lock().await;
            guard.bind_characteristic(CharacteristicKind::Receiver);
            guard.bind_characteristic(CharacteristicKind::Sender);
            guard.bind_characteristic(CharacteristicKind::PairingRequestor);
        }
        let mut streamer_events = session.lock().await.subscribe_streamer();

        let flow = Flow::start(
            session.clone(),
            FlowOptions {
                ssid: "test-ssid".into(),
                psk: "test-psk".into(),
                rtmp_url: "rtmp://test/live".into(),
                resolution: Resolution::Res1080p,
                bitrate_kbps: 5000,
                fps: Fps::Fps25,
                step_timeout: Duration::from_secs(2),
            },
        );

        // Forwards the mock transport's scripted replies into the session, standing in for the
        // real notification path a BLE adapter would drive.
        let session_for_pump = session.clone();
        let pump = tokio::spawn(async move {
            while let Ok(bytes) = inbound.recv().await {
                session_for_pump.lock().await.handle_notification(&bytes).await;
            }
        });

        let outcome = flow.wait().await;
        pump.abort();
        assert_eq!(outcome, FlowOutcome::Success);

        let mut saw_battery_100 = false;
        while let Ok(event) = streamer_events.try_recv() {
            if matches!(event, StreamerEvent::BatteryChanged(100)) {
                saw_battery_100 = true;
            }
        }
        assert!(saw_battery_100, "expected a BatteryChanged(100) event from the unsolicited streaming status notification");
    }
}
