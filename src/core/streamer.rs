//! Live-stream lifecycle: prepare, configure, start, stop.

use crate::core::action::OutboundAction;
use crate::core::constants::{SubsystemId, message_id, message_type};
use crate::core::frame::{Frame, pack_url};
use crate::core::variant::DeviceVariant;
use crate::error::CoreError;
use crate::logging::{log_debug, log_info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamerState {
    Idle,
    PreparingStage1,
    PreparingStage2,
    Starting,
    Stopping,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamerEvent {
    PrepareComplete,
    StartComplete,
    StopComplete,
    BatteryChanged(u8),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Res480p,
    Res720p,
    Res1080p,
}

impl Resolution {
    fn code(self) -> u8 {
        match self {
            Resolution::Res480p => 0x47,
            Resolution::Res720p => 0x04,
            Resolution::Res1080p => 0x0A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fps {
    Fps25,
    Fps30,
}

impl Fps {
    fn code(self) -> u8 {
        match self {
            Fps::Fps25 => 0x02,
            Fps::Fps30 => 0x03,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamerOutcome {
    pub actions: Vec<OutboundAction>,
    pub events: Vec<StreamerEvent>,
}

impl StreamerOutcome {
    fn empty() -> Self {
        Self::default()
    }
}

pub struct Streamer {
    state: StreamerState,
    variant: DeviceVariant,
}

impl Streamer {
    pub fn new(variant: DeviceVariant) -> Self {
        Self {
            state: StreamerState::Idle,
            variant,
        }
    }

    pub fn state(&self) -> StreamerState {
        self.state
    }

    pub fn prepare_to_live_stream(&mut self) -> StreamerOutcome {
        log_info("preparing to live stream (stage 1)");
        self.state = StreamerState::PreparingStage1;
        StreamerOutcome {
            actions: vec![OutboundAction::Frame {
                frame: Frame::new(
                    SubsystemId::Streamer,
                    message_id::PREPARE_TO_LIVE_STREAM_STAGE1,
                    message_type::PREPARE_TO_LIVE_STREAM,
                    vec![0x1A],
                ),
                no_response: true,
            }],
            events: vec![],
        }
    }

    pub fn start_live_stream(
        &mut self,
        resolution: Resolution,
        bitrate_kbps: u16,
        fps: Fps,
        rtmp_url: &str,
    ) -> Result<StreamerOutcome, CoreError> {
        log_info(&format!("starting live stream to {rtmp_url}"));

        let mut payload = vec![0x00, self.variant.device_kind_byte(), 0x00, resolution.code()];
        payload.extend_from_slice(&bitrate_kbps.to_le_bytes());
        payload.extend_from_slice(&[0x02, 0x00]);
        payload.push(fps.code());
        payload.extend_from_slice(&[0x00, 0x00, 0x00]);
        payload.extend_from_slice(&pack_url(rtmp_url)?);

        let configure = Frame::new(
            SubsystemId::Streamer,
            message_id::CONFIGURE_STREAMING,
            message_type::CONFIGURE_STREAMING,
            payload,
        );

        self.state = StreamerState::Starting;
        let start = Frame::new(
            SubsystemId::Streamer,
            message_id::START_STREAMING,
            message_type::START_STOP_STREAMING,
            vec![0x01, 0x01, 0x1A, 0x00, 0x01, 0x01],
        );

        Ok(StreamerOutcome {
            actions: vec![
                OutboundAction::Frame {
                    frame: configure,
                    no_response: true,
                },
                OutboundAction::Frame {
                    frame: start,
                    no_response: true,
                },
            ],
            events: vec![],
        })
    }

    pub fn stop_live_stream(&mut self) -> StreamerOutcome {
        log_info("stopping live stream");
        self.state = StreamerState::Stopping;
        StreamerOutcome {
            actions: vec![OutboundAction::Frame {
                frame: Frame::new(
                    SubsystemId::Streamer,
                    message_id::STOP_STREAMING,
                    message_type::START_STOP_STREAMING,
                    vec![0x01, 0x01, 0x1A, 0x00, 0x01, 0x02],
                ),
                no_response: true,
            }],
            events: vec![],
        }
    }

    pub fn handle_incoming(&mut self, frame: &Frame) -> StreamerOutcome {
        match frame.message_type {
            message_type::PREPARE_TO_LIVE_STREAM_RESULT => self.handle_prepare_result(frame),
            message_type::START_STOP_STREAMING_RESULT => self.handle_start_stop_result(frame),
            message_type::STREAMING_STATUS => self.handle_streaming_status(frame),
            _ => StreamerOutcome::empty(),
        }
    }

    fn handle_prepare_result(&mut self, frame: &Frame) -> StreamerOutcome {
        if self.state != StreamerState::PreparingStage1 {
            return StreamerOutcome::empty();
        }
        if frame.payload == [0x00] {
            log_info("prepare stage 1 succeeded, sending stage 2");
            self.state = StreamerState::PreparingStage2;
            StreamerOutcome {
                actions: vec![OutboundAction::Frame {
                    // Sent with message_id StartStreaming and message_type StartStopStreaming: a
                    // protocol quirk preserved exactly, see SPEC_FULL.md §9.
                    frame: Frame::new(
                        SubsystemId::Streamer,
                        message_id::START_STREAMING,
                        message_type::START_STOP_STREAMING,
                        vec![0x00, 0x01, 0x1C, 0x00],
                    ),
                    no_response: true,
                }],
                events: vec![],
            }
        } else {
            let hex = hex::encode(&frame.payload);
            log_debug(&format!("prepare stage 1 failed, payload: {hex}"));
            StreamerOutcome {
                actions: vec![],
                events: vec![StreamerEvent::Error(format!(
                    "prepare stage 1 failed, payload: {hex}"
                ))],
            }
        }
    }

    fn handle_start_stop_result(&mut self, frame: &Frame) -> StreamerOutcome {
        match self.state {
            StreamerState::PreparingStage2 => {
                log_info("prepare stage 2 succeeded");
                self.state = StreamerState::Idle;
                StreamerOutcome {
                    actions: vec![],
                    events: vec![StreamerEvent::PrepareComplete],
                }
            }
            StreamerState::Starting if frame.message_id == message_id::START_STREAMING => {
                log_info("live stream start succeeded");
                self.state = StreamerState::Idle;
                StreamerOutcome {
                    actions: vec![],
                    events: vec![StreamerEvent::StartComplete],
                }
            }
            StreamerState::Stopping => {
                log_info("live stream stop succeeded");
                self.state = StreamerState::Idle;
                StreamerOutcome {
                    actions: vec![],
                    events: vec![StreamerEvent::StopComplete],
                }
            }
            _ => StreamerOutcome::empty(),
        }
    }

    fn handle_streaming_status(&mut self, frame: &Frame) -> StreamerOutcome {
        if frame.payload.len() >= 21 {
            let battery = frame.payload[20];
            StreamerOutcome {
                actions: vec![],
                events: vec![StreamerEvent::BatteryChanged(battery)],
            }
        } else {
            StreamerOutcome::empty()
        }
    }
}
