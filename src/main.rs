use std::sync::Arc;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;

use dji_action_link::core::{CharacteristicKind, DeviceSession, DeviceVariant, Flow, FlowOptions, FlowOutcome, Fps, Resolution, Transport};
use dji_action_link::{CoreError, init_logger, log_info};

#[derive(Parser)]
#[command(name = "dji-action-link")]
#[command(about = "Drive a DJI Osmo action camera from idle to live-streaming over BLE")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe the BLE advertisement filter policy; scanning itself needs a real radio adapter.
    Discover,
    /// Run the idle-to-streaming flow against the given device. Without a real `Transport`
    /// adapter wired in, this demonstrates the call sequence and times out waiting for replies.
    Stream {
        ssid: String,
        psk: String,
        url: String,
        #[arg(long, default_value = "1080p")]
        resolution: String,
        #[arg(long, default_value_t = 5000)]
        bitrate: u16,
        #[arg(long, default_value_t = 25)]
        fps: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    init_logger();

    let cli = Cli::parse();
    match cli.command {
        Commands::Discover => {
            log_info("BLE scanning is supplied by the host application via a Transport adapter");
            log_info(
                "candidates are identified from manufacturer data key 0x08AA, see dji_action_link::core::match_candidate",
            );
        }
        Commands::Stream {
            ssid,
            psk,
            url,
            resolution,
            bitrate,
            fps,
        } => {
            let resolution = parse_resolution(&resolution)?;
            let fps = parse_fps(fps)?;

            let session = Arc::new(Mutex::new(DeviceSession::new(
                Box::new(NullTransport),
                DeviceVariant::OsmoAction4,
            )));
            {
                let mut guard = session.lock().await;
                guard.bind_characteristic(CharacteristicKind::Receiver);
                guard.bind_characteristic(CharacteristicKind::Sender);
                guard.bind_characteristic(CharacteristicKind::PairingRequestor);
            }

            let flow = Flow::start(
                session,
                FlowOptions {
                    ssid,
                    psk,
                    rtmp_url: url,
                    resolution,
                    bitrate_kbps: bitrate,
                    fps,
                    ..FlowOptions::default()
                },
            );

            match flow.wait().await {
                FlowOutcome::Success => log_info("stream started"),
                FlowOutcome::Failure(reason) => log_info(&format!("stream failed: {reason}")),
                FlowOutcome::Cancelled => log_info("stream cancelled"),
            }
        }
    }

    Ok(())
}

fn parse_resolution(s: &str) -> Result<Resolution, CoreError> {
    match s {
        "480p" => Ok(Resolution::Res480p),
        "720p" => Ok(Resolution::Res720p),
        "1080p" => Ok(Resolution::Res1080p),
        other => Err(CoreError::Discovery(format!("unsupported resolution: {other}"))),
    }
}

fn parse_fps(fps: u32) -> Result<Fps, CoreError> {
    match fps {
        25 => Ok(Fps::Fps25),
        30 => Ok(Fps::Fps30),
        other => Err(CoreError::Discovery(format!("unsupported fps: {other}"))),
    }
}

/// Accepts every write and never delivers a reply. Real use requires a real BLE adapter behind
/// [`Transport`]; this stands in only so the demo binary has something to run against.
struct NullTransport;

#[async_trait]
impl Transport for NullTransport {
    async fn connect(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), CoreError> {
        Ok(())
    }

    async fn write(&mut self, _data: &[u8], _no_response: bool) -> Result<(), CoreError> {
        Ok(())
    }

    async fn write_cccd(&mut self, _data: &[u8]) -> Result<(), CoreError> {
        Ok(())
    }
}
