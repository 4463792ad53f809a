//! Protocol core: frame codec, subsystem state machines, device session, and flow orchestrator.

pub mod action;
pub mod configurer;
pub mod constants;
pub mod crc;
pub mod discovery;
pub mod flow;
pub mod frame;
pub mod pairer;
pub mod session;
pub mod streamer;
pub mod transport;
pub mod variant;

#[cfg(test)]
pub mod mock_transport;

pub use action::OutboundAction;
pub use configurer::{Configurer, ConfigurerOutcome, StabilizationMode};
pub use constants::SubsystemId;
pub use discovery::{Candidate, match_candidate};
pub use flow::{Flow, FlowOptions, FlowOutcome};
pub use frame::{Frame, pack_short_string, pack_url};
pub use pairer::{Pairer, PairerEvent, PairerOutcome, PairerState};
pub use session::{CharacteristicKind, DeviceSession, LinkState, SessionEvent};
pub use streamer::{Fps, Resolution, Streamer, StreamerEvent, StreamerOutcome, StreamerState};
pub use transport::Transport;
pub use variant::{DeviceVariant, identify_variant};
