//! Image-stabilization configuration. Stateless: fire a `Configure` frame, log any reply.

use crate::core::action::OutboundAction;
use crate::core::constants::{SubsystemId, message_type};
use crate::core::frame::Frame;
use crate::core::variant::DeviceVariant;
use crate::logging::log_debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StabilizationMode {
    Off,
    RockSteady,
    HorizonSteady,
    RockSteadyPlus,
    HorizonBalancing,
}

impl StabilizationMode {
    fn code(self) -> u8 {
        match self {
            StabilizationMode::Off => 0,
            StabilizationMode::RockSteady => 1,
            StabilizationMode::HorizonSteady => 2,
            StabilizationMode::RockSteadyPlus => 3,
            StabilizationMode::HorizonBalancing => 4,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigurerOutcome {
    pub actions: Vec<OutboundAction>,
}

pub struct Configurer {
    variant: DeviceVariant,
}

impl Configurer {
    pub fn new(variant: DeviceVariant) -> Self {
        Self { variant }
    }

    pub fn set_image_stabilization(&mut self, mode: StabilizationMode) -> ConfigurerOutcome {
        let payload = vec![
            0x01,
            0x01,
            self.variant.stabilization_anchor_byte(),
            0x00,
            0x01,
            mode.code(),
        ];
        ConfigurerOutcome {
            actions: vec![OutboundAction::Frame {
                frame: Frame::new(SubsystemId::Configurer, 0, message_type::CONFIGURE, payload),
                no_response: true,
            }],
        }
    }

    /// Configure frames addressed to the Configurer subsystem are logged; no confirmation is
    /// awaited by higher layers.
    pub fn handle_incoming(&mut self, frame: &Frame) -> ConfigurerOutcome {
        if frame.subsystem == SubsystemId::Configurer && frame.message_type == message_type::CONFIGURE {
            log_debug(&format!(
                "received configurer result: {}",
                hex::encode(&frame.payload)
            ));
        }
        ConfigurerOutcome::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stabilization_payload_uses_variant_anchor_byte() {
        let mut configurer = Configurer::new(DeviceVariant::OsmoAction5Pro);
        let outcome = configurer.set_image_stabilization(StabilizationMode::RockSteady);
        match &outcome.actions[0] {
            OutboundAction::Frame { frame, .. } => {
                assert_eq!(frame.payload, vec![0x01, 0x01, 0x1A, 0x00, 0x01, 0x01]);
            }
            _ => panic!("expected frame action"),
        }
    }

    #[test]
    fn inbound_configure_reply_produces_no_actions() {
        let mut configurer = Configurer::new(DeviceVariant::OsmoAction3);
        let reply = Frame::new(SubsystemId::Configurer, 0, message_type::CONFIGURE, vec![0x00]);
        let outcome = configurer.handle_incoming(&reply);
        assert!(outcome.actions.is_empty());
    }
}
