use dji_action_link::core::{Frame, SubsystemId};
use proptest::prelude::*;

proptest! {
    #[test]
    fn round_trip_holds_for_arbitrary_payloads(
        subsystem in any::<u16>(),
        message_id in any::<u16>(),
        message_type in 0u32..=0xFF_FFFF,
        payload in proptest::collection::vec(any::<u8>(), 0..=242),
    ) {
        let frame = Frame::new(SubsystemId::from(subsystem), message_id, message_type, payload);
        let bytes = frame.serialize();
        let parsed = Frame::parse(&bytes).expect("a frame this crate serialized must parse back");
        prop_assert_eq!(parsed, frame);
    }

    #[test]
    fn a_single_corrupted_byte_never_parses_to_the_original(
        subsystem in any::<u16>(),
        payload in proptest::collection::vec(any::<u8>(), 1..=242),
        flip_index in 0usize..255,
    ) {
        let frame = Frame::new(SubsystemId::from(subsystem), 0, 0, payload);
        let mut bytes = frame.serialize();
        let index = flip_index % bytes.len();
        bytes[index] ^= 0xFF;
        if let Ok(parsed) = Frame::parse(&bytes) {
            prop_assert_ne!(parsed, frame);
        }
    }
}
