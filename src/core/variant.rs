//! Device variant identification from BLE advertisement manufacturer data.

/// Manufacturer-data key (within the BLE advertisement) that carries the variant bytes.
pub const MANUFACTURER_DATA_KEY: u16 = 0x08AA;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceVariant {
    OsmoAction3,
    OsmoAction4,
    OsmoAction5Pro,
    OsmoPocket3,
    /// Advertised, manufacturer data present, but not one of the known byte pairs.
    Unknown,
    /// No manufacturer data under [`MANUFACTURER_DATA_KEY`], or fewer than 2 bytes of it.
    Undefined,
}

impl DeviceVariant {
    /// The "device kind byte" used in `ConfigureStreaming` payloads.
    pub fn device_kind_byte(self) -> u8 {
        match self {
            DeviceVariant::OsmoAction5Pro => 0x2E,
            _ => 0x2A,
        }
    }

    /// The "stabilization anchor byte" used in `Configure` payloads.
    pub fn stabilization_anchor_byte(self) -> u8 {
        match self {
            DeviceVariant::OsmoAction5Pro => 0x1A,
            _ => 0x08,
        }
    }
}

/// Identifies a device variant from the raw bytes found under [`MANUFACTURER_DATA_KEY`].
pub fn identify_variant(manufacturer_data: Option<&[u8]>) -> DeviceVariant {
    let Some(data) = manufacturer_data else {
        return DeviceVariant::Undefined;
    };
    if data.len() < 2 {
        return DeviceVariant::Undefined;
    }
    match (data[0], data[1]) {
        (0x12, 0x00) => DeviceVariant::OsmoAction3,
        (0x14, 0x00) => DeviceVariant::OsmoAction4,
        (0x15, 0x00) => DeviceVariant::OsmoAction5Pro,
        (0x20, 0x00) => DeviceVariant::OsmoPocket3,
        _ => DeviceVariant::Unknown,
    }
}
