//! Advertisement-to-candidate matching policy, kept separate from the scan itself so it is
//! testable without a real radio.

use crate::core::variant::{DeviceVariant, identify_variant};

/// A caller-supplied filter narrowing which advertisements are treated as candidates.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilter {
    pub device_addr_filter: Option<String>,
    pub device_name_filter: Option<String>,
}

/// A single advertisement as seen by the scan, before any filtering.
#[derive(Debug, Clone)]
pub struct Advertisement {
    pub address: String,
    pub name: Option<String>,
    pub manufacturer_data: Option<Vec<u8>>,
}

/// An advertisement accepted as a candidate, with its variant resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub address: String,
    pub variant: DeviceVariant,
}

/// Applies the same candidate policy as the original device manager's advertisement handler:
/// unrecognized manufacturer data is still a candidate if a name filter matches; no manufacturer
/// data and no matching name filter is never a candidate; an address filter then excludes
/// anything that doesn't contain it.
pub fn match_candidate(advertisement: &Advertisement, filter: &DiscoveryFilter) -> Option<Candidate> {
    let variant = identify_variant(advertisement.manufacturer_data.as_deref());

    let variant = match variant {
        DeviceVariant::Undefined => {
            let name_matches = match (&filter.device_name_filter, &advertisement.name) {
                (Some(wanted), Some(name)) => name.contains(wanted.as_str()),
                _ => false,
            };
            if name_matches {
                DeviceVariant::Unknown
            } else {
                return None;
            }
        }
        other => other,
    };

    if let Some(wanted_addr) = &filter.device_addr_filter {
        if !advertisement.address.contains(wanted_addr.as_str()) {
            return None;
        }
    }

    Some(Candidate {
        address: advertisement.address.clone(),
        variant,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adv(name: Option<&str>, manufacturer_data: Option<Vec<u8>>) -> Advertisement {
        Advertisement {
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            name: name.map(String::from),
            manufacturer_data,
        }
    }

    #[test]
    fn recognized_manufacturer_data_is_always_a_candidate() {
        let filter = DiscoveryFilter::default();
        let candidate = match_candidate(&adv(None, Some(vec![0x12, 0x00])), &filter).unwrap();
        assert_eq!(candidate.variant, DeviceVariant::OsmoAction3);
    }

    #[test]
    fn undefined_without_name_filter_match_is_not_a_candidate() {
        let filter = DiscoveryFilter::default();
        assert!(match_candidate(&adv(Some("Osmo"), None), &filter).is_none());
    }

    #[test]
    fn undefined_with_matching_name_filter_becomes_unknown_candidate() {
        let filter = DiscoveryFilter {
            device_addr_filter: None,
            device_name_filter: Some("Osmo".to_string()),
        };
        let candidate = match_candidate(&adv(Some("My Osmo Action"), None), &filter).unwrap();
        assert_eq!(candidate.variant, DeviceVariant::Unknown);
    }

    #[test]
    fn address_filter_excludes_non_matching_candidates() {
        let filter = DiscoveryFilter {
            device_addr_filter: Some("11:22".to_string()),
            device_name_filter: None,
        };
        assert!(match_candidate(&adv(None, Some(vec![0x12, 0x00])), &filter).is_none());
    }
}
