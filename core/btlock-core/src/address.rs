//! Hardware addresses and the BlueZ object paths derived from them.

use crate::error::AddressError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_ADAPTER: &str = "hci0";
const BLUEZ_ROOT: &str = "/org/bluez";
const OCTETS: usize = 6;

/// A Bluetooth device address in `AA:BB:CC:DD:EE:FF` form, normalized to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct HardwareAddress(String);

impl HardwareAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the object path BlueZ exposes for this device under `adapter`.
    pub fn object_path(&self, adapter: &str) -> BusObjectPath {
        BusObjectPath(format!(
            "{}/{}/dev_{}",
            BLUEZ_ROOT,
            adapter,
            self.0.replace(':', "_")
        ))
    }
}

impl FromStr for HardwareAddress {
    type Err = AddressError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let octets: Vec<&str> = trimmed.split(':').collect();
        if octets.len() != OCTETS {
            return Err(AddressError::OctetCount {
                input: trimmed.to_string(),
                found: octets.len(),
            });
        }

        if let Some(bad) = octets
            .iter()
            .find(|octet| octet.len() != 2 || !octet.chars().all(|c| c.is_ascii_hexdigit()))
        {
            return Err(AddressError::InvalidOctet {
                input: trimmed.to_string(),
                octet: (*bad).to_string(),
            });
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for HardwareAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for HardwareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Object path of a device on the system bus, e.g. `/org/bluez/hci0/dev_80_04_5F_73_B2_90`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusObjectPath(String);

impl BusObjectPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes_case() {
        let address: HardwareAddress = " 80:04:5f:73:b2:90 ".parse().unwrap();
        assert_eq!(address.as_str(), "80:04:5F:73:B2:90");
    }

    #[test]
    fn rejects_wrong_octet_count() {
        let err = "80:04:5F:73:B2".parse::<HardwareAddress>().unwrap_err();
        assert_eq!(
            err,
            AddressError::OctetCount {
                input: "80:04:5F:73:B2".to_string(),
                found: 5,
            }
        );
    }

    #[test]
    fn rejects_non_hex_octet() {
        let err = "80:04:5F:73:B2:ZZ".parse::<HardwareAddress>().unwrap_err();
        assert!(matches!(err, AddressError::InvalidOctet { octet, .. } if octet == "ZZ"));
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!("  ".parse::<HardwareAddress>(), Err(AddressError::Empty));
    }

    #[test]
    fn object_path_uses_adapter_and_underscores() {
        let address: HardwareAddress = "80:04:5F:73:B2:90".parse().unwrap();
        assert_eq!(
            address.object_path(DEFAULT_ADAPTER).as_str(),
            "/org/bluez/hci0/dev_80_04_5F_73_B2_90"
        );
        assert_eq!(
            address.object_path("hci1").to_string(),
            "/org/bluez/hci1/dev_80_04_5F_73_B2_90"
        );
    }
}
