//! Device resolution: hardware address → BlueZ object path.
//!
//! The lister runs once; its output is scanned for the first line mentioning
//! the address. Matching is substring-based by default, so an address that is a
//! substring of another listed identifier would match too. `MatchMode::Exact`
//! compares whole whitespace-separated fields instead.

use crate::address::{BusObjectPath, HardwareAddress};
use crate::command::CommandSpec;
use crate::error::ResolveError;
use serde::Deserialize;
use std::process::{Command, Stdio};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Substring,
    Exact,
}

pub trait DeviceLister {
    /// Returns the lister's full stdout.
    fn list_devices(&self) -> Result<String, ResolveError>;
}

pub fn default_lister() -> CommandSpec {
    CommandSpec::new("bluetoothctl", ["devices"])
}

/// Runs a device-listing program (normally `bluetoothctl devices`).
#[derive(Debug, Clone)]
pub struct CommandLister {
    spec: CommandSpec,
}

impl CommandLister {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }
}

impl Default for CommandLister {
    fn default() -> Self {
        Self::new(default_lister())
    }
}

impl DeviceLister for CommandLister {
    fn list_devices(&self) -> Result<String, ResolveError> {
        debug!(command = %self.spec, "Running device lister");
        let output = Command::new(&self.spec.program)
            .args(&self.spec.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| ResolveError::Lister {
                program: self.spec.program.clone(),
                details: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(ResolveError::Lister {
                program: self.spec.program.clone(),
                details: format!(
                    "exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Runs the lister and builds the object path for `address`.
pub fn resolve<L: DeviceLister + ?Sized>(
    lister: &L,
    address: &HardwareAddress,
    adapter: &str,
    mode: MatchMode,
) -> Result<BusObjectPath, ResolveError> {
    let listing = lister.list_devices()?;
    debug!(listing = %listing.trim_end(), "Bluetooth device list");

    let path = find_device_path(&listing, address, adapter, mode).ok_or_else(|| {
        ResolveError::NotFound {
            address: address.to_string(),
        }
    })?;
    info!(address = %address, path = %path, outcome = "success", "Device path resolved");
    Ok(path)
}

/// Pure half of [`resolve`]: scans a listing for the address.
pub fn find_device_path(
    listing: &str,
    address: &HardwareAddress,
    adapter: &str,
    mode: MatchMode,
) -> Option<BusObjectPath> {
    listing
        .lines()
        .find(|line| line_matches(line, address, mode))
        .map(|_| address.object_path(adapter))
}

fn line_matches(line: &str, address: &HardwareAddress, mode: MatchMode) -> bool {
    // A device entry carries at least a tag and the address ("Device <addr> <name>").
    if line.split_whitespace().count() < 2 {
        return false;
    }
    match mode {
        MatchMode::Substring => line.contains(address.as_str()),
        MatchMode::Exact => line
            .split_whitespace()
            .any(|field| field.eq_ignore_ascii_case(address.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "Device 11:22:33:44:55:66 Keyboard\n\
                           Device 80:04:5F:73:B2:90 Pixel 7\n";

    struct CannedLister(Result<&'static str, &'static str>);

    impl DeviceLister for CannedLister {
        fn list_devices(&self) -> Result<String, ResolveError> {
            self.0
                .map(str::to_string)
                .map_err(|details| ResolveError::Lister {
                    program: "bluetoothctl".to_string(),
                    details: details.to_string(),
                })
        }
    }

    fn address() -> HardwareAddress {
        "80:04:5F:73:B2:90".parse().unwrap()
    }

    #[test]
    fn resolves_listed_device() {
        let path = resolve(&CannedLister(Ok(LISTING)), &address(), "hci0", MatchMode::Substring)
            .unwrap();
        assert_eq!(path.as_str(), "/org/bluez/hci0/dev_80_04_5F_73_B2_90");
    }

    #[test]
    fn missing_device_is_not_found() {
        let err = resolve(
            &CannedLister(Ok("Device 11:22:33:44:55:66 Keyboard\n")),
            &address(),
            "hci0",
            MatchMode::Substring,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { address } if address == "80:04:5F:73:B2:90"));
    }

    #[test]
    fn empty_listing_is_not_found() {
        let err = resolve(&CannedLister(Ok("")), &address(), "hci0", MatchMode::Exact).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));
    }

    #[test]
    fn lister_failure_is_distinguishable() {
        let err = resolve(
            &CannedLister(Err("No such file or directory")),
            &address(),
            "hci0",
            MatchMode::Substring,
        )
        .unwrap_err();
        assert!(matches!(err, ResolveError::Lister { .. }));
    }

    #[test]
    fn bare_address_line_is_ignored() {
        assert_eq!(
            find_device_path("80:04:5F:73:B2:90\n", &address(), "hci0", MatchMode::Substring),
            None
        );
    }

    #[test]
    fn substring_mode_matches_embedded_address() {
        let listing = "Device AA80:04:5F:73:B2:90 Impostor\n";
        assert!(find_device_path(listing, &address(), "hci0", MatchMode::Substring).is_some());
        assert!(find_device_path(listing, &address(), "hci0", MatchMode::Exact).is_none());
    }

    #[test]
    fn exact_mode_ignores_case() {
        let listing = "Device 80:04:5f:73:b2:90 Pixel\n";
        assert!(find_device_path(listing, &address(), "hci0", MatchMode::Exact).is_some());
    }

    #[test]
    fn command_lister_reports_missing_binary() {
        let lister = CommandLister::new(CommandSpec::new(
            "btlock-definitely-missing-binary",
            Vec::<String>::new(),
        ));
        assert!(matches!(
            lister.list_devices(),
            Err(ResolveError::Lister { .. })
        ));
    }
}
