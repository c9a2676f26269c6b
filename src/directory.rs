//! Discovered devices and the operator's selection.

use crate::error::{AppResult, GlassesError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A BLE peripheral reported by the glasses service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "device_name")]
    pub name: String,
    #[serde(rename = "device_address")]
    pub address: String,
}

impl Device {
    /// Build a device record.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

/// Last discovery result plus the current selection.
///
/// A selection always points at a held entry. Installing a new list drops the selection
/// first, even if the list is unchanged.
#[derive(Debug, Clone, Default)]
pub struct DeviceDirectory {
    devices: Vec<Device>,
    selected: Option<usize>,
}

impl DeviceDirectory {
    /// Empty directory with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held list wholesale.
    pub fn install(&mut self, devices: Vec<Device>) {
        self.selected = None;
        self.devices = devices;
    }

    /// Drop the list and the selection.
    pub fn reset(&mut self) {
        self.install(Vec::new());
    }

    /// Select the device at `index` in the held list.
    pub fn select(&mut self, index: usize) -> AppResult<&Device> {
        let len = self.devices.len();
        let device = self
            .devices
            .get(index)
            .ok_or(GlassesError::Selection { index, len })?;
        self.selected = Some(index);
        Ok(device)
    }

    /// Forget the selection, keeping the list.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Currently selected device, if any.
    pub fn selected(&self) -> Option<&Device> {
        self.selected.and_then(|i| self.devices.get(i))
    }

    /// Index of the current selection.
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Devices from the last discovery.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }
}
