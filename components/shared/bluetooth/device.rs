/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use serde::{Deserialize, Serialize};

use crate::DeviceAddress;

/// A device as reported by the platform Bluetooth stack.
pub trait BluetoothDevice {
    fn address(&self) -> &DeviceAddress;

    /// The advertised or cached name, if the platform knows one.
    fn name(&self) -> Option<&str>;
}

/// A plain snapshot of a discovered device.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BluetoothDeviceInfo {
    pub address: DeviceAddress,
    pub name: Option<String>,
}

impl BluetoothDeviceInfo {
    pub fn new(address: impl Into<DeviceAddress>, name: Option<&str>) -> BluetoothDeviceInfo {
        BluetoothDeviceInfo {
            address: address.into(),
            name: name.map(str::to_owned),
        }
    }
}

impl BluetoothDevice for BluetoothDeviceInfo {
    fn address(&self) -> &DeviceAddress {
        &self.address
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
