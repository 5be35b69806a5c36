/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use bluetooth_permission_traits::{BluetoothPermissionError, BluetoothPermissionResult};
use serde::{Deserialize, Serialize};

/// Preferences for one broker instance, usually read from the profile's prefs file.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct BluetoothPrefs {
    /// Whether a grant made through `acceptAllDevices: true` covers every service
    /// of the device, instead of only the services named in the request.
    pub accept_all_devices_grants_all_services: bool,

    /// Whether any granted device exposes all of its manufacturer data.
    pub allow_all_manufacturer_data: bool,

    /// Shown in place of a device name when none was captured at grant time.
    pub unknown_device_name_prefix: String,
}

impl Default for BluetoothPrefs {
    fn default() -> Self {
        BluetoothPrefs {
            accept_all_devices_grants_all_services: false,
            allow_all_manufacturer_data: false,
            unknown_device_name_prefix: "Unknown or Unsupported Device".to_owned(),
        }
    }
}

impl BluetoothPrefs {
    pub fn from_json(json: &str) -> BluetoothPermissionResult<BluetoothPrefs> {
        serde_json::from_str(json).map_err(|error| {
            BluetoothPermissionError::InvalidArgument(format!("invalid bluetooth prefs: {error}"))
        })
    }
}
