/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::HashMap;

use bluetooth_permission_traits::{DeviceAddress, Origin, WebBluetoothDeviceId};

#[derive(Default)]
struct OriginDevices {
    address_to_id: HashMap<DeviceAddress, WebBluetoothDeviceId>,
    id_to_address: HashMap<WebBluetoothDeviceId, DeviceAddress>,
}

/// Identifiers handed out for devices an origin has seen without holding a grant
/// for them: scan results, and devices whose grant was revoked. Each origin has
/// its own table so that identifiers cannot be correlated across sites.
#[derive(Default)]
pub(crate) struct ScannedDevices {
    origins: HashMap<Origin, OriginDevices>,
}

impl ScannedDevices {
    pub(crate) fn device_id(&self, origin: &Origin, device_address: &DeviceAddress) -> Option<WebBluetoothDeviceId> {
        self.origins.get(origin)?.address_to_id.get(device_address).copied()
    }

    pub(crate) fn device_address(
        &self,
        origin: &Origin,
        device_id: &WebBluetoothDeviceId,
    ) -> Option<&DeviceAddress> {
        self.origins.get(origin)?.id_to_address.get(device_id)
    }

    pub(crate) fn contains_id(&self, origin: &Origin, device_id: &WebBluetoothDeviceId) -> bool {
        self.device_address(origin, device_id).is_some()
    }

    /// Records `device_id` for `device_address`. Callers guarantee that neither
    /// half of the pair is already bound to something else in this origin.
    pub(crate) fn insert(&mut self, origin: Origin, device_address: DeviceAddress, device_id: WebBluetoothDeviceId) {
        let devices = self.origins.entry(origin).or_default();
        debug_assert!(
            devices
                .address_to_id
                .get(&device_address)
                .is_none_or(|existing| *existing == device_id)
        );
        devices.id_to_address.insert(device_id, device_address.clone());
        devices.address_to_id.insert(device_address, device_id);
    }
}
