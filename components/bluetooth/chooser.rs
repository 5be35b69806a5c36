/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Turning the outcome of a device chooser prompt into a grant.

use bluetooth_permission_traits::{
    BluetoothDevice, BluetoothPermissionError, BluetoothPermissionResult, DeviceAddress, Origin,
    RequestDeviceOptions, WebBluetoothDeviceId,
};
use log::{debug, warn};

use crate::BluetoothChooserContext;

/// How a chooser prompt ended, as reported by the embedder's UI.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BluetoothChooserEvent {
    /// The user picked the device with this address.
    Selected(DeviceAddress),
    Cancelled,
    DeniedPermission,
    /// The user asked for another discovery round; the request stays pending.
    Rescan,
}

/// Applies a chooser outcome. Only a selection of one of the `discovered` devices
/// changes broker state; every other outcome resolves to `Ok(None)`.
pub fn resolve_chooser_event<D: BluetoothDevice>(
    context: &BluetoothChooserContext,
    origin: &Origin,
    discovered: &[D],
    options: &RequestDeviceOptions,
    event: BluetoothChooserEvent,
) -> BluetoothPermissionResult<Option<WebBluetoothDeviceId>> {
    let device_address = match event {
        BluetoothChooserEvent::Selected(device_address) => device_address,
        other => {
            debug!("Bluetooth chooser for {origin} ended without a selection: {other:?}");
            return Ok(None);
        },
    };

    let Some(device) = discovered
        .iter()
        .find(|device| *device.address() == device_address)
    else {
        warn!("Bluetooth chooser for {origin} selected a device that was never offered");
        return Err(BluetoothPermissionError::NotFound);
    };

    context
        .grant_service_access_permission(origin, device, options)
        .map(Some)
}
