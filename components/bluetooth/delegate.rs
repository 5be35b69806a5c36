/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The frame-facing side of the broker. Every call names the frame that made it,
//! and is answered for the origin of that frame's top-level document.

use std::sync::Arc;

use bluetooth_permission_traits::{
    BluetoothDevice, BluetoothPermissionResult, BluetoothUuid, DeviceAddress, Origin,
    RequestDeviceOptions, WebBluetoothDeviceId,
};
use serde::{Deserialize, Serialize};

use crate::BluetoothChooserContext;

pub trait FrameHost {
    /// The last committed origin of the main frame this frame belongs to.
    fn main_frame_origin(&self) -> Origin;
}

/// A device as listed by `navigator.bluetooth.getDevices()`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct WebBluetoothDevice {
    pub id: WebBluetoothDeviceId,
    pub name: String,
}

pub trait BluetoothDelegate {
    fn get_web_bluetooth_device_id(
        &self,
        frame: &dyn FrameHost,
        device_address: &DeviceAddress,
    ) -> Option<WebBluetoothDeviceId>;

    fn get_device_address(
        &self,
        frame: &dyn FrameHost,
        device_id: &WebBluetoothDeviceId,
    ) -> BluetoothPermissionResult<DeviceAddress>;

    fn add_scanned_device(&self, frame: &dyn FrameHost, device_address: &DeviceAddress) -> WebBluetoothDeviceId;

    fn grant_service_access_permission(
        &self,
        frame: &dyn FrameHost,
        device: &dyn BluetoothDevice,
        options: &RequestDeviceOptions,
    ) -> BluetoothPermissionResult<WebBluetoothDeviceId>;

    fn has_device_permission(&self, frame: &dyn FrameHost, device_id: &WebBluetoothDeviceId) -> bool;

    fn revoke_device_permission_web_initiated(&self, frame: &dyn FrameHost, device_id: &WebBluetoothDeviceId);

    fn is_allowed_to_access_service(
        &self,
        frame: &dyn FrameHost,
        device_id: &WebBluetoothDeviceId,
        service: &BluetoothUuid,
    ) -> bool;

    fn is_allowed_to_access_at_least_one_service(
        &self,
        frame: &dyn FrameHost,
        device_id: &WebBluetoothDeviceId,
    ) -> bool;

    fn is_allowed_to_access_manufacturer_data(
        &self,
        frame: &dyn FrameHost,
        device_id: &WebBluetoothDeviceId,
        manufacturer_code: u16,
    ) -> bool;

    fn get_permitted_devices(&self, frame: &dyn FrameHost) -> Vec<WebBluetoothDevice>;
}

/// Forwards every call to the broker of the profile the delegate was made for.
pub struct PermissionDelegate {
    context: Arc<BluetoothChooserContext>,
}

impl PermissionDelegate {
    pub fn new(context: Arc<BluetoothChooserContext>) -> PermissionDelegate {
        PermissionDelegate { context }
    }

    pub fn context(&self) -> &Arc<BluetoothChooserContext> {
        &self.context
    }
}

impl BluetoothDelegate for PermissionDelegate {
    fn get_web_bluetooth_device_id(
        &self,
        frame: &dyn FrameHost,
        device_address: &DeviceAddress,
    ) -> Option<WebBluetoothDeviceId> {
        self.context
            .get_web_bluetooth_device_id(&frame.main_frame_origin(), device_address)
    }

    fn get_device_address(
        &self,
        frame: &dyn FrameHost,
        device_id: &WebBluetoothDeviceId,
    ) -> BluetoothPermissionResult<DeviceAddress> {
        self.context
            .get_device_address(&frame.main_frame_origin(), device_id)
    }

    fn add_scanned_device(&self, frame: &dyn FrameHost, device_address: &DeviceAddress) -> WebBluetoothDeviceId {
        self.context
            .add_scanned_device(&frame.main_frame_origin(), device_address)
    }

    fn grant_service_access_permission(
        &self,
        frame: &dyn FrameHost,
        device: &dyn BluetoothDevice,
        options: &RequestDeviceOptions,
    ) -> BluetoothPermissionResult<WebBluetoothDeviceId> {
        self.context
            .grant_service_access_permission(&frame.main_frame_origin(), device, options)
    }

    fn has_device_permission(&self, frame: &dyn FrameHost, device_id: &WebBluetoothDeviceId) -> bool {
        self.context
            .has_device_permission(&frame.main_frame_origin(), device_id)
    }

    fn revoke_device_permission_web_initiated(&self, frame: &dyn FrameHost, device_id: &WebBluetoothDeviceId) {
        self.context
            .revoke_device_permission_web_initiated(&frame.main_frame_origin(), device_id)
    }

    fn is_allowed_to_access_service(
        &self,
        frame: &dyn FrameHost,
        device_id: &WebBluetoothDeviceId,
        service: &BluetoothUuid,
    ) -> bool {
        self.context
            .is_allowed_to_access_service(&frame.main_frame_origin(), device_id, service)
    }

    fn is_allowed_to_access_at_least_one_service(
        &self,
        frame: &dyn FrameHost,
        device_id: &WebBluetoothDeviceId,
    ) -> bool {
        self.context
            .is_allowed_to_access_at_least_one_service(&frame.main_frame_origin(), device_id)
    }

    fn is_allowed_to_access_manufacturer_data(
        &self,
        frame: &dyn FrameHost,
        device_id: &WebBluetoothDeviceId,
        manufacturer_code: u16,
    ) -> bool {
        self.context.is_allowed_to_access_manufacturer_data(
            &frame.main_frame_origin(),
            device_id,
            manufacturer_code,
        )
    }

    fn get_permitted_devices(&self, frame: &dyn FrameHost) -> Vec<WebBluetoothDevice> {
        self.context
            .get_granted_objects(&frame.main_frame_origin())
            .iter()
            .map(|object| WebBluetoothDevice {
                id: BluetoothChooserContext::get_object_device_id(object),
                name: self.context.get_object_display_name(object),
            })
            .collect()
    }
}
