/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]

//! Types that cross the boundary of the Web Bluetooth permission broker.
//!
//! Web content only ever sees [`WebBluetoothDeviceId`]s. The [`DeviceAddress`] a
//! given identifier stands for stays on the browser side of this boundary.

pub mod bluetooth_uuid;
pub mod device;
pub mod device_id;
pub mod origin;
pub mod scanfilter;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::bluetooth_uuid::BluetoothUuid;
pub use crate::device::{BluetoothDevice, BluetoothDeviceInfo};
pub use crate::device_id::WebBluetoothDeviceId;
pub use crate::origin::{OpaqueOrigin, Origin};
pub use crate::scanfilter::{BluetoothScanfilter, RequestDeviceOptions};

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum BluetoothPermissionError {
    /// No device is known under the given identifier for the requesting origin.
    #[error("no device is known under this identifier")]
    NotFound,
    /// Structurally malformed input: an identifier, origin, UUID or request.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to persist bluetooth grants: {0}")]
    Persistence(String),
}

pub type BluetoothPermissionResult<T> = Result<T, BluetoothPermissionError>;

/// The platform address of a physical Bluetooth device, e.g. `AA:BB:CC:DD:EE:FF`.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    pub fn new(address: impl Into<String>) -> DeviceAddress {
        DeviceAddress(address.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for DeviceAddress {
    fn from(address: &str) -> Self {
        DeviceAddress::new(address)
    }
}

impl From<String> for DeviceAddress {
    fn from(address: String) -> Self {
        DeviceAddress(address)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
