/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::BluetoothPermissionError;

const DEVICE_ID_SIZE: usize = 16;

/// A random 128-bit token standing in for a device address inside a single origin.
///
/// Serialized as 24 characters of padded base64, which is also the form handed to
/// web content as `BluetoothDevice.id`.
#[derive(Clone, Copy, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct WebBluetoothDeviceId([u8; DEVICE_ID_SIZE]);

impl WebBluetoothDeviceId {
    /// Draws a fresh identifier from the thread-local CSPRNG. A failing entropy
    /// source panics inside `rand`, there is no recoverable path.
    pub fn create() -> WebBluetoothDeviceId {
        let mut rng = rand::rng();
        loop {
            let bytes: [u8; DEVICE_ID_SIZE] = rng.random();
            // The all-zero token is reserved as "no identifier".
            if bytes != [0; DEVICE_ID_SIZE] {
                return WebBluetoothDeviceId(bytes);
            }
        }
    }

    pub fn as_bytes(&self) -> &[u8; DEVICE_ID_SIZE] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }
}

impl FromStr for WebBluetoothDeviceId {
    type Err = BluetoothPermissionError;

    fn from_str(encoded: &str) -> Result<Self, Self::Err> {
        let invalid =
            || BluetoothPermissionError::InvalidArgument(format!("{encoded:?} is not a device id"));
        let decoded = STANDARD.decode(encoded).map_err(|_| invalid())?;
        let bytes: [u8; DEVICE_ID_SIZE] = decoded.try_into().map_err(|_| invalid())?;
        if bytes == [0; DEVICE_ID_SIZE] {
            return Err(invalid());
        }
        Ok(WebBluetoothDeviceId(bytes))
    }
}

impl TryFrom<String> for WebBluetoothDeviceId {
    type Error = BluetoothPermissionError;

    fn try_from(encoded: String) -> Result<Self, Self::Error> {
        encoded.parse()
    }
}

impl From<WebBluetoothDeviceId> for String {
    fn from(device_id: WebBluetoothDeviceId) -> String {
        device_id.to_base64()
    }
}

impl fmt::Display for WebBluetoothDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for WebBluetoothDeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WebBluetoothDeviceId({})", self.to_base64())
    }
}
