/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BluetoothPermissionError;

// https://webbluetoothcg.github.io/web-bluetooth/#valid-uuid
const CANONICAL_UUID_LENGTH: usize = 36;

// Bluetooth Core Specification, Vol 3, Part B, 2.5.1: 0000xxxx-0000-1000-8000-00805f9b34fb
const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// A GATT service UUID in its canonical 128-bit form.
#[derive(Clone, Copy, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct BluetoothUuid(Uuid);

impl BluetoothUuid {
    /// Expands a 16-bit SIG alias, e.g. `0x180d` for Heart Rate.
    pub const fn from_u16(alias: u16) -> BluetoothUuid {
        BluetoothUuid::from_u32(alias as u32)
    }

    /// Expands a 32-bit SIG alias.
    pub const fn from_u32(alias: u32) -> BluetoothUuid {
        BluetoothUuid(Uuid::from_u128(BLUETOOTH_BASE_UUID | ((alias as u128) << 96)))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The lowercase, hyphenated form used as the key in stored grants.
    pub fn canonical_value(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl FromStr for BluetoothUuid {
    type Err = BluetoothPermissionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.len() != CANONICAL_UUID_LENGTH {
            return Err(BluetoothPermissionError::InvalidArgument(format!(
                "{value:?} is not a canonical 128-bit UUID"
            )));
        }
        Uuid::try_parse(value).map(BluetoothUuid).map_err(|error| {
            BluetoothPermissionError::InvalidArgument(format!("{value:?} is not a UUID: {error}"))
        })
    }
}

impl From<Uuid> for BluetoothUuid {
    fn from(uuid: Uuid) -> Self {
        BluetoothUuid(uuid)
    }
}

impl TryFrom<String> for BluetoothUuid {
    type Error = BluetoothPermissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BluetoothUuid> for String {
    fn from(uuid: BluetoothUuid) -> String {
        uuid.canonical_value()
    }
}

impl fmt::Display for BluetoothUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl fmt::Debug for BluetoothUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BluetoothUuid({})", self.0.hyphenated())
    }
}
