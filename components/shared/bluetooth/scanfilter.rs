/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The parts of a page's `requestDevice()` options that decide what a grant covers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{BluetoothPermissionError, BluetoothPermissionResult, BluetoothUuid};

const FILTER_EMPTY_ERROR: &str = "'filters' member, if present, must be nonempty to find any devices.";
const FILTER_ERROR: &str = "A filter must restrict the devices in some way.";
// 248 is the maximum number of UTF-8 code units in a Bluetooth Device Name.
const MAX_DEVICE_NAME_LENGTH: usize = 248;
const NAME_PREFIX_ERROR: &str = "'namePrefix', if present, must be nonempty.";
const NAME_TOO_LONG_ERROR: &str = "A device name can't be longer than 248 bytes.";
const SERVICE_ERROR: &str = "'services', if present, must contain at least one service.";
const MANUFACTURER_DATA_ERROR: &str = "'manufacturerData', if present, must be nonempty.";
const OPTIONS_ERROR: &str = "Fields of 'options' conflict with each other. \
 Either 'acceptAllDevices' member must be true, or 'filters' member must be set to a value.";

fn type_error(message: &str) -> BluetoothPermissionError {
    BluetoothPermissionError::InvalidArgument(message.to_owned())
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct BluetoothScanfilter {
    name: Option<String>,
    name_prefix: Option<String>,
    services: Option<Vec<BluetoothUuid>>,
    manufacturer_data: Option<Vec<u16>>,
}

impl BluetoothScanfilter {
    pub fn new(
        name: Option<String>,
        name_prefix: Option<String>,
        services: Option<Vec<BluetoothUuid>>,
        manufacturer_data: Option<Vec<u16>>,
    ) -> BluetoothScanfilter {
        BluetoothScanfilter {
            name,
            name_prefix,
            services,
            manufacturer_data,
        }
    }

    /// A filter matching on the given services only.
    pub fn with_services(services: Vec<BluetoothUuid>) -> BluetoothScanfilter {
        BluetoothScanfilter::new(None, None, Some(services), None)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn name_prefix(&self) -> Option<&str> {
        self.name_prefix.as_deref()
    }

    pub fn services(&self) -> &[BluetoothUuid] {
        self.services.as_deref().unwrap_or_default()
    }

    pub fn manufacturer_data(&self) -> &[u16] {
        self.manufacturer_data.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.name_prefix.is_none() &&
            self.services.is_none() &&
            self.manufacturer_data.is_none()
    }

    // https://webbluetoothcg.github.io/web-bluetooth/#canonicalizing-the-filter
    fn validate(&self) -> BluetoothPermissionResult<()> {
        if self.is_empty() {
            return Err(type_error(FILTER_ERROR));
        }

        if self.services.as_ref().is_some_and(Vec::is_empty) {
            return Err(type_error(SERVICE_ERROR));
        }

        if let Some(ref name) = self.name {
            // Note: String::len() gives back the size in bytes.
            if name.len() > MAX_DEVICE_NAME_LENGTH {
                return Err(type_error(NAME_TOO_LONG_ERROR));
            }
        }

        if let Some(ref name_prefix) = self.name_prefix {
            if name_prefix.is_empty() {
                return Err(type_error(NAME_PREFIX_ERROR));
            }
            if name_prefix.len() > MAX_DEVICE_NAME_LENGTH {
                return Err(type_error(NAME_TOO_LONG_ERROR));
            }
        }

        if self.manufacturer_data.as_ref().is_some_and(Vec::is_empty) {
            return Err(type_error(MANUFACTURER_DATA_ERROR));
        }

        Ok(())
    }
}

/// The options a page passed to `navigator.bluetooth.requestDevice()`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct RequestDeviceOptions {
    filters: Option<Vec<BluetoothScanfilter>>,
    optional_services: Vec<BluetoothUuid>,
    optional_manufacturer_data: Vec<u16>,
    accept_all_devices: bool,
}

impl RequestDeviceOptions {
    pub fn new(
        filters: Option<Vec<BluetoothScanfilter>>,
        optional_services: Vec<BluetoothUuid>,
        optional_manufacturer_data: Vec<u16>,
        accept_all_devices: bool,
    ) -> RequestDeviceOptions {
        RequestDeviceOptions {
            filters,
            optional_services,
            optional_manufacturer_data,
            accept_all_devices,
        }
    }

    /// Options with a single filter on `services`.
    pub fn for_services(services: Vec<BluetoothUuid>) -> RequestDeviceOptions {
        RequestDeviceOptions::new(
            Some(vec![BluetoothScanfilter::with_services(services)]),
            vec![],
            vec![],
            false,
        )
    }

    /// `acceptAllDevices: true` with the given optional services.
    pub fn accepting_all_devices(optional_services: Vec<BluetoothUuid>) -> RequestDeviceOptions {
        RequestDeviceOptions::new(None, optional_services, vec![], true)
    }

    pub fn with_optional_manufacturer_data(mut self, codes: Vec<u16>) -> RequestDeviceOptions {
        self.optional_manufacturer_data = codes;
        self
    }

    pub fn filters(&self) -> &[BluetoothScanfilter] {
        self.filters.as_deref().unwrap_or_default()
    }

    pub fn is_accepting_all_devices(&self) -> bool {
        self.accept_all_devices
    }

    // https://webbluetoothcg.github.io/web-bluetooth/#dom-bluetooth-requestdevice
    pub fn validate(&self) -> BluetoothPermissionResult<()> {
        match (self.accept_all_devices, &self.filters) {
            (true, Some(_)) | (false, None) => return Err(type_error(OPTIONS_ERROR)),
            (false, Some(filters)) if filters.is_empty() => {
                return Err(type_error(FILTER_EMPTY_ERROR));
            },
            _ => {},
        }
        self.filters().iter().try_for_each(BluetoothScanfilter::validate)
    }

    /// Every service the page named, through a filter or as an optional service.
    pub fn services_set(&self) -> BTreeSet<BluetoothUuid> {
        self.filters()
            .iter()
            .flat_map(|filter| filter.services().iter())
            .chain(self.optional_services.iter())
            .copied()
            .collect()
    }

    /// Every manufacturer code the page named, through a filter or as optional data.
    pub fn manufacturer_codes(&self) -> BTreeSet<u16> {
        self.filters()
            .iter()
            .flat_map(|filter| filter.manufacturer_data().iter())
            .chain(self.optional_manufacturer_data.iter())
            .copied()
            .collect()
    }
}
