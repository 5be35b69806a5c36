/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Granted device objects, keyed by origin and then by device id.

use std::collections::{BTreeSet, HashMap};

use bluetooth_permission_traits::{BluetoothUuid, DeviceAddress, Origin, WebBluetoothDeviceId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// What an origin was allowed to do with one device.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PermissionGrant {
    device_id: WebBluetoothDeviceId,
    device_address: DeviceAddress,
    name: Option<String>,
    services: BTreeSet<BluetoothUuid>,
    all_services: bool,
    manufacturer_data: BTreeSet<u16>,
}

impl PermissionGrant {
    pub fn new(
        device_id: WebBluetoothDeviceId,
        device_address: DeviceAddress,
        name: Option<String>,
        services: BTreeSet<BluetoothUuid>,
        all_services: bool,
        manufacturer_data: BTreeSet<u16>,
    ) -> PermissionGrant {
        PermissionGrant {
            device_id,
            device_address,
            name,
            services,
            all_services,
            manufacturer_data,
        }
    }

    pub fn device_id(&self) -> WebBluetoothDeviceId {
        self.device_id
    }

    /// Only for the browser side; never hand this to web content.
    pub fn device_address(&self) -> &DeviceAddress {
        &self.device_address
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn services(&self) -> &BTreeSet<BluetoothUuid> {
        &self.services
    }

    pub fn allows_all_services(&self) -> bool {
        self.all_services
    }

    pub fn manufacturer_data(&self) -> &BTreeSet<u16> {
        &self.manufacturer_data
    }

    pub fn allows_service(&self, service: &BluetoothUuid) -> bool {
        self.all_services || self.services.contains(service)
    }

    pub fn allows_at_least_one_service(&self) -> bool {
        self.all_services || !self.services.is_empty()
    }

    pub fn allows_manufacturer_code(&self, manufacturer_code: u16) -> bool {
        self.manufacturer_data.contains(&manufacturer_code)
    }

    /// Folds a newer grant for the same device into this one. Permissions only
    /// ever grow; a newer non-empty name replaces the stored one.
    fn merge(&mut self, newer: PermissionGrant) {
        debug_assert_eq!(self.device_id, newer.device_id);
        if newer.name.as_deref().is_some_and(|name| !name.is_empty()) {
            self.name = newer.name;
        }
        self.services.extend(newer.services);
        self.all_services |= newer.all_services;
        self.manufacturer_data.extend(newer.manufacturer_data);
    }
}

#[derive(Default)]
pub(crate) struct GrantedObjects {
    objects: HashMap<Origin, IndexMap<WebBluetoothDeviceId, PermissionGrant>>,
}

impl GrantedObjects {
    pub(crate) fn get(&self, origin: &Origin, device_id: &WebBluetoothDeviceId) -> Option<&PermissionGrant> {
        self.objects.get(origin)?.get(device_id)
    }

    pub(crate) fn contains(&self, origin: &Origin, device_id: &WebBluetoothDeviceId) -> bool {
        self.get(origin, device_id).is_some()
    }

    pub(crate) fn find_by_address(
        &self,
        origin: &Origin,
        device_address: &DeviceAddress,
    ) -> Option<WebBluetoothDeviceId> {
        self.objects
            .get(origin)?
            .values()
            .find(|grant| grant.device_address == *device_address)
            .map(PermissionGrant::device_id)
    }

    /// Stores `grant`, merging it into an existing grant for the same device id.
    pub(crate) fn insert_or_merge(&mut self, origin: Origin, grant: PermissionGrant) -> &PermissionGrant {
        let device_id = grant.device_id;
        let grants = self.objects.entry(origin).or_default();
        match grants.entry(device_id) {
            indexmap::map::Entry::Occupied(entry) => {
                let existing = entry.into_mut();
                existing.merge(grant);
                existing
            },
            indexmap::map::Entry::Vacant(entry) => entry.insert(grant),
        }
    }

    pub(crate) fn remove(&mut self, origin: &Origin, device_id: &WebBluetoothDeviceId) -> Option<PermissionGrant> {
        let grants = self.objects.get_mut(origin)?;
        // Keep the remaining grants in the order they were made.
        let removed = grants.shift_remove(device_id);
        if grants.is_empty() {
            self.objects.remove(origin);
        }
        removed
    }

    pub(crate) fn for_origin(&self, origin: &Origin) -> impl Iterator<Item = &PermissionGrant> {
        self.objects.get(origin).into_iter().flat_map(IndexMap::values)
    }

    pub(crate) fn origins(&self) -> impl Iterator<Item = &Origin> {
        self.objects.keys()
    }
}
