/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![deny(unsafe_code)]

//! The Web Bluetooth permission broker of a browsing profile.
//!
//! Web content never learns the address of a device. Instead every origin gets its
//! own random [`WebBluetoothDeviceId`] for each device it has seen, either through
//! scanning or because the user picked the device in a chooser. The latter also
//! records a [`PermissionGrant`] listing the GATT services and manufacturer data
//! the origin may access, which is what every access check consults.

pub mod chooser;
pub mod delegate;
mod grants;
mod identity;
pub mod persistence;
pub mod prefs;

use std::collections::HashSet;

use bluetooth_permission_traits::{
    BluetoothDevice, BluetoothPermissionError, BluetoothPermissionResult, BluetoothUuid,
    DeviceAddress, Origin, RequestDeviceOptions, WebBluetoothDeviceId,
};
use log::{debug, info, trace, warn};
use parking_lot::Mutex;

pub use crate::grants::PermissionGrant;
use crate::grants::GrantedObjects;
use crate::identity::ScannedDevices;
pub use crate::persistence::{GrantPersistence, NoPersistence, StoredGrant};
pub use crate::prefs::BluetoothPrefs;

/// Both tables live behind one lock, so an id is never visible as granted before
/// it is bound to its address, and never bound to two addresses.
#[derive(Default)]
struct ChooserContextState {
    granted: GrantedObjects,
    scanned: ScannedDevices,
    /// Origins whose stored grants no longer match `granted` because a write failed.
    unflushed: HashSet<Origin>,
}

impl ChooserContextState {
    /// Granted objects are authoritative; the scanned table is the fallback.
    fn device_id(&self, origin: &Origin, device_address: &DeviceAddress) -> Option<WebBluetoothDeviceId> {
        self.granted
            .find_by_address(origin, device_address)
            .or_else(|| self.scanned.device_id(origin, device_address))
    }

    fn device_address(&self, origin: &Origin, device_id: &WebBluetoothDeviceId) -> Option<&DeviceAddress> {
        self.granted
            .get(origin, device_id)
            .map(PermissionGrant::device_address)
            .or_else(|| self.scanned.device_address(origin, device_id))
    }

    fn generate_device_id(&self, origin: &Origin) -> WebBluetoothDeviceId {
        loop {
            let device_id = WebBluetoothDeviceId::create();
            if !self.granted.contains(origin, &device_id) && !self.scanned.contains_id(origin, &device_id) {
                return device_id;
            }
        }
    }

    /// Returns the origins that had records dropped, so storage can be rewritten.
    fn load(&mut self, stored: Vec<StoredGrant>) -> HashSet<Origin> {
        let mut conflicted = HashSet::new();
        for StoredGrant { origin, grant } in stored {
            let device_id = grant.device_id();
            let bound_id = self.device_id(&origin, grant.device_address());
            let bound_address = self.device_address(&origin, &device_id);
            if bound_id.is_some_and(|id| id != device_id) ||
                bound_address.is_some_and(|address| address != grant.device_address())
            {
                warn!("Dropping stored bluetooth grant {device_id} for {origin}: conflicts with an earlier one");
                conflicted.insert(origin);
                continue;
            }
            self.granted.insert_or_merge(origin, grant);
        }
        conflicted
    }
}

/// Owns every device id and grant of one profile. Created when the profile starts
/// and dropped with it; nothing is shared between instances.
pub struct BluetoothChooserContext {
    prefs: BluetoothPrefs,
    state: Mutex<ChooserContextState>,
    persistence: Box<dyn GrantPersistence>,
    /// False when loading failed. Writing then would replace grants we never saw.
    writes_grants: bool,
}

impl BluetoothChooserContext {
    pub fn new(prefs: BluetoothPrefs) -> BluetoothChooserContext {
        BluetoothChooserContext::with_persistence(prefs, Box::new(NoPersistence))
    }

    /// Creates a broker starting from the grants `persistence` has stored. If they
    /// cannot be loaded the broker starts out empty and leaves storage alone for
    /// the rest of the session.
    pub fn with_persistence(prefs: BluetoothPrefs, persistence: Box<dyn GrantPersistence>) -> BluetoothChooserContext {
        let mut state = ChooserContextState::default();
        let (writes_grants, conflicted) = match persistence.load() {
            Ok(stored) => {
                debug!("Loading {} stored bluetooth grant(s)", stored.len());
                (true, state.load(stored))
            },
            Err(error) => {
                warn!("Failed to load stored bluetooth grants, starting empty and not storing new ones: {error}");
                (false, HashSet::new())
            },
        };
        let context = BluetoothChooserContext {
            prefs,
            state: Mutex::new(state),
            persistence,
            writes_grants,
        };
        {
            let mut state = context.state.lock();
            for origin in &conflicted {
                context.flush(&mut state, origin);
            }
        }
        context
    }

    /// The id `origin` already has for `device_address`, if any. Never creates one.
    pub fn get_web_bluetooth_device_id(
        &self,
        origin: &Origin,
        device_address: &DeviceAddress,
    ) -> Option<WebBluetoothDeviceId> {
        self.state.lock().device_id(origin, device_address)
    }

    /// Resolves an id handed to `origin` back to the device it stands for. Ids are
    /// never resolved across origins, even when the device is the same.
    pub fn get_device_address(
        &self,
        origin: &Origin,
        device_id: &WebBluetoothDeviceId,
    ) -> BluetoothPermissionResult<DeviceAddress> {
        self.state
            .lock()
            .device_address(origin, device_id)
            .cloned()
            .ok_or(BluetoothPermissionError::NotFound)
    }

    /// Returns the id `origin` has for a scanned device, creating one the first time
    /// the device is seen. The device gains no permissions from this.
    pub fn add_scanned_device(&self, origin: &Origin, device_address: &DeviceAddress) -> WebBluetoothDeviceId {
        let mut state = self.state.lock();
        if let Some(device_id) = state.device_id(origin, device_address) {
            return device_id;
        }
        let device_id = state.generate_device_id(origin);
        state
            .scanned
            .insert(origin.clone(), device_address.clone(), device_id);
        debug!("Issued device id {device_id} to {origin} for a scanned device");
        trace!("Device id {device_id} for {origin} stands for {device_address}");
        device_id
    }

    /// Records that the user let `origin` use `device`, with the services and
    /// manufacturer data named in `options`. A device granted before keeps its id,
    /// and its permissions become the union of the old and new ones.
    pub fn grant_service_access_permission(
        &self,
        origin: &Origin,
        device: &dyn BluetoothDevice,
        options: &RequestDeviceOptions,
    ) -> BluetoothPermissionResult<WebBluetoothDeviceId> {
        if let Err(error) = options.validate() {
            warn!("Refusing bluetooth grant for {origin}: {error}");
            return Err(error);
        }
        let device_address = device.address();
        if device_address.is_empty() {
            warn!("Refusing bluetooth grant for {origin}: the device has no address");
            return Err(BluetoothPermissionError::InvalidArgument(
                "device has no address".to_owned(),
            ));
        }

        let all_services =
            options.is_accepting_all_devices() && self.prefs.accept_all_devices_grants_all_services;

        let mut state = self.state.lock();
        let device_id = match state.device_id(origin, device_address) {
            Some(device_id) => device_id,
            None => state.generate_device_id(origin),
        };
        let grant = PermissionGrant::new(
            device_id,
            device_address.clone(),
            device.name().map(str::to_owned),
            options.services_set(),
            all_services,
            options.manufacturer_codes(),
        );
        let merged = state.granted.insert_or_merge(origin.clone(), grant);
        debug!(
            "Granted {origin} access to device {device_id}: {} service(s){}, {} manufacturer code(s)",
            merged.services().len(),
            if merged.allows_all_services() { " (all)" } else { "" },
            merged.manufacturer_data().len(),
        );
        self.flush(&mut state, origin);
        Ok(device_id)
    }

    pub fn has_device_permission(&self, origin: &Origin, device_id: &WebBluetoothDeviceId) -> bool {
        self.state.lock().granted.contains(origin, device_id)
    }

    /// Drops the grant `origin` holds for `device_id`, if any. The id keeps standing
    /// for the same device for the rest of the session.
    pub fn revoke_device_permission_web_initiated(&self, origin: &Origin, device_id: &WebBluetoothDeviceId) {
        let mut state = self.state.lock();
        let Some(revoked) = state.granted.remove(origin, device_id) else {
            trace!("Nothing to revoke for device {device_id} of {origin}");
            return;
        };
        state
            .scanned
            .insert(origin.clone(), revoked.device_address().clone(), *device_id);
        info!("Revoked {origin}'s permission to use device {device_id}");
        self.flush(&mut state, origin);
    }

    pub fn is_allowed_to_access_service(
        &self,
        origin: &Origin,
        device_id: &WebBluetoothDeviceId,
        service: &BluetoothUuid,
    ) -> bool {
        self.state
            .lock()
            .granted
            .get(origin, device_id)
            .is_some_and(|grant| grant.allows_service(service))
    }

    pub fn is_allowed_to_access_at_least_one_service(
        &self,
        origin: &Origin,
        device_id: &WebBluetoothDeviceId,
    ) -> bool {
        self.state
            .lock()
            .granted
            .get(origin, device_id)
            .is_some_and(PermissionGrant::allows_at_least_one_service)
    }

    pub fn is_allowed_to_access_manufacturer_data(
        &self,
        origin: &Origin,
        device_id: &WebBluetoothDeviceId,
        manufacturer_code: u16,
    ) -> bool {
        self.state
            .lock()
            .granted
            .get(origin, device_id)
            .is_some_and(|grant| {
                self.prefs.allow_all_manufacturer_data || grant.allows_manufacturer_code(manufacturer_code)
            })
    }

    /// Every grant `origin` holds, oldest first. Scanned devices are not included.
    pub fn get_granted_objects(&self, origin: &Origin) -> Vec<PermissionGrant> {
        self.state.lock().granted.for_origin(origin).cloned().collect()
    }

    pub fn get_object_device_id(object: &PermissionGrant) -> WebBluetoothDeviceId {
        object.device_id()
    }

    pub fn get_object_display_name(&self, object: &PermissionGrant) -> String {
        match object.name() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => format!(
                "{} ({})",
                self.prefs.unknown_device_name_prefix,
                object.device_id()
            ),
        }
    }

    /// Writes out every origin that holds grants or whose last write failed.
    /// Called by the owning profile as it shuts down, after which the broker is
    /// dropped.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        let origins: HashSet<Origin> = state
            .granted
            .origins()
            .chain(state.unflushed.iter())
            .cloned()
            .collect();
        for origin in &origins {
            self.flush(&mut state, origin);
        }
        debug!("Bluetooth chooser context shut down");
    }

    fn flush(&self, state: &mut ChooserContextState, origin: &Origin) {
        if !self.writes_grants {
            return;
        }
        let grants: Vec<PermissionGrant> = state.granted.for_origin(origin).cloned().collect();
        match self.persistence.store(origin, &grants) {
            Ok(()) => {
                state.unflushed.remove(origin);
            },
            Err(error) => {
                warn!("Failed to persist bluetooth grants for {origin}: {error}");
                state.unflushed.insert(origin.clone());
            },
        }
    }
}
