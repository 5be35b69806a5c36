/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use bluetooth_permission_traits::{
    BluetoothPermissionError, BluetoothPermissionResult, DeviceAddress, Origin,
    RequestDeviceOptions, WebBluetoothDeviceId,
};
use bluetooth_permissions::{
    BluetoothChooserContext, BluetoothPrefs, GrantPersistence, PermissionGrant, StoredGrant,
};
use parking_lot::Mutex;

use crate::{
    BATTERY, DEVICE_ADDRESS, HEART_RATE, OTHER_DEVICE_ADDRESS, heart_rate_monitor, init_logging,
    origin,
};

/// Remembers the last grants stored for every origin.
#[derive(Clone, Default)]
struct RecordingPersistence {
    initial: Vec<StoredGrant>,
    fail_load: bool,
    stored: Arc<Mutex<HashMap<Origin, Vec<PermissionGrant>>>>,
    writes: Arc<Mutex<usize>>,
    fail_store: Arc<Mutex<bool>>,
}

impl RecordingPersistence {
    fn stored_for(&self, origin: &Origin) -> Option<Vec<PermissionGrant>> {
        self.stored.lock().get(origin).cloned()
    }

    fn writes(&self) -> usize {
        *self.writes.lock()
    }

    fn set_failing(&self, failing: bool) {
        *self.fail_store.lock() = failing;
    }

    /// What a broker started from this storage would load.
    fn reloaded(&self) -> RecordingPersistence {
        RecordingPersistence {
            initial: self
                .stored
                .lock()
                .iter()
                .flat_map(|(origin, grants)| {
                    grants.iter().map(|grant| StoredGrant {
                        origin: origin.clone(),
                        grant: grant.clone(),
                    })
                })
                .collect(),
            ..Default::default()
        }
    }
}

impl GrantPersistence for RecordingPersistence {
    fn load(&self) -> BluetoothPermissionResult<Vec<StoredGrant>> {
        if self.fail_load {
            return Err(BluetoothPermissionError::Persistence(
                "profile storage is corrupt".to_owned(),
            ));
        }
        Ok(self.initial.clone())
    }

    fn store(&self, origin: &Origin, grants: &[PermissionGrant]) -> BluetoothPermissionResult<()> {
        if *self.fail_store.lock() {
            return Err(BluetoothPermissionError::Persistence("disk full".to_owned()));
        }
        *self.writes.lock() += 1;
        self.stored.lock().insert(origin.clone(), grants.to_vec());
        Ok(())
    }
}

struct FailingPersistence;

impl GrantPersistence for FailingPersistence {
    fn load(&self) -> BluetoothPermissionResult<Vec<StoredGrant>> {
        Ok(vec![])
    }

    fn store(&self, _: &Origin, _: &[PermissionGrant]) -> BluetoothPermissionResult<()> {
        Err(BluetoothPermissionError::Persistence("disk full".to_owned()))
    }
}

fn stored_grant(url: &str, device_id: WebBluetoothDeviceId, address: &str) -> StoredGrant {
    StoredGrant {
        origin: origin(url),
        grant: PermissionGrant::new(
            device_id,
            DeviceAddress::from(address),
            Some("Pulse".to_owned()),
            BTreeSet::from([HEART_RATE]),
            false,
            BTreeSet::new(),
        ),
    }
}

fn context_with(persistence: &RecordingPersistence) -> BluetoothChooserContext {
    init_logging();
    BluetoothChooserContext::with_persistence(
        BluetoothPrefs::default(),
        Box::new(persistence.clone()),
    )
}

#[test]
fn stored_grants_are_loaded_at_startup() {
    let device_id = WebBluetoothDeviceId::create();
    let persistence = RecordingPersistence {
        initial: vec![stored_grant("https://a.example", device_id, DEVICE_ADDRESS)],
        ..Default::default()
    };
    let context = context_with(&persistence);
    let a = origin("https://a.example");

    assert!(context.has_device_permission(&a, &device_id));
    assert!(context.is_allowed_to_access_service(&a, &device_id, &HEART_RATE));
    assert_eq!(
        context.add_scanned_device(&a, &DeviceAddress::from(DEVICE_ADDRESS)),
        device_id
    );
    assert!(!context.has_device_permission(&origin("https://b.example"), &device_id));
    assert_eq!(persistence.writes(), 0);
}

#[test]
fn conflicting_stored_grants_are_dropped() {
    let device_id = WebBluetoothDeviceId::create();
    let persistence = RecordingPersistence {
        initial: vec![
            stored_grant("https://a.example", device_id, DEVICE_ADDRESS),
            // Same device under another id.
            stored_grant(
                "https://a.example",
                WebBluetoothDeviceId::create(),
                DEVICE_ADDRESS,
            ),
            // Same id standing for another device.
            stored_grant("https://a.example", device_id, OTHER_DEVICE_ADDRESS),
            // Ids only need to be unique within an origin.
            stored_grant("https://b.example", device_id, OTHER_DEVICE_ADDRESS),
        ],
        ..Default::default()
    };
    let context = context_with(&persistence);

    let granted_a = context.get_granted_objects(&origin("https://a.example"));
    assert_eq!(granted_a.len(), 1);
    assert_eq!(granted_a[0].device_address(), &DeviceAddress::from(DEVICE_ADDRESS));
    // Storage is rewritten so the dropped records are gone next time.
    assert_eq!(
        persistence.stored_for(&origin("https://a.example")),
        Some(granted_a)
    );
    assert_eq!(persistence.stored_for(&origin("https://b.example")), None);
    assert_eq!(persistence.writes(), 1);
    assert_eq!(
        context.get_device_address(&origin("https://b.example"), &device_id),
        Ok(DeviceAddress::from(OTHER_DEVICE_ADDRESS))
    );
}

#[test]
fn load_failure_starts_empty() {
    let persistence = RecordingPersistence {
        fail_load: true,
        ..Default::default()
    };
    let context = context_with(&persistence);
    assert!(context.get_granted_objects(&origin("https://a.example")).is_empty());
}

#[test]
fn load_failure_leaves_stored_grants_alone() {
    let persistence = RecordingPersistence {
        fail_load: true,
        ..Default::default()
    };
    let context = context_with(&persistence);
    let a = origin("https://a.example");

    let device_id = context
        .grant_service_access_permission(
            &a,
            &heart_rate_monitor(),
            &RequestDeviceOptions::for_services(vec![HEART_RATE]),
        )
        .unwrap();
    assert!(context.has_device_permission(&a, &device_id));
    context.revoke_device_permission_web_initiated(&a, &device_id);
    context.shutdown();
    assert_eq!(persistence.writes(), 0);
    assert_eq!(persistence.stored_for(&a), None);
}

#[test]
fn grants_and_revocations_are_written_through() {
    let persistence = RecordingPersistence::default();
    let context = context_with(&persistence);
    let a = origin("https://a.example");

    let device_id = context
        .grant_service_access_permission(
            &a,
            &heart_rate_monitor(),
            &RequestDeviceOptions::for_services(vec![HEART_RATE]),
        )
        .unwrap();
    assert_eq!(persistence.stored_for(&a), Some(context.get_granted_objects(&a)));

    context
        .grant_service_access_permission(
            &a,
            &heart_rate_monitor(),
            &RequestDeviceOptions::for_services(vec![BATTERY]),
        )
        .unwrap();
    let stored = persistence.stored_for(&a).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].services(), &BTreeSet::from([HEART_RATE, BATTERY]));

    context.revoke_device_permission_web_initiated(&a, &device_id);
    assert_eq!(persistence.stored_for(&a), Some(vec![]));
}

#[test]
fn scanning_and_queries_are_not_written() {
    let persistence = RecordingPersistence::default();
    let context = context_with(&persistence);
    let a = origin("https://a.example");

    let device_id = context.add_scanned_device(&a, &DeviceAddress::from(DEVICE_ADDRESS));
    context.has_device_permission(&a, &device_id);
    context.revoke_device_permission_web_initiated(&a, &device_id);
    assert_eq!(persistence.writes(), 0);
}

#[test]
fn failed_revocation_write_is_retried_at_shutdown() {
    let persistence = RecordingPersistence::default();
    let context = context_with(&persistence);
    let a = origin("https://a.example");

    let device_id = context
        .grant_service_access_permission(
            &a,
            &heart_rate_monitor(),
            &RequestDeviceOptions::for_services(vec![HEART_RATE]),
        )
        .unwrap();
    persistence.set_failing(true);
    context.revoke_device_permission_web_initiated(&a, &device_id);
    assert_eq!(persistence.stored_for(&a).map(|grants| grants.len()), Some(1));

    persistence.set_failing(false);
    context.shutdown();
    assert_eq!(persistence.stored_for(&a), Some(vec![]));

    let restarted = context_with(&persistence.reloaded());
    assert!(!restarted.has_device_permission(&a, &device_id));
}

#[test]
fn shutdown_flushes_every_origin() {
    let persistence = RecordingPersistence::default();
    let context = context_with(&persistence);
    let a = origin("https://a.example");
    let b = origin("https://b.example");
    let options = RequestDeviceOptions::for_services(vec![HEART_RATE]);

    context
        .grant_service_access_permission(&a, &heart_rate_monitor(), &options)
        .unwrap();
    context
        .grant_service_access_permission(&b, &heart_rate_monitor(), &options)
        .unwrap();
    persistence.stored.lock().clear();

    context.shutdown();
    assert_eq!(persistence.stored_for(&a), Some(context.get_granted_objects(&a)));
    assert_eq!(persistence.stored_for(&b), Some(context.get_granted_objects(&b)));
}

#[test]
fn storage_failures_do_not_fail_grants() {
    init_logging();
    let context =
        BluetoothChooserContext::with_persistence(BluetoothPrefs::default(), Box::new(FailingPersistence));
    let a = origin("https://a.example");

    let device_id = context
        .grant_service_access_permission(
            &a,
            &heart_rate_monitor(),
            &RequestDeviceOptions::for_services(vec![HEART_RATE]),
        )
        .unwrap();
    assert!(context.has_device_permission(&a, &device_id));
    context.revoke_device_permission_web_initiated(&a, &device_id);
    assert!(!context.has_device_permission(&a, &device_id));
}
