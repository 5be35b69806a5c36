/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use bluetooth_permission_traits::{BluetoothPermissionResult, Origin};
use serde::{Deserialize, Serialize};

use crate::grants::PermissionGrant;

/// One grant as loaded from profile storage.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct StoredGrant {
    pub origin: Origin,
    pub grant: PermissionGrant,
}

/// Where a broker keeps its grants between sessions. How they are encoded is up to
/// the implementation.
pub trait GrantPersistence: Send + Sync {
    /// Every grant stored for the profile, in the order they were made.
    fn load(&self) -> BluetoothPermissionResult<Vec<StoredGrant>>;

    /// Replaces everything stored for `origin` with `grants`. An empty slice means
    /// the origin holds no grants anymore.
    fn store(&self, origin: &Origin, grants: &[PermissionGrant]) -> BluetoothPermissionResult<()>;
}

/// Keeps nothing; grants live as long as the broker does.
pub struct NoPersistence;

impl GrantPersistence for NoPersistence {
    fn load(&self) -> BluetoothPermissionResult<Vec<StoredGrant>> {
        Ok(vec![])
    }

    fn store(&self, _origin: &Origin, _grants: &[PermissionGrant]) -> BluetoothPermissionResult<()> {
        Ok(())
    }
}
