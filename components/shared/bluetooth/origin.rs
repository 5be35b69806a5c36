/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::{Host, Url};
use uuid::Uuid;

use crate::{BluetoothPermissionError, BluetoothPermissionResult};

/// The security principal every identifier and grant is scoped to.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Origin {
    /// A globally unique identifier
    Opaque(OpaqueOrigin),

    /// Consists of the URL's scheme, host and port
    Tuple(String, Host, u16),
}

impl Origin {
    pub fn new(origin: url::Origin) -> Origin {
        match origin {
            url::Origin::Opaque(_) => Origin::new_opaque(),
            url::Origin::Tuple(scheme, host, port) => Origin::Tuple(scheme, host, port),
        }
    }

    pub fn from_url(url: &Url) -> Origin {
        Origin::new(url.origin())
    }

    /// Creates a new opaque origin that is only equal to itself.
    pub fn new_opaque() -> Origin {
        Origin::Opaque(OpaqueOrigin(Uuid::new_v4()))
    }

    pub fn scheme(&self) -> Option<&str> {
        match *self {
            Origin::Opaque(_) => None,
            Origin::Tuple(ref scheme, _, _) => Some(scheme),
        }
    }

    pub fn host(&self) -> Option<&Host> {
        match *self {
            Origin::Opaque(_) => None,
            Origin::Tuple(_, ref host, _) => Some(host),
        }
    }

    pub fn port(&self) -> Option<u16> {
        match *self {
            Origin::Opaque(_) => None,
            Origin::Tuple(_, _, port) => Some(port),
        }
    }

    pub fn into_url_origin(self) -> url::Origin {
        match self {
            Origin::Opaque(_) => url::Origin::new_opaque(),
            Origin::Tuple(scheme, host, port) => url::Origin::Tuple(scheme, host, port),
        }
    }

    /// Return whether this origin is a (scheme, host, port) tuple
    /// (as opposed to an opaque origin).
    pub fn is_tuple(&self) -> bool {
        matches!(*self, Origin::Tuple(..))
    }

    /// <https://html.spec.whatwg.org/multipage/#ascii-serialisation-of-an-origin>
    pub fn ascii_serialization(&self) -> String {
        self.clone().into_url_origin().ascii_serialization()
    }
}

impl FromStr for Origin {
    type Err = BluetoothPermissionError;

    /// Parses a URL and takes its origin. URLs without a tuple origin (`data:`,
    /// `file:` and friends) yield a fresh opaque origin.
    fn from_str(input: &str) -> BluetoothPermissionResult<Origin> {
        let url = Url::parse(input).map_err(|error| {
            BluetoothPermissionError::InvalidArgument(format!("{input:?} is not a URL: {error}"))
        })?;
        Ok(Origin::from_url(&url))
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ascii_serialization())
    }
}

/// Opaque identifier for URLs that have file or other schemes
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct OpaqueOrigin(Uuid);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_origins_ignore_path_and_query() {
        let a: Origin = "https://a.example/page?q=1".parse().unwrap();
        let b: Origin = "https://a.example:443/other".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.ascii_serialization(), "https://a.example");
        assert_eq!(a.scheme(), Some("https"));
        assert_eq!(a.host(), Some(&Host::Domain("a.example".to_owned())));
        assert_eq!(a.port(), Some(443));
    }

    #[test]
    fn scheme_and_port_distinguish_origins() {
        let https: Origin = "https://a.example".parse().unwrap();
        let http: Origin = "http://a.example".parse().unwrap();
        let other_port: Origin = "https://a.example:8443".parse().unwrap();
        assert_ne!(https, http);
        assert_ne!(https, other_port);
        assert_eq!(other_port.to_string(), "https://a.example:8443");
    }

    #[test]
    fn opaque_origins_are_only_equal_to_themselves() {
        let a: Origin = "data:text/html,hello".parse().unwrap();
        let b: Origin = "data:text/html,hello".parse().unwrap();
        assert!(!a.is_tuple());
        assert_eq!(a.scheme(), None);
        assert_eq!(a.host(), None);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(a.to_string(), "null");
    }

    #[test]
    fn ip_hosts_keep_their_url_form() {
        let v6: Origin = "http://[::1]:8000/".parse().unwrap();
        assert_eq!(v6.host(), Some(&Host::Ipv6("::1".parse().unwrap())));
        assert_eq!(v6.ascii_serialization(), "http://[::1]:8000");
        let v4: Origin = "https://127.0.0.1/".parse().unwrap();
        assert_eq!(v4.ascii_serialization(), "https://127.0.0.1");
    }

    #[test]
    fn serializes_through_serde() {
        let origin: Origin = "https://a.example:8443".parse().unwrap();
        let json = serde_json::to_string(&origin).unwrap();
        assert_eq!(serde_json::from_str::<Origin>(&json).unwrap(), origin);
    }

    #[test]
    fn garbage_is_an_invalid_argument() {
        assert!(matches!(
            "not a url".parse::<Origin>(),
            Err(BluetoothPermissionError::InvalidArgument(_))
        ));
    }
}
