//! Known peer set.
//!
//! Peers are stored as canonical `host[:port]` strings. Canonicalization
//! happens before insertion: the address is parsed as a URL, scheme, path,
//! query, fragment and credentials are dropped, and the host is normalized
//! (lowercased) by the `url` crate.
//!
//! The canonical form is what the transport dials as `http://{host}`, so a
//! port is kept unless it is the scheme's default or 80. `http://node:80`,
//! `https://node:80` and `node` are one peer, and canonicalizing a canonical
//! host returns it unchanged.

use std::collections::BTreeSet;

use parking_lot::RwLock;
use thiserror::Error;
use url::Url;

/// Port implied by a bare host, since peers are always dialed over `http://`.
const TRANSPORT_DEFAULT_PORT: u16 = 80;

/// Errors returned by [`NodeRegistry::register`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The address has no host component we could extract.
    #[error("invalid node address: {0:?}")]
    InvalidAddress(String),
}

/// Thread-safe set of canonical peer hosts.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: RwLock<BTreeSet<String>>,
}

impl NodeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalizes `address` and inserts it. Registering the same host
    /// twice is a no-op. Returns the canonical form.
    pub fn register(&self, address: &str) -> Result<String, RegistryError> {
        let host = canonical_host(address)?;
        let inserted = self.nodes.write().insert(host.clone());
        if inserted {
            tracing::info!(node = %host, "registered peer");
        } else {
            tracing::debug!(node = %host, "peer already registered");
        }
        Ok(host)
    }

    /// Canonicalizes every address, then inserts them all. If any address
    /// is invalid nothing is inserted. Returns the canonical forms in input
    /// order.
    pub fn register_all<S: AsRef<str>>(&self, addresses: &[S]) -> Result<Vec<String>, RegistryError> {
        let hosts = addresses
            .iter()
            .map(|a| canonical_host(a.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut nodes = self.nodes.write();
        for host in &hosts {
            if nodes.insert(host.clone()) {
                tracing::info!(node = %host, "registered peer");
            }
        }
        Ok(hosts)
    }

    /// Snapshot of the registered hosts.
    pub fn nodes(&self) -> BTreeSet<String> {
        self.nodes.read().clone()
    }

    /// Number of registered hosts.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    /// Returns `true` if no peers are registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Returns `true` if `host` (already canonical) is registered.
    pub fn contains(&self, host: &str) -> bool {
        self.nodes.read().contains(host)
    }
}

/// Reduces a peer address to `host[:port]`.
///
/// Bare `host:port` strings parse as a URL with scheme `host`, so an address
/// without `://` that yields no host is retried with an `http://` prefix.
pub fn canonical_host(address: &str) -> Result<String, RegistryError> {
    let trimmed = address.trim();
    let invalid = || RegistryError::InvalidAddress(address.to_string());
    if trimmed.is_empty() {
        return Err(invalid());
    }

    let parsed = match Url::parse(trimmed) {
        Ok(url) if url.host_str().is_some() => url,
        _ if !trimmed.contains("://") => {
            Url::parse(&format!("http://{}", trimmed)).map_err(|_| invalid())?
        }
        _ => return Err(invalid()),
    };

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(invalid)?;

    Ok(match parsed.port() {
        Some(port) if port != TRANSPORT_DEFAULT_PORT => format!("{}:{}", host, port),
        _ => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_collapses_to_one_entry() {
        let registry = NodeRegistry::new();
        registry.register("http://localhost:5001").unwrap();
        registry.register("http://localhost:5001/").unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("localhost:5001"));
    }

    #[test]
    fn scheme_path_and_query_are_discarded() {
        assert_eq!(
            canonical_host("https://peer.example.com:8443/chain?full=1#tip").unwrap(),
            "peer.example.com:8443"
        );
        assert_eq!(
            canonical_host("http://user:pw@10.0.0.1:5000/").unwrap(),
            "10.0.0.1:5000"
        );
    }

    #[test]
    fn host_is_lowercased() {
        assert_eq!(canonical_host("http://LocalHost:5001").unwrap(), "localhost:5001");
    }

    #[test]
    fn bare_host_port_is_accepted() {
        assert_eq!(canonical_host("localhost:5001").unwrap(), "localhost:5001");
        assert_eq!(canonical_host("192.168.0.5:5000").unwrap(), "192.168.0.5:5000");
    }

    #[test]
    fn default_port_is_dropped() {
        assert_eq!(canonical_host("http://node:80").unwrap(), "node");
        assert_eq!(canonical_host("http://node").unwrap(), "node");
    }

    #[test]
    fn port_80_is_implied_for_any_scheme() {
        assert_eq!(canonical_host("https://node:80").unwrap(), "node");
        assert_eq!(canonical_host("node:80").unwrap(), "node");
        assert_eq!(canonical_host("https://node:8443").unwrap(), "node:8443");
    }

    #[test]
    fn canonical_host_is_idempotent() {
        for address in [
            "https://node:80",
            "http://node:80",
            "https://node",
            "https://Peer.Example.com:8443/chain",
            "http://node:443",
            "localhost:5001",
            "http://10.0.0.1:5000/",
            "http://[::1]:5000",
        ] {
            let once = canonical_host(address).unwrap();
            let twice = canonical_host(&once).unwrap();
            assert_eq!(once, twice, "canonical form of {:?} moved on re-parse", address);
        }
    }

    #[test]
    fn register_all_is_all_or_nothing() {
        let registry = NodeRegistry::new();
        assert!(registry
            .register_all(&["http://localhost:5001", "http://"])
            .is_err());
        assert!(registry.is_empty());

        let hosts = registry
            .register_all(&["https://node:80", "http://localhost:5001/"])
            .unwrap();
        assert_eq!(hosts, vec!["node", "localhost:5001"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn single_and_batch_registration_agree() {
        let single = NodeRegistry::new();
        let batch = NodeRegistry::new();
        for address in ["https://node:80", "http://LocalHost:5001/", "node:7000"] {
            single.register(address).unwrap();
        }
        batch
            .register_all(&["https://node:80", "http://LocalHost:5001/", "node:7000"])
            .unwrap();
        assert_eq!(single.nodes(), batch.nodes());
    }

    #[test]
    fn different_ports_are_different_peers() {
        let registry = NodeRegistry::new();
        registry.register("http://localhost:5001").unwrap();
        registry.register("http://localhost:5002").unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn unparseable_addresses_are_rejected() {
        for bad in ["", "   ", "http://", "not a url", "http://[::1"] {
            assert_eq!(
                canonical_host(bad),
                Err(RegistryError::InvalidAddress(bad.to_string())),
                "address {:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn failed_registration_leaves_registry_untouched() {
        let registry = NodeRegistry::new();
        assert!(registry.register("http://").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_registration_is_safe() {
        let registry = std::sync::Arc::new(NodeRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || {
                    for port in 0..25 {
                        registry
                            .register(&format!("http://node{}:{}", i % 2, 5000 + port))
                            .unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(registry.len(), 50);
    }
}
