//! Peer directory.
//!
//! Peers are not probed: the directory enumerates every `host:port` the
//! deployment topology allows and reconciliation finds out which answer.

use parking_lot::RwLock;
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::time::Duration;
use tracing::debug;

/// Peer discovery configuration.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// This node's host.
    pub host: Ipv4Addr,
    /// This node's port.
    pub port: u16,
    /// Offsets added to the last octet of `host` to form candidate hosts.
    pub host_offsets: RangeInclusive<u8>,
    /// Candidate ports.
    pub ports: RangeInclusive<u16>,
    /// How often the directory is rebuilt.
    pub refresh_interval: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::LOCALHOST,
            port: 5000,
            host_offsets: 0..=1,
            ports: 5000..=5004,
            refresh_interval: Duration::from_secs(20),
        }
    }
}

impl PeerConfig {
    /// This node's own `host:port`.
    pub fn self_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Enumerate candidate peers: ports outer, host offsets inner.
    ///
    /// Offsets that would overflow the last octet are skipped, as is this
    /// node's own address.
    pub fn candidates(&self) -> Vec<String> {
        let me = self.self_address();
        let [a, b, c, d] = self.host.octets();
        let mut peers = Vec::new();

        for port in self.ports.clone() {
            for offset in self.host_offsets.clone() {
                let Some(last) = d.checked_add(offset) else {
                    continue;
                };
                let target = format!("{}:{}", Ipv4Addr::new(a, b, c, last), port);
                if target != me {
                    peers.push(target);
                }
            }
        }
        peers
    }
}

/// The set of peers this node talks to.
#[derive(Debug)]
pub struct PeerDirectory {
    config: PeerConfig,
    peers: RwLock<Vec<String>>,
}

impl PeerDirectory {
    /// Create an empty directory; call [`refresh`](Self::refresh) to populate it.
    pub fn new(config: PeerConfig) -> Self {
        Self {
            config,
            peers: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    /// Rebuild the peer list from the configured topology, replacing the old one.
    pub fn refresh(&self) -> Vec<String> {
        let peers = self.config.candidates();
        debug!(count = peers.len(), ?peers, "peer directory refreshed");
        *self.peers.write() = peers.clone();
        peers
    }

    /// Replace the peer list with an explicit set.
    pub fn set_peers(&self, peers: Vec<String>) {
        *self.peers.write() = peers;
    }

    /// Current peers, in enumeration order.
    pub fn peers(&self) -> Vec<String> {
        self.peers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_exclude_self() {
        let config = PeerConfig::default();
        let peers = config.candidates();

        assert!(!peers.contains(&"127.0.0.1:5000".to_string()));
        assert_eq!(peers.len(), 2 * 5 - 1);
    }

    #[test]
    fn test_candidates_order_ports_outer() {
        let config = PeerConfig {
            host: Ipv4Addr::new(192, 168, 0, 10),
            port: 5000,
            host_offsets: 0..=1,
            ports: 5000..=5001,
            ..Default::default()
        };

        assert_eq!(
            config.candidates(),
            vec![
                "192.168.0.11:5000",
                "192.168.0.10:5001",
                "192.168.0.11:5001",
            ]
        );
    }

    #[test]
    fn test_candidates_skip_octet_overflow() {
        let config = PeerConfig {
            host: Ipv4Addr::new(10, 0, 0, 255),
            port: 7000,
            host_offsets: 0..=2,
            ports: 7000..=7000,
            ..Default::default()
        };

        assert!(config.candidates().is_empty());
    }

    #[test]
    fn test_refresh_replaces_peers() {
        let directory = PeerDirectory::new(PeerConfig::default());
        directory.set_peers(vec!["10.0.0.1:9999".into()]);

        let refreshed = directory.refresh();
        assert_eq!(directory.peers(), refreshed);
        assert!(!directory.peers().contains(&"10.0.0.1:9999".to_string()));
    }

    #[test]
    fn test_new_directory_is_empty() {
        let directory = PeerDirectory::new(PeerConfig::default());
        assert!(directory.is_empty());
        directory.refresh();
        assert_eq!(directory.len(), 9);
    }
}
