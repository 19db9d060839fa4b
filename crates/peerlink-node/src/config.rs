// ============================================
// File: crates/peerlink-node/src/config.rs
// ============================================
//! # Node Configuration
//!
//! ## Creation Reason
//! One TOML file configures both the directory service and every peer:
//! where the directory lives, the fixed peer address book, key parameters,
//! where keyrings are stored and how long to wait on sockets.
//!
//! ## Main Functionality
//! - `NodeConfig`: Main configuration structure
//! - `AddressBook`: Identity → socket address map used to dial peers
//! - TOML file loading and validation
//!
//! ## Configuration Sections
//! - `directory`: Directory service address
//! - `peers`: Address book
//! - `keys`: Prime pool, starting exponent, session secret range
//! - `storage`: Keyring directory
//! - `timeouts`: Connect and read bounds
//! - `logging`: Log level
//!
//! ## Example Configuration
//! ```toml
//! [directory]
//! addr = "127.0.0.1:4000"
//!
//! [peers]
//! Alice = "127.0.0.1:5001"
//! Bob = "127.0.0.1:5002"
//!
//! [keys]
//! prime_pool = [101, 103, 107, 109, 113, 127, 131, 137, 139]
//! initial_exponent = 17
//! secret_min = 2
//! secret_max = 50
//!
//! [storage]
//! data_dir = "."
//!
//! [timeouts]
//! connect_ms = 5000
//! read_ms = 10000
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `secret_max` must stay below the smallest modulus the pool can
//!   produce, otherwise handshakes between small-modulus peers fail
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use peerlink_common::types::PeerId;
use peerlink_core::crypto::keys::{self, DEFAULT_PRIME_POOL, DEFAULT_PUBLIC_EXPONENT};
use peerlink_transport::Timeouts;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{NodeError, Result};

// ============================================
// NodeConfig
// ============================================

/// Main node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory service settings.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Fixed peer address book.
    #[serde(default)]
    pub peers: AddressBook,

    /// Key generation and handshake parameters.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Keyring storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Socket wait bounds.
    #[serde(default)]
    pub timeouts: TimeoutsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!(path = %path_str, "Loading configuration");

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| NodeError::config_load(&path_str, e.to_string()))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| NodeError::config_load(&path_str, e.to_string()))?;
        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string.
    ///
    /// # Errors
    /// Returns error if the content cannot be parsed or validated.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| NodeError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    /// `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.directory.validate()?;
        self.peers.validate(self.directory.addr)?;
        self.keys.validate()?;
        self.timeouts.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Serializes configuration to a TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Returns the keyring file of `peer`.
    #[must_use]
    pub fn keyring_path(&self, peer: &PeerId) -> PathBuf {
        self.storage.data_dir.join(format!("keyring_{peer}.json"))
    }
}

// ============================================
// DirectoryConfig
// ============================================

/// Directory service section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Address the directory listens on and peers dial.
    #[serde(default = "default_directory_addr")]
    pub addr: SocketAddr,
}

fn default_directory_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4000))
}

impl DirectoryConfig {
    fn validate(&self) -> Result<()> {
        if self.addr.port() == 0 {
            return Err(NodeError::config_invalid("directory.addr", "port cannot be 0"));
        }
        Ok(())
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            addr: default_directory_addr(),
        }
    }
}

// ============================================
// AddressBook
// ============================================

/// Identity → socket address map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressBook {
    entries: BTreeMap<PeerId, SocketAddr>,
}

impl AddressBook {
    /// Creates an empty address book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds or replaces an entry.
    #[must_use]
    pub fn with(mut self, peer: PeerId, addr: SocketAddr) -> Self {
        self.entries.insert(peer, addr);
        self
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, peer: PeerId, addr: SocketAddr) {
        self.entries.insert(peer, addr);
    }

    /// Looks up the address of `peer`.
    ///
    /// # Errors
    /// [`NodeError::UnknownAddress`] when `peer` has no entry.
    pub fn resolve(&self, peer: &PeerId) -> Result<SocketAddr> {
        self.entries
            .get(peer)
            .copied()
            .ok_or_else(|| NodeError::UnknownAddress(peer.clone()))
    }

    /// Returns `true` if `peer` has an entry.
    #[must_use]
    pub fn contains(&self, peer: &PeerId) -> bool {
        self.entries.contains_key(peer)
    }

    /// Iterates identities in order.
    pub fn identities(&self) -> impl Iterator<Item = &PeerId> {
        self.entries.keys()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn validate(&self, directory: SocketAddr) -> Result<()> {
        if self.entries.is_empty() {
            return Err(NodeError::config_invalid("peers", "at least one peer is required"));
        }
        let mut seen = BTreeMap::new();
        for (peer, addr) in &self.entries {
            let field = format!("peers.{peer}");
            if addr.port() == 0 {
                return Err(NodeError::config_invalid(field, "port cannot be 0"));
            }
            if *addr == directory {
                return Err(NodeError::config_invalid(field, "collides with directory.addr"));
            }
            if let Some(other) = seen.insert(*addr, peer) {
                return Err(NodeError::config_invalid(
                    field,
                    format!("address already used by '{other}'"),
                ));
            }
        }
        Ok(())
    }
}

impl Default for AddressBook {
    fn default() -> Self {
        [("Alice", 5001), ("Bob", 5002), ("Charlie", 5003), ("David", 5004)]
            .into_iter()
            .filter_map(|(name, port)| Some((PeerId::new(name).ok()?, port)))
            .fold(Self::new(), |book, (peer, port)| {
                book.with(peer, SocketAddr::from(([127, 0, 0, 1], port)))
            })
    }
}

// ============================================
// KeysConfig
// ============================================

/// Key generation and handshake section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysConfig {
    /// Primes the modulus factors are drawn from.
    #[serde(default = "default_prime_pool")]
    pub prime_pool: Vec<u64>,

    /// First public exponent candidate.
    #[serde(default = "default_initial_exponent")]
    pub initial_exponent: u64,

    /// Smallest session secret.
    #[serde(default = "default_secret_min")]
    pub secret_min: u64,

    /// Largest session secret.
    #[serde(default = "default_secret_max")]
    pub secret_max: u64,
}

fn default_prime_pool() -> Vec<u64> {
    DEFAULT_PRIME_POOL.to_vec()
}

fn default_initial_exponent() -> u64 {
    DEFAULT_PUBLIC_EXPONENT
}

fn default_secret_min() -> u64 {
    2
}

fn default_secret_max() -> u64 {
    50
}

impl KeysConfig {
    /// Inclusive session secret range.
    #[must_use]
    pub fn secret_range(&self) -> RangeInclusive<u64> {
        self.secret_min..=self.secret_max
    }

    fn validate(&self) -> Result<()> {
        keys::validate_pool(&self.prime_pool)
            .map_err(|e| NodeError::config_invalid("keys.prime_pool", e.to_string()))?;
        if keys::min_modulus(&self.prime_pool).is_none() {
            return Err(NodeError::config_invalid("keys.prime_pool", "modulus overflows"));
        }
        if self.initial_exponent < 3 || self.initial_exponent % 2 == 0 {
            return Err(NodeError::config_invalid(
                "keys.initial_exponent",
                "must be odd and at least 3",
            ));
        }
        if self.secret_min < 2 {
            return Err(NodeError::config_invalid("keys.secret_min", "must be at least 2"));
        }
        if self.secret_min > self.secret_max {
            return Err(NodeError::config_invalid(
                "keys.secret_max",
                "must not be smaller than keys.secret_min",
            ));
        }
        let smallest = keys::min_modulus(&self.prime_pool).unwrap_or(0);
        if self.secret_max >= smallest {
            return Err(NodeError::config_invalid(
                "keys.secret_max",
                format!("must be below the smallest possible modulus {smallest}"),
            ));
        }
        Ok(())
    }
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            prime_pool: default_prime_pool(),
            initial_exponent: default_initial_exponent(),
            secret_min: default_secret_min(),
            secret_max: default_secret_max(),
        }
    }
}

// ============================================
// StorageConfig
// ============================================

/// Keyring storage section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `keyring_<identity>.json` files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

// ============================================
// TimeoutsConfig
// ============================================

/// Socket wait bounds section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Connect bound in milliseconds.
    #[serde(default = "default_connect_ms")]
    pub connect_ms: u64,

    /// Per-line read/write bound in milliseconds.
    #[serde(default = "default_read_ms")]
    pub read_ms: u64,
}

fn default_connect_ms() -> u64 {
    5_000
}

fn default_read_ms() -> u64 {
    10_000
}

impl TimeoutsConfig {
    /// Converts to transport timeouts.
    #[must_use]
    pub const fn to_timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(self.connect_ms),
            read: Duration::from_millis(self.read_ms),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.connect_ms == 0 {
            return Err(NodeError::config_invalid("timeouts.connect_ms", "must be greater than 0"));
        }
        if self.read_ms == 0 {
            return Err(NodeError::config_invalid("timeouts.read_ms", "must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_ms(),
            read_ms: default_read_ms(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(NodeError::config_invalid(
                "logging.level",
                "must be one of trace, debug, info, warn, error",
            )),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str) -> PeerId {
        PeerId::new(name).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.directory.addr.port(), 4000);
        assert_eq!(config.peers.len(), 4);
        assert_eq!(config.peers.resolve(&peer("Bob")).unwrap().port(), 5002);
        assert_eq!(config.peers.resolve(&peer("David")).unwrap().port(), 5004);
        assert_eq!(config.keys.secret_range(), 2..=50);
        assert_eq!(config.timeouts.to_timeouts(), Timeouts::default());
    }

    #[test]
    fn test_config_format() {
        let toml = r#"
            [directory]
            addr = "127.0.0.1:7000"

            [peers]
            Alice = "127.0.0.1:7001"
            Bob = "127.0.0.1:7002"

            [keys]
            prime_pool = [11, 13, 17, 19, 23, 29, 31]
            initial_exponent = 3
            secret_min = 2
            secret_max = 20

            [storage]
            data_dir = "/tmp/peerlink"

            [timeouts]
            connect_ms = 250
            read_ms = 500

            [logging]
            level = "debug"
        "#;

        let config = NodeConfig::from_str(toml).unwrap();
        assert_eq!(config.directory.addr.port(), 7000);
        assert_eq!(config.peers.len(), 2);
        assert!(!config.peers.contains(&peer("Charlie")));
        assert_eq!(config.keys.prime_pool.len(), 7);
        assert_eq!(config.timeouts.to_timeouts().read, Duration::from_millis(500));
        assert_eq!(
            config.keyring_path(&peer("Alice")),
            PathBuf::from("/tmp/peerlink/keyring_Alice.json")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = NodeConfig::from_str("[logging]\nlevel = \"warn\"\n").unwrap();
        assert_eq!(config.peers.len(), 4);
        assert_eq!(config.keys.initial_exponent, 17);
        assert_eq!(config.storage.data_dir, PathBuf::from("."));
    }

    #[test]
    fn test_rejects_invalid_sections() {
        let cases = [
            ("[directory]\naddr = \"127.0.0.1:0\"\n", "directory.addr"),
            ("[keys]\nprime_pool = [101]\n", "keys.prime_pool"),
            ("[keys]\nprime_pool = [101, 100]\n", "keys.prime_pool"),
            ("[keys]\ninitial_exponent = 4\n", "keys.initial_exponent"),
            ("[keys]\nsecret_min = 1\n", "keys.secret_min"),
            ("[keys]\nsecret_min = 40\nsecret_max = 30\n", "keys.secret_max"),
            ("[keys]\nprime_pool = [11, 13]\nsecret_max = 143\n", "keys.secret_max"),
            ("[timeouts]\nread_ms = 0\n", "timeouts.read_ms"),
            ("[logging]\nlevel = \"loud\"\n", "logging.level"),
            ("[peers]\nAlice = \"127.0.0.1:4000\"\n", "peers.Alice"),
            (
                "[peers]\nAlice = \"127.0.0.1:6000\"\nBob = \"127.0.0.1:6000\"\n",
                "peers.Bob",
            ),
        ];
        for (toml, expected_field) in cases {
            match NodeConfig::from_str(toml) {
                Err(NodeError::ConfigInvalid { field, .. }) => {
                    assert_eq!(field, expected_field, "config: {toml}");
                }
                other => panic!("expected ConfigInvalid for {toml}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_invalid_identity_in_address_book() {
        let err = NodeConfig::from_str("[peers]\n\"Al ice\" = \"127.0.0.1:6000\"\n").unwrap_err();
        assert!(matches!(err, NodeError::ConfigLoad { .. }));
    }

    #[test]
    fn test_unknown_address() {
        let book = AddressBook::default();
        let err = book.resolve(&peer("Mallory")).unwrap_err();
        assert!(matches!(err, NodeError::UnknownAddress(p) if p.as_str() == "Mallory"));
    }

    #[test]
    fn test_to_toml_round_trip() {
        let config = NodeConfig::default();
        let reparsed = NodeConfig::from_str(&config.to_toml()).unwrap();
        assert_eq!(reparsed.peers, config.peers);
        assert_eq!(reparsed.keys.prime_pool, config.keys.prime_pool);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peerlink.toml");
        tokio::fs::write(&path, "[directory]\naddr = \"127.0.0.1:4100\"\n")
            .await
            .unwrap();
        let config = NodeConfig::load(&path).await.unwrap();
        assert_eq!(config.directory.addr.port(), 4100);

        let missing = NodeConfig::load(dir.path().join("missing.toml")).await.unwrap_err();
        assert!(missing.is_config_error());
    }
}
