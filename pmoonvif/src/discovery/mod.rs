//! # Module Discovery - Découverte WS-Discovery des caméras ONVIF
//!
//! Ce module envoie un `Probe` WS-Discovery sur le groupe multicast
//! `239.255.255.250:3702` et collecte les `ProbeMatches` des caméras.
//!
//! ## Fonctionnalités
//!
//! - ✅ Probe filtré sur le type `NetworkVideoTransmitter`
//! - ✅ Corrélation des réponses par `MessageID` / `RelatesTo`
//! - ✅ Écoute bornée par une échéance, jamais bloquante au-delà
//! - ✅ Une ou plusieurs interfaces, en parallèle ou séquentiellement
//! - ✅ Dédoublonnage optionnel par identifiant de device
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use pmoonvif::discovery::{InterfaceSelector, discover};
//!
//! for camera in discover(&InterfaceSelector::All, Duration::from_secs(2))? {
//!     println!("{} ({}) -> {}", camera.name, camera.id, camera.xaddr);
//! }
//! # Ok::<(), pmoonvif::OnvifError>(())
//! ```

mod engine;
mod matches;
pub mod probe;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use tracing::warn;

pub use engine::Discovery;
pub use matches::{ONVIF_NAME_SCOPE, ProbeMatchError, device_name, parse_probe_match};
pub use probe::ProbeRequest;

use crate::errors::OnvifError;
use crate::model::{DiscoveredDevice, DiscoveryReport};

/// Groupe multicast WS-Discovery
pub const WS_DISCOVERY_MULTICAST: Ipv4Addr = Ipv4Addr::new(239, 255, 255, 250);

/// Port UDP WS-Discovery
pub const WS_DISCOVERY_PORT: u16 = 3702;

/// Interfaces locales depuis lesquelles sonder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InterfaceSelector {
    /// Toutes les interfaces IPv4 non-loopback
    #[default]
    All,
    /// Interface nommée (ex: `"eth0"`)
    Named(String),
    /// Adresse locale explicite
    Address(Ipv4Addr),
}

impl InterfaceSelector {
    /// `onvif.discovery.interface` : vide ou absent = toutes, une adresse IPv4
    /// littérale = [`InterfaceSelector::Address`], sinon un nom d'interface.
    pub fn from_config(config: &pmoconfig::Config) -> Self {
        match config.get_discovery_interface() {
            Ok(Some(value)) => Self::parse(&value),
            Ok(None) => Self::All,
            Err(err) => {
                warn!("Failed to get discovery interface: {}, probing all interfaces", err);
                Self::All
            }
        }
    }

    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            Self::All
        } else if let Ok(addr) = value.parse::<Ipv4Addr>() {
            Self::Address(addr)
        } else {
            Self::Named(value.to_string())
        }
    }
}

/// Paramètres d'une découverte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Durée d'écoute après l'envoi du Probe
    pub duration: Duration,
    /// Destination du Probe, le groupe multicast par défaut
    pub target: SocketAddr,
    /// Ne garder que la première réponse de chaque device
    pub dedupe: bool,
    /// Sonder les interfaces en parallèle
    pub parallel: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(pmoconfig::DEFAULT_DISCOVERY_DURATION_MS),
            target: SocketAddr::V4(SocketAddrV4::new(WS_DISCOVERY_MULTICAST, WS_DISCOVERY_PORT)),
            dedupe: pmoconfig::DEFAULT_DISCOVERY_DEDUPE,
            parallel: pmoconfig::DEFAULT_DISCOVERY_PARALLEL,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_duration(duration: Duration) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    pub fn from_config(config: &pmoconfig::Config) -> Self {
        let defaults = Self::default();
        Self {
            duration: config
                .get_discovery_duration_ms()
                .map(Duration::from_millis)
                .unwrap_or_else(|err| {
                    warn!("Failed to get discovery duration: {}, using default", err);
                    defaults.duration
                }),
            dedupe: config.get_discovery_dedupe().unwrap_or_else(|err| {
                warn!("Failed to get discovery dedupe flag: {}, using default", err);
                defaults.dedupe
            }),
            parallel: config.get_discovery_parallel().unwrap_or_else(|err| {
                warn!("Failed to get discovery parallel flag: {}, using default", err);
                defaults.parallel
            }),
            ..defaults
        }
    }
}

/// Découverte avec les paramètres par défaut et la durée donnée.
pub fn discover(
    selector: &InterfaceSelector,
    duration: Duration,
) -> Result<Vec<DiscoveredDevice>, OnvifError> {
    Discovery::new(DiscoveryConfig::with_duration(duration)).discover(selector)
}

/// Comme [`discover`], sous forme de rapport JSON `{"Error": ..., "Data": [...]}`.
pub fn discover_json(selector: &InterfaceSelector, duration: Duration) -> String {
    DiscoveryReport::from(discover(selector, duration)).to_json()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse() {
        assert_eq!(InterfaceSelector::parse(""), InterfaceSelector::All);
        assert_eq!(InterfaceSelector::parse("  "), InterfaceSelector::All);
        assert_eq!(
            InterfaceSelector::parse("eth0"),
            InterfaceSelector::Named("eth0".to_string())
        );
        assert_eq!(
            InterfaceSelector::parse("192.168.1.20"),
            InterfaceSelector::Address(Ipv4Addr::new(192, 168, 1, 20))
        );
    }

    #[test]
    fn test_default_config() {
        let config = DiscoveryConfig::default();

        assert_eq!(config.duration, Duration::from_secs(2));
        assert_eq!(config.target.to_string(), "239.255.255.250:3702");
        assert!(config.dedupe);
        assert!(config.parallel);
    }

    #[test]
    fn test_config_from_pmoconfig() {
        let cfg = pmoconfig::Config::embedded();
        cfg.set_discovery_duration_ms(500).unwrap();
        cfg.set_discovery_dedupe(false).unwrap();
        cfg.set_discovery_interface(Some("wlan0".to_string())).unwrap();

        let config = DiscoveryConfig::from_config(&cfg);
        assert_eq!(config.duration, Duration::from_millis(500));
        assert!(!config.dedupe);
        assert_eq!(config.target, DiscoveryConfig::default().target);

        assert_eq!(
            InterfaceSelector::from_config(&cfg),
            InterfaceSelector::Named("wlan0".to_string())
        );
    }

    #[test]
    fn test_embedded_config_probes_all_interfaces() {
        let cfg = pmoconfig::Config::embedded();
        assert_eq!(InterfaceSelector::from_config(&cfg), InterfaceSelector::All);
    }

    #[test]
    fn test_discover_json_reports_interface_error() {
        let json = discover_json(
            &InterfaceSelector::Named("pmoonvif-no-such-if0".to_string()),
            Duration::from_millis(10),
        );
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(report["Error"].as_str().unwrap().contains("pmoonvif-no-such-if0"));
        assert_eq!(report["Data"].as_array().unwrap().len(), 0);
    }
}
