//! Cycle Probe / écoute par interface réseau

use std::collections::HashSet;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, trace, warn};

use super::matches::parse_probe_match;
use super::probe::ProbeRequest;
use super::{DiscoveryConfig, InterfaceSelector};
use crate::errors::OnvifError;
use crate::ids::{IdSource, RandomIds};
use crate::model::DiscoveredDevice;

/// Taille du tampon de réception, suffisante pour un ProbeMatches
const RECV_BUFFER_SIZE: usize = 16 * 1024;

/// Moteur WS-Discovery.
///
/// Chaque appel à [`Discovery::discover`] envoie un Probe par adresse locale
/// sélectionnée et écoute les réponses jusqu'à l'échéance configurée.
pub struct Discovery {
    config: DiscoveryConfig,
    ids: Arc<dyn IdSource>,
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new(DiscoveryConfig::default())
    }
}

impl Discovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self::with_id_source(config, Arc::new(RandomIds))
    }

    pub fn with_id_source(config: DiscoveryConfig, ids: Arc<dyn IdSource>) -> Self {
        Self { config, ids }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Découvre les caméras joignables depuis les interfaces sélectionnées.
    ///
    /// Une erreur de mise en place (interface introuvable, bind, envoi) sur
    /// une seule interface fait échouer l'ensemble. Les datagrammes invalides
    /// ou étrangers au Probe sont ignorés. Aucune réponse n'est pas une erreur.
    pub fn discover(
        &self,
        selector: &InterfaceSelector,
    ) -> Result<Vec<DiscoveredDevice>, OnvifError> {
        let addresses = resolve_addresses(selector)?;
        if addresses.is_empty() {
            warn!("No usable IPv4 interface for WS-Discovery");
            return Ok(Vec::new());
        }

        let per_interface: Vec<Result<Vec<DiscoveredDevice>, OnvifError>> =
            if self.config.parallel && addresses.len() > 1 {
                thread::scope(|scope| {
                    let handles: Vec<_> = addresses
                        .iter()
                        .map(|&local| scope.spawn(move || self.probe_interface(local)))
                        .collect();

                    handles
                        .into_iter()
                        .map(|handle| {
                            handle
                                .join()
                                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                        })
                        .collect()
                })
            } else {
                addresses
                    .iter()
                    .map(|&local| self.probe_interface(local))
                    .collect()
            };

        let mut devices = Vec::new();
        for result in per_interface {
            devices.extend(result?);
        }

        if self.config.dedupe {
            devices = dedupe_by_id(devices);
        }

        info!(
            count = devices.len(),
            interfaces = addresses.len(),
            "✅ WS-Discovery finished"
        );
        Ok(devices)
    }

    /// Un cycle complet sur une adresse locale : bind, Probe, écoute jusqu'à l'échéance.
    pub fn probe_interface(&self, local: Ipv4Addr) -> Result<Vec<DiscoveredDevice>, OnvifError> {
        let target = self.config.target;
        let probe = ProbeRequest::new(self.ids.as_ref());

        let socket = bind_socket(local, target).inspect_err(|err| {
            warn!(local = %local, "❌ Cannot open WS-Discovery socket: {}", err);
        })?;

        let deadline = Instant::now() + self.config.duration;

        socket
            .send_to(probe.to_xml().as_bytes(), target)
            .inspect_err(|err| {
                warn!(local = %local, target = %target, "❌ Failed to send Probe: {}", err);
            })?;
        info!(local = %local, target = %target, message_id = %probe.message_id, "📤 Probe sent");
        trace!("📨 Probe payload\n{}", probe.to_xml());

        let mut devices = Vec::new();
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            socket.set_read_timeout(Some(remaining))?;

            match socket.recv_from(&mut buf) {
                Ok((len, from)) => match parse_probe_match(&probe.message_id, &buf[..len]) {
                    Ok(device) => {
                        debug!(from = %from, id = %device.id, xaddr = %device.xaddr, "📥 ProbeMatch");
                        devices.push(device);
                    }
                    Err(err) => {
                        trace!(from = %from, "Discarding datagram: {}", err);
                    }
                },
                Err(err) if is_deadline(&err) => continue,
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::Interrupted | io::ErrorKind::ConnectionReset
                    ) =>
                {
                    trace!(local = %local, "Ignoring transient receive error: {}", err);
                }
                Err(err) => {
                    warn!(local = %local, "❌ WS-Discovery receive error: {}", err);
                    return Err(err.into());
                }
            }
        }

        debug!(local = %local, count = devices.len(), "Listen window closed");
        Ok(devices)
    }
}

fn bind_socket(local: Ipv4Addr, target: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.bind(&SocketAddr::from((local, 0)).into())?;

    if let IpAddr::V4(group) = target.ip() {
        if group.is_multicast() {
            socket.set_multicast_if_v4(&local)?;
        }
    }

    Ok(socket.into())
}

/// `WouldBlock` sous Unix, `TimedOut` sous Windows.
fn is_deadline(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn resolve_addresses(selector: &InterfaceSelector) -> Result<Vec<Ipv4Addr>, OnvifError> {
    match selector {
        InterfaceSelector::Address(addr) => Ok(vec![*addr]),
        InterfaceSelector::Named(name) => match pmoutils::interface_ipv4(name)? {
            Some(addr) => {
                debug!(interface = %name, addr = %addr, "Resolved discovery interface");
                Ok(vec![addr])
            }
            None => Err(OnvifError::interface(format!(
                "interface {name} not found or has no IPv4 address"
            ))),
        },
        InterfaceSelector::All => {
            let mut seen = HashSet::new();
            Ok(pmoutils::list_ipv4_interfaces()?
                .into_iter()
                .map(|iface| iface.addr)
                .filter(|addr| seen.insert(*addr))
                .collect())
        }
    }
}

/// Garde la première occurrence de chaque identifiant, dans l'ordre.
fn dedupe_by_id(devices: Vec<DiscoveredDevice>) -> Vec<DiscoveredDevice> {
    let mut seen = HashSet::new();
    devices
        .into_iter()
        .filter(|device| seen.insert(device.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{WS_DISCOVERY_MULTICAST, WS_DISCOVERY_PORT};

    fn device(id: &str, xaddr: &str) -> DiscoveredDevice {
        DiscoveredDevice {
            id: id.to_string(),
            name: String::new(),
            xaddr: xaddr.to_string(),
        }
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let devices = vec![
            device("a", "http://10.0.0.1/onvif/device_service"),
            device("b", "http://10.0.0.2/onvif/device_service"),
            device("a", "http://192.168.1.1/onvif/device_service"),
        ];

        let deduped = dedupe_by_id(devices);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].xaddr, "http://10.0.0.1/onvif/device_service");
        assert_eq!(deduped[1].id, "b");
    }

    #[test]
    fn test_resolve_explicit_address() {
        let addr = Ipv4Addr::new(192, 168, 1, 10);
        let resolved = resolve_addresses(&InterfaceSelector::Address(addr)).unwrap();
        assert_eq!(resolved, vec![addr]);
    }

    #[test]
    fn test_resolve_unknown_interface_is_fatal() {
        let selector = InterfaceSelector::Named("pmoonvif-no-such-if0".to_string());
        let err = resolve_addresses(&selector).unwrap_err();
        assert!(matches!(err, OnvifError::Interface(_)));
    }

    #[test]
    fn test_resolve_all_has_no_loopback() {
        let resolved = resolve_addresses(&InterfaceSelector::All).unwrap();
        assert!(resolved.iter().all(|addr| !addr.is_loopback()));
    }

    #[test]
    fn test_bind_unicast_target() {
        let target: SocketAddr = "127.0.0.1:3702".parse().unwrap();
        let socket = bind_socket(Ipv4Addr::LOCALHOST, target).unwrap();
        let local = socket.local_addr().unwrap();

        assert_eq!(local.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_ne!(local.port(), 0);
    }

    #[test]
    fn test_bind_multicast_target() {
        let target = SocketAddr::from((WS_DISCOVERY_MULTICAST, WS_DISCOVERY_PORT));
        let socket = bind_socket(Ipv4Addr::LOCALHOST, target).unwrap();
        let local = socket.local_addr().unwrap();

        assert_eq!(local.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_ne!(local.port(), 0);
    }

    #[test]
    fn test_bind_foreign_address_fails() {
        let target = SocketAddr::from((WS_DISCOVERY_MULTICAST, WS_DISCOVERY_PORT));
        let err = bind_socket(Ipv4Addr::new(203, 0, 113, 77), target).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::AddrNotAvailable);
    }
}
