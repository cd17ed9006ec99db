use get_if_addrs::{IfAddr, get_if_addrs};
use std::io;
use std::net::Ipv4Addr;
use tracing::trace;

/// Interface réseau locale possédant une adresse IPv4 utilisable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Interface {
    /// Nom de l'interface (ex: `"eth0"`, `"wlan0"`, `"en0"`)
    pub name: String,

    /// Adresse IPv4 portée par l'interface
    pub addr: Ipv4Addr,
}

/// Liste toutes les adresses IPv4 non-loopback des interfaces réseau.
///
/// Parcourt toutes les interfaces réseau de la machine et collecte leurs adresses IPv4,
/// en excluant les adresses de loopback (127.0.0.1). Une interface portant plusieurs
/// adresses apparaît une fois par adresse.
///
/// # Errors
///
/// Retourne l'erreur d'E/S du système si l'énumération des interfaces échoue.
///
/// # Examples
///
/// ```no_run
/// use pmoutils::list_ipv4_interfaces;
///
/// for iface in list_ipv4_interfaces()? {
///     println!("Interface {}: {}", iface.name, iface.addr);
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn list_ipv4_interfaces() -> io::Result<Vec<Ipv4Interface>> {
    let mut result = Vec::new();

    for iface in get_if_addrs()? {
        match iface.addr {
            IfAddr::V4(ref v4) if !v4.ip.is_loopback() => {
                result.push(Ipv4Interface {
                    name: iface.name.clone(),
                    addr: v4.ip,
                });
            }
            _ => {
                trace!(interface = %iface.name, ip = %iface.ip(), "Skipping non IPv4 or loopback address");
            }
        }
    }

    Ok(result)
}

/// Retourne la première adresse IPv4 non-loopback d'une interface nommée.
///
/// `Ok(None)` signifie que l'interface n'existe pas ou ne porte aucune adresse
/// IPv4 utilisable.
pub fn interface_ipv4(name: &str) -> io::Result<Option<Ipv4Addr>> {
    Ok(list_ipv4_interfaces()?
        .into_iter()
        .find(|iface| iface.name == name)
        .map(|iface| iface.addr))
}
