/// Utilitaires pour la gestion des adresses IP réseau.
///
/// Ce module fournit des fonctions pour lister les adresses IPv4
/// des interfaces réseau locales de la machine.
///
/// # Fonctions principales
///
/// - [`list_ipv4_interfaces`] : Toutes les adresses IPv4 non-loopback, par interface
/// - [`interface_ipv4`] : L'adresse IPv4 d'une interface nommée
///
/// # Examples
///
/// ```no_run
/// use pmoutils::interface_ipv4;
///
/// if let Some(ip) = interface_ipv4("eth0")? {
///     println!("Adresse IP de eth0: {}", ip);
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
mod ip_utils;

pub use ip_utils::{Ipv4Interface, interface_ipv4, list_ipv4_interfaces};
