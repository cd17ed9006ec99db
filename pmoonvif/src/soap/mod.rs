//! # Module SOAP - Simple Object Access Protocol
//!
//! Ce module construit les requêtes SOAP 1.2 envoyées aux caméras ONVIF.
//!
//! ## Fonctionnalités
//!
//! - ✅ Enveloppe SOAP 1.2 avec namespaces fournis par l'appelant
//! - ✅ Header `Action` WS-Addressing optionnel
//! - ✅ Header `Security` WS-Security (UsernameToken / PasswordDigest)
//! - ✅ Normalisation des espaces du texte émis
//!
//! ## Architecture
//!
//! - [`SoapRequest`] : Description d'une requête (corps, namespaces, identifiants)
//! - [`UsernameToken`] : Jeton d'authentification, recalculé à chaque requête
//!
//! ## Example
//!
//! ```
//! use pmoonvif::ids::RandomIds;
//! use pmoonvif::soap::SoapRequest;
//!
//! let xml = SoapRequest::new("<tds:GetSystemDateAndTime/>")
//!     .namespace(r#"xmlns:tds="http://www.onvif.org/ver10/device/wsdl""#)
//!     .credentials("admin", "secret")
//!     .build(&RandomIds);
//!
//! assert!(xml.contains("<s:Header><Security"));
//! ```

mod envelope;
pub mod security;

use once_cell::sync::Lazy;
use regex::Regex;

pub use envelope::{SOAP_ENV_NS, SoapRequest, WSA_NS};
pub use security::{UsernameToken, password_digest};

static BETWEEN_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").expect("valid regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Supprime les espaces entre balises adjacentes et réduit les autres
/// suites d'espaces à un seul caractère.
pub fn normalize_whitespace(xml: &str) -> String {
    let compact = BETWEEN_TAGS.replace_all(xml, "><");
    WHITESPACE_RUN.replace_all(&compact, " ").into_owned()
}

/// Échappe les caractères spéciaux d'un texte inséré dans un élément XML
pub fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
