//! Lecture des réponses `ProbeMatches`

use thiserror::Error;

use crate::model::DiscoveredDevice;
use crate::xml::{XmlDocument, XmlError};

/// Préfixe du scope portant le nom de la caméra
pub const ONVIF_NAME_SCOPE: &str = "onvif://www.onvif.org/name/";

const RELATES_TO: &str = "Envelope.Header.RelatesTo";
const ADDRESS: &str = "Envelope.Body.ProbeMatches.ProbeMatch.EndpointReference.Address";
const SCOPES: &str = "Envelope.Body.ProbeMatches.ProbeMatch.Scopes";
const XADDRS: &str = "Envelope.Body.ProbeMatches.ProbeMatch.XAddrs";

/// Raison du rejet d'un datagramme.
///
/// Ces erreurs ne sortent jamais du moteur de découverte : le datagramme
/// est ignoré et l'écoute continue.
#[derive(Debug, Error)]
pub enum ProbeMatchError {
    #[error("not a discovery reply: {0}")]
    Malformed(#[from] XmlError),

    #[error("reply relates to {got:?}, expected {expected}")]
    Unrelated { expected: String, got: Option<String> },

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("device does not advertise any XAddr")]
    NoXAddr,
}

/// Valide un datagramme reçu en réponse au Probe `message_id`.
pub fn parse_probe_match(message_id: &str, datagram: &[u8]) -> Result<DiscoveredDevice, ProbeMatchError> {
    let doc = XmlDocument::parse(datagram)?;

    let relates_to = doc.value(RELATES_TO).ok();
    if relates_to.as_deref().map(str::trim) != Some(message_id) {
        return Err(ProbeMatchError::Unrelated {
            expected: message_id.to_string(),
            got: relates_to,
        });
    }

    let address = doc
        .value(ADDRESS)
        .map_err(|_| ProbeMatchError::MissingField("EndpointReference.Address"))?;
    let id = address.strip_prefix("urn:uuid:").unwrap_or(&address).to_string();
    if id.is_empty() {
        return Err(ProbeMatchError::MissingField("EndpointReference.Address"));
    }

    let name = doc
        .value(SCOPES)
        .ok()
        .and_then(|scopes| device_name(&scopes))
        .unwrap_or_default();

    let xaddrs = doc.value(XADDRS).unwrap_or_default();
    let xaddr = xaddrs
        .split_whitespace()
        .next()
        .ok_or(ProbeMatchError::NoXAddr)?
        .to_string();

    Ok(DiscoveredDevice { id, name, xaddr })
}

/// Nom lisible tiré du premier scope `onvif://www.onvif.org/name/...`.
pub fn device_name(scopes: &str) -> Option<String> {
    scopes
        .split_whitespace()
        .find_map(|scope| scope.strip_prefix(ONVIF_NAME_SCOPE))
        .map(|name| name.replace('_', " "))
}
