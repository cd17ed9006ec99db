//! Message WS-Discovery `Probe`

use crate::ids::IdSource;
use crate::soap::{SOAP_ENV_NS, normalize_whitespace};

/// Namespace WS-Addressing utilisé par WS-Discovery (version 2004/08)
pub const WSA_DISCOVERY_NS: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";

/// Namespace WS-Discovery 2005/04
pub const WSD_NS: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery";

/// Namespace du type de device ONVIF recherché
pub const ONVIF_NETWORK_NS: &str = "http://www.onvif.org/ver10/network/wsdl";

/// Destination logique d'un Probe multicast
pub const DISCOVERY_URN: &str = "urn:schemas-xmlsoap-org:ws:2005:04:discovery";

pub const PROBE_ACTION: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe";

/// Adresse WS-Addressing « répondre à l'émetteur »
pub const ANONYMOUS_REPLY_TO: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing/role/anonymous";

/// Type ONVIF des caméras (Network Video Transmitter)
pub const NVT_TYPE: &str = "dn:NetworkVideoTransmitter";

/// Requête Probe, une par tentative et par interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// `uuid:<uuid>`, recopié par les caméras dans `RelatesTo`
    pub message_id: String,

    /// Filtre `Types` (QName préfixé par `dn`)
    pub types: String,
}

impl ProbeRequest {
    pub fn new(ids: &dyn IdSource) -> Self {
        Self {
            message_id: format!("uuid:{}", ids.next_uuid()),
            types: NVT_TYPE.to_string(),
        }
    }

    pub fn to_xml(&self) -> String {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <e:Envelope
                xmlns:e="{soap}"
                xmlns:w="{wsa}"
                xmlns:d="{wsd}"
                xmlns:dn="{network}">
                <e:Header>
                    <w:MessageID>{message_id}</w:MessageID>
                    <w:ReplyTo>
                        <w:Address>{reply_to}</w:Address>
                    </w:ReplyTo>
                    <w:To e:mustUnderstand="true">{to}</w:To>
                    <w:Action e:mustUnderstand="true">{action}</w:Action>
                </e:Header>
                <e:Body>
                    <d:Probe>
                        <d:Types>{types}</d:Types>
                    </d:Probe>
                </e:Body>
            </e:Envelope>"#,
            soap = SOAP_ENV_NS,
            wsa = WSA_DISCOVERY_NS,
            wsd = WSD_NS,
            network = ONVIF_NETWORK_NS,
            message_id = self.message_id,
            reply_to = ANONYMOUS_REPLY_TO,
            to = DISCOVERY_URN,
            action = PROBE_ACTION,
            types = self.types,
        );

        normalize_whitespace(&xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::FixedIds;
    use crate::xml::XmlDocument;
    use uuid::Uuid;

    fn probe() -> ProbeRequest {
        let uuid = Uuid::parse_str("0f4c1a7e-6b4d-4b3a-9d6e-3c2b1a0f9e8d").unwrap();
        ProbeRequest::new(&FixedIds::new(vec![uuid]))
    }

    #[test]
    fn test_message_id_prefix() {
        assert_eq!(
            probe().message_id,
            "uuid:0f4c1a7e-6b4d-4b3a-9d6e-3c2b1a0f9e8d"
        );
    }

    #[test]
    fn test_probe_header_and_body() {
        let probe = probe();
        let doc = XmlDocument::parse(probe.to_xml().as_bytes()).unwrap();

        assert_eq!(doc.value("Envelope.Header.MessageID").unwrap(), probe.message_id);
        assert_eq!(doc.value("Envelope.Header.To").unwrap(), DISCOVERY_URN);
        assert_eq!(doc.value("Envelope.Header.Action").unwrap(), PROBE_ACTION);
        assert_eq!(
            doc.value("Envelope.Header.ReplyTo.Address").unwrap(),
            ANONYMOUS_REPLY_TO
        );
        assert_eq!(
            doc.value("Envelope.Body.Probe.Types").unwrap(),
            "dn:NetworkVideoTransmitter"
        );
    }

    #[test]
    fn test_probe_is_compact() {
        let xml = probe().to_xml();

        assert!(!xml.contains('\n'));
        assert!(!xml.contains("> <"));
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><e:Envelope xmlns:e="#));
    }

    #[test]
    fn test_each_probe_has_its_own_id() {
        let ids = FixedIds::new(vec![Uuid::from_u128(1), Uuid::from_u128(2)]);
        let first = ProbeRequest::new(&ids);
        let second = ProbeRequest::new(&ids);

        assert_ne!(first.message_id, second.message_id);
    }
}
