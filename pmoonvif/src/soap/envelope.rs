//! Construction des enveloppes SOAP 1.2 des requêtes ONVIF

use chrono::TimeDelta;

use super::normalize_whitespace;
use super::security::UsernameToken;
use crate::ids::IdSource;
use crate::model::DeviceEndpoint;

/// Namespace de l'enveloppe SOAP 1.2, toujours déclaré sous l'alias `s`
pub const SOAP_ENV_NS: &str = "http://www.w3.org/2003/05/soap-envelope";

/// Namespace WS-Addressing de l'élément `Action`
pub const WSA_NS: &str = "http://www.w3.org/2005/08/addressing";

/// Description d'une requête SOAP, consommée une seule fois par le builder.
#[derive(Debug, Clone, Default)]
pub struct SoapRequest {
    /// Fragment XML inséré tel quel dans `<s:Body>`
    pub body: String,

    /// Déclarations de namespace ajoutées à la racine (ex: `xmlns:tds="..."`)
    pub namespaces: Vec<String>,

    /// Utilisateur ; vide = pas de header de sécurité
    pub username: String,

    pub password: String,

    /// Décalage appliqué à l'horodatage `Created` du jeton (peut être négatif)
    pub token_skew: TimeDelta,

    /// URI WS-Addressing `Action` ; absente ou vide = pas d'élément `Action`
    pub action: Option<String>,
}

impl SoapRequest {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    /// Requête portant les identifiants de `endpoint`.
    pub fn for_endpoint(endpoint: &DeviceEndpoint, body: impl Into<String>) -> Self {
        Self::new(body).credentials(&endpoint.username, &endpoint.password)
    }

    pub fn namespace(mut self, declaration: impl Into<String>) -> Self {
        self.namespaces.push(declaration.into());
        self
    }

    pub fn namespaces<I, S>(mut self, declarations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces
            .extend(declarations.into_iter().map(Into::into));
        self
    }

    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    pub fn token_skew(mut self, skew: TimeDelta) -> Self {
        self.token_skew = skew;
        self
    }

    pub fn action(mut self, uri: impl Into<String>) -> Self {
        self.action = Some(uri.into());
        self
    }

    fn action_uri(&self) -> Option<&str> {
        self.action.as_deref().filter(|uri| !uri.is_empty())
    }

    /// Construit le texte de l'enveloppe avec un jeton de sécurité frais.
    pub fn build(&self, ids: &dyn IdSource) -> String {
        let token = (!self.username.is_empty()).then(|| {
            UsernameToken::generate(&self.username, &self.password, self.token_skew, ids)
        });
        self.build_with_token(token.as_ref())
    }

    /// Construit le texte de l'enveloppe avec un jeton imposé.
    ///
    /// Le jeton n'est émis que si la requête porte un utilisateur.
    pub fn build_with_token(&self, token: Option<&UsernameToken>) -> String {
        let mut envelope = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        envelope.push_str(&format!(r#"<s:Envelope xmlns:s="{SOAP_ENV_NS}""#));
        for namespace in &self.namespaces {
            envelope.push(' ');
            envelope.push_str(namespace);
        }
        envelope.push('>');

        let action = self.action_uri().map(|uri| {
            format!(r#"<Action mustUnderstand="1" xmlns="{WSA_NS}">{uri}</Action>"#)
        });
        let security = token
            .filter(|_| !self.username.is_empty())
            .map(UsernameToken::to_xml);

        let headers: Vec<String> = [action, security].into_iter().flatten().collect();
        if !headers.is_empty() {
            envelope.push_str("<s:Header>");
            envelope.push_str(&headers.concat());
            envelope.push_str("</s:Header>");
        }

        envelope.push_str("<s:Body>");
        envelope.push_str(&self.body);
        envelope.push_str("</s:Body>");
        envelope.push_str("</s:Envelope>");

        normalize_whitespace(&envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::FixedIds;
    use crate::xml::XmlDocument;

    const BODY: &str = r#"<tds:GetDeviceInformation/>"#;
    const TDS: &str = r#"xmlns:tds="http://www.onvif.org/ver10/device/wsdl""#;

    fn token() -> UsernameToken {
        UsernameToken::from_parts("admin", "secret", &[7u8; 16], "2024-03-01T12:00:00Z")
    }

    #[test]
    fn test_no_header_without_user_and_action() {
        let request = SoapRequest::new(BODY).namespace(TDS);
        let xml = request.build(&FixedIds::default());

        assert!(!xml.contains("Header"));
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><s:Envelope"#));
        assert!(xml.contains(&format!(r#"<s:Envelope xmlns:s="{SOAP_ENV_NS}" {TDS}>"#)));
        assert!(xml.ends_with("<s:Body><tds:GetDeviceInformation/></s:Body></s:Envelope>"));
    }

    #[test]
    fn test_empty_action_is_ignored() {
        let request = SoapRequest::new(BODY).action("");
        let xml = request.build(&FixedIds::default());

        assert!(!xml.contains("Header"));
        assert!(!xml.contains("Action"));
    }

    #[test]
    fn test_action_header_only() {
        let request = SoapRequest::new(BODY)
            .action("http://www.onvif.org/ver10/events/wsdl/PullPointSubscription/PullMessagesRequest");
        let xml = request.build(&FixedIds::default());

        assert!(xml.contains("<s:Header><Action mustUnderstand=\"1\""));
        assert!(xml.contains("PullMessagesRequest</Action></s:Header>"));
        assert!(!xml.contains("Security"));
    }

    #[test]
    fn test_security_header_only() {
        let request = SoapRequest::new(BODY).credentials("admin", "secret");
        let token = token();
        let xml = request.build_with_token(Some(&token));

        assert!(xml.contains("<s:Header><Security"));
        assert!(xml.contains("<Password Type="));
        assert!(xml.contains(&token.password_digest));
        assert!(xml.contains(&token.nonce));
        assert!(!xml.contains("<Action"));
    }

    #[test]
    fn test_action_precedes_security() {
        let request = SoapRequest::new(BODY)
            .credentials("admin", "secret")
            .action("urn:test");
        let xml = request.build(&FixedIds::default());

        let action = xml.find("<Action").unwrap();
        let security = xml.find("<Security").unwrap();
        assert!(action < security);
        assert_eq!(xml.matches("<s:Header>").count(), 1);
    }

    #[test]
    fn test_token_ignored_without_username() {
        let request = SoapRequest::new(BODY);
        let xml = request.build_with_token(Some(&token()));

        assert!(!xml.contains("Header"));
    }

    #[test]
    fn test_body_is_verbatim() {
        let body = r#"<trt:GetStreamUri><trt:StreamSetup><tt:Stream>RTP-Unicast</tt:Stream></trt:StreamSetup><trt:ProfileToken>profile_1</trt:ProfileToken></trt:GetStreamUri>"#;
        let request = SoapRequest::new(body)
            .namespaces([
                r#"xmlns:trt="http://www.onvif.org/ver10/media/wsdl""#,
                r#"xmlns:tt="http://www.onvif.org/ver10/schema""#,
            ])
            .credentials("admin", "secret");
        let xml = request.build(&FixedIds::default());

        assert!(xml.contains(&format!("<s:Body>{body}</s:Body>")));
    }

    #[test]
    fn test_body_whitespace_is_normalized() {
        let body = "<tptz:Stop>\n    <tptz:ProfileToken>main   profile</tptz:ProfileToken>\n</tptz:Stop>";
        let xml = SoapRequest::new(body).build(&FixedIds::default());

        assert!(xml.contains(
            "<s:Body><tptz:Stop><tptz:ProfileToken>main profile</tptz:ProfileToken></tptz:Stop></s:Body>"
        ));
        assert!(!xml.contains('\n'));
    }

    #[test]
    fn test_envelope_is_well_formed() {
        let request = SoapRequest::new(BODY)
            .namespace(TDS)
            .credentials("admin", "secret")
            .action("urn:test");
        let xml = request.build(&FixedIds::default());

        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        assert_eq!(
            doc.value("Envelope.Header.Security.UsernameToken.Username").unwrap(),
            "admin"
        );
        assert_eq!(doc.value("Envelope.Header.Action").unwrap(), "urn:test");
        assert!(doc.contains("Envelope.Body.GetDeviceInformation"));
    }

    #[test]
    fn test_for_endpoint_copies_credentials() {
        let endpoint = DeviceEndpoint::new("http://10.0.0.2/onvif/device_service", "admin", "pw");
        let request = SoapRequest::for_endpoint(&endpoint, BODY);

        assert_eq!(request.username, "admin");
        assert_eq!(request.password, "pw");
        assert_eq!(request.body, BODY);
    }
}
