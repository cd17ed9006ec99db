//! Jeton WS-Security `UsernameToken` avec `PasswordDigest`

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use sha1::{Digest, Sha1};

use super::xml_escape;
use crate::ids::IdSource;

/// Namespace WS-Security (secext)
pub const WSSE_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";

/// Namespace WS-Security utility (pour `Created`)
pub const WSU_NS: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// Type du mot de passe : digest SHA-1
pub const PASSWORD_DIGEST_TYPE: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";

/// Encodage du nonce : base64
pub const NONCE_ENCODING_TYPE: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// Jeton d'authentification valable pour une seule requête.
///
/// Chaque requête reçoit un nonce et un horodatage neufs : un jeton n'est
/// jamais conservé ni réutilisé.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsernameToken {
    pub username: String,

    /// `base64(SHA-1(nonce ‖ created ‖ password))`
    pub password_digest: String,

    /// Nonce encodé en base64
    pub nonce: String,

    /// Horodatage RFC 3339 UTC
    pub created: String,
}

impl UsernameToken {
    /// Génère un jeton frais.
    ///
    /// Le nonce est constitué des 16 octets bruts d'un UUID tiré de `ids`,
    /// l'horodatage vaut l'heure UTC courante décalée de `skew`.
    pub fn generate(username: &str, password: &str, skew: TimeDelta, ids: &dyn IdSource) -> Self {
        let nonce = ids.next_uuid();
        let now = Utc::now();
        let created = now.checked_add_signed(skew).unwrap_or(now);
        Self::from_parts(username, password, nonce.as_bytes(), &format_created(created))
    }

    /// Construit un jeton à partir d'un nonce et d'un horodatage imposés.
    pub fn from_parts(username: &str, password: &str, nonce: &[u8], created: &str) -> Self {
        Self {
            username: username.to_string(),
            password_digest: password_digest(nonce, created, password),
            nonce: BASE64.encode(nonce),
            created: created.to_string(),
        }
    }

    /// Élément `<Security>` prêt à insérer dans le header SOAP.
    pub fn to_xml(&self) -> String {
        format!(
            r#"<Security s:mustUnderstand="1" xmlns="{wsse}">
                <UsernameToken>
                    <Username>{username}</Username>
                    <Password Type="{password_type}">{digest}</Password>
                    <Nonce EncodingType="{nonce_encoding}">{nonce}</Nonce>
                    <Created xmlns="{wsu}">{created}</Created>
                </UsernameToken>
            </Security>"#,
            wsse = WSSE_NS,
            username = xml_escape(&self.username),
            password_type = PASSWORD_DIGEST_TYPE,
            digest = self.password_digest,
            nonce_encoding = NONCE_ENCODING_TYPE,
            nonce = self.nonce,
            wsu = WSU_NS,
            created = self.created,
        )
    }
}

/// `base64(SHA-1(nonce ‖ created ‖ password))`, concaténation brute sans séparateur.
pub fn password_digest(nonce: &[u8], created: &str, password: &str) -> String {
    let mut sha = Sha1::new();
    sha.update(nonce);
    sha.update(created.as_bytes());
    sha.update(password.as_bytes());
    BASE64.encode(sha.finalize())
}

/// Format RFC 3339 à la seconde, suffixe `Z`.
pub fn format_created(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
