use serde::{Deserialize, Serialize};

use crate::errors::OnvifError;

/// Where and as whom SOAP operations are sent.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceEndpoint {
    /// Control address (XAddr), e.g. `http://192.168.0.11/onvif/device_service`
    #[serde(rename = "XAddr")]
    pub xaddr: String,
    #[serde(rename = "User")]
    pub username: String,
    #[serde(rename = "Password", skip_serializing, default)]
    pub password: String,
}

impl DeviceEndpoint {
    pub fn new(xaddr: &str, username: &str, password: &str) -> Self {
        Self {
            xaddr: xaddr.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Same credentials, another service address (media, PTZ, events...).
    pub fn with_xaddr(&self, xaddr: &str) -> Self {
        Self {
            xaddr: xaddr.to_string(),
            ..self.clone()
        }
    }
}

/// Camera found by WS-Discovery.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Endpoint reference UUID, without the `urn:uuid:` prefix
    #[serde(rename = "ID")]
    pub id: String,
    /// Friendly name from the `onvif://www.onvif.org/name/` scope, may be empty
    #[serde(rename = "Name")]
    pub name: String,
    /// First advertised control address
    #[serde(rename = "XAddr")]
    pub xaddr: String,
}

impl DiscoveredDevice {
    pub fn endpoint(&self, username: &str, password: &str) -> DeviceEndpoint {
        DeviceEndpoint::new(&self.xaddr, username, password)
    }
}

/// JSON report of a discovery run: `{"Error": "...", "Data": [...]}`.
///
/// `Error` is empty on success; on failure `Data` holds nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryReport {
    #[serde(rename = "Error")]
    pub error: String,
    #[serde(rename = "Data")]
    pub data: Vec<DiscoveredDevice>,
}

impl DiscoveryReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            format!(r#"{{"Error":"cannot serialize discovery report: {err}","Data":[]}}"#)
        })
    }
}

impl From<Result<Vec<DiscoveredDevice>, OnvifError>> for DiscoveryReport {
    fn from(result: Result<Vec<DiscoveredDevice>, OnvifError>) -> Self {
        match result {
            Ok(data) => DiscoveryReport {
                error: String::new(),
                data,
            },
            Err(err) => DiscoveryReport {
                error: err.to_string(),
                data: Vec::new(),
            },
        }
    }
}
