use std::time::Duration;

use thiserror::Error;

use crate::xml::XmlError;

#[derive(Error, Debug)]
pub enum OnvifError {
    #[error("Invalid device address '{xaddr}': {reason}")]
    InvalidUrl { xaddr: String, reason: String },
    #[error("HTTP error when sending SOAP request to {xaddr}: {source}")]
    Network {
        xaddr: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("SOAP request to {xaddr} timed out after {timeout:?}")]
    Timeout { xaddr: String, timeout: Duration },
    #[error("Socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{reason}")]
    Fault { reason: String, status: u16 },
    #[error("{xaddr} failed with HTTP status {status}")]
    HttpStatus {
        xaddr: String,
        status: u16,
        body: String,
    },
    #[error("Malformed response: {0}")]
    MalformedResponse(#[from] XmlError),
    #[error("Network interface error: {0}")]
    Interface(String),
}

impl OnvifError {
    pub fn interface(message: impl Into<String>) -> Self {
        OnvifError::Interface(message.into())
    }

    /// Whether the device rejected the credentials.
    ///
    /// Devices report this either as an HTTP 401 or as a SOAP fault whose
    /// reason mentions "authorized" (`NotAuthorized`, `Sender not Authorized`...).
    pub fn is_unauthorized(&self) -> bool {
        match self {
            OnvifError::Fault { reason, status } => {
                *status == 401 || reason.to_lowercase().contains("authorized")
            }
            OnvifError::HttpStatus { status, .. } => *status == 401,
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, OnvifError::Timeout { .. })
    }

    /// SOAP fault reason text, if the device answered with a fault.
    pub fn fault_reason(&self) -> Option<&str> {
        match self {
            OnvifError::Fault { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fault(reason: &str, status: u16) -> OnvifError {
        OnvifError::Fault {
            reason: reason.to_string(),
            status,
        }
    }

    #[test]
    fn test_fault_displays_reason_only() {
        assert_eq!(fault("Sender not Authorized", 200).to_string(), "Sender not Authorized");
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(fault("Sender not Authorized", 200).is_unauthorized());
        assert!(fault("ter:NotAuthorized", 400).is_unauthorized());
        assert!(fault("whatever", 401).is_unauthorized());
        assert!(!fault("Invalid profile token", 200).is_unauthorized());

        let status = OnvifError::HttpStatus {
            xaddr: "http://cam/onvif/device_service".to_string(),
            status: 401,
            body: String::new(),
        };
        assert!(status.is_unauthorized());
        assert!(!OnvifError::interface("eth9").is_unauthorized());
    }

    #[test]
    fn test_fault_reason() {
        assert_eq!(fault("boom", 500).fault_reason(), Some("boom"));
        assert_eq!(OnvifError::interface("x").fault_reason(), None);
    }
}
