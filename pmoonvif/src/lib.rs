//! # pmoonvif - Cœur protocolaire d'un client ONVIF
//!
//! Cette crate fournit ce dont toute opération ONVIF a besoin, sans les
//! opérations elles-mêmes :
//!
//! - ✅ Jeton WS-Security `UsernameToken` / `PasswordDigest` ([`soap::security`])
//! - ✅ Construction d'enveloppes SOAP 1.2 ([`soap::SoapRequest`])
//! - ✅ Envoi HTTP, détection des SOAP faults ([`SoapClient`])
//! - ✅ Document XML navigable par chemin ([`XmlDocument`])
//! - ✅ Découverte WS-Discovery des caméras ([`discovery`])
//!
//! ## Example
//!
//! ```no_run
//! use pmoonvif::{ClientConfig, DeviceEndpoint, SoapClient};
//!
//! let client = SoapClient::new(ClientConfig::default());
//! let camera = DeviceEndpoint::new("http://192.168.1.64/onvif/device_service", "admin", "secret");
//!
//! let response = client.call(
//!     &camera,
//!     "<tds:GetDeviceInformation/>",
//!     &[r#"xmlns:tds="http://www.onvif.org/ver10/device/wsdl""#],
//!     None,
//! )?;
//! let model = response.value("Envelope.Body.GetDeviceInformationResponse.Model")?;
//! println!("Model: {model}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod discovery;
pub mod errors;
pub mod ids;
pub mod model;
pub mod soap;
pub mod xml;

pub use client::{ClientConfig, SoapClient};
pub use discovery::{Discovery, DiscoveryConfig, InterfaceSelector, discover, discover_json};
pub use errors::OnvifError;
pub use ids::{FixedIds, IdSource, RandomIds};
pub use model::{DeviceEndpoint, DiscoveredDevice, DiscoveryReport};
pub use soap::{SoapRequest, UsernameToken};
pub use xml::{XmlDocument, XmlError};
