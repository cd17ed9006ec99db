//! Découvre les caméras ONVIF du réseau local puis interroge chacune.
//!
//! ```text
//! cargo run -p pmoonvif --example discover -- [interface] [user] [password]
//! ```
//!
//! Sans interface, la valeur `onvif.discovery.interface` de la configuration
//! est utilisée (toutes les interfaces par défaut).

use std::env;

use anyhow::Result;
use pmoonvif::{ClientConfig, Discovery, DiscoveryConfig, InterfaceSelector, SoapClient};
use tracing_subscriber::EnvFilter;

const TDS: &str = r#"xmlns:tds="http://www.onvif.org/ver10/device/wsdl""#;

fn main() -> Result<()> {
    let config = pmoconfig::get_config();

    let default_level = config
        .get_log_min_level()
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    let selector = match args.first() {
        Some(value) => InterfaceSelector::parse(value),
        None => InterfaceSelector::from_config(&config),
    };
    let username = args.get(1).map(String::as_str).unwrap_or("");
    let password = args.get(2).map(String::as_str).unwrap_or("");

    let discovery = Discovery::new(DiscoveryConfig::from_config(&config));
    let devices = discovery.discover(&selector)?;

    if devices.is_empty() {
        println!("No ONVIF device answered within {:?}", discovery.config().duration);
        return Ok(());
    }

    let client = SoapClient::new(ClientConfig::from_config(&config));

    for device in &devices {
        println!("📷 {} [{}]", device.name, device.id);
        println!("   {}", device.xaddr);

        let endpoint = device.endpoint(username, password);
        match client.call(&endpoint, "<tds:GetDeviceInformation/>", &[TDS], None) {
            Ok(info) => {
                let field = |name: &str| {
                    info.value(&format!(
                        "Envelope.Body.GetDeviceInformationResponse.{name}"
                    ))
                    .unwrap_or_default()
                };
                println!(
                    "   {} {} (firmware {})",
                    field("Manufacturer"),
                    field("Model"),
                    field("FirmwareVersion")
                );
            }
            Err(err) if err.is_unauthorized() => {
                println!("   🔒 credentials rejected: {err}");
            }
            Err(err) => {
                println!("   ❌ {err}");
            }
        }
    }

    Ok(())
}
