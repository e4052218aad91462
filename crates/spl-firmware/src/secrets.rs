//! Compile-time provisioning.
//!
//! The build script loads a local `.env` and forwards these variables to
//! rustc, so credentials are baked into the binary without ever being
//! committed. All three default to empty when unset.

/// WiFi network name.
pub const WIFI_SSID: &str = env!("SPL_WIFI_SSID");

/// WiFi passphrase.
pub const WIFI_PASSWORD: &str = env!("SPL_WIFI_PASSWORD");

/// Write key for the telemetry channel, sent as the `api_key` query
/// parameter on every upload.
pub const API_KEY: &str = env!("SPL_API_KEY");

/// Host of the telemetry endpoint.
pub const TELEMETRY_HOST: &str = "api.thingspeak.com";

/// TCP port of the telemetry endpoint.
pub const TELEMETRY_PORT: u16 = 80;
