//! Typed configuration for the monitor.
//!
//! Everything here ships with the documented defaults baked in; the
//! firmware overrides the telemetry block with its compile-time secrets
//! and leaves the rest alone.

use serde::{Deserialize, Serialize};

/// Timing of the acquisition path.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    /// Pause between the register-select write and the value read, in ms.
    /// The meter needs this long to latch the selected register.
    pub settle_ms: u32,
    /// Pause between polling cycles, in ms.
    pub cycle_ms: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            settle_ms: 10,
            cycle_ms: 5_000,
        }
    }
}

/// How long to wait for network association at startup.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectConfig {
    /// Pause between connectivity polls, in ms.
    pub poll_ms: u32,
    /// Polls before giving up on startup connectivity entirely.
    pub max_attempts: u32,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        // Two minutes at the default poll rate.
        Self {
            poll_ms: 500,
            max_attempts: 240,
        }
    }
}

/// Where measurements get uploaded.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct TelemetryConfig<'a> {
    /// Endpoint host name or IPv4 literal.
    pub host: &'a str,
    /// TCP port of the endpoint.
    pub port: u16,
    /// Write key passed as the `api_key` query parameter.
    pub api_key: &'a str,
}

impl Default for TelemetryConfig<'_> {
    fn default() -> Self {
        Self {
            host: "",
            port: 80,
            api_key: "",
        }
    }
}

/// Top-level configuration bundle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
#[serde(bound(deserialize = "'de: 'a"))]
pub struct AppConfig<'a> {
    pub sampling: SamplingConfig,
    pub connect: ConnectConfig,
    pub telemetry: TelemetryConfig<'a>,
}
