//! Telemetry upload over plain HTTP.
//!
//! The channel protocol is a single GET per reading:
//! `/update?api_key=<KEY>&field1=<value>` against the configured host. The
//! actual socket work lives behind [`Transport`] so the upload policy
//! (skip on a dead link, map the status code) is testable off-hardware.

use core::fmt::Write as _;
use core::future::Future;

use heapless::String;
use log::{debug, info, warn};

use crate::config::TelemetryConfig;

/// Bytes of the response body kept around for logging.
pub const BODY_CAPTURE_BYTES: usize = 128;

/// Status recorded when the transport failed before any status line
/// arrived, mirroring what command line HTTP clients report there.
pub const STATUS_NO_RESPONSE: u16 = 0;

/// Minimal view of an HTTP response: the status code plus the leading
/// bytes of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: heapless::Vec<u8, BODY_CAPTURE_BYTES>,
}

impl TransportResponse {
    /// Parse a raw HTTP/1.x response. Returns `None` when the bytes do
    /// not start with a well formed status line.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        let line_end = raw.windows(2).position(|w| w == b"\r\n")?;
        let status_line = core::str::from_utf8(&raw[..line_end]).ok()?;

        let mut parts = status_line.split(' ');
        if !parts.next()?.starts_with("HTTP/1.") {
            return None;
        }
        let status: u16 = parts.next()?.parse().ok()?;

        let body_start = raw
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .map(|at| at + 4)
            .unwrap_or(raw.len());
        let available = &raw[body_start..];
        let take = available.len().min(BODY_CAPTURE_BYTES);

        let mut body = heapless::Vec::new();
        let _ = body.extend_from_slice(&available[..take]);
        Some(Self { status, body })
    }

    /// The captured body as text, or an empty string if it is not UTF-8.
    pub fn body_text(&self) -> &str {
        core::str::from_utf8(&self.body).unwrap_or("")
    }
}

/// One-shot HTTP client.
///
/// An implementation opens a connection, issues a single GET for
/// `path_and_query`, reads the response and releases the connection
/// before returning.
pub trait Transport {
    type Error: core::fmt::Debug;

    fn get(
        &mut self,
        host: &str,
        port: u16,
        path_and_query: &str,
    ) -> impl Future<Output = Result<TransportResponse, Self::Error>>;
}

/// Link-state probe consulted before every upload attempt.
pub trait Connectivity {
    fn is_connected(&self) -> bool;
}

impl<C: Connectivity> Connectivity for &C {
    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}

/// What became of one reading handed to [`Uploader::upload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The endpoint acknowledged the reading with a 200.
    Delivered,
    /// The endpoint answered with a non-200 status, or the transport
    /// failed before a status arrived ([`STATUS_NO_RESPONSE`]).
    Rejected(u16),
    /// The link was down, so no request was attempted.
    Skipped,
}

/// Pushes readings to the telemetry channel.
pub struct Uploader<'a, T, C> {
    transport: T,
    link: C,
    config: TelemetryConfig<'a>,
}

impl<'a, T, C> Uploader<'a, T, C>
where
    T: Transport,
    C: Connectivity,
{
    pub fn new(transport: T, link: C, config: TelemetryConfig<'a>) -> Self {
        Self {
            transport,
            link,
            config,
        }
    }

    /// Whether the probe currently reports a usable link.
    pub fn link_up(&self) -> bool {
        self.link.is_connected()
    }

    /// Push one reading to the channel.
    ///
    /// A down link skips the attempt outright so an outage never stalls
    /// sampling behind socket timeouts.
    pub async fn upload(&mut self, decibels: u8) -> UploadOutcome {
        if !self.link.is_connected() {
            debug!("link down, skipping upload of {} dB", decibels);
            return UploadOutcome::Skipped;
        }

        let mut path: String<128> = String::new();
        let _ = write!(
            path,
            "/update?api_key={}&field1={}",
            self.config.api_key, decibels
        );

        match self
            .transport
            .get(self.config.host, self.config.port, &path)
            .await
        {
            Ok(response) if response.status == 200 => {
                info!(
                    "delivered {} dB ({})",
                    decibels,
                    response.body_text().trim()
                );
                UploadOutcome::Delivered
            }
            Ok(response) => {
                warn!(
                    "endpoint rejected {} dB with status {}",
                    decibels, response.status
                );
                UploadOutcome::Rejected(response.status)
            }
            Err(e) => {
                warn!("upload transport failed: {:?}", e);
                UploadOutcome::Rejected(STATUS_NO_RESPONSE)
            }
        }
    }
}
