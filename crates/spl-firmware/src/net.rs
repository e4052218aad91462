//! WiFi supervision and the telemetry transport.
//!
//! [`supervise`] owns the WiFi controller for the lifetime of the device:
//! it associates, waits for DHCP, then watches the link and reconnects
//! after any loss, publishing the current state through a
//! [`ConnectivityHandle`]. The upload path never touches the controller;
//! it only reads the handle and opens short-lived TCP sockets.

use core::fmt::Write as _;
use core::net::Ipv4Addr;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_net::dns::DnsQueryType;
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, Stack};
use embassy_time::{Duration, Timer, WithTimeout};
use embedded_io_async::Write as _;
use esp_radio::wifi::WifiController;
use heapless::String;
use log::{info, warn};
use thiserror_no_std::Error;

use spl_core::uploader::{Connectivity, Transport, TransportResponse};

/// How long DHCP gets after association before the attempt is abandoned.
const DHCP_TIMEOUT_SECS: u64 = 15;

/// Pause between reconnection attempts after any failure.
const RETRY_DELAY_SECS: u64 = 5;

/// Cadence of the link health check while associated.
const LINK_POLL_INTERVAL_MS: u64 = 500;

/// Per-operation socket timeout for telemetry requests.
const SOCKET_TIMEOUT_SECS: u64 = 10;

const RX_BUFFER_BYTES: usize = 1024;
const TX_BUFFER_BYTES: usize = 512;
const RESPONSE_BUFFER_BYTES: usize = 1024;

/// Link state shared between the WiFi supervisor and the upload path.
///
/// Lives in a plain `static`; the supervisor writes it, everyone else
/// reads it through the [`Connectivity`] impl.
pub struct ConnectivityHandle {
    connected: AtomicBool,
}

impl ConnectivityHandle {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
        }
    }

    fn set(&self, up: bool) {
        self.connected.store(up, Ordering::Relaxed);
    }
}

impl Default for ConnectivityHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Connectivity for ConnectivityHandle {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

/// Keep the WiFi association alive forever.
///
/// The handle reports up only while the interface is associated and holds
/// a DHCP lease. Any loss drops the handle first, then tears down and
/// retries after [`RETRY_DELAY_SECS`].
pub async fn supervise(
    controller: &mut WifiController<'_>,
    stack: Stack<'_>,
    link: &ConnectivityHandle,
) -> ! {
    loop {
        link.set(false);

        if !controller.is_started().unwrap_or(false) {
            if let Err(err) = controller.start_async().await {
                warn!("wifi start failed: {:?}", err);
                Timer::after_secs(RETRY_DELAY_SECS).await;
                continue;
            }
        }

        if let Err(err) = controller.connect_async().await {
            warn!("wifi connect failed: {:?}", err);
            let _ = controller.disconnect_async().await;
            Timer::after_secs(RETRY_DELAY_SECS).await;
            continue;
        }

        match stack
            .wait_config_up()
            .with_timeout(Duration::from_secs(DHCP_TIMEOUT_SECS))
            .await
        {
            Ok(()) => {
                if let Some(config) = stack.config_v4() {
                    info!("network up, ip {}", config.address);
                }
                link.set(true);
            }
            Err(_) => {
                warn!("dhcp timed out, reconnecting");
                let _ = controller.disconnect_async().await;
                Timer::after_secs(RETRY_DELAY_SECS).await;
                continue;
            }
        }

        while stack.is_link_up()
            && stack.config_v4().is_some()
            && matches!(controller.is_connected(), Ok(true))
        {
            Timer::after_millis(LINK_POLL_INTERVAL_MS).await;
        }

        warn!("wifi link lost, reconnecting");
        link.set(false);
        let _ = controller.disconnect_async().await;
        Timer::after_secs(RETRY_DELAY_SECS).await;
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("host name did not resolve")]
    Dns,
    #[error("tcp connect failed")]
    Connect,
    #[error("socket i/o failed mid-request")]
    Io,
    #[error("peer did not answer with http")]
    Protocol,
}

/// [`Transport`] over the device's TCP/IP stack.
///
/// Socket buffers live on the caller's stack for the duration of one
/// request, so an idle monitor holds no socket memory between uploads.
pub struct TcpTransport<'a> {
    stack: Stack<'a>,
}

impl<'a> TcpTransport<'a> {
    pub fn new(stack: Stack<'a>) -> Self {
        Self { stack }
    }

    async fn resolve(&self, host: &str) -> Result<IpAddress, TransportError> {
        // An IPv4 literal skips the resolver entirely.
        if let Ok(address) = host.parse::<Ipv4Addr>() {
            return Ok(IpAddress::Ipv4(address));
        }

        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(|e| {
                warn!("dns lookup of {} failed: {:?}", host, e);
                TransportError::Dns
            })?;
        addresses.first().copied().ok_or(TransportError::Dns)
    }
}

impl Transport for TcpTransport<'_> {
    type Error = TransportError;

    async fn get(
        &mut self,
        host: &str,
        port: u16,
        path_and_query: &str,
    ) -> Result<TransportResponse, Self::Error> {
        let address = self.resolve(host).await?;

        let mut rx_buffer = [0u8; RX_BUFFER_BYTES];
        let mut tx_buffer = [0u8; TX_BUFFER_BYTES];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(Duration::from_secs(SOCKET_TIMEOUT_SECS)));

        socket.connect((address, port)).await.map_err(|e| {
            warn!("connect to {}:{} failed: {:?}", host, port, e);
            TransportError::Connect
        })?;

        let mut request: String<256> = String::new();
        let _ = write!(
            request,
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path_and_query, host
        );

        socket.write_all(request.as_bytes()).await.map_err(|e| {
            warn!("request write failed: {:?}", e);
            TransportError::Io
        })?;
        socket.flush().await.map_err(|e| {
            warn!("request flush failed: {:?}", e);
            TransportError::Io
        })?;

        // `Connection: close` makes EOF the end-of-response marker.
        let mut response = [0u8; RESPONSE_BUFFER_BYTES];
        let mut filled = 0;
        while filled < response.len() {
            match socket.read(&mut response[filled..]).await {
                Ok(0) => break,
                Ok(read) => filled += read,
                Err(e) => {
                    warn!("response read failed: {:?}", e);
                    return Err(TransportError::Io);
                }
            }
        }
        socket.close();

        TransportResponse::parse(&response[..filled]).ok_or(TransportError::Protocol)
    }
}
