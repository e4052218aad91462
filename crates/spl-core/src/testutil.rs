//! Shared fakes for exercising the monitor off-hardware.
//!
//! The I2C fake records every bus interaction into one transcript, with
//! the settle delays interleaved, so tests can assert the exact wire
//! choreography rather than just the returned bytes. Handles to the
//! transcript and the fault switches are cloned out before a fake moves
//! into the code under test.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, Operation};

use crate::registers::METER_ADDRESS;
use crate::uploader::{Connectivity, Transport, TransportResponse};

/// Shared log of everything that happened on the fake bus.
pub type Transcript = Rc<RefCell<Vec<BusEvent>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Write { address: u8, bytes: Vec<u8> },
    Read { address: u8, len: usize },
    Settle { ns: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeBusError;

impl embedded_hal_async::i2c::Error for FakeBusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// In-memory register file behaving like the meter: a one-byte write
/// selects a register, a later read returns its value.
pub struct FakeBus {
    transcript: Transcript,
    regs: [u8; 0x78],
    selected: Option<u8>,
    fail_writes: Rc<Cell<bool>>,
    fail_reads: Rc<Cell<bool>>,
}

/// Handles into a [`FakeBus`], taken before it moves into the meter.
pub struct BusHandles {
    pub transcript: Transcript,
    pub fail_writes: Rc<Cell<bool>>,
    pub fail_reads: Rc<Cell<bool>>,
}

impl FakeBus {
    pub fn with_registers(values: &[(u8, u8)]) -> Self {
        let mut regs = [0u8; 0x78];
        for &(address, value) in values {
            regs[address as usize] = value;
        }
        Self {
            transcript: Rc::new(RefCell::new(Vec::new())),
            regs,
            selected: None,
            fail_writes: Rc::new(Cell::new(false)),
            fail_reads: Rc::new(Cell::new(false)),
        }
    }

    pub fn handles(&self) -> BusHandles {
        BusHandles {
            transcript: self.transcript.clone(),
            fail_writes: self.fail_writes.clone(),
            fail_reads: self.fail_reads.clone(),
        }
    }
}

impl ErrorType for FakeBus {
    type Error = FakeBusError;
}

impl I2c for FakeBus {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    self.transcript.borrow_mut().push(BusEvent::Write {
                        address,
                        bytes: bytes.to_vec(),
                    });
                    if self.fail_writes.get() {
                        return Err(FakeBusError);
                    }
                    if let [register] = **bytes {
                        self.selected = Some(register);
                    }
                }
                Operation::Read(buffer) => {
                    self.transcript.borrow_mut().push(BusEvent::Read {
                        address,
                        len: buffer.len(),
                    });
                    if self.fail_reads.get() {
                        return Err(FakeBusError);
                    }
                    let value = self
                        .selected
                        .and_then(|register| self.regs.get(register as usize).copied())
                        .unwrap_or(0);
                    buffer.fill(value);
                }
            }
        }
        Ok(())
    }
}

/// Delay that records its pauses into the bus transcript instead of
/// sleeping, so the settle step shows up between select and read.
pub struct FakeDelay {
    transcript: Transcript,
}

impl FakeDelay {
    pub fn new(transcript: Transcript) -> Self {
        Self { transcript }
    }
}

impl DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.transcript.borrow_mut().push(BusEvent::Settle { ns });
    }
}

/// One-byte register-select writes, in transcript order.
pub fn selector_writes(transcript: &Transcript) -> Vec<u8> {
    transcript
        .borrow()
        .iter()
        .filter_map(|event| match event {
            BusEvent::Write { bytes, .. } if bytes.len() == 1 => Some(bytes[0]),
            _ => None,
        })
        .collect()
}

/// Assert a transcript holds exactly one select/settle/read exchange for
/// `selector`, with the settle pauses summing to `settle_ns`.
pub fn assert_single_register_read(events: &[BusEvent], selector: u8, settle_ns: u64) {
    assert!(
        events.len() >= 3,
        "expected select, settle, read; got {:?}",
        events
    );
    assert_eq!(
        events[0],
        BusEvent::Write {
            address: METER_ADDRESS,
            bytes: alloc::vec![selector],
        },
        "exchange must start with a one-byte register select"
    );
    assert_eq!(
        events[events.len() - 1],
        BusEvent::Read {
            address: METER_ADDRESS,
            len: 1,
        },
        "exchange must end with a one-byte value read"
    );
    let settled: u64 = events[1..events.len() - 1]
        .iter()
        .map(|event| match event {
            BusEvent::Settle { ns } => u64::from(*ns),
            other => panic!("unexpected event between select and read: {:?}", other),
        })
        .sum();
    assert_eq!(settled, settle_ns, "settle time between select and read");
}

/// Connectivity probe whose answer tests can flip at runtime.
#[derive(Clone)]
pub struct FakeProbe {
    up: Rc<Cell<bool>>,
}

impl FakeProbe {
    pub fn new(up: bool) -> Self {
        Self {
            up: Rc::new(Cell::new(up)),
        }
    }

    pub fn set(&self, up: bool) {
        self.up.set(up);
    }
}

impl Connectivity for FakeProbe {
    fn is_connected(&self) -> bool {
        self.up.get()
    }
}

/// One GET the fake transport served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestRecord {
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Handles into a [`FakeTransport`], taken before it moves into the
/// uploader. `opened`/`closed` count connection lifecycles so tests can
/// assert every attempt released its connection.
pub struct TransportHandles {
    pub requests: Rc<RefCell<Vec<RequestRecord>>>,
    pub opened: Rc<Cell<usize>>,
    pub closed: Rc<Cell<usize>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeTransportError;

/// Transport answering every GET with a fixed status, or failing at the
/// socket level when built with [`FakeTransport::failing`].
pub struct FakeTransport {
    status: u16,
    fail: bool,
    requests: Rc<RefCell<Vec<RequestRecord>>>,
    opened: Rc<Cell<usize>>,
    closed: Rc<Cell<usize>>,
}

impl FakeTransport {
    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            fail: false,
            requests: Rc::new(RefCell::new(Vec::new())),
            opened: Rc::new(Cell::new(0)),
            closed: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing() -> Self {
        let mut transport = Self::with_status(0);
        transport.fail = true;
        transport
    }

    pub fn handles(&self) -> TransportHandles {
        TransportHandles {
            requests: self.requests.clone(),
            opened: self.opened.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl Transport for FakeTransport {
    type Error = FakeTransportError;

    async fn get(
        &mut self,
        host: &str,
        port: u16,
        path_and_query: &str,
    ) -> Result<TransportResponse, Self::Error> {
        self.opened.set(self.opened.get() + 1);
        self.requests.borrow_mut().push(RequestRecord {
            host: String::from(host),
            port,
            path: String::from(path_and_query),
        });
        self.closed.set(self.closed.get() + 1);

        if self.fail {
            return Err(FakeTransportError);
        }
        let mut body = heapless::Vec::new();
        let _ = body.extend_from_slice(b"ok");
        Ok(TransportResponse {
            status: self.status,
            body,
        })
    }
}

/// Display that records what gets flushed at it.
///
/// `lit_pixels` counts non-black colors, which is enough to tell "text
/// was drawn" from "frame is blank" without rasterizing fonts in tests.
pub struct RecordingDisplay {
    pub flushes: usize,
    pub last_area: Option<Rectangle>,
    pub colors_seen: usize,
    pub lit_pixels: usize,
}

impl Default for RecordingDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self {
            flushes: 0,
            last_area: None,
            colors_seen: 0,
            lit_pixels: 0,
        }
    }

    fn record(&mut self, color: Rgb565) {
        self.colors_seen += 1;
        if color != Rgb565::BLACK {
            self.lit_pixels += 1;
        }
    }
}

impl OriginDimensions for RecordingDisplay {
    fn size(&self) -> Size {
        Size::new(320, 240)
    }
}

impl DrawTarget for RecordingDisplay {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(_, color) in pixels {
            self.record(color);
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.flushes += 1;
        self.last_area = Some(*area);
        for color in colors {
            self.record(color);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct DisplayFault;

/// Display whose every operation fails, for exercising the paths that
/// must survive a wedged panel.
pub struct FailingDisplay;

impl OriginDimensions for FailingDisplay {
    fn size(&self) -> Size {
        Size::new(320, 240)
    }
}

impl DrawTarget for FailingDisplay {
    type Color = Rgb565;
    type Error = DisplayFault;

    fn draw_iter<I>(&mut self, _pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        Err(DisplayFault)
    }
}
