//! Async register client for the decibel meter.
//!
//! The meter's firmware is slow: it wants the register selector in its own
//! write transaction and a settle pause before the value is fetched. A
//! combined write-read with a repeated start locks it up, so this client
//! never issues one.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::error;
use thiserror_no_std::Error;

use crate::registers::{self, METER_ADDRESS, Register};

/// Failure of a single register access, split by transaction phase.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterError {
    /// The register-select write was not acknowledged.
    #[error("register select write failed")]
    Select,
    /// The one-byte value read failed after a successful select.
    #[error("register value read failed")]
    Read,
    /// A history slot past the end of the ring was requested.
    #[error("history slot out of range")]
    HistorySlot,
}

/// Register client owning the meter's dedicated bus and a settle delay.
pub struct DbMeter<I2C, D> {
    i2c: I2C,
    delay: D,
    settle_ms: u32,
}

impl<I2C, D> DbMeter<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D, settle_ms: u32) -> Self {
        Self {
            i2c,
            delay,
            settle_ms,
        }
    }

    /// Read one named register.
    pub async fn read_register(&mut self, register: Register) -> Result<u8, MeterError> {
        self.read_address(register.addr()).await
    }

    /// Read one slot of the rolling history ring.
    pub async fn history(&mut self, slot: u8) -> Result<u8, MeterError> {
        let address = registers::history_slot(slot).ok_or(MeterError::HistorySlot)?;
        self.read_address(address).await
    }

    /// Meter firmware version.
    pub async fn version(&mut self) -> Result<u8, MeterError> {
        self.read_register(Register::Version).await
    }

    /// Assemble the 32-bit device id from its four byte registers.
    pub async fn device_id(&mut self) -> Result<u32, MeterError> {
        let id3 = self.read_register(Register::Id3).await?;
        let id2 = self.read_register(Register::Id2).await?;
        let id1 = self.read_register(Register::Id1).await?;
        let id0 = self.read_register(Register::Id0).await?;
        Ok(u32::from_be_bytes([id3, id2, id1, id0]))
    }

    /// Latest averaged level (may be the warm-up sentinel).
    pub async fn decibel(&mut self) -> Result<u8, MeterError> {
        self.read_register(Register::Decibel).await
    }

    /// Minimum level since the last reset.
    pub async fn min(&mut self) -> Result<u8, MeterError> {
        self.read_register(Register::Min).await
    }

    /// Maximum level since the last reset.
    pub async fn max(&mut self) -> Result<u8, MeterError> {
        self.read_register(Register::Max).await
    }

    /// One register access: select, settle, read back. No retries; the
    /// caller decides what a failed cycle means.
    async fn read_address(&mut self, address: u8) -> Result<u8, MeterError> {
        self.i2c
            .write(METER_ADDRESS, &[address])
            .await
            .map_err(|e| {
                error!("select of register {:#04x} failed: {:?}", address, e);
                MeterError::Select
            })?;

        self.delay.delay_ms(self.settle_ms).await;

        let mut value = [0u8; 1];
        self.i2c
            .read(METER_ADDRESS, &mut value)
            .await
            .map_err(|e| {
                error!("read of register {:#04x} failed: {:?}", address, e);
                MeterError::Read
            })?;
        Ok(value[0])
    }
}
