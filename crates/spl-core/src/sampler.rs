//! Acquisition policy on top of the register client.

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{info, warn};
use thiserror_no_std::Error;

use crate::meter::{DbMeter, MeterError};
use crate::reading::Sample;
use crate::registers::{NO_READING, Register};

/// Why a polling cycle produced no sample.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleError {
    /// The meter is still warming up (or was just reset) and has nothing
    /// to report. Expected for the first seconds after power-up.
    #[error("meter has no valid reading yet")]
    NotReady,
    /// The bus transaction itself failed.
    #[error("meter bus transaction failed: {0}")]
    Bus(#[from] MeterError),
}

/// Pulls samples out of the meter, applying the warm-up sentinel policy.
pub struct Sampler<I2C, D> {
    meter: DbMeter<I2C, D>,
}

impl<I2C, D> Sampler<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(meter: DbMeter<I2C, D>) -> Self {
        Self { meter }
    }

    /// One-time startup pass: log the meter's firmware version and device
    /// id. Purely diagnostic; a meter that refuses to identify itself
    /// still gets polled.
    pub async fn start(&mut self) {
        match self.identity().await {
            Ok((version, id)) => info!("meter firmware v{}, device id {:08X}", version, id),
            Err(err) => warn!("meter identity read failed ({}); polling anyway", err),
        }
    }

    async fn identity(&mut self) -> Result<(u8, u32), MeterError> {
        let version = self.meter.version().await?;
        let id = self.meter.device_id().await?;
        Ok((version, id))
    }

    /// Poll the meter once.
    ///
    /// Reads the live level first and short-circuits on the warm-up
    /// sentinel, so MIN and MAX are only fetched for cycles that will
    /// actually be surfaced.
    pub async fn sample(&mut self) -> Result<Sample, SampleError> {
        let current = self.meter.decibel().await?;
        if current == NO_READING {
            return Err(SampleError::NotReady);
        }
        let min = self.meter.min().await?;
        let max = self.meter.max().await?;
        Ok(Sample::new(current, min, max))
    }
}
