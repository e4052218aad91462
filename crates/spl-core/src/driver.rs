//! Top-level control loop for the monitor.
//!
//! Two phases: wait for the network, then poll forever. The connection
//! phase is bounded so a monitor with dead credentials fails loudly at
//! startup instead of sitting on a blank screen. Once running, the loop
//! never goes back: a link lost later only skips uploads while sampling
//! and the display carry on.

use core::convert::Infallible;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use log::{debug, info, warn};
use thiserror_no_std::Error;

use crate::config::{ConnectConfig, SamplingConfig};
use crate::presenter::Presenter;
use crate::reading::Sample;
use crate::sampler::{SampleError, Sampler};
use crate::uploader::{Connectivity, Transport, UploadOutcome, Uploader};

/// Where the driver is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting for the network link before the first poll.
    Connecting,
    /// The poll/display/upload loop. Terminal.
    Running,
}

/// Startup could not complete.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    /// The network never came up within the connection budget.
    #[error("no network connectivity after {0} attempts")]
    ConnectTimeout(u32),
}

/// What one pass of the running loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No usable reading this cycle; screen and channel were left alone.
    Skipped(SampleError),
    /// A reading was taken, rendered and offered to the uploader.
    Completed {
        sample: Sample,
        upload: UploadOutcome,
    },
}

/// Wires sampler, presenter and uploader together and owns the phase
/// logic. The display is passed per call so its concrete type stays out
/// of the driver's generics.
pub struct Driver<'a, I2C, D, T, C> {
    sampler: Sampler<I2C, D>,
    uploader: Uploader<'a, T, C>,
    presenter: Presenter,
    delay: D,
    sampling: SamplingConfig,
    connect: ConnectConfig,
    state: RunState,
}

impl<'a, I2C, D, T, C> Driver<'a, I2C, D, T, C>
where
    I2C: I2c,
    D: DelayNs,
    T: Transport,
    C: Connectivity,
{
    pub fn new(
        sampler: Sampler<I2C, D>,
        uploader: Uploader<'a, T, C>,
        presenter: Presenter,
        delay: D,
        sampling: SamplingConfig,
        connect: ConnectConfig,
    ) -> Self {
        Self {
            sampler,
            uploader,
            presenter,
            delay,
            sampling,
            connect,
            state: RunState::Connecting,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Block until the network link is up, within the configured budget.
    ///
    /// Paints a status line while waiting and an alert when the budget
    /// runs out. Does nothing if the driver is already running.
    pub async fn connect<DSP>(&mut self, display: &mut DSP) -> Result<(), StartupError>
    where
        DSP: DrawTarget<Color = Rgb565>,
        DSP::Error: core::fmt::Debug,
    {
        if self.state == RunState::Running {
            return Ok(());
        }

        if let Err(e) = self.presenter.show_status(display, "Connecting to WiFi...") {
            warn!("display update failed: {:?}", e);
        }

        for attempt in 1..=self.connect.max_attempts {
            if self.uploader.link_up() {
                info!(
                    "network up after {} of {} polls",
                    attempt, self.connect.max_attempts
                );
                self.state = RunState::Running;
                return Ok(());
            }
            self.delay.delay_ms(self.connect.poll_ms).await;
        }

        if let Err(e) = self.presenter.show_alert(display, "WiFi connection failed") {
            warn!("display update failed: {:?}", e);
        }
        Err(StartupError::ConnectTimeout(self.connect.max_attempts))
    }

    /// One pass of the running loop: sample, render, upload.
    ///
    /// A cycle without a usable reading touches neither the screen nor
    /// the channel. A display fault is logged and the cycle carries on;
    /// the reading still goes out.
    pub async fn run_cycle<DSP>(&mut self, display: &mut DSP) -> CycleOutcome
    where
        DSP: DrawTarget<Color = Rgb565>,
        DSP::Error: core::fmt::Debug,
    {
        let sample = match self.sampler.sample().await {
            Ok(sample) => sample,
            Err(err @ SampleError::NotReady) => {
                debug!("no reading yet, skipping cycle");
                return CycleOutcome::Skipped(err);
            }
            Err(err) => {
                warn!("sampling failed: {}", err);
                return CycleOutcome::Skipped(err);
            }
        };

        info!("measured {}", sample);
        if let Err(e) = self.presenter.show_sample(display, &sample) {
            warn!("display update failed: {:?}", e);
        }

        let upload = self.uploader.upload(sample.decibels()).await;
        CycleOutcome::Completed { sample, upload }
    }

    /// Run the monitor forever: connect, identify the meter, then cycle
    /// at the configured rate. Only returns if startup fails.
    pub async fn run<DSP>(&mut self, display: &mut DSP) -> Result<Infallible, StartupError>
    where
        DSP: DrawTarget<Color = Rgb565>,
        DSP::Error: core::fmt::Debug,
    {
        self.connect(display).await?;
        self.sampler.start().await;

        loop {
            self.run_cycle(display).await;
            self.delay.delay_ms(self.sampling.cycle_ms).await;
        }
    }
}
