//! Screen layout for the monitor.
//!
//! One screen, redrawn in full each time something changes: a caption, the
//! live level as `dB: <value>`, and a min/max footer. While there is no
//! valid reading the presenter leaves the panel alone entirely, so the
//! previous frame (or the startup status screen) stays visible.

use core::fmt::Write as _;

use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::mono_font::ascii::{FONT_6X10, FONT_10X20};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Text};
use embedded_layout::prelude::*;
use heapless::String;

use crate::framebuffer::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX, FrameBuffer};
use crate::reading::{Reading, Sample};

/// Vertical position of the caption line.
const CAPTION_Y: i32 = 36;

/// Vertical position of the min/max footer.
const FOOTER_Y: i32 = DISPLAY_HEIGHT_PX as i32 - 24;

/// Muted gray for the caption and footer text.
const LIGHT_GRAY: Rgb565 = Rgb565::new(21, 42, 21);

/// Format the main reading line.
pub fn format_db_line(decibels: u8) -> String<16> {
    let mut line = String::new();
    // "dB: 255" is 7 bytes, well inside capacity
    let _ = write!(line, "dB: {}", decibels);
    line
}

/// Format the min/max footer, or `None` while either bound still carries
/// the warm-up sentinel (right after a meter reset). A sentinel byte is
/// never rendered.
pub fn format_range_line(min: Reading, max: Reading) -> Option<String<32>> {
    if !min.is_valid() || !max.is_valid() {
        return None;
    }
    let mut line = String::new();
    let _ = write!(line, "min {}  max {}", min.value, max.value);
    Some(line)
}

/// Draws the monitor's screens into a framebuffer and flushes them to
/// whatever panel the caller passes in.
pub struct Presenter {
    frame: FrameBuffer,
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            frame: FrameBuffer::new(),
        }
    }

    /// Render a full reading screen and push it to the panel.
    pub fn show_sample<D>(&mut self, display: &mut D, sample: &Sample) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.frame.clear(Rgb565::BLACK).ok();

        let center_x = (DISPLAY_WIDTH_PX / 2) as i32;

        Text::with_alignment(
            "SOUND LEVEL",
            Point::new(center_x, CAPTION_Y),
            MonoTextStyle::new(&FONT_6X10, LIGHT_GRAY),
            Alignment::Center,
        )
        .draw(&mut self.frame)
        .ok();

        let line = format_db_line(sample.decibels());
        Text::new(&line, Point::zero(), MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE))
            .align_to(&self.frame.bounding_box(), horizontal::Center, vertical::Center)
            .draw(&mut self.frame)
            .ok();

        if let Some(range) = format_range_line(sample.min, sample.max) {
            Text::with_alignment(
                &range,
                Point::new(center_x, FOOTER_Y),
                MonoTextStyle::new(&FONT_6X10, LIGHT_GRAY),
                Alignment::Center,
            )
            .draw(&mut self.frame)
            .ok();
        }

        self.frame.flush(display)
    }

    /// Render a centered status line (startup, waiting for the network).
    pub fn show_status<D>(&mut self, display: &mut D, message: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.show_message(display, message, Rgb565::WHITE)
    }

    /// Render a centered failure line.
    pub fn show_alert<D>(&mut self, display: &mut D, message: &str) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.show_message(display, message, Rgb565::RED)
    }

    fn show_message<D>(
        &mut self,
        display: &mut D,
        message: &str,
        color: Rgb565,
    ) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.frame.clear(Rgb565::BLACK).ok();
        Text::new(message, Point::zero(), MonoTextStyle::new(&FONT_10X20, color))
            .align_to(&self.frame.bounding_box(), horizontal::Center, vertical::Center)
            .draw(&mut self.frame)
            .ok();
        self.frame.flush(display)
    }
}

/// Draw target that swallows everything.
///
/// Stands in for the panel when it failed to initialize but the monitor
/// is configured to keep running headless.
pub struct NullDisplay;

impl OriginDimensions for NullDisplay {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32)
    }
}

impl DrawTarget for NullDisplay {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, _pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        Ok(())
    }
}
