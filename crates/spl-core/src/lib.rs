//! Hardware-independent core library for spl-rs
//!
//! This crate contains all platform-agnostic logic for the sound level
//! monitor: the dB meter register client, sampling policy, screen
//! rendering, telemetry upload, and the driving state machine.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both the
//! embedded target (ESP32-S3) and desktop hosts for the test suite. All
//! hardware access goes through `embedded-hal-async` traits and the
//! `Transport`/`Connectivity` traits in [`uploader`], which the firmware
//! crate implements against the real board.

#![no_std]

extern crate alloc;

pub mod config;
pub mod driver;
pub mod framebuffer;
pub mod meter;
pub mod presenter;
pub mod reading;
pub mod registers;
pub mod sampler;
pub mod uploader;

#[cfg(test)]
pub(crate) mod testutil;
