//! ESP32-S3 specific modules for spl-rs
//!
//! This crate contains the code that cannot compile on desktop targets:
//! WiFi bring-up and supervision, the TCP transport for telemetry
//! uploads, and compile-time credential management.

#![no_std]

extern crate alloc;

pub mod net;
pub mod secrets;
