//! Register map of the I2C decibel meter module.
//!
//! The meter exposes a flat byte-register interface: a one-byte selector
//! write chooses the register, and a subsequent one-byte read returns its
//! value. Addresses 0x00..=0x0E are the named registers below; the rolling
//! history ring occupies 0x14..=0x77.

/// 7-bit I2C address of the meter.
pub const METER_ADDRESS: u8 = 0x48;

/// Bus clock for the meter, in kHz. The module's firmware cannot keep up
/// with standard-mode 100 kHz, so the bus it sits on must be clocked down
/// and must not carry any other peripheral.
pub const BUS_RATE_KHZ: u32 = 10;

/// Sentinel stored in [`Register::Decibel`] while the meter has not yet
/// accumulated a valid measurement (power-up, or right after a reset).
pub const NO_READING: u8 = 0xFF;

/// Named registers of the meter.
///
/// Discriminants are the wire addresses, so `reg as u8` (via [`addr`]) is
/// the selector byte to write.
///
/// [`addr`]: Register::addr
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// Meter firmware version.
    Version = 0x00,
    /// Device id, most significant byte.
    Id3 = 0x01,
    /// Device id, second byte.
    Id2 = 0x02,
    /// Device id, third byte.
    Id1 = 0x03,
    /// Device id, least significant byte.
    Id0 = 0x04,
    /// User scratch byte, persists until power-down.
    Scratch = 0x05,
    /// Control bits (interrupt enable, filter select).
    Control = 0x06,
    /// Averaging window in milliseconds, high byte.
    TavgHigh = 0x07,
    /// Averaging window in milliseconds, low byte.
    TavgLow = 0x08,
    /// Writing any value clears MIN, MAX and the history ring.
    Reset = 0x09,
    /// Latest A-weighted sound level in dB SPL, or [`NO_READING`].
    Decibel = 0x0A,
    /// Minimum level since the last reset.
    Min = 0x0B,
    /// Maximum level since the last reset.
    Max = 0x0C,
    /// Low threshold for the interrupt feature.
    ThresholdMin = 0x0D,
    /// High threshold for the interrupt feature.
    ThresholdMax = 0x0E,
}

impl Register {
    /// Every named register, in address order.
    pub const ALL: [Register; 15] = [
        Register::Version,
        Register::Id3,
        Register::Id2,
        Register::Id1,
        Register::Id0,
        Register::Scratch,
        Register::Control,
        Register::TavgHigh,
        Register::TavgLow,
        Register::Reset,
        Register::Decibel,
        Register::Min,
        Register::Max,
        Register::ThresholdMin,
        Register::ThresholdMax,
    ];

    /// Wire address of the register.
    pub const fn addr(self) -> u8 {
        self as u8
    }
}

/// First address of the rolling history ring.
pub const HISTORY_FIRST: u8 = 0x14;

/// Last address of the rolling history ring (inclusive).
pub const HISTORY_LAST: u8 = 0x77;

/// Number of slots in the history ring.
pub const HISTORY_SLOTS: u8 = HISTORY_LAST - HISTORY_FIRST + 1;

/// Wire address of history slot `index`, or `None` past the end of the
/// ring.
pub const fn history_slot(index: u8) -> Option<u8> {
    if index < HISTORY_SLOTS {
        Some(HISTORY_FIRST + index)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_addresses_match_the_device_map() {
        let addresses: alloc::vec::Vec<u8> = Register::ALL.iter().map(|r| r.addr()).collect();
        let expected = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D,
            0x0E,
        ];
        assert_eq!(addresses, expected);
    }

    #[test]
    fn history_ring_is_one_hundred_slots() {
        assert_eq!(HISTORY_SLOTS, 100);
        assert_eq!(history_slot(0), Some(0x14));
        assert_eq!(history_slot(99), Some(0x77));
        assert_eq!(history_slot(100), None);
        assert_eq!(history_slot(u8::MAX), None);
    }
}
