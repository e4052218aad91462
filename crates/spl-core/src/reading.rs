//! Value types for meter readings.

use crate::registers::NO_READING;

/// Which register a reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingKind {
    /// The live averaged level.
    Current,
    /// Minimum since the last meter reset.
    Min,
    /// Maximum since the last meter reset.
    Max,
}

/// A single byte read from the meter, tagged with its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub value: u8,
    pub kind: ReadingKind,
}

impl Reading {
    pub const fn new(value: u8, kind: ReadingKind) -> Self {
        Self { value, kind }
    }

    /// Whether the byte is an actual level rather than the warm-up
    /// sentinel.
    pub const fn is_valid(&self) -> bool {
        self.value != NO_READING
    }
}

/// One polling cycle's worth of readings.
///
/// `current` is always valid here: the sampler never hands out a sample
/// whose live reading is the sentinel. `min`/`max` can still carry it
/// right after a meter reset, so consumers check those individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub current: Reading,
    pub min: Reading,
    pub max: Reading,
}

impl Sample {
    pub const fn new(current: u8, min: u8, max: u8) -> Self {
        Self {
            current: Reading::new(current, ReadingKind::Current),
            min: Reading::new(min, ReadingKind::Min),
            max: Reading::new(max, ReadingKind::Max),
        }
    }

    /// The live level in dB SPL.
    pub const fn decibels(&self) -> u8 {
        self.current.value
    }
}

impl core::fmt::Display for Sample {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} dB (min {}, max {})",
            self.current.value, self.min.value, self.max.value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_byte_is_not_a_valid_reading() {
        assert!(!Reading::new(NO_READING, ReadingKind::Current).is_valid());
        assert!(Reading::new(0, ReadingKind::Current).is_valid());
        assert!(Reading::new(254, ReadingKind::Max).is_valid());
    }

    #[test]
    fn sample_formats_all_three_levels() {
        let sample = Sample::new(42, 30, 60);
        let text = alloc::format!("{}", sample);
        assert_eq!(text, "42 dB (min 30, max 60)");
    }
}
