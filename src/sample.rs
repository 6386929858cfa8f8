//! Sample conditioning utilities shared by the ingestion pipeline

use log::error;

use crate::status::{Status, StatusSubsystem};
use crate::types::RawSample;

/// Clamps each axis of a raw sample away from the minimum 16-bit value.
///
/// `i16::MIN` has no positive two's-complement counterpart, so a sample
/// containing it would break the negation-based axis corrections applied
/// later in the pipeline. The value is rewritten to `i16::MIN + 1`; every
/// other value passes through unchanged.
///
/// Drivers must call this on every raw sample before pushing it into a FIFO.
///
/// # Example
/// ```
/// use fusion_runtime::condition_sample;
///
/// let mut sample = [i16::MIN, -5, 1000];
/// condition_sample(&mut sample);
/// assert_eq!(sample, [i16::MIN + 1, -5, 1000]);
/// ```
pub fn condition_sample(sample: &mut RawSample) {
    for axis in sample.iter_mut() {
        if *axis == i16::MIN {
            *axis += 1;
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for u8 {}
    impl Sealed for i8 {}
    impl Sealed for u16 {}
    impl Sealed for i16 {}
    impl Sealed for u32 {}
    impl Sealed for i32 {}
}

/// Element types accepted by [`zero_buffer`].
///
/// Restricted to the 8-, 16- and 32-bit integer widths the buffer pools are
/// built from; other element types are rejected at compile time.
pub trait ZeroElement: sealed::Sealed + Copy + PartialEq {
    /// The zero value for this element type.
    const ZERO: Self;
}

macro_rules! impl_zero_element {
    ($($ty:ty),*) => {
        $(impl ZeroElement for $ty {
            const ZERO: Self = 0;
        })*
    };
}

impl_zero_element!(u8, i8, u16, i16, u32, i32);

/// Zeroes a buffer before reuse, optionally verifying the result.
///
/// With `verify` set, the buffer is re-scanned after zeroing and any nonzero
/// element raises [`Status::HardFault`] through the status collaborator;
/// a cleared buffer that still holds data indicates corrupted memory and is
/// not recoverable.
pub fn zero_buffer<E: ZeroElement>(
    status: &mut dyn StatusSubsystem,
    buffer: &mut [E],
    verify: bool,
) {
    for element in buffer.iter_mut() {
        *element = E::ZERO;
    }

    if verify && buffer.iter().any(|element| *element != E::ZERO) {
        error!("buffer failed zero verification");
        status.set(Status::HardFault);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingStatus {
        last_set: Option<Status>,
    }

    impl StatusSubsystem for RecordingStatus {
        fn set(&mut self, status: Status) {
            self.last_set = Some(status);
        }

        fn get(&self) -> Status {
            self.last_set.unwrap_or_default()
        }

        fn queue(&mut self, _status: Status) {}

        fn update(&mut self) {}

        fn test(&mut self) {}
    }

    #[test]
    fn test_condition_sample_is_identity_for_ordinary_values() {
        let cases: [RawSample; 4] = [
            [0, 0, 0],
            [i16::MAX, i16::MAX, i16::MAX],
            [i16::MIN + 1, -1, 1],
            [-12345, 672, 30000],
        ];

        for case in cases {
            let mut sample = case;
            condition_sample(&mut sample);
            assert_eq!(sample, case, "sample {case:?} should pass unchanged");
        }
    }

    #[test]
    fn test_condition_sample_rewrites_minimum_value() {
        let mut sample = [i16::MIN, i16::MIN, i16::MIN];
        condition_sample(&mut sample);
        assert_eq!(sample, [i16::MIN + 1, i16::MIN + 1, i16::MIN + 1]);

        // Only the affected axis is rewritten.
        let mut sample = [100, i16::MIN, -100];
        condition_sample(&mut sample);
        assert_eq!(sample, [100, i16::MIN + 1, -100]);
    }

    #[test]
    fn test_zero_buffer_clears_all_elements() {
        let mut status = RecordingStatus::default();
        let mut buffer = [0xA5u8; 16];

        zero_buffer(&mut status, &mut buffer, false);

        assert!(buffer.iter().all(|b| *b == 0));
        assert_eq!(status.last_set, None);
    }

    #[test]
    fn test_zero_buffer_verify_passes_on_honest_memory() {
        let mut status = RecordingStatus::default();
        let mut buffer = [-123i32; 8];

        zero_buffer(&mut status, &mut buffer, true);

        assert!(buffer.iter().all(|b| *b == 0));
        assert_eq!(status.last_set, None, "verification must not raise a fault");
    }

    #[test]
    fn test_zero_buffer_handles_16_bit_elements() {
        let mut status = RecordingStatus::default();
        let mut buffer = [i16::MIN; 12];

        zero_buffer(&mut status, &mut buffer, true);

        assert!(buffer.iter().all(|b| *b == 0));
        assert_eq!(status.last_set, None);
    }
}
