//! Board-level hardware abstraction hooks

use crate::channels::{AccelChannel, GyroChannel, MagChannel};

/// Capability interface for board-specific hardware corrections.
///
/// Axis orientation, sign conventions, and bus wiring differ per board; the
/// conditioning pipeline calls back into this trait so the same runtime
/// binary logic serves any mounting. Corrections operate in place on the raw
/// FIFO contents, before averaging.
pub trait BoardHal {
    /// Brings up the sensor bus on the given pins.
    ///
    /// Returns false when the bus could not be initialized; the runtime
    /// treats that as a hard fault.
    fn initialize_bus(&mut self, sda_pin: u32, scl_pin: u32) -> bool;

    /// Applies board-specific axis corrections to raw accelerometer samples.
    fn correct_accel(&mut self, accel: &mut AccelChannel);

    /// Applies board-specific axis corrections to raw magnetometer samples.
    fn correct_mag(&mut self, mag: &mut MagChannel);

    /// Applies board-specific axis corrections to raw gyroscope samples.
    fn correct_gyro(&mut self, gyro: &mut GyroChannel);
}
