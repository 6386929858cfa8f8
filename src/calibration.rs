//! Calibration collaborator interface for the conditioning pipeline

use crate::channels::{AccelChannel, MagChannel};

/// Capability interface for the external calibration algorithms.
///
/// The conditioning pipeline owns *when* calibration runs; the collaborator
/// owns *how*. Per cycle the pipeline inverts each class's calibration over
/// the fresh raw average, feeds the historical sample buffers the solvers
/// converge on, and gives the magnetometer solver one time slice of its
/// incremental fit. Entry points that participate in time slicing receive
/// the current loop counter.
///
/// Magnetometer history updates are gated: while a calibration pass is
/// walking the buffer across cycles, [`mag_history_read_only`] returns true
/// and the pipeline skips [`update_mag_history`] so the fit never sees a
/// half-updated buffer.
///
/// [`mag_history_read_only`]: CalibrationSuite::mag_history_read_only
/// [`update_mag_history`]: CalibrationSuite::update_mag_history
pub trait CalibrationSuite {
    /// Resets accelerometer calibration state and its history buffer.
    ///
    /// `packet_on` is the control subsystem's calibration-streaming flag,
    /// which the collaborator may reset alongside its own state.
    fn initialize_accel(&mut self, packet_on: &mut bool);

    /// Resets magnetometer calibration state and its history buffer.
    fn initialize_mag(&mut self);

    /// Maps the accelerometer's raw average into calibrated units, writing
    /// the channel's calibrated fields.
    fn invert_accel(&mut self, accel: &mut AccelChannel);

    /// Records the current accelerometer measurement into the history
    /// buffer used for calibration convergence.
    fn update_accel_history(&mut self, accel: &AccelChannel, packet_on: &mut bool);

    /// Removes hard- and soft-iron terms from the magnetometer's raw
    /// average, writing the channel's calibrated fields.
    fn invert_mag(&mut self, mag: &mut MagChannel);

    /// Returns true while a time-sliced magnetic calibration pass holds the
    /// history buffer and updates must be skipped.
    fn mag_history_read_only(&self) -> bool;

    /// Records the current magnetometer measurement into the history buffer.
    fn update_mag_history(&mut self, mag: &MagChannel, cycle: u32);

    /// Runs one time slice of the incremental magnetic calibration fit.
    fn refine_mag(&mut self, mag: &mut MagChannel, cycle: u32);
}
