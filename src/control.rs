//! Control subsystem state and output-type resolution

use crate::types::Features;

/// Which estimation variant's orientation the host streams by default.
///
/// Each value names the quaternion packet produced by one variant family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputType {
    /// 3DOF accelerometer tilt quaternion (the most basic output).
    #[default]
    Tilt3Dof,
    /// 3DOF magnetic eCompass quaternion.
    Compass3Dof,
    /// 3DOF gyroscope integration quaternion.
    Gyro3Dof,
    /// 6DOF accelerometer + magnetometer quaternion.
    AccelMag6Dof,
    /// 6DOF accelerometer + gyroscope Kalman quaternion.
    AccelGyro6Dof,
    /// 9DOF Kalman quaternion.
    Full9Dof,
}

/// Resolves the default output type for a feature selection.
///
/// Starts from the most basic output and walks a fixed priority order,
/// letting each enabled variant overwrite the choice. The last enabled
/// variant in that order wins, so a build with every variant selected
/// always defaults to the 9DOF Kalman output.
///
/// # Example
/// ```
/// use fusion_runtime::{Features, OutputType, resolve_default_output};
///
/// let features = Features::MAG | Features::COMPASS_3DOF;
/// assert_eq!(resolve_default_output(features), OutputType::Compass3Dof);
/// assert_eq!(resolve_default_output(Features::ALL), OutputType::Full9Dof);
/// ```
pub fn resolve_default_output(features: Features) -> OutputType {
    let mut output = OutputType::Tilt3Dof;
    if features.contains(Features::COMPASS_3DOF) {
        output = OutputType::Compass3Dof;
    }
    if features.contains(Features::GYRO_3DOF) {
        output = OutputType::Gyro3Dof;
    }
    if features.contains(Features::ACCEL_MAG_6DOF) {
        output = OutputType::AccelMag6Dof;
    }
    if features.contains(Features::ACCEL_GYRO_6DOF) {
        output = OutputType::AccelGyro6Dof;
    }
    if features.contains(Features::FULL_9DOF) {
        output = OutputType::Full9Dof;
    }
    output
}

/// Communication-facing configuration owned by the host.
///
/// The runtime writes the resolved output types during initialization; the
/// host's packet encoder and command handlers read and adjust them at will.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlSubsystem {
    /// Output type resolved from the build's feature selection.
    pub default_output: OutputType,
    /// Output type currently streamed; starts as `default_output` and may
    /// be switched by host commands.
    pub output: OutputType,
    /// True while the host streams accelerometer calibration packets; the
    /// conditioning pipeline hands this to the calibration collaborator.
    pub accel_cal_packet_on: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_variants_defaults_to_tilt() {
        assert_eq!(
            resolve_default_output(Features::ALL_SENSORS),
            OutputType::Tilt3Dof
        );
    }

    #[test]
    fn test_single_variant_selects_its_output() {
        assert_eq!(
            resolve_default_output(Features::COMPASS_3DOF),
            OutputType::Compass3Dof
        );
        assert_eq!(
            resolve_default_output(Features::ACCEL_GYRO_6DOF),
            OutputType::AccelGyro6Dof
        );
    }

    #[test]
    fn test_last_enabled_variant_wins() {
        // Gyro outranks compass in the fixed priority order.
        let features = Features::COMPASS_3DOF | Features::GYRO_3DOF;
        assert_eq!(resolve_default_output(features), OutputType::Gyro3Dof);

        // The 9DOF Kalman outranks everything.
        assert_eq!(resolve_default_output(Features::ALL), OutputType::Full9Dof);
    }

    #[test]
    fn test_basic_variants_do_not_shift_the_default() {
        // The pressure and tilt variants have no designated output of their
        // own; the default stays at the tilt quaternion.
        let features = Features::PRESSURE_1DOF | Features::TILT_3DOF;
        assert_eq!(resolve_default_output(features), OutputType::Tilt3Dof);
    }
}
