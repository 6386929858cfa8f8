//! Estimation-variant state blocks and the fusion engine interface

use nalgebra::{UnitQuaternion, Vector3};

use crate::channels::{AccelChannel, GyroChannel, MagChannel, PressureChannel};
use crate::types::Features;

/// 1DOF pressure altimetry state.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sv1DofPressure {
    /// Low-pass filtered altitude in meters.
    pub altitude_m: f32,
    /// Low-pass filtered temperature in °C.
    pub temperature_c: f32,
}

/// 3DOF accelerometer tilt state.
#[derive(Debug, Clone, Copy)]
pub struct Sv3DofTilt {
    /// Orientation estimate.
    pub quaternion: UnitQuaternion<f32>,
    /// Roll angle in degrees.
    pub roll_deg: f32,
    /// Pitch angle in degrees.
    pub pitch_deg: f32,
}

impl Default for Sv3DofTilt {
    fn default() -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
            roll_deg: 0.0,
            pitch_deg: 0.0,
        }
    }
}

/// 3DOF magnetic eCompass state.
#[derive(Debug, Clone, Copy)]
pub struct Sv3DofCompass {
    /// Orientation estimate.
    pub quaternion: UnitQuaternion<f32>,
    /// Magnetic heading in degrees.
    pub heading_deg: f32,
}

impl Default for Sv3DofCompass {
    fn default() -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
            heading_deg: 0.0,
        }
    }
}

/// 3DOF gyroscope integration state.
#[derive(Debug, Clone, Copy)]
pub struct Sv3DofGyro {
    /// Orientation estimate.
    pub quaternion: UnitQuaternion<f32>,
    /// Angular rate consumed by the last integration step, in deg/s.
    pub rate_dps: Vector3<f32>,
}

impl Default for Sv3DofGyro {
    fn default() -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
            rate_dps: Vector3::zeros(),
        }
    }
}

/// 6DOF accelerometer + magnetometer eCompass state.
#[derive(Debug, Clone, Copy)]
pub struct Sv6DofCompass {
    /// Orientation estimate.
    pub quaternion: UnitQuaternion<f32>,
    /// Magnetic heading in degrees.
    pub heading_deg: f32,
}

impl Default for Sv6DofCompass {
    fn default() -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
            heading_deg: 0.0,
        }
    }
}

/// 6DOF accelerometer + gyroscope Kalman state.
#[derive(Debug, Clone, Copy)]
pub struct Sv6DofKalman {
    /// Orientation estimate.
    pub quaternion: UnitQuaternion<f32>,
    /// Estimated gyroscope bias in deg/s.
    pub gyro_bias_dps: Vector3<f32>,
}

impl Default for Sv6DofKalman {
    fn default() -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
            gyro_bias_dps: Vector3::zeros(),
        }
    }
}

/// 9DOF accelerometer + magnetometer + gyroscope Kalman state.
#[derive(Debug, Clone, Copy)]
pub struct Sv9DofKalman {
    /// Orientation estimate.
    pub quaternion: UnitQuaternion<f32>,
    /// Estimated gyroscope bias in deg/s.
    pub gyro_bias_dps: Vector3<f32>,
    /// Estimated geomagnetic inclination in degrees.
    pub inclination_deg: f32,
}

impl Default for Sv9DofKalman {
    fn default() -> Self {
        Self {
            quaternion: UnitQuaternion::identity(),
            gyro_bias_dps: Vector3::zeros(),
            inclination_deg: 0.0,
        }
    }
}

/// One state block per enabled estimation variant.
///
/// Variants are independent: any subset can be active, each maintaining its
/// own orientation estimate against the shared sensor stream.
#[derive(Debug, Default)]
pub struct VariantBank {
    pub pressure_1dof: Option<Sv1DofPressure>,
    pub tilt_3dof: Option<Sv3DofTilt>,
    pub compass_3dof: Option<Sv3DofCompass>,
    pub gyro_3dof: Option<Sv3DofGyro>,
    pub compass_6dof: Option<Sv6DofCompass>,
    pub kalman_6dof: Option<Sv6DofKalman>,
    pub kalman_9dof: Option<Sv9DofKalman>,
}

impl VariantBank {
    /// Builds state blocks for the variants selected in `features`.
    pub fn new(features: Features) -> Self {
        Self {
            pressure_1dof: features
                .contains(Features::PRESSURE_1DOF)
                .then(Sv1DofPressure::default),
            tilt_3dof: features
                .contains(Features::TILT_3DOF)
                .then(Sv3DofTilt::default),
            compass_3dof: features
                .contains(Features::COMPASS_3DOF)
                .then(Sv3DofCompass::default),
            gyro_3dof: features
                .contains(Features::GYRO_3DOF)
                .then(Sv3DofGyro::default),
            compass_6dof: features
                .contains(Features::ACCEL_MAG_6DOF)
                .then(Sv6DofCompass::default),
            kalman_6dof: features
                .contains(Features::ACCEL_GYRO_6DOF)
                .then(Sv6DofKalman::default),
            kalman_9dof: features
                .contains(Features::FULL_9DOF)
                .then(Sv9DofKalman::default),
        }
    }
}

/// Fixed-shape handle set passed to the fusion engine every cycle.
///
/// The shape never changes with the feature selection: a disabled variant or
/// sensor class simply yields `None`, and the engine no-ops on absent
/// handles. This keeps the dispatch call identical across every build
/// combination.
#[derive(Debug)]
pub struct FusionHandles<'c> {
    pub pressure_1dof: Option<&'c mut Sv1DofPressure>,
    pub tilt_3dof: Option<&'c mut Sv3DofTilt>,
    pub compass_3dof: Option<&'c mut Sv3DofCompass>,
    pub gyro_3dof: Option<&'c mut Sv3DofGyro>,
    pub compass_6dof: Option<&'c mut Sv6DofCompass>,
    pub kalman_6dof: Option<&'c mut Sv6DofKalman>,
    pub kalman_9dof: Option<&'c mut Sv9DofKalman>,
    pub accel: Option<&'c mut AccelChannel>,
    pub mag: Option<&'c mut MagChannel>,
    pub gyro: Option<&'c mut GyroChannel>,
    pub pressure: Option<&'c mut PressureChannel>,
}

/// Capability interface for the external fusion engine.
///
/// The engine owns the quaternion/Kalman math; the runtime owns scheduling
/// and hands it conditioned data once per cycle.
pub trait FusionEngine {
    /// One-time algorithm initialization, called during system bring-up.
    fn initialize(&mut self, handles: FusionHandles<'_>);

    /// Runs every enabled variant against the conditioned channel data.
    fn fuse(&mut self, handles: FusionHandles<'_>);

    /// Injects a step perturbation into the variant states for
    /// fault-injection testing. Default: no-op.
    fn apply_perturbation(&mut self, handles: FusionHandles<'_>) {
        let _ = handles;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_built_from_features() {
        let bank = VariantBank::new(Features::TILT_3DOF | Features::FULL_9DOF);

        assert!(bank.tilt_3dof.is_some());
        assert!(bank.kalman_9dof.is_some());
        assert!(bank.pressure_1dof.is_none());
        assert!(bank.compass_3dof.is_none());
        assert!(bank.gyro_3dof.is_none());
        assert!(bank.compass_6dof.is_none());
        assert!(bank.kalman_6dof.is_none());
    }

    #[test]
    fn test_all_variants_start_at_identity() {
        let bank = VariantBank::new(Features::ALL_VARIANTS);

        assert_eq!(
            bank.tilt_3dof.unwrap().quaternion,
            UnitQuaternion::identity()
        );
        assert_eq!(
            bank.kalman_9dof.unwrap().quaternion,
            UnitQuaternion::identity()
        );
        assert_eq!(bank.kalman_6dof.unwrap().gyro_bias_dps, Vector3::zeros());
    }

    #[test]
    fn test_sensor_bits_do_not_create_variants() {
        let bank = VariantBank::new(Features::ALL_SENSORS);
        assert!(bank.pressure_1dof.is_none());
        assert!(bank.tilt_3dof.is_none());
        assert!(bank.kalman_9dof.is_none());
    }
}
