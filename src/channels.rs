//! Per-sensor-class channel blocks and the conditioning pipeline

use log::warn;
use nalgebra::Vector3;

use crate::calibration::CalibrationSuite;
use crate::fifo::SampleFifo;
use crate::hal::BoardHal;
use crate::status::{Status, StatusSubsystem};
use crate::types::{
    ACCEL_FIFO_CAPACITY, Features, GYRO_FIFO_CAPACITY, MAG_FIFO_CAPACITY, RawSample,
};

/// Accelerometer channel: raw FIFO, per-cycle averages, calibrated output.
///
/// Scale and identity fields are stamped by the sensor driver during
/// `initialize`; averages are produced by the conditioning pipeline;
/// calibrated fields are written by the calibration collaborator.
#[derive(Debug)]
pub struct AccelChannel {
    /// Runtime enable for duty-cycling; a disabled channel is skipped by
    /// conditioning and keeps its FIFO contents across clears.
    pub enabled: bool,
    /// Identity register value reported by the driver (0 until probed).
    pub who_am_i: u8,
    /// Scale in g per count, stamped by the driver for its configured range.
    pub g_per_count: f32,
    /// Raw sample FIFO filled by the driver.
    pub fifo: SampleFifo<ACCEL_FIFO_CAPACITY>,
    /// Per-axis average of the last non-empty cycle, in counts.
    pub raw_average: RawSample,
    /// The same average in g.
    pub average_g: Vector3<f32>,
    /// Calibrated measurement in g, written by the calibration collaborator.
    pub calibrated_g: Vector3<f32>,
    /// Calibrated measurement in counts.
    pub calibrated_counts: RawSample,
}

impl AccelChannel {
    pub fn new() -> Self {
        Self {
            enabled: true,
            who_am_i: 0,
            g_per_count: 0.0,
            fifo: SampleFifo::new(),
            raw_average: [0; 3],
            average_g: Vector3::zeros(),
            calibrated_g: Vector3::zeros(),
            calibrated_counts: [0; 3],
        }
    }

    /// Runs the per-cycle conditioning steps for this channel.
    ///
    /// Overflow is reported as an immediate soft fault before anything else:
    /// samples were dropped this cycle, so the average is degraded no matter
    /// what the rest of the pipeline does.
    pub(crate) fn condition(
        &mut self,
        hal: &mut dyn BoardHal,
        cal: &mut dyn CalibrationSuite,
        status: &mut dyn StatusSubsystem,
        packet_on: &mut bool,
    ) {
        if self.fifo.overflowed() {
            warn!(
                "accel FIFO overflowed, {} samples dropped",
                self.fifo.overflow_count()
            );
            status.set(Status::SoftFault);
        }

        hal.correct_accel(self);

        if let Some(average) = self.fifo.average() {
            self.raw_average = average;
            self.average_g = to_float(average) * self.g_per_count;
        }

        cal.invert_accel(self);
        cal.update_accel_history(self, packet_on);
    }
}

impl Default for AccelChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Magnetometer channel: raw FIFO, per-cycle averages, calibrated field.
#[derive(Debug)]
pub struct MagChannel {
    /// Runtime enable for duty-cycling.
    pub enabled: bool,
    /// Identity register value reported by the driver (0 until probed).
    pub who_am_i: u8,
    /// Scale in µT per count, stamped by the driver.
    pub ut_per_count: f32,
    /// Raw sample FIFO filled by the driver.
    pub fifo: SampleFifo<MAG_FIFO_CAPACITY>,
    /// Per-axis average of the last non-empty cycle, in counts.
    pub raw_average: RawSample,
    /// The same average in µT.
    pub average_ut: Vector3<f32>,
    /// Calibrated field in µT, written by the calibration collaborator.
    pub calibrated_ut: Vector3<f32>,
    /// Calibrated field in counts.
    pub calibrated_counts: RawSample,
}

impl MagChannel {
    pub fn new() -> Self {
        Self {
            enabled: true,
            who_am_i: 0,
            ut_per_count: 0.0,
            fifo: SampleFifo::new(),
            raw_average: [0; 3],
            average_ut: Vector3::zeros(),
            calibrated_ut: Vector3::zeros(),
            calibrated_counts: [0; 3],
        }
    }

    /// Runs the per-cycle conditioning steps for this channel.
    ///
    /// Beyond averaging and calibration inversion, the magnetometer also
    /// feeds the calibration history buffer (unless a time-sliced fit holds
    /// it read-only) and donates one time slice to the incremental fit.
    pub(crate) fn condition(
        &mut self,
        hal: &mut dyn BoardHal,
        cal: &mut dyn CalibrationSuite,
        status: &mut dyn StatusSubsystem,
        cycle: u32,
    ) {
        if self.fifo.overflowed() {
            warn!(
                "mag FIFO overflowed, {} samples dropped",
                self.fifo.overflow_count()
            );
            status.set(Status::SoftFault);
        }

        hal.correct_mag(self);

        if let Some(average) = self.fifo.average() {
            self.raw_average = average;
            self.average_ut = to_float(average) * self.ut_per_count;
        }

        cal.invert_mag(self);
        if !cal.mag_history_read_only() {
            cal.update_mag_history(self, cycle);
        }
        cal.refine_mag(self, cycle);
    }
}

impl Default for MagChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Gyroscope channel: raw FIFO and per-cycle averages.
///
/// The averages serve offset initialization and the 3DOF gyro variant; the
/// Kalman variants integrate the buffered samples directly inside the fusion
/// engine, so no calibrated members live here.
#[derive(Debug)]
pub struct GyroChannel {
    /// Runtime enable for duty-cycling.
    pub enabled: bool,
    /// Identity register value reported by the driver (0 until probed).
    pub who_am_i: u8,
    /// Scale in degrees/second per count, stamped by the driver.
    pub dps_per_count: f32,
    /// Raw sample FIFO filled by the driver.
    pub fifo: SampleFifo<GYRO_FIFO_CAPACITY>,
    /// Per-axis average of the last non-empty cycle, in counts.
    pub raw_average: RawSample,
    /// The same average in degrees/second.
    pub average_dps: Vector3<f32>,
}

impl GyroChannel {
    pub fn new() -> Self {
        Self {
            enabled: true,
            who_am_i: 0,
            dps_per_count: 0.0,
            fifo: SampleFifo::new(),
            raw_average: [0; 3],
            average_dps: Vector3::zeros(),
        }
    }

    /// Runs the per-cycle conditioning steps for this channel.
    pub(crate) fn condition(&mut self, hal: &mut dyn BoardHal, status: &mut dyn StatusSubsystem) {
        if self.fifo.overflowed() {
            warn!(
                "gyro FIFO overflowed, {} samples dropped",
                self.fifo.overflow_count()
            );
            status.set(Status::SoftFault);
        }

        hal.correct_gyro(self);

        if let Some(average) = self.fifo.average() {
            self.raw_average = average;
            self.average_dps = to_float(average) * self.dps_per_count;
        }
    }
}

impl Default for GyroChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Pressure channel: altitude and temperature, no FIFO.
///
/// Pressure sensors are read at most once per cycle, so the driver writes
/// the latest converted values directly.
#[derive(Debug)]
pub struct PressureChannel {
    /// Runtime enable for duty-cycling.
    pub enabled: bool,
    /// Identity register value reported by the driver (0 until probed).
    pub who_am_i: u8,
    /// Scale in meters per count, stamped by the driver.
    pub m_per_count: f32,
    /// Scale in °C per count, stamped by the driver.
    pub c_per_count: f32,
    /// Latest altitude in counts.
    pub raw_altitude: i32,
    /// Latest temperature in counts.
    pub raw_temperature: i16,
    /// Latest altitude in meters.
    pub altitude_m: f32,
    /// Latest temperature in °C.
    pub temperature_c: f32,
}

impl PressureChannel {
    pub fn new() -> Self {
        Self {
            enabled: true,
            who_am_i: 0,
            m_per_count: 0.0,
            c_per_count: 0.0,
            raw_altitude: 0,
            raw_temperature: 0,
            altitude_m: 0.0,
            temperature_c: 0.0,
        }
    }
}

impl Default for PressureChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One channel block per sensor class, present only when the class's
/// feature bit is selected.
///
/// Drivers receive `&mut SampleBanks` from the scheduler and push samples
/// into the channels for the classes they serve.
#[derive(Debug, Default)]
pub struct SampleBanks {
    pub accel: Option<AccelChannel>,
    pub mag: Option<MagChannel>,
    pub gyro: Option<GyroChannel>,
    pub pressure: Option<PressureChannel>,
}

impl SampleBanks {
    /// Builds channel blocks for the sensor classes selected in `features`.
    pub fn new(features: Features) -> Self {
        Self {
            accel: features
                .contains(Features::ACCEL)
                .then(AccelChannel::new),
            mag: features.contains(Features::MAG).then(MagChannel::new),
            gyro: features.contains(Features::GYRO).then(GyroChannel::new),
            pressure: features
                .contains(Features::PRESSURE)
                .then(PressureChannel::new),
        }
    }

    /// Clears the FIFO of every present, enabled channel.
    ///
    /// Disabled channels keep their buffered samples and averages so a class
    /// that was powered down for duty-cycling still presents its last data
    /// when re-enabled.
    pub fn clear_fifos(&mut self) {
        if let Some(accel) = self.accel.as_mut() {
            if accel.enabled {
                accel.fifo.clear();
            }
        }
        if let Some(mag) = self.mag.as_mut() {
            if mag.enabled {
                mag.fifo.clear();
            }
        }
        if let Some(gyro) = self.gyro.as_mut() {
            if gyro.enabled {
                gyro.fifo.clear();
            }
        }
    }
}

fn to_float(sample: RawSample) -> Vector3<f32> {
    Vector3::new(
        f32::from(sample[0]),
        f32::from(sample[1]),
        f32::from(sample[2]),
    )
}
