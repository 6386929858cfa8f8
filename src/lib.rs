#![no_std]

//! Real-time orchestration core for multi-sensor attitude estimation.
//!
//! This crate owns the deterministic control loop of an embedded orientation
//! estimator: it schedules heterogeneous inertial/magnetic/pressure sensor
//! reads, conditions raw samples into calibrated averages, dispatches them to
//! the enabled estimation variants, and maintains the fault/status discipline
//! the rest of the firmware consumes. The numeric fusion algorithms,
//! calibration solvers, board corrections, bus drivers, and the concrete
//! status backend stay outside, reached through capability traits.
//!
//! # Features
//!
//! - Per-sensor read cadence with lazy reinitialization of failed devices
//! - Fixed-capacity sample FIFOs with overflow accounting (no overwrite)
//! - Per-class conditioning: HAL correction, averaging, calibration hooks
//! - Seven independently selectable estimation variants sharing one sensor
//!   stream, dispatched through a shape-stable handle set
//! - Immediate fault reporting with debounced recovery via a queued status
//! - `#![no_std]` compatible for embedded targets
//!
//! # Quick Start
//!
//! ```rust
//! use fusion_runtime::*;
//!
//! // Minimal collaborators; real firmware wires in its own.
//! #[derive(Default)]
//! struct Leds { current: Status, queued: Status }
//!
//! impl StatusSubsystem for Leds {
//!     fn set(&mut self, status: Status) {
//!         self.current = status;
//!         self.queued = status;
//!     }
//!     fn get(&self) -> Status { self.current }
//!     fn queue(&mut self, status: Status) { self.queued = status; }
//!     fn update(&mut self) { self.current = self.queued; }
//!     fn test(&mut self) {}
//! }
//!
//! struct Board;
//!
//! impl BoardHal for Board {
//!     fn initialize_bus(&mut self, _sda: u32, _scl: u32) -> bool { true }
//!     fn correct_accel(&mut self, _accel: &mut AccelChannel) {}
//!     fn correct_mag(&mut self, _mag: &mut MagChannel) {}
//!     fn correct_gyro(&mut self, _gyro: &mut GyroChannel) {}
//! }
//!
//! struct NoCal;
//!
//! impl CalibrationSuite for NoCal {
//!     fn initialize_accel(&mut self, _packet_on: &mut bool) {}
//!     fn initialize_mag(&mut self) {}
//!     fn invert_accel(&mut self, accel: &mut AccelChannel) {
//!         accel.calibrated_g = accel.average_g;
//!     }
//!     fn update_accel_history(&mut self, _accel: &AccelChannel, _packet_on: &mut bool) {}
//!     fn invert_mag(&mut self, mag: &mut MagChannel) {
//!         mag.calibrated_ut = mag.average_ut;
//!     }
//!     fn mag_history_read_only(&self) -> bool { false }
//!     fn update_mag_history(&mut self, _mag: &MagChannel, _cycle: u32) {}
//!     fn refine_mag(&mut self, _mag: &mut MagChannel, _cycle: u32) {}
//! }
//!
//! struct Engine;
//!
//! impl FusionEngine for Engine {
//!     fn initialize(&mut self, _handles: FusionHandles<'_>) {}
//!     fn fuse(&mut self, _handles: FusionHandles<'_>) {}
//! }
//!
//! struct Imu;
//!
//! impl SensorDriver for Imu {
//!     fn initialize(&mut self, _addr: u16, banks: &mut SampleBanks) -> Result<(), SensorError> {
//!         if let Some(accel) = banks.accel.as_mut() {
//!             accel.g_per_count = 0.000488; // ±4 g range
//!         }
//!         Ok(())
//!     }
//!     fn read(&mut self, _addr: u16, banks: &mut SampleBanks) -> Result<(), SensorError> {
//!         let mut sample = [12, -34, 2048];
//!         condition_sample(&mut sample);
//!         if let Some(accel) = banks.accel.as_mut() {
//!             accel.fifo.push(sample);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut leds = Leds::default();
//! let mut control = ControlSubsystem::default();
//! let mut imu = Imu;
//! let (mut board, mut cal, mut engine) = (Board, NoCal, Engine);
//!
//! let features = Features::ACCEL | Features::TILT_3DOF;
//! let mut ctx = FusionContext::new(features, &mut leds, &mut control);
//! ctx.install_sensor(&mut imu, 0x1f, 1).unwrap();
//! ctx.initialize(&mut engine, &mut board, &mut cal, 21, 22);
//! assert_eq!(ctx.status(), Status::Normal);
//!
//! // One fusion cycle, as driven by the host's periodic timer.
//! let cycle = ctx.cycle();
//! ctx.read_sensors(cycle).unwrap();
//! ctx.condition_readings(&mut board, &mut cal);
//! ctx.run_fusion(&mut engine);
//! ctx.update_status();
//! ```

mod calibration;
mod channels;
mod context;
mod control;
mod fifo;
mod hal;
mod registry;
mod sample;
mod status;
mod types;
mod variants;

// Re-export all public types and functions
pub use calibration::CalibrationSuite;
pub use channels::{AccelChannel, GyroChannel, MagChannel, PressureChannel, SampleBanks};
pub use context::FusionContext;
pub use control::{ControlSubsystem, OutputType, resolve_default_output};
pub use fifo::SampleFifo;
pub use hal::BoardHal;
pub use registry::{SensorDriver, SensorRegistry, SensorSlot};
pub use sample::{ZeroElement, condition_sample, zero_buffer};
pub use status::{Status, StatusSubsystem};
pub use types::{
    ACCEL_FIFO_CAPACITY, Features, GYRO_FIFO_CAPACITY, InstallError, MAG_FIFO_CAPACITY,
    MAX_SENSORS, RawSample, SensorError,
};
pub use variants::{
    FusionEngine, FusionHandles, Sv1DofPressure, Sv3DofCompass, Sv3DofGyro, Sv3DofTilt,
    Sv6DofCompass, Sv6DofKalman, Sv9DofKalman, VariantBank,
};
