//! Top-level fusion context and per-cycle orchestration

use log::{error, info, warn};

use crate::calibration::CalibrationSuite;
use crate::channels::SampleBanks;
use crate::control::{ControlSubsystem, resolve_default_output};
use crate::hal::BoardHal;
use crate::registry::{SensorDriver, SensorRegistry};
use crate::status::{Status, StatusSubsystem};
use crate::types::{Features, InstallError, SensorError};
use crate::variants::{FusionEngine, FusionHandles, VariantBank};

/// Top-level state of the fusion runtime.
///
/// A single instance lives for the life of the process. Every cycle the host
/// drives it through the same sequence from one periodic execution context
/// (nominally 25 Hz):
///
/// 1. [`read_sensors`](Self::read_sensors): service every scheduled sensor.
/// 2. [`condition_readings`](Self::condition_readings): average, correct,
///    and calibrate the buffered samples.
/// 3. [`run_fusion`](Self::run_fusion): dispatch to the fusion engine,
///    clear the FIFOs, advance the cycle counter.
/// 4. [`update_status`](Self::update_status): promote any queued status.
///
/// Nothing here suspends, blocks, or locks; the `&mut self` receivers make
/// concurrent or re-entrant use a compile error rather than a discipline.
pub struct FusionContext<'a> {
    features: Features,
    cycle: u32,
    bus_ticks: u32,
    spare_ticks: u32,
    perturbation: bool,
    registry: SensorRegistry<'a>,
    banks: SampleBanks,
    variants: VariantBank,
    status: &'a mut dyn StatusSubsystem,
    control: &'a mut ControlSubsystem,
}

impl<'a> FusionContext<'a> {
    /// Creates a context for the given feature selection.
    ///
    /// Channel and variant blocks exist only for selected bits; the status
    /// and control subsystems stay owned by the caller and are borrowed for
    /// the context's lifetime.
    pub fn new(
        features: Features,
        status: &'a mut dyn StatusSubsystem,
        control: &'a mut ControlSubsystem,
    ) -> Self {
        Self {
            features,
            cycle: 0,
            bus_ticks: 0,
            spare_ticks: 0,
            perturbation: false,
            registry: SensorRegistry::new(),
            banks: SampleBanks::new(features),
            variants: VariantBank::new(features),
            status,
            control,
        }
    }

    /// The feature selection this context was built with.
    pub fn features(&self) -> Features {
        self.features
    }

    /// Current fusion cycle index. Increments once per
    /// [`run_fusion`](Self::run_fusion) call.
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// The per-class channel banks.
    pub fn banks(&self) -> &SampleBanks {
        &self.banks
    }

    /// Mutable access to the channel banks, e.g. for duty-cycling a class.
    pub fn banks_mut(&mut self) -> &mut SampleBanks {
        &mut self.banks
    }

    /// The estimation-variant state blocks.
    pub fn variants(&self) -> &VariantBank {
        &self.variants
    }

    /// The sensor registry.
    pub fn registry(&self) -> &SensorRegistry<'a> {
        &self.registry
    }

    /// The control subsystem configuration.
    pub fn control(&self) -> &ControlSubsystem {
        self.control
    }

    /// Mutable access to the control subsystem configuration.
    pub fn control_mut(&mut self) -> &mut ControlSubsystem {
        self.control
    }

    /// Arms or disarms perturbation injection for step-response testing.
    pub fn set_perturbation(&mut self, on: bool) {
        self.perturbation = on;
    }

    /// Whether perturbation injection is armed.
    pub fn perturbation(&self) -> bool {
        self.perturbation
    }

    /// Adds to the free-running bus benchmarking counter.
    pub fn tally_bus_ticks(&mut self, ticks: u32) {
        self.bus_ticks = self.bus_ticks.wrapping_add(ticks);
    }

    /// Ticks spent on sensor bus traffic since startup.
    pub fn bus_ticks(&self) -> u32 {
        self.bus_ticks
    }

    /// Adds to the free-running idle benchmarking counter.
    pub fn tally_spare_ticks(&mut self, ticks: u32) {
        self.spare_ticks = self.spare_ticks.wrapping_add(ticks);
    }

    /// Ticks spent waiting for the timing interrupt since startup.
    pub fn spare_ticks(&self) -> u32 {
        self.spare_ticks
    }

    /// Installs a caller-owned sensor driver into the registry.
    ///
    /// `schedule` is the read cadence divisor: the sensor is serviced when
    /// `cycle % schedule == 0`. Performs no I/O and never mutates the
    /// registry on failure.
    pub fn install_sensor(
        &mut self,
        driver: &'a mut dyn SensorDriver,
        addr: u16,
        schedule: u16,
    ) -> Result<(), InstallError> {
        self.registry.install(driver, addr, schedule)
    }

    /// Initializes every registered sensor, best-effort.
    ///
    /// No early exit: every sensor is attempted even after a failure, and
    /// the first error in registration order is returned. Successfully
    /// initialized sensors are marked ready for scheduled reads.
    pub fn initialize_sensors(&mut self) -> Result<(), SensorError> {
        let Self {
            registry, banks, ..
        } = self;

        let mut first_error = None;
        for slot in registry.iter_mut() {
            match slot.driver.initialize(slot.addr, banks) {
                Ok(()) => slot.initialized = true,
                Err(e) => {
                    warn!("sensor {:#04x} failed to initialize: {e}", slot.addr);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Services every sensor whose schedule matches `cycle`.
    ///
    /// An initialized sensor is read; a read failure demotes it to
    /// uninitialized so its next scheduled cycle attempts `initialize`
    /// instead (self-healing). An uninitialized sensor gets one
    /// initialization attempt in place of its read. Every sensor is visited
    /// regardless of earlier failures; the first error in registration order
    /// is returned.
    ///
    /// Status reporting is deliberately asymmetric: any failure sets
    /// [`Status::SoftFault`] immediately, while full success only *queues*
    /// [`Status::Normal`]; recovery becomes visible at the host's next
    /// [`update_status`](Self::update_status) promotion, debouncing flicker
    /// from a sensor that alternates between good and bad cycles.
    pub fn read_sensors(&mut self, cycle: u32) -> Result<(), SensorError> {
        let Self {
            registry,
            banks,
            status,
            ..
        } = self;

        let mut first_error = None;
        for slot in registry.iter_mut() {
            if cycle % u32::from(slot.schedule) != 0 {
                continue;
            }

            let result = if slot.initialized {
                let result = slot.driver.read(slot.addr, banks);
                if let Err(e) = result {
                    warn!("sensor {:#04x} read failed: {e}, demoting", slot.addr);
                    slot.initialized = false;
                }
                result
            } else {
                let result = slot.driver.initialize(slot.addr, banks);
                if result.is_ok() {
                    slot.initialized = true;
                }
                result
            };

            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            None => {
                status.queue(Status::Normal);
                Ok(())
            }
            Some(e) => {
                status.set(Status::SoftFault);
                Err(e)
            }
        }
    }

    /// Conditions the buffered samples of every enabled sensor class.
    ///
    /// Per class: report FIFO overflow as an immediate soft fault, apply the
    /// board HAL correction, average the FIFO, and run the calibration
    /// hooks. FIFOs are not cleared here; that happens after fusion so the
    /// engine can still see the raw buffers.
    pub fn condition_readings(&mut self, hal: &mut dyn BoardHal, cal: &mut dyn CalibrationSuite) {
        let Self {
            banks,
            status,
            control,
            cycle,
            ..
        } = self;

        if let Some(accel) = banks.accel.as_mut() {
            if accel.enabled {
                accel.condition(hal, cal, &mut **status, &mut control.accel_cal_packet_on);
            }
        }
        if let Some(mag) = banks.mag.as_mut() {
            if mag.enabled {
                mag.condition(hal, cal, &mut **status, *cycle);
            }
        }
        if let Some(gyro) = banks.gyro.as_mut() {
            if gyro.enabled {
                gyro.condition(hal, &mut **status);
            }
        }
    }

    /// Dispatches one fusion pass and finishes the cycle.
    ///
    /// The engine receives the fixed-shape handle set, `None` for every
    /// disabled variant or class, so the call looks identical across all
    /// build combinations. Afterwards the FIFOs are cleared unconditionally
    /// and the cycle counter advances.
    pub fn run_fusion(&mut self, engine: &mut dyn FusionEngine) {
        if self.perturbation {
            engine.apply_perturbation(gather_handles(&mut self.banks, &mut self.variants));
        }

        engine.fuse(gather_handles(&mut self.banks, &mut self.variants));

        self.banks.clear_fifos();
        self.cycle = self.cycle.wrapping_add(1);
    }

    /// Clears the FIFO of every present, enabled sensor class.
    pub fn clear_fifos(&mut self) {
        self.banks.clear_fifos();
    }

    /// Brings the whole subsystem up, leaving status at [`Status::Normal`]
    /// on success.
    ///
    /// Sequence: status to [`Status::Initializing`]; bus bring-up (failure
    /// is a hard fault; the status backend traps and does not return);
    /// best-effort sensor initialization (failure demotes to a soft fault
    /// and continues); output-type resolution; engine initialization; cycle
    /// counter reset; calibration state reset; FIFO clear. Status reaches
    /// [`Status::Normal`] only when no sensor error was recorded.
    pub fn initialize(
        &mut self,
        engine: &mut dyn FusionEngine,
        hal: &mut dyn BoardHal,
        cal: &mut dyn CalibrationSuite,
        sda_pin: u32,
        scl_pin: u32,
    ) {
        self.status.set(Status::Initializing);

        if !hal.initialize_bus(sda_pin, scl_pin) {
            error!("bus bring-up failed on pins sda={sda_pin} scl={scl_pin}");
            self.status.set(Status::HardFault);
        }

        let sensors = self.initialize_sensors();
        if sensors.is_err() {
            self.status.set(Status::SoftFault);
        }

        let default_output = resolve_default_output(self.features);
        self.control.default_output = default_output;
        self.control.output = default_output;

        engine.initialize(gather_handles(&mut self.banks, &mut self.variants));

        self.cycle = 0;

        cal.initialize_mag();
        cal.initialize_accel(&mut self.control.accel_cal_packet_on);

        self.banks.clear_fifos();

        if sensors.is_ok() {
            self.status.set(Status::Normal);
            info!("fusion runtime up, default output {:?}", self.control.output);
        }
    }

    /// Makes `status` current immediately (see [`StatusSubsystem::set`]).
    pub fn set_status(&mut self, status: Status) {
        self.status.set(status);
    }

    /// The current, externally visible status.
    pub fn status(&self) -> Status {
        self.status.get()
    }

    /// Stages `status` for the next promotion.
    pub fn queue_status(&mut self, status: Status) {
        self.status.queue(status);
    }

    /// Promotes the queued status to current. The host calls this once per
    /// cycle.
    pub fn update_status(&mut self) {
        self.status.update();
    }

    /// Runs the status backend's self-check hook.
    pub fn test_status(&mut self) {
        self.status.test();
    }
}

impl core::fmt::Debug for FusionContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FusionContext")
            .field("features", &self.features)
            .field("cycle", &self.cycle)
            .field("sensors", &self.registry.len())
            .field("perturbation", &self.perturbation)
            .finish_non_exhaustive()
    }
}

fn gather_handles<'c>(
    banks: &'c mut SampleBanks,
    variants: &'c mut VariantBank,
) -> FusionHandles<'c> {
    FusionHandles {
        pressure_1dof: variants.pressure_1dof.as_mut(),
        tilt_3dof: variants.tilt_3dof.as_mut(),
        compass_3dof: variants.compass_3dof.as_mut(),
        gyro_3dof: variants.gyro_3dof.as_mut(),
        compass_6dof: variants.compass_6dof.as_mut(),
        kalman_6dof: variants.kalman_6dof.as_mut(),
        kalman_9dof: variants.kalman_9dof.as_mut(),
        accel: banks.accel.as_mut(),
        mag: banks.mag.as_mut(),
        gyro: banks.gyro.as_mut(),
        pressure: banks.pressure.as_mut(),
    }
}
