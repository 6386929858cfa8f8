//! Sensor registry: installation, scheduling metadata, driver capability

use heapless::Vec;
use log::debug;

use crate::channels::SampleBanks;
use crate::types::{InstallError, MAX_SENSORS, SensorError};

/// Capability interface a physical sensor driver supplies when installed.
///
/// Both entry points receive the channel banks so the driver can stamp
/// identity/scale fields during bring-up and push conditioned samples during
/// reads. Calls are expected to be bounded and non-blocking; the scheduler
/// invokes them synchronously from the fusion loop.
pub trait SensorDriver {
    /// Puts the device into the operating mode the fusion pipeline expects
    /// (range, data rate, FIFO mode).
    fn initialize(&mut self, addr: u16, banks: &mut SampleBanks) -> Result<(), SensorError>;

    /// Drains the device and pushes its samples into the channel banks.
    ///
    /// Drivers must run [`condition_sample`](crate::condition_sample) on
    /// every raw sample before pushing it.
    fn read(&mut self, addr: u16, banks: &mut SampleBanks) -> Result<(), SensorError>;
}

/// One installed sensor: bus address, read cadence, and driver capability.
pub struct SensorSlot<'d> {
    pub(crate) addr: u16,
    pub(crate) schedule: u16,
    pub(crate) initialized: bool,
    pub(crate) driver: &'d mut dyn SensorDriver,
}

impl<'d> SensorSlot<'d> {
    /// Bus address the sensor was installed with.
    pub fn addr(&self) -> u16 {
        self.addr
    }

    /// Read cadence divisor: the sensor is serviced when
    /// `cycle % schedule == 0`.
    pub fn schedule(&self) -> u16 {
        self.schedule
    }

    /// Whether the sensor responded to its last initialization attempt.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl core::fmt::Debug for SensorSlot<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SensorSlot")
            .field("addr", &self.addr)
            .field("schedule", &self.schedule)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

/// Index-stable arena of installed sensors.
///
/// Iteration order is installation order, which is also the order error
/// aggregation observes failures in. Drivers stay owned by the caller; the
/// registry borrows them exclusively for its lifetime, so a driver cannot be
/// installed into two registries at once.
#[derive(Debug, Default)]
pub struct SensorRegistry<'d> {
    slots: Vec<SensorSlot<'d>, MAX_SENSORS>,
}

impl<'d> SensorRegistry<'d> {
    /// Creates an empty registry.
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Installs a sensor at the end of the registry.
    ///
    /// Performs no I/O: the device is only probed later, by
    /// `initialize_sensors` or by the scheduler's lazy retry. Fails without
    /// mutating the registry when the schedule is zero or the arena is full.
    pub fn install(
        &mut self,
        driver: &'d mut dyn SensorDriver,
        addr: u16,
        schedule: u16,
    ) -> Result<(), InstallError> {
        if schedule == 0 {
            return Err(InstallError::ZeroSchedule);
        }

        let slot = SensorSlot {
            addr,
            schedule,
            initialized: false,
            driver,
        };
        self.slots
            .push(slot)
            .map_err(|_| InstallError::RegistryFull)?;

        debug!("installed sensor at addr {addr:#04x} with schedule {schedule}");
        Ok(())
    }

    /// Number of installed sensors.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true when no sensors are installed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Installed sensors in installation order.
    pub fn iter(&self) -> impl Iterator<Item = &SensorSlot<'d>> {
        self.slots.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SensorSlot<'d>> {
        self.slots.iter_mut()
    }
}
