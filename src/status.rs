//! System status levels and the status collaborator contract
//!
//! The runtime never owns status storage itself. It writes health changes
//! through a [`StatusSubsystem`] implementation supplied by the host, which
//! keeps two slots: the *current* status visible to the rest of the firmware
//! and a *queued* status staged for the next promotion.
//!
//! The split exists to decouple fault detection from recovery. Faults are
//! always reported through [`StatusSubsystem::set`] and become visible
//! immediately. Recovery to [`Status::Normal`] is only ever staged through
//! [`StatusSubsystem::queue`] and becomes visible when the host calls
//! [`StatusSubsystem::update`] at its regular once-per-cycle promotion point,
//! so a sensor that flaps between good and bad reads cannot flicker the
//! externally visible state.

/// Overall health of the fusion subsystem as seen by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Startup is in progress; outputs are not yet valid.
    #[default]
    Initializing,
    /// All registered sensors are responding and outputs are valid.
    Normal,
    /// A recoverable problem was detected (sensor dropout, FIFO overflow).
    /// The runtime keeps cycling and retries the failing device.
    SoftFault,
    /// An unrecoverable problem was detected (bus bring-up failure,
    /// memory verification failure).
    HardFault,
}

/// Capability interface for the externally-owned status backend.
///
/// Implementations typically drive an LED, a telemetry field, or a watchdog
/// in addition to storing the two status slots.
///
/// # Contract
///
/// - [`set`](Self::set) replaces the current status immediately.
///   An implementation must not return control to the caller when the new
///   status is [`Status::HardFault`]: hard faults raised during bus bring-up
///   are fatal by design and the backend is expected to trap (reset, halt,
///   or park the system in a safe state).
/// - [`queue`](Self::queue) stages a status without changing visibility.
/// - [`update`](Self::update) promotes the queued status to current. The
///   host calls this exactly once per fusion cycle.
/// - [`test`](Self::test) is a self-check hook for exercising the backend's
///   indicator path (e.g. cycling an LED through all states).
pub trait StatusSubsystem {
    /// Makes `status` the current, externally visible status immediately.
    fn set(&mut self, status: Status);

    /// Returns the current, externally visible status.
    fn get(&self) -> Status;

    /// Stages `status` for the next promotion without changing visibility.
    fn queue(&mut self, status: Status);

    /// Promotes the queued status to current.
    fn update(&mut self);

    /// Exercises the backend's indicator path as a self-check.
    fn test(&mut self);
}
