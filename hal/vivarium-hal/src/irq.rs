//! GPIO interrupt service abstractions
//!
//! The touch driver may run interrupt driven: a falling edge on the INT
//! line raises an event flag and nothing else. This trait covers the two
//! platform resources involved - the chip-wide GPIO ISR service and the
//! per-pin edge handler - so the driver can roll both back independently
//! when a later init step fails.

/// Error reported by interrupt service operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqError {
    /// The service or handler could not be installed
    Unavailable,
}

/// Interrupt service hookup for one GPIO line
pub trait IrqService {
    /// Install the chip-wide GPIO ISR service if not already present.
    ///
    /// Returns `true` when this call installed it, `false` when it was
    /// already running. Callers that installed the service are responsible
    /// for uninstalling it on rollback.
    fn install_service(&mut self) -> Result<bool, IrqError>;

    /// Attach the falling-edge handler for the line.
    ///
    /// The handler must do nothing but raise an event flag: no I/O, no
    /// allocation, no blocking call.
    fn attach_handler(&mut self) -> Result<(), IrqError>;

    /// Detach the edge handler. Safe to call when none is attached.
    fn detach_handler(&mut self);

    /// Uninstall the chip-wide ISR service. Safe to call when absent.
    fn uninstall_service(&mut self);
}
