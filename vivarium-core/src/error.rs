//! Error taxonomy
//!
//! Every driver-level call returns `Result<_, Error>`. Lower-layer bus
//! failures are logged with context at the point of failure and passed up
//! unchanged in kind.

use vivarium_hal::i2c::BusError;
use vivarium_hal::irq::IrqError;

/// Errors reported by the driver and display layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Operation requires an initialized driver
    NotInitialized,
    /// Argument out of range (pin index, brightness, region)
    InvalidArgument,
    /// The shared bus has not been created yet
    BusNotReady,
    /// Underlying bus controller creation failed
    BusCreate,
    /// Underlying bus controller destruction failed; the handle is retained
    BusTeardown,
    /// Bus transaction exceeded its deadline
    IoTimeout,
    /// Bus transaction failed (NACK, arbitration loss, rejection)
    Io,
    /// Buffer allocation failed
    OutOfMemory,
    /// Panel identity register read all-zero or mismatched
    UnexpectedPanelId,
    /// Device identity mismatch (wrong or absent controller)
    NotFound,
    /// Feature intentionally not implemented
    NotSupported,
}

impl From<BusError> for Error {
    fn from(e: BusError) -> Self {
        match e {
            BusError::Timeout => Error::IoTimeout,
            BusError::Io => Error::Io,
        }
    }
}

impl From<IrqError> for Error {
    fn from(_: IrqError) -> Self {
        Error::Io
    }
}
