//! Shared I2C bus manager
//!
//! The panel board has one I2C master bus shared by the output expander
//! and the touch controller. The manager owns the single bus instance for
//! the process lifetime: created once, handed out by reference, torn down
//! last.
//!
//! All access runs on the single UI task. A build that adds more tasks
//! touching the bus must wrap the manager in a mutex first.

use log::error;
use vivarium_core::Error;
use vivarium_hal::i2c::{BusError, I2cBus};

/// Owner of the single shared bus instance
///
/// Replaces a process-wide mutable handle with an explicit context object:
/// whoever owns the manager controls bus lifetime, and every driver call
/// borrows the bus through it.
pub struct BusManager<B: I2cBus> {
    bus: Option<B>,
}

impl<B: I2cBus> BusManager<B> {
    /// Create an empty manager with no bus
    pub const fn new() -> Self {
        Self { bus: None }
    }

    /// Create the bus if it does not exist yet
    ///
    /// Idempotent: when a bus is already held the creation closure is not
    /// invoked and the call succeeds immediately.
    pub fn init<F>(&mut self, create: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<B, BusError>,
    {
        if self.bus.is_some() {
            return Ok(());
        }
        match create() {
            Ok(bus) => {
                self.bus = Some(bus);
                Ok(())
            }
            Err(e) => {
                error!("bus creation failed: {:?}", e);
                Err(Error::BusCreate)
            }
        }
    }

    /// Borrow the bus, or `None` when uninitialized. Never fails, never
    /// blocks.
    pub fn get(&mut self) -> Option<&mut B> {
        self.bus.as_mut()
    }

    /// Borrow the bus, reporting `BusNotReady` when uninitialized
    pub fn bus(&mut self) -> Result<&mut B, Error> {
        self.bus.as_mut().ok_or(Error::BusNotReady)
    }

    /// Whether a bus is currently held
    pub fn is_ready(&self) -> bool {
        self.bus.is_some()
    }

    /// Destroy the bus
    ///
    /// No-op when no bus exists. On teardown failure the handle is kept
    /// unchanged so the caller may retry.
    pub fn deinit(&mut self) -> Result<(), Error> {
        let Some(bus) = self.bus.as_mut() else {
            return Ok(());
        };
        if let Err(e) = bus.teardown() {
            error!("bus teardown failed: {:?}", e);
            return Err(Error::BusTeardown);
        }
        self.bus = None;
        Ok(())
    }
}

impl<B: I2cBus> Default for BusManager<B> {
    fn default() -> Self {
        Self::new()
    }
}
