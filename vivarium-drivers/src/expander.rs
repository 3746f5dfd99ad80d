//! CH422G output expander driver
//!
//! The CH422G exposes eight push-pull outputs used for panel power
//! gating, touch reset routing, and status LEDs. Each of its registers is
//! reached through a dedicated I2C device address rather than a register
//! offset, so the driver attaches up to three addresses on the shared
//! bus.
//!
//! The hardware has no per-bit addressing: every pin write is a
//! read-modify-write on an in-memory shadow followed by one full-byte
//! transmission. The shadow always reflects the last value successfully
//! *requested*; it is intentionally not rolled back when a transmission
//! fails, so the next state change retransmits the accumulated intent.

use log::{error, warn};
use vivarium_core::Error;
use vivarium_hal::i2c::I2cBus;

/// Output enable / mode control register address
const ADDR_MODE: u8 = 0x48 >> 1;
/// Push-pull output register address (EXIO0..7)
const ADDR_OUTPUT: u8 = 0x70 >> 1;
/// Input readback register address (EXIO0..7)
const ADDR_READBACK: u8 = 0x4D >> 1;

/// Enable push-pull outputs
const MODE_DEFAULT: u8 = 0x01;

const SPEED_HZ: u32 = 100_000;
const TIMEOUT_MS: u32 = 10;

/// Register-shadow driver for the CH422G
pub struct Ch422g {
    mode_shadow: u8,
    output_shadow: u8,
    mode_attached: bool,
    output_attached: bool,
    readback_attached: bool,
    initialized: bool,
}

impl Ch422g {
    /// Create an uninitialized driver
    pub const fn new() -> Self {
        Self {
            mode_shadow: 0,
            output_shadow: 0,
            mode_attached: false,
            output_attached: false,
            readback_attached: false,
            initialized: false,
        }
    }

    /// Attach the expander's device addresses and drive the defaults
    ///
    /// The readback address is best-effort: a failure there is logged and
    /// the driver runs without readback capability. Any other failure
    /// detaches everything attached so far before returning.
    pub fn init<B: I2cBus>(&mut self, bus: &mut B) -> Result<(), Error> {
        if self.initialized {
            return Ok(());
        }

        if let Err(e) = bus.attach(ADDR_MODE, SPEED_HZ) {
            error!("failed to attach mode device: {:?}", e);
            return Err(e.into());
        }
        self.mode_attached = true;

        if let Err(e) = bus.attach(ADDR_OUTPUT, SPEED_HZ) {
            error!("failed to attach output device: {:?}", e);
            self.detach_all(bus);
            return Err(e.into());
        }
        self.output_attached = true;

        match bus.attach(ADDR_READBACK, SPEED_HZ) {
            Ok(()) => self.readback_attached = true,
            Err(e) => {
                warn!("failed to attach readback device: {:?}", e);
                self.readback_attached = false;
            }
        }

        self.mode_shadow = MODE_DEFAULT;
        if let Err(e) = bus.transmit(ADDR_MODE, &[self.mode_shadow], TIMEOUT_MS) {
            error!("mode configuration failed: {:?}", e);
            self.detach_all(bus);
            return Err(e.into());
        }

        // All outputs low: downstream peripherals stay in reset until released.
        self.output_shadow = 0x00;
        if let Err(e) = self.write_outputs(bus) {
            self.detach_all(bus);
            return Err(e);
        }

        self.initialized = true;
        Ok(())
    }

    /// Set one output pin
    ///
    /// Skips the bus write entirely when the requested level matches the
    /// shadow. On a transmission failure the shadow keeps the requested
    /// value and the bus error kind is passed through.
    pub fn set_pin<B: I2cBus>(&mut self, bus: &mut B, pin: u8, level: bool) -> Result<(), Error> {
        if !self.initialized {
            return Err(Error::NotInitialized);
        }
        if pin >= 8 {
            return Err(Error::InvalidArgument);
        }

        let mask = 1u8 << pin;
        let new_state = if level {
            self.output_shadow | mask
        } else {
            self.output_shadow & !mask
        };

        if new_state == self.output_shadow {
            return Ok(());
        }

        self.output_shadow = new_state;
        self.write_outputs(bus)
    }

    /// Read one pin, never failing from the caller's perspective
    ///
    /// Uses hardware readback when available; on any read failure the
    /// shadow-derived value is returned instead. The readback path is
    /// advisory, not authoritative.
    pub fn get_pin<B: I2cBus>(&mut self, bus: &mut B, pin: u8) -> bool {
        if !self.initialized || pin >= 8 {
            return false;
        }

        if self.readback_attached {
            let mut data = [0u8; 1];
            match bus.receive(ADDR_READBACK, &mut data, TIMEOUT_MS) {
                Ok(()) => return (data[0] >> pin) & 0x01 != 0,
                Err(e) => warn!("readback failed ({:?}), falling back to shadow", e),
            }
        }

        (self.output_shadow >> pin) & 0x01 != 0
    }

    /// Detach all devices and reset to the uninitialized defaults
    pub fn deinit<B: I2cBus>(&mut self, bus: &mut B) {
        self.detach_all(bus);
        *self = Self::new();
    }

    fn write_outputs<B: I2cBus>(&self, bus: &mut B) -> Result<(), Error> {
        bus.transmit(ADDR_OUTPUT, &[self.output_shadow], TIMEOUT_MS)
            .map_err(|e| {
                error!("output transmit failed: {:?}", e);
                e.into()
            })
    }

    /// Detach each attached device independently; a failed detach is
    /// logged and does not stop the others.
    fn detach_all<B: I2cBus>(&mut self, bus: &mut B) {
        if self.mode_attached {
            if let Err(e) = bus.detach(ADDR_MODE) {
                warn!("failed to detach mode device: {:?}", e);
            }
            self.mode_attached = false;
        }
        if self.output_attached {
            if let Err(e) = bus.detach(ADDR_OUTPUT) {
                warn!("failed to detach output device: {:?}", e);
            }
            self.output_attached = false;
        }
        if self.readback_attached {
            if let Err(e) = bus.detach(ADDR_READBACK) {
                warn!("failed to detach readback device: {:?}", e);
            }
            self.readback_attached = false;
        }
    }
}

impl Default for Ch422g {
    fn default() -> Self {
        Self::new()
    }
}
