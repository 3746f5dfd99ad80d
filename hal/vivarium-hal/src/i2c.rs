//! I2C bus abstractions
//!
//! Provides a trait for an I2C master bus with explicit per-address device
//! registration, mirroring master-bus controllers where each peripheral
//! address is attached once and transactions are bounded by a timeout.

/// Error kind reported by bus transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Transaction exceeded its deadline
    Timeout,
    /// NACK, arbitration loss, registration rejection, or other bus fault
    Io,
}

/// I2C bus master with device registration
///
/// Peripheral drivers attach their 7-bit address (with a per-device clock
/// speed) before transacting and detach it during teardown. A device
/// address must never be used after the bus it was attached to has been
/// torn down.
pub trait I2cBus {
    /// Register a device address on the bus
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `speed_hz` - SCL clock for transactions with this device
    fn attach(&mut self, address: u8, speed_hz: u32) -> Result<(), BusError>;

    /// Remove a previously attached device address
    fn detach(&mut self, address: u8) -> Result<(), BusError>;

    /// Write data to an attached device
    fn transmit(&mut self, address: u8, bytes: &[u8], timeout_ms: u32) -> Result<(), BusError>;

    /// Read data from an attached device
    fn receive(&mut self, address: u8, buf: &mut [u8], timeout_ms: u32) -> Result<(), BusError>;

    /// Write then read in a single transaction (repeated start)
    ///
    /// This is commonly used to write a register address then read data.
    fn transmit_receive(
        &mut self,
        address: u8,
        bytes: &[u8],
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), BusError>;

    /// Tear down the bus controller
    ///
    /// On failure the bus must remain usable so the caller can retry.
    fn teardown(&mut self) -> Result<(), BusError>;
}

/// I2C clock configuration
#[derive(Debug, Clone, Copy)]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000, // 100kHz standard mode
        }
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };
}
