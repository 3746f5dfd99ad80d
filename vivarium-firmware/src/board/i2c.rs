//! Shared I2C master bus over ESP-IDF

use esp_idf_hal::delay::TickType;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::i2c::{I2c, I2cConfig, I2cDriver};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_svc::sys::{EspError, ESP_ERR_TIMEOUT};
use heapless::Vec;
use log::info;
use vivarium_core::config::pins::BusPins;
use vivarium_hal::i2c::{BusError, I2cBus, I2cConfig as BusClock};

/// The fastest device on the bus (the touch controller) sets the clock
const BUS_CLOCK: BusClock = BusClock::FAST;

/// [`I2cBus`] over the ESP-IDF I2C master driver
///
/// ESP-IDF's legacy driver addresses devices per transaction, so
/// attach/detach reduce to registration bookkeeping; the per-device
/// clock request is satisfied as long as it does not exceed the bus
/// clock.
pub struct EspI2cBus {
    driver: I2cDriver<'static>,
    attached: Vec<u8, 8>,
}

impl EspI2cBus {
    /// Create the bus on the panel board's SDA/SCL wiring
    pub fn new<I: I2c>(
        i2c: impl Peripheral<P = I> + 'static,
        pins: &BusPins,
    ) -> Result<Self, BusError> {
        // Safety: the pin map is the board wiring
        let sda = unsafe { AnyIOPin::new(i32::from(pins.sda)) };
        let scl = unsafe { AnyIOPin::new(i32::from(pins.scl)) };

        // The legacy driver has no glitch-filter knob; the filter length
        // in the pin map applies to the newer master-bus driver only.
        let config = I2cConfig::new()
            .baudrate(BUS_CLOCK.frequency.Hz())
            .sda_enable_pullup(pins.internal_pullup)
            .scl_enable_pullup(pins.internal_pullup);
        let driver = I2cDriver::new(i2c, sda, scl, &config).map_err(map_err)?;
        info!("I2C bus up at {} Hz", BUS_CLOCK.frequency);
        Ok(Self {
            driver,
            attached: Vec::new(),
        })
    }

    fn ensure_attached(&self, address: u8) -> Result<(), BusError> {
        if self.attached.contains(&address) {
            Ok(())
        } else {
            Err(BusError::Io)
        }
    }
}

impl I2cBus for EspI2cBus {
    fn attach(&mut self, address: u8, speed_hz: u32) -> Result<(), BusError> {
        if speed_hz > BUS_CLOCK.frequency || self.attached.contains(&address) {
            return Err(BusError::Io);
        }
        self.attached.push(address).map_err(|_| BusError::Io)
    }

    fn detach(&mut self, address: u8) -> Result<(), BusError> {
        match self.attached.iter().position(|&a| a == address) {
            Some(idx) => {
                self.attached.remove(idx);
                Ok(())
            }
            None => Err(BusError::Io),
        }
    }

    fn transmit(&mut self, address: u8, bytes: &[u8], timeout_ms: u32) -> Result<(), BusError> {
        self.ensure_attached(address)?;
        self.driver
            .write(address, bytes, ticks(timeout_ms))
            .map_err(map_err)
    }

    fn receive(&mut self, address: u8, buf: &mut [u8], timeout_ms: u32) -> Result<(), BusError> {
        self.ensure_attached(address)?;
        self.driver
            .read(address, buf, ticks(timeout_ms))
            .map_err(map_err)
    }

    fn transmit_receive(
        &mut self,
        address: u8,
        bytes: &[u8],
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<(), BusError> {
        self.ensure_attached(address)?;
        self.driver
            .write_read(address, bytes, buf, ticks(timeout_ms))
            .map_err(map_err)
    }

    fn teardown(&mut self) -> Result<(), BusError> {
        // The driver frees its controller on drop; nothing can fail here.
        Ok(())
    }
}

fn ticks(ms: u32) -> u32 {
    TickType::new_millis(u64::from(ms)).ticks()
}

fn map_err(e: EspError) -> BusError {
    if e.code() == ESP_ERR_TIMEOUT {
        BusError::Timeout
    } else {
        BusError::Io
    }
}
