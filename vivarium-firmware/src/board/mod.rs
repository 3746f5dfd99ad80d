//! ESP32-S3 board layer
//!
//! Implements the HAL and device trait seams over ESP-IDF: the I2C
//! master bus, the SPI command link and `esp_lcd` RGB surface, the LEDC
//! backlight, the DMA heap, runtime-reconfigurable GPIO, and the touch
//! interrupt hookup.

mod backlight;
mod gpio;
mod i2c;
mod irq;
mod memory;
mod panel;

pub use backlight::LedcBacklight;
pub use gpio::{flex_pin, FlexGpio};
pub use i2c::EspI2cBus;
pub use irq::GpioIsr;
pub use memory::DmaHeap;
pub use panel::EspPanelBackend;
