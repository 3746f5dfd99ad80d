//! Pin assignments
//!
//! Fixed wiring of the 7" panel boards. The video data/sync pins live in
//! the panel profiles; this module covers the shared I2C bus, the touch
//! control lines, and the backlight.

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    /// GPIO pin number
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
    /// Enable internal pull-up
    pub pull_up: bool,
}

impl PinConfig {
    /// Create a new pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
            pull_up: false,
        }
    }

    /// Create a pin with pull-up enabled
    pub const fn with_pullup(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: true,
        }
    }
}

/// Shared I2C master bus wiring
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusPins {
    pub sda: u8,
    pub scl: u8,
    /// Glitch filter length in clock cycles
    pub glitch_filter_cnt: u8,
    pub internal_pullup: bool,
}

/// SDA/SCL wiring of the panel board's shared bus
pub const I2C_BUS_PINS: BusPins = BusPins {
    sda: 8,
    scl: 9,
    glitch_filter_cnt: 7,
    internal_pullup: true,
};

/// Touch controller control lines
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchPins {
    pub reset: PinConfig,
    pub interrupt: PinConfig,
}

/// GT911 reset/interrupt wiring
pub const TOUCH_PINS: TouchPins = TouchPins {
    reset: PinConfig::new(17),
    interrupt: PinConfig::with_pullup(18),
};

/// Backlight PWM output
pub const BACKLIGHT_PIN: u8 = 2;
