//! Runtime-reconfigurable GPIO

use esp_idf_hal::gpio::{AnyIOPin, InputOutput, PinDriver, Pull};
use vivarium_core::config::pins::PinConfig;
use vivarium_core::Error;
use vivarium_hal::gpio::{FlexPin, InputPin, OutputPin};

/// [`FlexPin`] over an ESP-IDF input/output pin driver
///
/// The touch control lines switch between driven-output and pulled-up
/// input at runtime; the ESP32's GPIO matrix supports both directions
/// simultaneously, so "switching" is a matter of pull configuration and
/// output level.
pub struct FlexGpio {
    pin: PinDriver<'static, AnyIOPin, InputOutput>,
}

/// Build a [`FlexGpio`] from a pin-map entry
pub fn flex_pin(cfg: PinConfig) -> Result<FlexGpio, Error> {
    // Safety: the pin map is the board wiring
    let pin = unsafe { AnyIOPin::new(i32::from(cfg.pin)) };
    let mut driver = PinDriver::input_output(pin).map_err(|_| Error::Io)?;
    if cfg.pull_up {
        driver.set_pull(Pull::Up).map_err(|_| Error::Io)?;
    }
    Ok(FlexGpio { pin: driver })
}

impl OutputPin for FlexGpio {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}

impl InputPin for FlexGpio {
    fn is_high(&self) -> bool {
        self.pin.is_high()
    }
}

impl FlexPin for FlexGpio {
    fn set_output(&mut self) {
        let _ = self.pin.set_pull(Pull::Floating);
    }

    fn set_input_pullup(&mut self) {
        // Released to input: stop driving and let the pull-up win
        let _ = self.pin.set_high();
        let _ = self.pin.set_pull(Pull::Up);
    }
}
