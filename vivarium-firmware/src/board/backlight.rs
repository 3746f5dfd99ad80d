//! LEDC PWM backlight

use esp_idf_hal::gpio::AnyOutputPin;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution, CHANNEL0, TIMER0};
use esp_idf_hal::prelude::*;
use log::info;
use vivarium_core::traits::backlight::Backlight;
use vivarium_core::Error;

const PWM_FREQ_HZ: u32 = 5_000;
/// Power-on duty before the orchestrator takes over brightness
const INITIAL_DUTY: u8 = 200;

/// [`Backlight`] over an ESP-IDF LEDC timer + channel pair
pub struct LedcBacklight {
    parts: Option<(CHANNEL0, TIMER0, AnyOutputPin)>,
    driver: Option<LedcDriver<'static>>,
}

impl LedcBacklight {
    pub fn new(channel: CHANNEL0, timer: TIMER0, pin_num: u8) -> Self {
        // Safety: the pin number is the board wiring
        let pin = unsafe { AnyOutputPin::new(i32::from(pin_num)) };
        Self {
            parts: Some((channel, timer, pin)),
            driver: None,
        }
    }
}

impl Backlight for LedcBacklight {
    fn start(&mut self) -> Result<(), Error> {
        let Some((channel, timer, pin)) = self.parts.take() else {
            return Err(Error::NotInitialized);
        };
        let timer_config = TimerConfig::new()
            .frequency(PWM_FREQ_HZ.Hz())
            .resolution(Resolution::Bits8);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config).map_err(|_| Error::Io)?;
        let mut driver = LedcDriver::new(channel, timer_driver, pin).map_err(|_| Error::Io)?;
        driver
            .set_duty(u32::from(INITIAL_DUTY))
            .map_err(|_| Error::Io)?;
        info!("backlight PWM up ({} Hz, 8-bit)", PWM_FREQ_HZ);
        self.driver = Some(driver);
        Ok(())
    }

    fn set_duty(&mut self, duty: u8) -> Result<(), Error> {
        let Some(driver) = self.driver.as_mut() else {
            return Err(Error::NotInitialized);
        };
        driver.set_duty(u32::from(duty)).map_err(|_| Error::Io)
    }

    fn stop(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            let _ = driver.set_duty(0);
            let _ = driver.disable();
        }
    }
}
