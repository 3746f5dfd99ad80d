//! Vivarium - Habitat Control Panel Firmware
//!
//! Firmware binary for the ESP32-S3 7" touch LCD boards. Wires the
//! portable driver stack to real peripherals and runs the UI tick loop.
//!
//! Startup order matters: shared bus, output expander (which gates the
//! panel power rails), display orchestrator, touch controller, screen
//! scaffold. A failure at any stage unwinds the stages already completed
//! in reverse order and aborts; the watchdog restarts the board.

use embedded_hal::delay::DelayNs;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use log::{error, info};

use vivarium_core::config::panel::ST7262_7IN;
use vivarium_core::config::pins::{BACKLIGHT_PIN, I2C_BUS_PINS, TOUCH_PINS};
use vivarium_core::config::touch::TouchConfig;
use vivarium_core::traits::ui::InputRead;
use vivarium_core::{Error, EventFlag};
use vivarium_display::{Display, DisplayConfig, UiRoot};
use vivarium_drivers::bus::BusManager;
use vivarium_drivers::expander::Ch422g;
use vivarium_drivers::touch::Gt911;

mod board;
mod ui_port;

/// UI tick period; the toolkit expects its timer handler every 1-10 ms
const UI_TICK_MS: u32 = 10;

/// Expander rail assignments on the 7" board
const EXIO_TOUCH_RESET: u8 = 1;
const EXIO_DISPLAY_ENABLE: u8 = 2;

/// Raised by the touch INT edge handler, drained by the poll loop
static TOUCH_EVENT: EventFlag = EventFlag::new();

fn main() {
    // Required before anything else on ESP-IDF
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("=== Vivarium panel v{} ===", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        // Startup failures are fatal; panic reboots into a clean retry.
        error!("startup failed: {:?}", e);
        panic!("startup failed: {:?}", e);
    }
}

fn run() -> Result<(), Error> {
    let p = Peripherals::take().map_err(|_| Error::NotSupported)?;
    let mut delay = FreeRtos;

    // --- Shared bus ---------------------------------------------------
    let mut bus = BusManager::new();
    bus.init(|| board::EspI2cBus::new(p.i2c0, &I2C_BUS_PINS))?;

    // --- Output expander ----------------------------------------------
    let mut expander = Ch422g::new();
    if let Err(e) = expander.init(bus.bus()?) {
        let _ = bus.deinit();
        return Err(e);
    }
    // Release the rails the expander holds in reset after power-up
    if let Err(e) = release_rails(&mut bus, &mut expander) {
        unwind_expander(&mut bus, &mut expander);
        return Err(e);
    }

    // --- Display ------------------------------------------------------
    let mut backend = board::EspPanelBackend::new(p.spi2);
    let backlight = board::LedcBacklight::new(p.ledc.channel0, p.ledc.timer0, BACKLIGHT_PIN);
    let mut toolkit = ui_port::ToolkitPort::new();

    let mut display = match Display::init(
        &mut backend,
        &mut toolkit,
        backlight,
        board::DmaHeap,
        &ST7262_7IN,
        &DisplayConfig::default(),
        &mut delay,
    ) {
        Ok(display) => display,
        Err(e) => {
            unwind_expander(&mut bus, &mut expander);
            return Err(e);
        }
    };

    // --- Touch --------------------------------------------------------
    let rst = match board::flex_pin(TOUCH_PINS.reset) {
        Ok(pin) => pin,
        Err(e) => {
            display.deinit();
            unwind_expander(&mut bus, &mut expander);
            return Err(e);
        }
    };
    let int = match board::flex_pin(TOUCH_PINS.interrupt) {
        Ok(pin) => pin,
        Err(e) => {
            display.deinit();
            unwind_expander(&mut bus, &mut expander);
            return Err(e);
        }
    };
    let irq = board::GpioIsr::new(i32::from(TOUCH_PINS.interrupt.pin), &TOUCH_EVENT);

    let (h_res, v_res) = display.resolution();
    let mut touch =
        Gt911::interrupt_driven(TouchConfig::gt911(h_res, v_res), rst, int, irq, &TOUCH_EVENT);
    if let Err(e) = touch.init(bus.bus()?, &mut delay) {
        display.deinit();
        unwind_expander(&mut bus, &mut expander);
        return Err(e);
    }

    // --- Screen scaffold ----------------------------------------------
    let _scaffold = match UiRoot::init(&mut toolkit) {
        Ok(root) => root,
        Err(e) => {
            if let Ok(b) = bus.bus() {
                touch.deinit(b);
            }
            display.deinit();
            unwind_expander(&mut bus, &mut expander);
            return Err(e);
        }
    };

    info!("system up, entering UI tick loop");

    let mut input = InputRead::default();
    loop {
        if let Ok(b) = bus.bus() {
            touch.poll(b, &mut input);
        }
        // The toolkit's timer/event processing runs here and presents
        // dirty regions through `display.flush(...)` via the registered
        // flush callback.
        toolkit.tick();
        delay.delay_ms(UI_TICK_MS);
    }
}

/// The expander holds the panel and touch rails low out of reset
fn release_rails<B: vivarium_hal::I2cBus>(
    bus: &mut BusManager<B>,
    expander: &mut Ch422g,
) -> Result<(), Error> {
    expander.set_pin(bus.bus()?, EXIO_DISPLAY_ENABLE, true)?;
    expander.set_pin(bus.bus()?, EXIO_TOUCH_RESET, true)
}

/// Reverse of the bus + expander stages
fn unwind_expander<B: vivarium_hal::I2cBus>(bus: &mut BusManager<B>, expander: &mut Ch422g) {
    if let Some(b) = bus.get() {
        expander.deinit(b);
    }
    let _ = bus.deinit();
}
