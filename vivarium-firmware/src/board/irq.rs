//! Touch interrupt hookup
//!
//! The edge handler runs in ISR context and does exactly one thing:
//! raise the shared event flag. Everything else happens at poll time.

use core::ffi::c_void;
use esp_idf_sys::{
    gpio_install_isr_service, gpio_int_type_t_GPIO_INTR_NEGEDGE, gpio_isr_handler_add,
    gpio_isr_handler_remove, gpio_set_intr_type, gpio_uninstall_isr_service, ESP_ERR_INVALID_STATE,
    ESP_OK,
};
use vivarium_core::EventFlag;
use vivarium_hal::irq::{IrqError, IrqService};

unsafe extern "C" fn touch_edge_isr(arg: *mut c_void) {
    let flag = &*(arg as *const EventFlag);
    flag.raise();
}

/// [`IrqService`] over the ESP-IDF GPIO ISR service
pub struct GpioIsr {
    pin: i32,
    flag: &'static EventFlag,
}

impl GpioIsr {
    pub fn new(pin: i32, flag: &'static EventFlag) -> Self {
        Self { pin, flag }
    }
}

impl IrqService for GpioIsr {
    fn install_service(&mut self) -> Result<bool, IrqError> {
        match unsafe { gpio_install_isr_service(0) } {
            ESP_OK => Ok(true),
            ESP_ERR_INVALID_STATE => Ok(false), // already running
            _ => Err(IrqError::Unavailable),
        }
    }

    fn attach_handler(&mut self) -> Result<(), IrqError> {
        let err = unsafe {
            gpio_set_intr_type(self.pin, gpio_int_type_t_GPIO_INTR_NEGEDGE);
            gpio_isr_handler_add(
                self.pin,
                Some(touch_edge_isr),
                self.flag as *const EventFlag as *mut c_void,
            )
        };
        if err == ESP_OK {
            Ok(())
        } else {
            Err(IrqError::Unavailable)
        }
    }

    fn detach_handler(&mut self) {
        unsafe { gpio_isr_handler_remove(self.pin) };
    }

    fn uninstall_service(&mut self) {
        unsafe { gpio_uninstall_isr_service() };
    }
}
