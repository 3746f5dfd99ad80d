//! Panel command link and RGB surface over ESP-IDF
//!
//! The command link is a plain SPI device with a GPIO D/C line; the
//! surface wraps the `esp_lcd` RGB panel engine, which owns continuous
//! pixel delivery once created.

use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::{config as spi_config, SpiDeviceDriver, SpiDriver, SpiDriverConfig, SPI2};
use esp_idf_sys as sys;
use log::info;
use vivarium_core::config::panel::{LinkConfig, VideoConfig};
use vivarium_core::traits::panel::{CommandLink, PanelBackend, RgbPanel};
use vivarium_core::Error;

/// Command-phase SPI channel with D/C discipline
pub struct SpiLink {
    spi: SpiDeviceDriver<'static, SpiDriver<'static>>,
    dc: PinDriver<'static, AnyOutputPin, Output>,
}

impl CommandLink for SpiLink {
    fn write_command(&mut self, opcode: u8, params: &[u8]) -> Result<(), Error> {
        self.dc.set_low().map_err(|_| Error::Io)?;
        self.spi.write(&[opcode]).map_err(|_| Error::Io)?;
        if !params.is_empty() {
            self.dc.set_high().map_err(|_| Error::Io)?;
            self.spi.write(params).map_err(|_| Error::Io)?;
        }
        Ok(())
    }

    fn read_command(&mut self, opcode: u8, buf: &mut [u8]) -> Result<(), Error> {
        self.dc.set_low().map_err(|_| Error::Io)?;
        self.spi.write(&[opcode]).map_err(|_| Error::Io)?;
        self.dc.set_high().map_err(|_| Error::Io)?;
        self.spi.read(buf).map_err(|_| Error::Io)?;
        Ok(())
    }

    fn release(self) {
        // Dropping the device driver frees the SPI bus
    }
}

/// The `esp_lcd` RGB video timing engine
pub struct RgbSurface {
    handle: sys::esp_lcd_panel_handle_t,
}

// The handle is only touched from the UI task
unsafe impl Send for RgbSurface {}

impl RgbPanel for RgbSurface {
    fn reset(&mut self) -> Result<(), Error> {
        esp_call(unsafe { sys::esp_lcd_panel_reset(self.handle) })
    }

    fn init(&mut self) -> Result<(), Error> {
        esp_call(unsafe { sys::esp_lcd_panel_init(self.handle) })
    }

    fn draw_region(
        &mut self,
        x1: u16,
        y1: u16,
        x2: u16,
        y2: u16,
        pixels: &[u8],
    ) -> Result<(), Error> {
        esp_call(unsafe {
            sys::esp_lcd_panel_draw_bitmap(
                self.handle,
                i32::from(x1),
                i32::from(y1),
                i32::from(x2),
                i32::from(y2),
                pixels.as_ptr().cast(),
            )
        })
    }

    fn set_power(&mut self, on: bool) -> Result<(), Error> {
        esp_call(unsafe { sys::esp_lcd_panel_disp_on_off(self.handle, on) })
    }

    fn set_sleep(&mut self, sleep: bool) -> Result<(), Error> {
        esp_call(unsafe { sys::esp_lcd_panel_disp_sleep(self.handle, sleep) })
    }

    fn delete(self) -> Result<(), Error> {
        esp_call(unsafe { sys::esp_lcd_panel_del(self.handle) })
    }
}

/// [`PanelBackend`] over the SPI2 host and the `esp_lcd` RGB engine
///
/// The SPI host is a one-shot resource: releasing the link returns the
/// wires but not the peripheral singleton, so a second bring-up within
/// one boot is not supported (nor needed).
pub struct EspPanelBackend {
    spi: Option<SPI2>,
}

impl EspPanelBackend {
    pub fn new(spi: SPI2) -> Self {
        Self { spi: Some(spi) }
    }
}

impl PanelBackend for EspPanelBackend {
    type Link = SpiLink;
    type Surface = RgbSurface;

    fn open_link(&mut self, cfg: &LinkConfig) -> Result<Self::Link, Error> {
        let spi = self.spi.take().ok_or(Error::NotSupported)?;

        // Safety: the profile's pin assignments are the board wiring
        let sclk = unsafe { AnyIOPin::new(i32::from(cfg.sclk_pin)) };
        let mosi = unsafe { AnyIOPin::new(i32::from(cfg.mosi_pin)) };
        let cs = unsafe { AnyIOPin::new(i32::from(cfg.cs_pin)) };
        let dc_pin = unsafe { AnyOutputPin::new(i32::from(cfg.dc_pin)) };

        let driver = SpiDriver::new(
            spi,
            sclk,
            mosi,
            Option::<AnyIOPin>::None,
            &SpiDriverConfig::new(),
        )
        .map_err(|_| Error::Io)?;

        let device_config = spi_config::Config::new()
            .baudrate(cfg.frequency_hz.Hz().into())
            .data_mode(spi_config::MODE_0);
        let spi = SpiDeviceDriver::new(driver, Some(cs), &device_config).map_err(|_| Error::Io)?;
        let dc = PinDriver::output(dc_pin).map_err(|_| Error::Io)?;

        info!("panel command link up at {} Hz", cfg.frequency_hz);
        Ok(SpiLink { spi, dc })
    }

    fn create_surface(&mut self, video: &VideoConfig) -> Result<Self::Surface, Error> {
        let mut config: sys::esp_lcd_rgb_panel_config_t = unsafe { core::mem::zeroed() };
        config.clk_src = sys::soc_periph_lcd_clk_src_t_LCD_CLK_SRC_PLL160M;
        config.timings.pclk_hz = video.pclk_hz;
        config.timings.h_res = u32::from(video.h_res);
        config.timings.v_res = u32::from(video.v_res);
        config.timings.hsync_pulse_width = u32::from(video.hsync.pulse_width);
        config.timings.hsync_back_porch = u32::from(video.hsync.back_porch);
        config.timings.hsync_front_porch = u32::from(video.hsync.front_porch);
        config.timings.vsync_pulse_width = u32::from(video.vsync.pulse_width);
        config.timings.vsync_back_porch = u32::from(video.vsync.back_porch);
        config.timings.vsync_front_porch = u32::from(video.vsync.front_porch);
        config
            .timings
            .flags
            .set_hsync_idle_low(video.hsync_idle_low.into());
        config
            .timings
            .flags
            .set_vsync_idle_low(video.vsync_idle_low.into());
        config.timings.flags.set_de_idle_high(video.de_idle_high.into());
        config
            .timings
            .flags
            .set_pclk_active_neg(video.pclk_active_neg.into());
        config.data_width = 16;
        config.bits_per_pixel = 16;
        config.num_fbs = 1;
        config.hsync_gpio_num = i32::from(video.hsync_pin);
        config.vsync_gpio_num = i32::from(video.vsync_pin);
        config.de_gpio_num = i32::from(video.de_pin);
        config.pclk_gpio_num = i32::from(video.pclk_pin);
        config.disp_gpio_num = -1;
        for (slot, pin) in config.data_gpio_nums.iter_mut().zip(video.data_pins) {
            *slot = i32::from(pin);
        }
        config.flags.set_fb_in_psram(video.fb_in_psram.into());

        let mut handle: sys::esp_lcd_panel_handle_t = core::ptr::null_mut();
        esp_call(unsafe { sys::esp_lcd_new_rgb_panel(&config, &mut handle) })?;
        info!(
            "RGB engine up ({}x{} @ {} Hz)",
            video.h_res, video.v_res, video.pclk_hz
        );
        Ok(RgbSurface { handle })
    }
}

fn esp_call(err: sys::esp_err_t) -> Result<(), Error> {
    match err {
        sys::ESP_OK => Ok(()),
        sys::ESP_ERR_TIMEOUT => Err(Error::IoTimeout),
        sys::ESP_ERR_NO_MEM => Err(Error::OutOfMemory),
        _ => Err(Error::Io),
    }
}
