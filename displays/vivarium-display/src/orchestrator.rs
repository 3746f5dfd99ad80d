//! Display orchestrator
//!
//! Single entrypoint sequencing panel bring-up, backlight PWM setup, dual
//! DMA frame buffer allocation, and toolkit display registration - and
//! the exact-inverse teardown. A failure at any step synchronously rolls
//! back everything acquired so far inside the same call: callers never
//! clean up after a failed init.

use embedded_hal::delay::DelayNs;
use log::{error, info, warn};
use vivarium_core::config::panel::PanelProfile;
use vivarium_core::traits::backlight::Backlight;
use vivarium_core::traits::memory::{FrameAllocator, FrameBuffer};
use vivarium_core::traits::panel::{PanelBackend, RgbPanel};
use vivarium_core::traits::ui::{Region, RenderMode, UiDisplay, UiToolkit};
use vivarium_core::Error;
use vivarium_drivers::panel::{bring_up, Panel};

/// RGB565 on the wire
const BYTES_PER_PIXEL: usize = 2;

/// Orchestrator tuning
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    /// Each frame buffer holds `h_res * v_res / buffer_divisor` pixels.
    /// Smaller divisor = smoother partial refresh, more RAM held.
    pub buffer_divisor: usize,
    /// Brightness percentage restored when leaving sleep
    pub wake_brightness: u8,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            buffer_divisor: 10,
            wake_brightness: 80,
        }
    }
}

/// The composed display: panel + backlight + buffers + toolkit display
pub struct Display<B, K, A, U>
where
    B: PanelBackend,
    K: Backlight,
    A: FrameAllocator,
    U: UiDisplay,
{
    panel: Option<Panel<B>>,
    backlight: K,
    alloc: A,
    ui: Option<U>,
    buf_a: Option<FrameBuffer>,
    buf_b: Option<FrameBuffer>,
    h_res: u16,
    v_res: u16,
    wake_brightness: u8,
}

impl<B, K, A, U> Display<B, K, A, U>
where
    B: PanelBackend,
    K: Backlight,
    A: FrameAllocator,
    U: UiDisplay,
{
    /// Bring the whole display stack up
    ///
    /// Order: panel bring-up, backlight start, frame buffer A, frame
    /// buffer B, toolkit display creation, buffer registration in
    /// partial-render mode. Every failure path leaves the backlight off,
    /// frees any allocated buffer exactly once, and sends the panel (when
    /// one was created) display-off followed by delete.
    pub fn init<T, D>(
        backend: &mut B,
        toolkit: &mut T,
        mut backlight: K,
        mut alloc: A,
        profile: &PanelProfile,
        cfg: &DisplayConfig,
        delay: &mut D,
    ) -> Result<Self, Error>
    where
        T: UiToolkit<Display = U>,
        D: DelayNs,
    {
        let panel = bring_up(backend, profile, delay)?;

        if let Err(e) = backlight.start() {
            error!("backlight start failed");
            roll_back_hw(&mut backlight, panel);
            return Err(e);
        }

        let buf_len = usize::from(profile.video.h_res) * usize::from(profile.video.v_res)
            / cfg.buffer_divisor
            * BYTES_PER_PIXEL;

        let Some(buf_a) = alloc.alloc(buf_len) else {
            error!("frame buffer A allocation failed ({} bytes)", buf_len);
            roll_back_hw(&mut backlight, panel);
            return Err(Error::OutOfMemory);
        };
        let Some(buf_b) = alloc.alloc(buf_len) else {
            error!("frame buffer B allocation failed ({} bytes)", buf_len);
            alloc.free(buf_a);
            roll_back_hw(&mut backlight, panel);
            return Err(Error::OutOfMemory);
        };

        let mut ui = match toolkit.create_display(profile.video.h_res, profile.video.v_res) {
            Ok(ui) => ui,
            Err(e) => {
                error!("toolkit display creation failed");
                alloc.free(buf_b);
                alloc.free(buf_a);
                roll_back_hw(&mut backlight, panel);
                return Err(e);
            }
        };

        if let Err(e) = ui.set_buffers(&buf_a, &buf_b, RenderMode::Partial) {
            error!("buffer registration failed");
            ui.delete();
            alloc.free(buf_b);
            alloc.free(buf_a);
            roll_back_hw(&mut backlight, panel);
            return Err(e);
        }

        info!(
            "display up: {} {}x{}, 2x{} byte buffers",
            profile.name, profile.video.h_res, profile.video.v_res, buf_len
        );
        Ok(Self {
            panel: Some(panel),
            backlight,
            alloc,
            ui: Some(ui),
            buf_a: Some(buf_a),
            buf_b: Some(buf_b),
            h_res: profile.video.h_res,
            v_res: profile.video.v_res,
            wake_brightness: cfg.wake_brightness,
        })
    }

    /// Flush callback body: present `pixels` for `area`
    ///
    /// Signals render-done to the toolkit only when the panel accepted
    /// the pixels. A draw failure is logged and left unsignalled - the
    /// intentional stall surfaces the fault instead of masking lost
    /// pixels.
    pub fn flush(&mut self, area: &Region, pixels: &[u8]) {
        let Some(panel) = self.panel.as_mut() else {
            return;
        };
        match panel.draw_region(area.x1, area.y1, area.x2 + 1, area.y2 + 1, pixels) {
            Ok(()) => {
                if let Some(ui) = self.ui.as_mut() {
                    ui.flush_complete();
                }
            }
            Err(e) => error!(
                "draw region ({},{})..({},{}) failed: {:?}",
                area.x1, area.y1, area.x2, area.y2, e
            ),
        }
    }

    /// Set brightness as a percentage, applied immediately
    pub fn set_brightness(&mut self, brightness: u8) {
        let pct = brightness.min(100);
        let duty = (u32::from(pct) * 255 / 100) as u8;
        if self.backlight.set_duty(duty).is_err() {
            warn!("backlight duty update failed");
        }
    }

    /// Enter or leave panel sleep; brightness is coupled to it
    pub fn set_sleep(&mut self, sleep: bool) -> Result<(), Error> {
        let Some(panel) = self.panel.as_mut() else {
            return Err(Error::NotInitialized);
        };
        panel.set_sleep(sleep)?;
        if sleep {
            self.set_brightness(0);
        } else {
            let level = self.wake_brightness;
            self.set_brightness(level);
        }
        Ok(())
    }

    /// Panel resolution
    pub fn resolution(&self) -> (u16, u16) {
        (self.h_res, self.v_res)
    }

    /// Tear the display stack down in exact-inverse order
    ///
    /// The toolkit display dies first so no flush callback can touch the
    /// buffers once they are freed.
    pub fn deinit(mut self) {
        if let Some(ui) = self.ui.take() {
            ui.delete();
        }
        self.backlight.stop();
        if let Some(buf) = self.buf_a.take() {
            self.alloc.free(buf);
        }
        if let Some(buf) = self.buf_b.take() {
            self.alloc.free(buf);
        }
        if let Some(panel) = self.panel.take() {
            shutdown_panel(panel);
        }
        info!("display deinitialized");
    }
}

/// Turn the backlight off and dispose of the panel
fn roll_back_hw<K: Backlight, P: RgbPanel>(backlight: &mut K, panel: P) {
    if backlight.set_duty(0).is_err() {
        warn!("backlight off failed during rollback");
    }
    backlight.stop();
    shutdown_panel(panel);
}

/// Display-off, then delete. Failures here are logged, not propagated:
/// rollback keeps going.
fn shutdown_panel<P: RgbPanel>(mut panel: P) {
    if panel.set_power(false).is_err() {
        warn!("panel display-off failed");
    }
    if panel.delete().is_err() {
        warn!("panel delete failed");
    }
}
