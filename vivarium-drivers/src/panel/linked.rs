//! Sleep-command panel decorator
//!
//! Some controllers (the ST7701 family) need explicit sleep-in/out and
//! display-on/off commands over the command channel that configured them;
//! the RGB engine alone cannot reach those registers. This wrapper keeps
//! the command link alive for the panel's lifetime and injects the
//! commands before delegating to the base panel, composing over the
//! interface instead of patching the base panel's operation table.

use vivarium_core::traits::panel::{CommandLink, RgbPanel};
use vivarium_core::Error;

/// Enter sleep mode
const CMD_SLPIN: u8 = 0x10;
/// Leave sleep mode
const CMD_SLPOUT: u8 = 0x11;
/// Display output off
const CMD_DISPOFF: u8 = 0x28;
/// Display output on
const CMD_DISPON: u8 = 0x29;

/// An [`RgbPanel`] wrapping another with command-channel sleep/power
/// gating
#[derive(Debug, PartialEq)]
pub struct LinkedPanel<S: RgbPanel, L: CommandLink> {
    surface: S,
    link: L,
}

impl<S: RgbPanel, L: CommandLink> LinkedPanel<S, L> {
    /// Wrap `surface`, taking ownership of its command link
    pub fn new(surface: S, link: L) -> Self {
        Self { surface, link }
    }
}

impl<S: RgbPanel, L: CommandLink> RgbPanel for LinkedPanel<S, L> {
    fn reset(&mut self) -> Result<(), Error> {
        self.surface.reset()
    }

    fn init(&mut self) -> Result<(), Error> {
        self.surface.init()
    }

    fn draw_region(
        &mut self,
        x1: u16,
        y1: u16,
        x2: u16,
        y2: u16,
        pixels: &[u8],
    ) -> Result<(), Error> {
        self.surface.draw_region(x1, y1, x2, y2, pixels)
    }

    fn set_power(&mut self, on: bool) -> Result<(), Error> {
        self.link
            .write_command(if on { CMD_DISPON } else { CMD_DISPOFF }, &[])?;
        self.surface.set_power(on)
    }

    fn set_sleep(&mut self, sleep: bool) -> Result<(), Error> {
        self.link
            .write_command(if sleep { CMD_SLPIN } else { CMD_SLPOUT }, &[])?;
        self.surface.set_sleep(sleep)
    }

    fn delete(self) -> Result<(), Error> {
        self.link.release();
        self.surface.delete()
    }
}
