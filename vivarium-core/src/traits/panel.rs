//! RGB panel trait seams
//!
//! Panel bring-up is two-phase: a command channel configures the
//! controller chip, then a continuous-refresh video timing engine takes
//! over pixel delivery. Both phases are behind traits so the bring-up
//! sequencing and its rollback paths run against scripted doubles on the
//! host.

use crate::config::panel::{LinkConfig, VideoConfig};
use crate::error::Error;

/// Command-phase channel to the panel controller
///
/// In hardware this is a SPI device with a dedicated D/C line; the
/// implementation drives D/C low for the opcode byte and high for the
/// parameter bytes.
pub trait CommandLink {
    /// Send one opcode with its parameter bytes
    fn write_command(&mut self, opcode: u8, params: &[u8]) -> Result<(), Error>;

    /// Send an opcode and read `buf.len()` bytes back
    fn read_command(&mut self, opcode: u8, buf: &mut [u8]) -> Result<(), Error>;

    /// Release the channel, returning its hardware resources
    fn release(self);
}

/// Continuous-refresh RGB surface produced by the video timing engine
///
/// Consuming `delete` makes double-deletion unrepresentable; a caller
/// holding an `Option<P>` takes the handle out to destroy it.
pub trait RgbPanel {
    /// Pulse the panel reset line
    fn reset(&mut self) -> Result<(), Error>;

    /// Run the engine's own initialization
    fn init(&mut self) -> Result<(), Error>;

    /// Present pixels in the half-open window `[x1, x2) x [y1, y2)`
    fn draw_region(
        &mut self,
        x1: u16,
        y1: u16,
        x2: u16,
        y2: u16,
        pixels: &[u8],
    ) -> Result<(), Error>;

    /// Turn the display output on or off
    fn set_power(&mut self, on: bool) -> Result<(), Error>;

    /// Enter or leave panel sleep
    fn set_sleep(&mut self, sleep: bool) -> Result<(), Error>;

    /// Destroy the panel and free the video engine resources
    fn delete(self) -> Result<(), Error>;
}

/// Platform services needed by panel bring-up
///
/// The board layer creates the command channel and the RGB timing engine;
/// each creation can fail and must leave nothing behind when it does.
pub trait PanelBackend {
    /// Command channel type
    type Link: CommandLink;
    /// Video engine surface type
    type Surface: RgbPanel;

    /// Acquire the command channel described by `cfg`
    fn open_link(&mut self, cfg: &LinkConfig) -> Result<Self::Link, Error>;

    /// Create the RGB timing engine surface described by `video`
    fn create_surface(&mut self, video: &VideoConfig) -> Result<Self::Surface, Error>;
}
