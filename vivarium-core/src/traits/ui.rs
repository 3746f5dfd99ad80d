//! UI toolkit port
//!
//! The GUI toolkit itself is an external collaborator; this module
//! defines the narrow contract the core depends on: display object
//! creation with buffer registration, the render-done signal, the
//! input-read record filled by the touch driver, and object-tree
//! creation for the screen scaffold.

use crate::error::Error;
use crate::traits::memory::FrameBuffer;

/// Rectangular screen region, inclusive corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl Region {
    /// Width in pixels
    pub fn width(&self) -> u16 {
        self.x2 - self.x1 + 1
    }

    /// Height in pixels
    pub fn height(&self) -> u16 {
        self.y2 - self.y1 + 1
    }
}

/// A screen-space coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

/// Contact state reported to the toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputState {
    Pressed,
    Released,
}

/// Record filled by the input-poll callback
///
/// `more_data` tells the toolkit to call back immediately because more
/// touch points from the same physical event are still queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputRead {
    pub state: InputState,
    pub point: Point,
    pub more_data: bool,
}

impl Default for InputRead {
    fn default() -> Self {
        Self {
            state: InputState::Released,
            point: Point::default(),
            more_data: false,
        }
    }
}

/// Buffer strategy registered with the toolkit display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderMode {
    /// Render dirty regions into the buffers, flushing each
    Partial,
    /// Render the whole screen every refresh
    Full,
    /// Toolkit draws straight into the front buffer
    Direct,
}

/// Factory side of the toolkit boundary
pub trait UiToolkit {
    /// Toolkit display object
    type Display: UiDisplay;

    /// Create a display object sized to the panel resolution
    fn create_display(&mut self, h_res: u16, v_res: u16) -> Result<Self::Display, Error>;
}

/// A live toolkit display object
pub trait UiDisplay {
    /// Register the two render buffers and the render mode
    fn set_buffers(
        &mut self,
        buf_a: &FrameBuffer,
        buf_b: &FrameBuffer,
        mode: RenderMode,
    ) -> Result<(), Error>;

    /// Signal that the pixels handed to the flush callback are on screen
    fn flush_complete(&mut self);

    /// Destroy the display object; the toolkit stops issuing flushes
    fn delete(self);
}

/// Object-tree side of the toolkit boundary
///
/// Only the lifecycle is modeled here; widget content and layout belong
/// to the screens built on top.
pub trait UiTree {
    /// Opaque toolkit object handle
    type Object;

    /// Register the shared style set. Paired with `styles_deinit`.
    fn styles_init(&mut self) -> Result<(), Error>;

    /// Release the shared style set
    fn styles_deinit(&mut self);

    /// Create a top-level screen object
    fn create_screen(&mut self) -> Result<Self::Object, Error>;

    /// Create a child container of `parent`
    fn create_container(&mut self, parent: &Self::Object) -> Result<Self::Object, Error>;

    /// Delete an object and its children
    fn delete_object(&mut self, obj: Self::Object);
}
