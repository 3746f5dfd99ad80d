//! Device-level trait seams
//!
//! These traits define the interface between the drivers/display layer
//! and hardware-specific implementations (or scripted test doubles).

pub mod backlight;
pub mod memory;
pub mod panel;
pub mod ui;

pub use backlight::Backlight;
pub use memory::{FrameAllocator, FrameBuffer};
pub use panel::{CommandLink, PanelBackend, RgbPanel};
pub use ui::{
    InputRead, InputState, Point, Region, RenderMode, UiDisplay, UiToolkit, UiTree,
};
