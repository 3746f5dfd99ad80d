//! Display orchestration for the Vivarium panel
//!
//! This crate composes the panel driver, the backlight, the DMA frame
//! buffers, and the UI toolkit's display object into one init/deinit
//! lifecycle with exact-inverse rollback on any failure, plus the
//! lifecycle scaffold for the screen sections the UI builds on top.
//!
//! The GUI toolkit itself is an external collaborator consumed only
//! through the port traits in `vivarium-core::traits::ui`.

#![no_std]
#![deny(unsafe_code)]

pub mod orchestrator;
pub mod ui;

// Re-export key types
pub use orchestrator::{Display, DisplayConfig};
pub use ui::UiRoot;
