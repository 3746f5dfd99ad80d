//! Configuration types
//!
//! All configuration is compile-time: pin maps, panel timing/command
//! tables, and touch controller addressing. Nothing here is loaded at
//! runtime.

pub mod panel;
pub mod pins;
pub mod touch;

pub use panel::{IdCheck, LinkConfig, PanelCommand, PanelProfile, SyncTiming, VideoConfig};
pub use pins::{BusPins, PinConfig, TouchPins};
pub use touch::{TouchConfig, MAX_TOUCH_POINTS};
