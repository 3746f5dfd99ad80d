//! Vivarium Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that are implemented
//! by the board layer (ESP32-S3 via ESP-IDF in the firmware crate) and by
//! scripted mocks in host tests. This keeps every driver in
//! `vivarium-drivers` testable without hardware.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (vivarium-firmware)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vivarium-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ ESP32-S3      │       │ host-test     │
//! │ board layer   │       │ mocks         │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`], [`gpio::FlexPin`] - Digital I/O
//! - [`i2c::I2cBus`] - I2C master with explicit device registration
//! - [`irq::IrqService`] - GPIO interrupt service hookup

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod irq;

// Re-export key traits at crate root for convenience
pub use gpio::{FlexPin, InputPin, OutputPin};
pub use i2c::{BusError, I2cBus};
pub use irq::{IrqError, IrqService};
