//! Hardware driver implementations
//!
//! This crate provides the drivers behind the trait seams defined in
//! vivarium-core:
//!
//! - Shared I2C bus manager (singleton handle, idempotent init)
//! - CH422G output expander (register shadow, best-effort readback)
//! - GT911 capacitive touch controller (interrupt or polling)
//! - RGB panel bring-up (two-phase: command link, then video engine)
//!   and the sleep-command panel decorator

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod expander;
pub mod panel;
pub mod touch;
