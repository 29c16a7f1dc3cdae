//! Configure-once, transfer-many I2C master layer
//!
//! This crate adapts the vendor I2C master packet driver (described by
//! [`grmaster_hal::PacketDriver`]) to a generic bus interface:
//!
//! - Device registry: one slot per controller, holding its opened handle
//! - Configuration negotiation: mode, speed class and address width checks,
//!   then one driver call per parameter
//! - Message translation: bus messages to driver packets, submitted in order
//! - `embedded-hal` 1.0 [`I2c`](embedded_hal::i2c::I2c) adapter
//!
//! [`BusManager`] ties these together and is the type applications hold.
//!
//! # Logging
//!
//! Enable `defmt` or `log` to get diagnostics for every failure path. The
//! two features are mutually exclusive.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This must go first so the macros are visible to the other modules.
#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod hal;
pub mod manager;
pub mod negotiate;
pub mod registry;
pub mod transfer;

#[cfg(test)]
mod mock;

pub use config::{
    AddressWidth, BusRequest, ConfigWord, ControllerConfig, NegotiatedParameters, SpeedClass,
    DEFAULT_CONTROLLERS,
};
pub use error::Error;
pub use hal::Controller;
pub use manager::BusManager;
pub use transfer::{BusMessage, Direction, SubmitStrategy, MAX_BATCH};

// Re-export the driver interface so applications need one dependency
pub use grmaster_hal::{DriverError, Packet, PacketDriver, Statistics};
