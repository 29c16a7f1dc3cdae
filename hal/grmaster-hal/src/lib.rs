//! grmaster Hardware Abstraction Layer
//!
//! This crate describes the vendor I2C master packet driver (`i2cmst`) as a
//! Rust trait, so that the bus layer in `grmaster-core` can be written and
//! tested without the board support package.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Bus clients (sensors, embedded-hal)    │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  grmaster-core (registry, negotiation,  │
//! │  message translation)                   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  grmaster-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  i2cmst packet driver (vendor BSP)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Items
//!
//! - [`driver::PacketDriver`] - controller lifecycle, parameters and submission
//! - [`packet::Packet`] - the driver's unit of transfer
//! - [`driver::DriverError`] - non-OK driver status codes

#![no_std]
#![deny(unsafe_code)]

pub mod driver;
pub mod packet;

// Re-export key items at crate root for convenience
pub use driver::{DriverError, DriverStatus, PacketDriver, Statistics};
pub use packet::{Packet, PacketFlags, PacketPayload};
