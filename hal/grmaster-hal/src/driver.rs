//! Packet driver abstraction
//!
//! Describes the vendor I2C master packet driver as a trait. Every call is
//! synchronous: it returns once the hardware has completed or rejected the
//! request. Timeouts, if any, live inside the implementation.

use core::fmt;

use crate::packet::Packet;

/// Non-OK status reported by the packet driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Generic failure (NACK, arbitration loss, timeout after retries)
    Fail,
    /// Parameter rejected (for example an unsupported bus frequency)
    Invalid,
    /// Controller busy with another transaction
    Busy,
    /// Controller was not running; returned by `stop` on an idle controller
    NotStarted,
    /// Handle does not refer to an opened controller
    NotOpen,
    /// Any other status code, as reported by the driver
    Other(i32),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Fail => f.write_str("transfer failed"),
            DriverError::Invalid => f.write_str("invalid parameter"),
            DriverError::Busy => f.write_str("controller busy"),
            DriverError::NotStarted => f.write_str("controller not started"),
            DriverError::NotOpen => f.write_str("controller not open"),
            DriverError::Other(code) => write!(f, "driver status {}", code),
        }
    }
}

/// Result of a packet driver call
pub type DriverStatus = Result<(), DriverError>;

/// Transfer counters kept by the packet driver per controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Statistics {
    /// Packets completed successfully
    pub completed: u32,
    /// Packets that failed after all retries
    pub failed: u32,
    /// Individual retry attempts
    pub retries: u32,
    /// NACKs received from targets
    pub nacks: u32,
}

/// I2C master packet driver
///
/// One implementation drives all controllers of a chip. Controllers are
/// identified by index and, once opened, by their handle. A handle is
/// exclusive: a second `open` of the same index while the first handle is
/// alive is expected to fail.
pub trait PacketDriver {
    /// Opened controller
    type Handle;

    /// Open the controller at `index`
    ///
    /// Returns `None` if the index does not exist or the controller is
    /// already claimed.
    fn open(&self, index: u8) -> Option<Self::Handle>;

    /// Close a handle and release the controller
    fn close(&self, handle: Self::Handle);

    /// Stop any running transaction
    ///
    /// Stopping an idle controller reports [`DriverError::NotStarted`], which
    /// callers should treat as benign.
    fn stop(&self, handle: &mut Self::Handle) -> DriverStatus;

    /// Set the number of automatic retries per packet
    fn set_retries(&self, handle: &mut Self::Handle, retries: u32) -> DriverStatus;

    /// Set the bus frequency in Hz
    ///
    /// Only 100 kHz and 400 kHz are accepted by the hardware.
    fn set_speed(&self, handle: &mut Self::Handle, hz: u32) -> DriverStatus;

    /// Select interrupt-driven (`true`) or polled (`false`) operation
    fn set_interrupt_mode(&self, handle: &mut Self::Handle, enabled: bool) -> DriverStatus;

    /// Enable or disable 10-bit target addressing
    fn set_ten_bit_addressing(&self, handle: &mut Self::Handle, enabled: bool) -> DriverStatus;

    /// Reset the transfer counters of a handle
    fn clear_statistics(&self, handle: &mut Self::Handle);

    /// Read the transfer counters of a handle
    ///
    /// Drivers built without statistics support return `None`.
    fn statistics(&self, handle: &Self::Handle) -> Option<Statistics> {
        let _ = handle;
        None
    }

    /// Submit a packet list and block until it completes
    ///
    /// Packets are processed in order. Processing stops at the first packet
    /// that fails and its error is returned; packets before it stay
    /// completed.
    ///
    /// # Arguments
    /// * `handle` - Opened and configured controller
    /// * `packets` - Packet list, at least one element
    fn submit(&self, handle: &mut Self::Handle, packets: &mut [Packet<'_>]) -> DriverStatus;
}
