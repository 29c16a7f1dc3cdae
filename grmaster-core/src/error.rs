//! Bus layer errors

use core::fmt;

use grmaster_hal::DriverError;

/// Errors returned by [`configure`] and [`transfer`]
///
/// Kinds that carry a [`DriverError`] were rejected by the packet driver;
/// the rest are detected by this layer before the hardware is touched.
///
/// [`configure`]: crate::BusManager::configure
/// [`transfer`]: crate::BusManager::transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Master mode was not requested
    UnsupportedMode,
    /// Requested speed class is neither Standard nor Fast
    UnsupportedSpeed,
    /// Controller could not be opened (invalid index or already claimed)
    DeviceUnavailable,
    /// Driver rejected the retry count
    RetryConfigFailed(DriverError),
    /// Driver rejected the bus frequency
    SpeedConfigFailed(DriverError),
    /// Driver rejected the interrupt mode
    InterruptConfigFailed(DriverError),
    /// Driver rejected the addressing width
    AddressWidthConfigFailed(DriverError),
    /// Transfer on a controller that has not been configured
    DeviceNotConfigured,
    /// Another configure or transfer is running on the controller
    ControllerBusy,
    /// Packet submission failed during a transfer
    HardwareTransferFailed(DriverError),
}

impl Error {
    /// Check if repeating the same call may succeed
    ///
    /// Hardware transfer failures and busy controllers are transient. Every
    /// other kind needs a change of configuration or call sequence first.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::HardwareTransferFailed(_) | Error::ControllerBusy)
    }

    /// Check if this error comes from negotiating or applying a configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedMode
                | Error::UnsupportedSpeed
                | Error::RetryConfigFailed(_)
                | Error::SpeedConfigFailed(_)
                | Error::InterruptConfigFailed(_)
                | Error::AddressWidthConfigFailed(_)
        )
    }

    /// Driver status behind this error, if the driver reported one
    pub fn driver_error(&self) -> Option<DriverError> {
        match *self {
            Error::RetryConfigFailed(e)
            | Error::SpeedConfigFailed(e)
            | Error::InterruptConfigFailed(e)
            | Error::AddressWidthConfigFailed(e)
            | Error::HardwareTransferFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedMode => f.write_str("master mode not requested"),
            Error::UnsupportedSpeed => {
                f.write_str("unsupported speed, must be either 100000 or 400000 Hz")
            }
            Error::DeviceUnavailable => f.write_str("controller could not be opened"),
            Error::RetryConfigFailed(e) => write!(f, "setting retries failed: {}", e),
            Error::SpeedConfigFailed(e) => write!(f, "setting speed failed: {}", e),
            Error::InterruptConfigFailed(e) => write!(f, "setting interrupt mode failed: {}", e),
            Error::AddressWidthConfigFailed(e) => {
                write!(f, "setting address width failed: {}", e)
            }
            Error::DeviceNotConfigured => f.write_str("controller not configured"),
            Error::ControllerBusy => f.write_str("controller in use by another call"),
            Error::HardwareTransferFailed(e) => write!(f, "packet submission failed: {}", e),
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        // The packet driver does not report NACK or arbitration causes.
        embedded_hal::i2c::ErrorKind::Other
    }
}
