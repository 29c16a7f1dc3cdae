//! Configuration negotiation
//!
//! Turns a [`ControllerConfig`] and a [`BusRequest`] into
//! [`NegotiatedParameters`], then opens a controller and applies them.
//!
//! Validation runs before the driver is touched. Once a handle is open,
//! every driver step that fails closes it again before the error is
//! returned, so a failed configuration never leaks a controller.

use grmaster_hal::{DriverError, DriverStatus, PacketDriver};

use crate::config::{BusRequest, ControllerConfig, NegotiatedParameters};
use crate::Error;

/// Validate a request against what the controller supports
///
/// Fails with [`Error::UnsupportedMode`] when master mode is not requested
/// and with [`Error::UnsupportedSpeed`] for anything but Standard or Fast.
pub fn negotiate(
    config: &ControllerConfig,
    request: &BusRequest,
) -> Result<NegotiatedParameters, Error> {
    if !request.master {
        error!("i2c{}: master mode not requested", config.index);
        return Err(Error::UnsupportedMode);
    }

    if !request.speed.is_supported() {
        error!(
            "i2c{}: speed {} Hz unsupported, must be either 100000 or 400000",
            config.index,
            request.speed.hz()
        );
        return Err(Error::UnsupportedSpeed);
    }

    Ok(NegotiatedParameters {
        speed: request.speed,
        address_width: request.address_width,
        retries: config.retries,
        interrupt_enable: config.interrupt_enable,
    })
}

/// Open controller `index` and configure it with `params`
///
/// Returns the configured handle with cleared statistics. The handle is not
/// published anywhere; that is up to the caller.
pub fn open_configured<D: PacketDriver>(
    driver: &D,
    index: u8,
    params: &NegotiatedParameters,
) -> Result<D::Handle, Error> {
    let Some(mut handle) = driver.open(index) else {
        error!("i2c{}: open failed", index);
        return Err(Error::DeviceUnavailable);
    };

    match unexpected_stop(driver.stop(&mut handle)) {
        Some(e) => {
            warn!("i2c{}: stop failed ({:?}), continuing", index, e);
        }
        None => {
            debug!("i2c{}: controller idle", index);
        }
    }

    if let Err(e) = apply(driver, &mut handle, params) {
        error!("i2c{}: configuration failed: {:?}", index, e);
        driver.close(handle);
        return Err(e);
    }

    driver.clear_statistics(&mut handle);
    Ok(handle)
}

/// Error from stopping a freshly opened controller, unless it only says the
/// controller was not running
fn unexpected_stop(status: DriverStatus) -> Option<DriverError> {
    match status {
        Ok(()) | Err(DriverError::NotStarted) => None,
        Err(e) => Some(e),
    }
}

/// Apply parameters to an opened handle, one driver call each
///
/// Stops at the first rejected call.
fn apply<D: PacketDriver>(
    driver: &D,
    handle: &mut D::Handle,
    params: &NegotiatedParameters,
) -> Result<(), Error> {
    driver
        .set_retries(handle, params.retries)
        .map_err(Error::RetryConfigFailed)?;
    driver
        .set_speed(handle, params.speed_hz())
        .map_err(Error::SpeedConfigFailed)?;
    driver
        .set_interrupt_mode(handle, params.interrupt_enable)
        .map_err(Error::InterruptConfigFailed)?;
    driver
        .set_ten_bit_addressing(handle, params.address_width.is_ten_bit())
        .map_err(Error::AddressWidthConfigFailed)?;
    Ok(())
}
