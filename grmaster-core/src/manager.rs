//! Bus manager
//!
//! Owns the packet driver and the device registry, and exposes the two
//! bus-client operations: configure a controller once, then transfer
//! through it any number of times.
//!
//! # Example
//!
//! ```ignore
//! let bus: BusManager<Gr716Driver, CriticalSectionRawMutex> = BusManager::new(driver);
//!
//! bus.configure(
//!     &ControllerConfig::new(0).with_retries(3),
//!     BusRequest::master(SpeedClass::Fast, AddressWidth::Seven),
//! )?;
//!
//! let mut reading = [0u8; 2];
//! bus.transfer(
//!     0,
//!     &mut [BusMessage::Write(&[0x00]), BusMessage::Read(&mut reading)],
//!     0x48,
//! )?;
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use grmaster_hal::{PacketDriver, Statistics};

use crate::config::{
    BusRequest, ControllerConfig, NegotiatedParameters, DEFAULT_CONTROLLERS,
};
use crate::hal::Controller;
use crate::negotiate::{negotiate, open_configured};
use crate::registry::{ClaimError, Registry, Slot};
use crate::transfer::{self, BusMessage, SubmitStrategy};
use crate::Error;

/// Configure-once, transfer-many front end for up to `N` controllers
///
/// All operations take `&self`. The registry lock is only held while a
/// controller's handle is checked out or put back, never across a driver
/// call, so controllers never contend with each other. A configure or
/// transfer that finds its controller checked out by another call fails
/// with [`Error::ControllerBusy`] instead of interleaving with it.
pub struct BusManager<D: PacketDriver, M: RawMutex, const N: usize = DEFAULT_CONTROLLERS> {
    driver: D,
    registry: Registry<D::Handle, M, N>,
    strategy: SubmitStrategy,
}

impl<D: PacketDriver, M: RawMutex, const N: usize> BusManager<D, M, N> {
    /// Create a manager with every controller unconfigured
    pub const fn new(driver: D) -> Self {
        Self {
            driver,
            registry: Registry::new(),
            strategy: SubmitStrategy::PerMessage,
        }
    }

    /// Select how transfers are handed to the driver
    pub fn with_strategy(mut self, strategy: SubmitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Submission strategy in use
    pub fn strategy(&self) -> SubmitStrategy {
        self.strategy
    }

    /// The packet driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Number of controller slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Negotiate `request` and apply it to controller `config.index`
    ///
    /// Nothing is touched when the request is rejected during negotiation.
    /// Past that point a handle already held for the controller is closed
    /// first, since the driver hands out a controller only once. On success
    /// the new handle replaces it in the registry; on failure the slot is
    /// left empty and the new handle is closed.
    pub fn configure(&self, config: &ControllerConfig, request: BusRequest) -> Result<(), Error> {
        let params = negotiate(config, &request)?;
        let index = config.index;

        let mut slot = self.registry.claim(index).map_err(|e| match e {
            ClaimError::OutOfRange => {
                error!("i2c{}: no such controller", index);
                Error::DeviceUnavailable
            }
            ClaimError::Busy => {
                error!("i2c{}: busy, configure refused", index);
                Error::ControllerBusy
            }
        })?;

        if let Some(previous) = slot.take() {
            debug!("i2c{}: closing previous handle", index);
            self.driver.close(previous.handle);
        }

        let handle = open_configured(&self.driver, index, &params)?;
        *slot = Some(Slot { handle, params });

        info!(
            "i2c{}: configured, {} Hz, 10-bit {}, {} retries",
            index,
            params.speed_hz(),
            params.address_width.is_ten_bit(),
            params.retries
        );
        Ok(())
    }

    /// Decode a [`ConfigWord`](crate::ConfigWord) and configure with it
    pub fn configure_word(&self, config: &ControllerConfig, word: u32) -> Result<(), Error> {
        let request = BusRequest::from_config_word(word).map_err(|e| {
            error!("i2c{}: config word {:#x} rejected: {:?}", config.index, word, e);
            e
        })?;
        self.configure(config, request)
    }

    /// Run `messages` in order against `address` on controller `index`
    ///
    /// An empty message list succeeds without touching the driver. The first
    /// message the driver rejects ends the transfer with
    /// [`Error::HardwareTransferFailed`]; messages before it are not undone.
    pub fn transfer(
        &self,
        index: u8,
        messages: &mut [BusMessage<'_>],
        address: u16,
    ) -> Result<(), Error> {
        self.transfer_iter(index, address, messages.iter_mut().map(BusMessage::reborrow))
    }

    /// Like [`transfer`](Self::transfer), over any message iterator
    pub fn transfer_iter<'b, I>(&self, index: u8, address: u16, messages: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = BusMessage<'b>>,
    {
        let mut messages = messages.into_iter().peekable();
        if messages.peek().is_none() {
            return Ok(());
        }

        let mut slot = match self.registry.claim(index) {
            Ok(slot) => slot,
            Err(ClaimError::Busy) => {
                error!("i2c{}: busy, transfer refused", index);
                return Err(Error::ControllerBusy);
            }
            Err(ClaimError::OutOfRange) => {
                error!("i2c{}: transfer on unconfigured controller", index);
                return Err(Error::DeviceNotConfigured);
            }
        };

        let Some(configured) = slot.as_mut() else {
            error!("i2c{}: transfer on unconfigured controller", index);
            return Err(Error::DeviceNotConfigured);
        };

        transfer::submit(
            &self.driver,
            &mut configured.handle,
            index,
            address,
            self.strategy,
            messages,
        )
    }

    /// Close controller `index` and empty its slot
    ///
    /// Returns `false` if there was nothing to release or the controller is
    /// in use by another call.
    pub fn release(&self, index: u8) -> bool {
        let Ok(mut slot) = self.registry.claim(index) else {
            return false;
        };

        match slot.take() {
            Some(previous) => {
                self.driver.close(previous.handle);
                debug!("i2c{}: released", index);
                true
            }
            None => false,
        }
    }

    /// Check if controller `index` has been configured
    pub fn is_configured(&self, index: u8) -> bool {
        self.registry.is_occupied(index)
    }

    /// Parameters controller `index` was configured with
    pub fn negotiated(&self, index: u8) -> Option<NegotiatedParameters> {
        self.registry.params(index)
    }

    /// Driver counters for controller `index`
    ///
    /// `None` while another call is using the controller.
    pub fn statistics(&self, index: u8) -> Option<Statistics> {
        let slot = self.registry.claim(index).ok()?;
        slot.as_ref().and_then(|s| self.driver.statistics(&s.handle))
    }

    /// `embedded-hal` view of controller `index`
    ///
    /// The controller does not need to be configured yet; transactions on it
    /// fail with [`Error::DeviceNotConfigured`] until it is.
    pub fn controller(&self, index: u8) -> Controller<'_, D, M, N> {
        Controller::new(self, index)
    }
}
