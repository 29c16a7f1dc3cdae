//! `embedded-hal` adapter
//!
//! Lets drivers written against `embedded_hal::i2c::I2c` run on a
//! [`BusManager`] controller. Each transaction becomes one transfer: every
//! operation turns into one message, all sharing the transaction address.
//!
//! The packet driver issues start and stop per packet, so adjacent
//! operations are not merged into one bus transaction the way the
//! `embedded-hal` contract describes for native controllers.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress, TenBitAddress};
use grmaster_hal::PacketDriver;

use crate::manager::BusManager;
use crate::transfer::BusMessage;
use crate::Error;

impl<'a> From<&'a mut Operation<'_>> for BusMessage<'a> {
    fn from(operation: &'a mut Operation<'_>) -> Self {
        match operation {
            Operation::Read(buf) => BusMessage::Read(&mut **buf),
            Operation::Write(buf) => BusMessage::Write(*buf),
        }
    }
}

/// One controller of a [`BusManager`], as an `embedded-hal` I2C bus
pub struct Controller<'m, D: PacketDriver, M: RawMutex, const N: usize> {
    bus: &'m BusManager<D, M, N>,
    index: u8,
}

impl<'m, D: PacketDriver, M: RawMutex, const N: usize> Controller<'m, D, M, N> {
    pub(crate) fn new(bus: &'m BusManager<D, M, N>, index: u8) -> Self {
        Self { bus, index }
    }

    /// Controller index
    pub fn index(&self) -> u8 {
        self.index
    }
}

impl<D: PacketDriver, M: RawMutex, const N: usize> ErrorType for Controller<'_, D, M, N> {
    type Error = Error;
}

impl<D: PacketDriver, M: RawMutex, const N: usize> I2c<SevenBitAddress>
    for Controller<'_, D, M, N>
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.bus.transfer_iter(
            self.index,
            u16::from(address),
            operations.iter_mut().map(BusMessage::from),
        )
    }
}

impl<D: PacketDriver, M: RawMutex, const N: usize> I2c<TenBitAddress>
    for Controller<'_, D, M, N>
{
    fn transaction(
        &mut self,
        address: TenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.bus
            .transfer_iter(self.index, address, operations.iter_mut().map(BusMessage::from))
    }
}
