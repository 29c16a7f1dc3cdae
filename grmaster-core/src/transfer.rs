//! Message translation
//!
//! Converts generic bus messages into packets for the packet driver and
//! submits them in order. The first packet the driver rejects ends the
//! transfer; messages already on the wire stay done, there is no rollback.

use grmaster_hal::{Packet, PacketDriver};
use heapless::Vec;

use crate::Error;

/// Largest packet list handed to the driver by [`SubmitStrategy::Batched`]
pub const MAX_BATCH: usize = 8;

/// Data direction of a bus message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Target to master
    Read,
    /// Master to target
    Write,
}

/// One message of a transfer
///
/// The buffer stays borrowed from the caller; reads land in it directly.
#[derive(Debug)]
pub enum BusMessage<'a> {
    /// Fill the buffer from the target
    Read(&'a mut [u8]),
    /// Send the buffer to the target
    Write(&'a [u8]),
}

impl<'a> BusMessage<'a> {
    /// Direction of this message
    pub fn direction(&self) -> Direction {
        match self {
            BusMessage::Read(_) => Direction::Read,
            BusMessage::Write(_) => Direction::Write,
        }
    }

    /// Byte count
    pub fn len(&self) -> usize {
        match self {
            BusMessage::Read(buf) => buf.len(),
            BusMessage::Write(buf) => buf.len(),
        }
    }

    /// Check if the message carries no bytes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the message for a shorter lifetime
    pub fn reborrow(&mut self) -> BusMessage<'_> {
        match self {
            BusMessage::Read(buf) => BusMessage::Read(&mut **buf),
            BusMessage::Write(buf) => BusMessage::Write(*buf),
        }
    }

    /// Build the packet for this message
    ///
    /// Read maps to the driver's read flag, write to its absence. The
    /// packet borrows the message buffer as is.
    pub fn into_packet(self, address: u16) -> Packet<'a> {
        match self {
            BusMessage::Read(buf) => Packet::read(address, buf),
            BusMessage::Write(buf) => Packet::write(address, buf),
        }
    }
}

/// How the messages of one transfer reach the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubmitStrategy {
    /// One single-packet list per message
    #[default]
    PerMessage,
    /// Lists of up to [`MAX_BATCH`] packets
    Batched,
}

/// Submit `messages` to the driver in order
///
/// Expects at least one message. Returns the error of the first packet the
/// driver rejects; nothing after it is submitted.
pub fn submit<'b, D, I>(
    driver: &D,
    handle: &mut D::Handle,
    index: u8,
    address: u16,
    strategy: SubmitStrategy,
    messages: I,
) -> Result<(), Error>
where
    D: PacketDriver,
    I: Iterator<Item = BusMessage<'b>>,
{
    match strategy {
        SubmitStrategy::PerMessage => submit_each(driver, handle, index, address, messages),
        SubmitStrategy::Batched => submit_batched(driver, handle, index, address, messages),
    }
}

fn submit_each<'b, D, I>(
    driver: &D,
    handle: &mut D::Handle,
    index: u8,
    address: u16,
    messages: I,
) -> Result<(), Error>
where
    D: PacketDriver,
    I: Iterator<Item = BusMessage<'b>>,
{
    for (n, message) in messages.enumerate() {
        let mut list = [message.into_packet(address)];
        trace!(
            "i2c{}: packet {} to {:#x}, {} bytes",
            index,
            n,
            address,
            list[0].length()
        );

        if let Err(e) = driver.submit(handle, &mut list) {
            error!("i2c{}: request failed at message {}: {:?}", index, n, e);
            return Err(Error::HardwareTransferFailed(e));
        }
    }

    Ok(())
}

fn submit_batched<'b, D, I>(
    driver: &D,
    handle: &mut D::Handle,
    index: u8,
    address: u16,
    mut messages: I,
) -> Result<(), Error>
where
    D: PacketDriver,
    I: Iterator<Item = BusMessage<'b>>,
{
    loop {
        let mut list: Vec<Packet<'b>, MAX_BATCH> = messages
            .by_ref()
            .take(MAX_BATCH)
            .map(|m| m.into_packet(address))
            .collect();

        if list.is_empty() {
            return Ok(());
        }

        trace!("i2c{}: list of {} packets to {:#x}", index, list.len(), address);

        if let Err(e) = driver.submit(handle, &mut list) {
            error!("i2c{}: list request failed: {:?}", index, e);
            return Err(Error::HardwareTransferFailed(e));
        }
    }
}
