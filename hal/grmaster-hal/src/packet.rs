//! Packet representation
//!
//! A packet is what the vendor driver moves on the wire in one go: a
//! direction flag, the target address, and a borrowed payload buffer. The
//! payload is never copied; the driver reads from or writes into the
//! caller's memory directly.

use bitflags::bitflags;

bitflags! {
    /// Packet flags understood by the packet driver
    ///
    /// The driver only knows two directions. A packet without [`READ`] is a
    /// write.
    ///
    /// [`READ`]: PacketFlags::READ
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PacketFlags: u32 {
        /// Transfer from the target into the payload buffer
        const READ = 1 << 0;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PacketFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PacketFlags({=u32:#x})", self.bits());
    }
}

/// Borrowed payload of a packet
#[derive(Debug)]
pub enum PacketPayload<'a> {
    /// Buffer the driver fills from the target
    Read(&'a mut [u8]),
    /// Buffer the driver sends to the target
    Write(&'a [u8]),
}

impl PacketPayload<'_> {
    /// Payload length in bytes
    pub fn len(&self) -> usize {
        match self {
            PacketPayload::Read(buf) => buf.len(),
            PacketPayload::Write(buf) => buf.len(),
        }
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Address of the first payload byte
    ///
    /// Useful for checking that a buffer was passed through without a copy.
    pub fn as_ptr(&self) -> *const u8 {
        match self {
            PacketPayload::Read(buf) => buf.as_ptr(),
            PacketPayload::Write(buf) => buf.as_ptr(),
        }
    }
}

/// One unit of transfer for the packet driver
#[derive(Debug)]
pub struct Packet<'a> {
    /// Direction flags
    pub flags: PacketFlags,
    /// Target (slave) address, 7 or 10 bits depending on the handle setup
    pub slave: u16,
    /// Payload buffer, borrowed from the caller
    pub payload: PacketPayload<'a>,
}

impl<'a> Packet<'a> {
    /// Build a read packet that fills `buf` from `slave`
    pub fn read(slave: u16, buf: &'a mut [u8]) -> Self {
        Self {
            flags: PacketFlags::READ,
            slave,
            payload: PacketPayload::Read(buf),
        }
    }

    /// Build a write packet that sends `buf` to `slave`
    pub fn write(slave: u16, buf: &'a [u8]) -> Self {
        Self {
            flags: PacketFlags::empty(),
            slave,
            payload: PacketPayload::Write(buf),
        }
    }

    /// Number of payload bytes
    pub fn length(&self) -> usize {
        self.payload.len()
    }

    /// Check if this packet reads from the target
    pub fn is_read(&self) -> bool {
        self.flags.contains(PacketFlags::READ)
    }
}
