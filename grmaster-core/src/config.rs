//! Controller configuration types
//!
//! [`ControllerConfig`] is the per-instance setup a board provides once.
//! [`BusRequest`] is what a bus client asks for when it configures the bus.
//! Negotiation turns the two into [`NegotiatedParameters`].

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// Number of controllers on a GR716
pub const DEFAULT_CONTROLLERS: usize = 2;

/// Per-controller setup supplied by the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControllerConfig {
    /// Controller index (slot in the device registry)
    pub index: u8,
    /// Automatic hardware retries per packet
    pub retries: u32,
    /// Interrupt-driven (`true`) or polled (`false`) operation
    pub interrupt_enable: bool,
}

impl ControllerConfig {
    /// Polled controller with no retries
    pub const fn new(index: u8) -> Self {
        Self {
            index,
            retries: 0,
            interrupt_enable: false,
        }
    }

    /// Set the retry count
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Enable or disable interrupt-driven operation
    pub const fn with_interrupts(mut self, enabled: bool) -> Self {
        self.interrupt_enable = enabled;
        self
    }
}

/// Bus clock rate tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SpeedClass {
    /// 100 kHz
    #[default]
    Standard,
    /// 400 kHz
    Fast,
    /// 1 MHz
    FastPlus,
    /// 3.4 MHz
    High,
    /// 5 MHz
    Ultra,
}

impl SpeedClass {
    /// Nominal bus frequency in Hz
    pub const fn hz(self) -> u32 {
        match self {
            SpeedClass::Standard => 100_000,
            SpeedClass::Fast => 400_000,
            SpeedClass::FastPlus => 1_000_000,
            SpeedClass::High => 3_400_000,
            SpeedClass::Ultra => 5_000_000,
        }
    }

    /// Check if the controller can run at this speed
    pub const fn is_supported(self) -> bool {
        matches!(self, SpeedClass::Standard | SpeedClass::Fast)
    }

    /// Decode the 3-bit speed field of a configuration word
    pub const fn from_field(field: u32) -> Option<Self> {
        match field {
            1 => Some(SpeedClass::Standard),
            2 => Some(SpeedClass::Fast),
            3 => Some(SpeedClass::FastPlus),
            4 => Some(SpeedClass::High),
            5 => Some(SpeedClass::Ultra),
            _ => None,
        }
    }
}

/// Target address encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AddressWidth {
    /// 7-bit addresses
    #[default]
    Seven,
    /// 10-bit addresses
    Ten,
}

impl AddressWidth {
    /// Check if 10-bit addressing is selected
    pub const fn is_ten_bit(self) -> bool {
        matches!(self, AddressWidth::Ten)
    }
}

bitflags! {
    /// Generic bus configuration word
    ///
    /// ```text
    /// bit  0    10-bit addressing
    /// bits 1-3  speed class (1 Standard, 2 Fast, 3 Fast+, 4 High, 5 Ultra)
    /// bit  4    master mode
    /// ```
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConfigWord: u32 {
        /// Use 10-bit target addresses
        const ADDR_10_BITS = 1 << 0;
        /// Speed class field
        const SPEED = 0b111 << 1;
        /// Operate as bus master
        const MODE_MASTER = 1 << 4;

        const _ = !0;
    }
}

impl ConfigWord {
    const SPEED_SHIFT: u32 = 1;

    /// Build a word from its parts
    pub const fn compose(master: bool, speed: SpeedClass, width: AddressWidth) -> Self {
        let field = match speed {
            SpeedClass::Standard => 1,
            SpeedClass::Fast => 2,
            SpeedClass::FastPlus => 3,
            SpeedClass::High => 4,
            SpeedClass::Ultra => 5,
        };
        let mut bits = field << Self::SPEED_SHIFT;
        if master {
            bits |= Self::MODE_MASTER.bits();
        }
        if width.is_ten_bit() {
            bits |= Self::ADDR_10_BITS.bits();
        }
        Self::from_bits_retain(bits)
    }

    /// Raw value of the speed field
    pub const fn speed_field(self) -> u32 {
        (self.bits() & Self::SPEED.bits()) >> Self::SPEED_SHIFT
    }
}

/// Mode, speed and addressing requested by a bus client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusRequest {
    /// Master capability requested
    pub master: bool,
    /// Requested bus clock tier
    pub speed: SpeedClass,
    /// Requested target address encoding
    pub address_width: AddressWidth,
}

impl BusRequest {
    /// Master-mode request
    pub const fn master(speed: SpeedClass, address_width: AddressWidth) -> Self {
        Self {
            master: true,
            speed,
            address_width,
        }
    }

    /// Decode a [`ConfigWord`]
    ///
    /// Checks run in negotiation order: a word without the master bit is
    /// [`Error::UnsupportedMode`] whatever its speed field holds, and an
    /// unassigned speed code is [`Error::UnsupportedSpeed`].
    pub fn from_config_word(word: u32) -> Result<Self, Error> {
        let word = ConfigWord::from_bits_retain(word);

        if !word.contains(ConfigWord::MODE_MASTER) {
            return Err(Error::UnsupportedMode);
        }

        let speed = SpeedClass::from_field(word.speed_field()).ok_or(Error::UnsupportedSpeed)?;
        let address_width = if word.contains(ConfigWord::ADDR_10_BITS) {
            AddressWidth::Ten
        } else {
            AddressWidth::Seven
        };

        Ok(Self::master(speed, address_width))
    }

    /// Encode as a [`ConfigWord`]
    pub const fn config_word(&self) -> ConfigWord {
        ConfigWord::compose(self.master, self.speed, self.address_width)
    }
}

impl Default for BusRequest {
    fn default() -> Self {
        Self::master(SpeedClass::Standard, AddressWidth::Seven)
    }
}

/// Parameters applied to a controller by a successful configuration
///
/// Fixed for the lifetime of the handle; reconfiguring replaces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NegotiatedParameters {
    /// Bus clock tier (Standard or Fast)
    pub speed: SpeedClass,
    /// Target address encoding
    pub address_width: AddressWidth,
    /// Hardware retries per packet
    pub retries: u32,
    /// Interrupt-driven operation
    pub interrupt_enable: bool,
}

impl NegotiatedParameters {
    /// Bus frequency handed to the driver
    pub const fn speed_hz(&self) -> u32 {
        self.speed.hz()
    }
}
