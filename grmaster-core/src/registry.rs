//! Device registry
//!
//! Fixed-capacity table of opened controller handles, indexed by controller
//! number. Each slot sits behind its own blocking mutex, held only long
//! enough to move a handle in or out. Driver calls run on a [`Claim`] with
//! the lock released, so a transfer on one controller never waits on
//! another. A second claim on a controller that is already claimed is
//! refused until the first one is dropped.

use core::cell::RefCell;
use core::ops::{Deref, DerefMut};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::NegotiatedParameters;

/// Configured controller: the handle plus the parameters applied to it
#[derive(Debug)]
pub struct Slot<H> {
    /// Handle returned by the packet driver
    pub handle: H,
    /// Parameters the handle was configured with
    pub params: NegotiatedParameters,
}

enum Entry<H> {
    Vacant,
    Ready(Slot<H>),
    // Checked out; the parameters stay readable meanwhile
    Claimed(Option<NegotiatedParameters>),
}

/// Why a slot could not be claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClaimError {
    /// Index outside the table
    OutOfRange,
    /// Another claim on the slot is still alive
    Busy,
}

/// Table of controller handles
///
/// A slot is empty, holds exactly one configured handle, or is claimed.
pub struct Registry<H, M: RawMutex, const N: usize> {
    slots: [Mutex<M, RefCell<Entry<H>>>; N],
}

impl<H, M: RawMutex, const N: usize> Registry<H, M, N> {
    const VACANT: Mutex<M, RefCell<Entry<H>>> = Mutex::new(RefCell::new(Entry::Vacant));

    /// Create a registry with all slots empty
    pub const fn new() -> Self {
        Self {
            slots: [Self::VACANT; N],
        }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Take exclusive use of the slot at `index`
    ///
    /// The lock is only held while the slot is checked out. Whatever the
    /// claim holds when it is dropped is put back: a handle makes the slot
    /// configured again, `None` leaves it empty.
    pub fn claim(&self, index: u8) -> Result<Claim<'_, H, M>, ClaimError> {
        let cell = self
            .slots
            .get(usize::from(index))
            .ok_or(ClaimError::OutOfRange)?;

        let slot = cell.lock(|entry| {
            let mut entry = entry.borrow_mut();
            match core::mem::replace(&mut *entry, Entry::Claimed(None)) {
                Entry::Vacant => Ok(None),
                Entry::Ready(slot) => {
                    *entry = Entry::Claimed(Some(slot.params));
                    Ok(Some(slot))
                }
                Entry::Claimed(params) => {
                    *entry = Entry::Claimed(params);
                    Err(ClaimError::Busy)
                }
            }
        })?;

        Ok(Claim { cell, slot })
    }

    /// Check if the slot at `index` holds a handle, claimed or not
    pub fn is_occupied(&self, index: u8) -> bool {
        self.params(index).is_some()
    }

    /// Parameters of the handle at `index`
    pub fn params(&self, index: u8) -> Option<NegotiatedParameters> {
        self.slots.get(usize::from(index))?.lock(|entry| match &*entry.borrow() {
            Entry::Vacant => None,
            Entry::Ready(slot) => Some(slot.params),
            Entry::Claimed(params) => *params,
        })
    }
}

impl<H, M: RawMutex, const N: usize> Default for Registry<H, M, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Checked-out registry slot
///
/// Derefs to the slot contents. Dropping it returns the contents to the
/// registry.
pub struct Claim<'r, H, M: RawMutex> {
    cell: &'r Mutex<M, RefCell<Entry<H>>>,
    slot: Option<Slot<H>>,
}

impl<H, M: RawMutex> Deref for Claim<'_, H, M> {
    type Target = Option<Slot<H>>;

    fn deref(&self) -> &Self::Target {
        &self.slot
    }
}

impl<H, M: RawMutex> DerefMut for Claim<'_, H, M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.slot
    }
}

impl<H, M: RawMutex> Drop for Claim<'_, H, M> {
    fn drop(&mut self) {
        let entry = match self.slot.take() {
            Some(slot) => Entry::Ready(slot),
            None => Entry::Vacant,
        };
        self.cell.lock(|cell| *cell.borrow_mut() = entry);
    }
}
