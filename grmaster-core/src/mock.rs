//! Packet drivers for tests
//!
//! [`MockDriver`] records every driver call in order, tracks which
//! controllers are open, and lets a test make individual calls fail.
//! [`GateDriver`] is thread-safe and can hold one controller inside
//! `submit` until the test lets it go.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use std::vec::Vec;

use grmaster_hal::{
    DriverError, DriverStatus, Packet, PacketDriver, PacketPayload, Statistics,
};

/// Controllers the mock pretends to have
pub const MOCK_CONTROLLERS: u8 = 4;

/// A recorded driver call, tagged with the controller index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(u8),
    Close(u8),
    Stop(u8),
    SetRetries(u8, u32),
    SetSpeed(u8, u32),
    SetInterruptMode(u8, bool),
    SetTenBitAddressing(u8, bool),
    ClearStatistics(u8),
    Submit(u8, Vec<PacketRecord>),
}

/// What the driver saw of a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketRecord {
    pub read: bool,
    pub slave: u16,
    pub length: usize,
    pub ptr: usize,
}

impl PacketRecord {
    fn of(packet: &Packet<'_>) -> Self {
        Self {
            read: packet.is_read(),
            slave: packet.slave,
            length: packet.length(),
            ptr: packet.payload.as_ptr() as usize,
        }
    }
}

#[derive(Debug)]
pub struct MockHandle {
    index: u8,
}

impl MockHandle {
    pub fn index(&self) -> u8 {
        self.index
    }
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    open: [bool; MOCK_CONTROLLERS as usize],
    stats: [Statistics; MOCK_CONTROLLERS as usize],
    refuse_open: [bool; MOCK_CONTROLLERS as usize],
    stop_result: Option<DriverStatus>,
    retries: Option<DriverError>,
    speed: Option<DriverError>,
    interrupt_mode: Option<DriverError>,
    ten_bit: Option<DriverError>,
    fail_packet: Option<(usize, DriverError)>,
    executed: usize,
}

pub struct MockDriver {
    state: RefCell<State>,
}

impl MockDriver {
    /// Byte written into every read buffer
    pub const READ_FILL: u8 = 0x5A;

    pub fn new() -> Self {
        Self {
            state: RefCell::new(State::default()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Packet lists passed to `submit`, oldest first
    pub fn submissions(&self) -> Vec<Vec<PacketRecord>> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Submit(_, list) => Some(list.clone()),
                _ => None,
            })
            .collect()
    }

    /// Packets completed without error
    pub fn executed_packets(&self) -> usize {
        self.state.borrow().executed
    }

    pub fn is_open(&self, index: u8) -> bool {
        self.state.borrow().open[usize::from(index)]
    }

    pub fn fail_open(&self, index: u8) {
        self.state.borrow_mut().refuse_open[usize::from(index)] = true;
    }

    pub fn set_stop_result(&self, result: DriverStatus) {
        self.state.borrow_mut().stop_result = Some(result);
    }

    pub fn fail_set_retries(&self, error: DriverError) {
        self.state.borrow_mut().retries = Some(error);
    }

    pub fn fail_set_speed(&self, error: DriverError) {
        self.state.borrow_mut().speed = Some(error);
    }

    pub fn fail_set_interrupt_mode(&self, error: DriverError) {
        self.state.borrow_mut().interrupt_mode = Some(error);
    }

    pub fn fail_set_ten_bit_addressing(&self, error: DriverError) {
        self.state.borrow_mut().ten_bit = Some(error);
    }

    /// Fail the `nth` packet (counted from zero over all submissions)
    pub fn fail_packet(&self, nth: usize, error: DriverError) {
        self.state.borrow_mut().fail_packet = Some((nth, error));
    }

    /// Allow the next call of each kind to succeed again
    pub fn heal(&self) {
        let mut state = self.state.borrow_mut();
        state.retries = None;
        state.speed = None;
        state.interrupt_mode = None;
        state.ten_bit = None;
        state.fail_packet = None;
        state.refuse_open = [false; MOCK_CONTROLLERS as usize];
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }

    fn injected(&self, pick: impl FnOnce(&State) -> Option<DriverError>) -> DriverStatus {
        match pick(&*self.state.borrow()) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl PacketDriver for MockDriver {
    type Handle = MockHandle;

    fn open(&self, index: u8) -> Option<MockHandle> {
        self.record(Call::Open(index));
        let mut state = self.state.borrow_mut();
        let i = usize::from(index);
        if index >= MOCK_CONTROLLERS || state.open[i] || state.refuse_open[i] {
            return None;
        }
        state.open[i] = true;
        Some(MockHandle { index })
    }

    fn close(&self, handle: MockHandle) {
        self.record(Call::Close(handle.index));
        self.state.borrow_mut().open[usize::from(handle.index)] = false;
    }

    fn stop(&self, handle: &mut MockHandle) -> DriverStatus {
        self.record(Call::Stop(handle.index));
        self.state
            .borrow()
            .stop_result
            .unwrap_or(Err(DriverError::NotStarted))
    }

    fn set_retries(&self, handle: &mut MockHandle, retries: u32) -> DriverStatus {
        self.record(Call::SetRetries(handle.index, retries));
        self.injected(|s| s.retries)
    }

    fn set_speed(&self, handle: &mut MockHandle, hz: u32) -> DriverStatus {
        self.record(Call::SetSpeed(handle.index, hz));
        self.injected(|s| s.speed)
    }

    fn set_interrupt_mode(&self, handle: &mut MockHandle, enabled: bool) -> DriverStatus {
        self.record(Call::SetInterruptMode(handle.index, enabled));
        self.injected(|s| s.interrupt_mode)
    }

    fn set_ten_bit_addressing(&self, handle: &mut MockHandle, enabled: bool) -> DriverStatus {
        self.record(Call::SetTenBitAddressing(handle.index, enabled));
        self.injected(|s| s.ten_bit)
    }

    fn clear_statistics(&self, handle: &mut MockHandle) {
        self.record(Call::ClearStatistics(handle.index));
        self.state.borrow_mut().stats[usize::from(handle.index)] = Statistics::default();
    }

    fn statistics(&self, handle: &MockHandle) -> Option<Statistics> {
        Some(self.state.borrow().stats[usize::from(handle.index)])
    }

    fn submit(&self, handle: &mut MockHandle, packets: &mut [Packet<'_>]) -> DriverStatus {
        let records = packets.iter().map(PacketRecord::of).collect();
        self.record(Call::Submit(handle.index, records));

        let mut state = self.state.borrow_mut();
        let i = usize::from(handle.index);
        for packet in packets.iter_mut() {
            if let Some((nth, error)) = state.fail_packet {
                if state.executed == nth {
                    state.stats[i].failed += 1;
                    return Err(error);
                }
            }
            if let PacketPayload::Read(buf) = &mut packet.payload {
                buf.fill(Self::READ_FILL);
            }
            state.executed += 1;
            state.stats[i].completed += 1;
        }
        Ok(())
    }
}

const UNGATED: u8 = u8::MAX;

pub struct GateDriver {
    gated: AtomicU8,
    parked: AtomicBool,
    released: AtomicBool,
    opens: AtomicUsize,
}

impl GateDriver {
    pub const fn new() -> Self {
        Self {
            gated: AtomicU8::new(UNGATED),
            parked: AtomicBool::new(false),
            released: AtomicBool::new(false),
            opens: AtomicUsize::new(0),
        }
    }

    /// Hold the next submission on controller `index` until [`release`]
    ///
    /// [`release`]: Self::release
    pub fn hold(&self, index: u8) {
        self.released.store(false, Ordering::SeqCst);
        self.parked.store(false, Ordering::SeqCst);
        self.gated.store(index, Ordering::SeqCst);
    }

    /// Wait until the held submission has started
    pub fn wait_parked(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.parked.load(Ordering::SeqCst) {
            if Instant::now() > deadline {
                return false;
            }
            thread::yield_now();
        }
        true
    }

    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl PacketDriver for GateDriver {
    type Handle = u8;

    fn open(&self, index: u8) -> Option<u8> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Some(index)
    }

    fn close(&self, _handle: u8) {}

    fn stop(&self, _handle: &mut u8) -> DriverStatus {
        Err(DriverError::NotStarted)
    }

    fn set_retries(&self, _handle: &mut u8, _retries: u32) -> DriverStatus {
        Ok(())
    }

    fn set_speed(&self, _handle: &mut u8, _hz: u32) -> DriverStatus {
        Ok(())
    }

    fn set_interrupt_mode(&self, _handle: &mut u8, _enabled: bool) -> DriverStatus {
        Ok(())
    }

    fn set_ten_bit_addressing(&self, _handle: &mut u8, _enabled: bool) -> DriverStatus {
        Ok(())
    }

    fn clear_statistics(&self, _handle: &mut u8) {}

    fn submit(&self, handle: &mut u8, _packets: &mut [Packet<'_>]) -> DriverStatus {
        let held = self
            .gated
            .compare_exchange(*handle, UNGATED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if held {
            self.parked.store(true, Ordering::SeqCst);
            while !self.released.load(Ordering::SeqCst) {
                thread::yield_now();
            }
        }
        Ok(())
    }
}
