// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! What the clock tree needs from the platform: 32-bit register access and a
//! microsecond busy-wait.

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::{InMemoryRegister, ReadWrite};

/// A single 32-bit clock control register.
///
/// Accesses are assumed to be ordered, uncached and to take effect
/// immediately. Clocks only ever do read-modify-write sequences through this
/// trait; they never cache a register value between calls.
pub trait ClockRegister {
    fn read(&self) -> u32;
    fn write(&self, value: u32);
}

impl ClockRegister for ReadWrite<u32> {
    fn read(&self) -> u32 {
        self.get()
    }

    fn write(&self, value: u32) {
        self.set(value)
    }
}

/// Host-side emulation of a control register.
impl ClockRegister for InMemoryRegister<u32> {
    fn read(&self) -> u32 {
        self.get()
    }

    fn write(&self, value: u32) {
        self.set(value)
    }
}

/// Monotonic busy-wait used after PLL reconfiguration.
///
/// Clock setup runs before timers and interrupts are available, so this must
/// not sleep or yield.
pub trait Delay {
    fn delay_us(&self, us: u32);
}

/// Get the `count` consecutive clock control registers mapped at `address`,
/// as handed to [`crate::setup::ClockNode::regs`].
///
/// # Safety
///
/// `address` must be the address of `count` mapped, 4-byte aligned clock
/// control registers that stay mapped for the lifetime of the program.
pub unsafe fn mmio_registers(address: usize, count: usize) -> &'static [ReadWrite<u32>] {
    core::slice::from_raw_parts(address as *const ReadWrite<u32>, count)
}
