// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Host-side stand-ins for the clock controller.

use core::cell::Cell;

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::InMemoryRegister;

use crate::platform::{ClockRegister, Delay};

/// An in-memory control register that counts the writes it receives.
pub struct FakeRegister {
    reg: InMemoryRegister<u32>,
    writes: Cell<usize>,
}

impl FakeRegister {
    pub fn new(value: u32) -> Self {
        FakeRegister {
            reg: InMemoryRegister::new(value),
            writes: Cell::new(0),
        }
    }

    pub fn value(&self) -> u32 {
        self.reg.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl ClockRegister for FakeRegister {
    fn read(&self) -> u32 {
        self.reg.get()
    }

    fn write(&self, value: u32) {
        self.writes.set(self.writes.get() + 1);
        self.reg.set(value);
    }
}

/// Records the busy-waits instead of spinning.
pub struct FakeDelay {
    calls: Cell<usize>,
    total_us: Cell<u32>,
}

impl FakeDelay {
    pub fn new() -> Self {
        FakeDelay {
            calls: Cell::new(0),
            total_us: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn total_us(&self) -> u32 {
        self.total_us.get()
    }
}

impl Delay for FakeDelay {
    fn delay_us(&self, us: u32) {
        self.calls.set(self.calls.get() + 1);
        self.total_us.set(self.total_us.get() + us);
    }
}
