// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! One-bit clock gate. A set bit lets the clock through.
//!
//! Besides being the gate stage of composites, a gate is also a clock of its
//! own: the bus gate banks register one per peripheral, passing the rate of
//! their single parent through.

use crate::clocks::ClockOps;
use crate::platform::ClockRegister;
use crate::ErrorCode;

pub struct Gate<'a> {
    reg: &'a dyn ClockRegister,
    bit: u8,
}

impl<'a> Gate<'a> {
    pub fn new(reg: &'a dyn ClockRegister, bit: u8) -> Self {
        Gate { reg, bit: bit.min(31) }
    }

    pub fn enable(&self) {
        self.reg.write(self.reg.read() | (1 << self.bit));
    }

    pub fn disable(&self) {
        self.reg.write(self.reg.read() & !(1 << self.bit));
    }

    pub fn is_enabled(&self) -> bool {
        self.reg.read() & (1 << self.bit) != 0
    }
}

impl ClockOps for Gate<'_> {
    fn recalc_rate(&self, parent_rate: u32) -> Result<u32, ErrorCode> {
        Ok(parent_rate)
    }

    fn round_rate(&self, _rate: u32, parent_rate: u32) -> u32 {
        parent_rate
    }

    fn set_rate(&self, _rate: u32, _parent_rate: u32) -> Result<(), ErrorCode> {
        Ok(())
    }

    fn get_parent(&self) -> Result<usize, ErrorCode> {
        Ok(0)
    }

    fn set_parent(&self, index: usize) -> Result<(), ErrorCode> {
        match index {
            0 => Ok(()),
            _ => Err(ErrorCode::INVAL),
        }
    }

    fn enable(&self) {
        Gate::enable(self)
    }

    fn disable(&self) {
        Gate::disable(self)
    }

    fn is_enabled(&self) -> bool {
        Gate::is_enabled(self)
    }
}
