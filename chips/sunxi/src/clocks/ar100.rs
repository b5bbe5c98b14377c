// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! A31 AR100 (embedded OpenRISC core) rate stage: `(parent >> shift) / div`.

use log::debug;
use tock_registers::{register_bitfields, LocalRegisterCopy};

use crate::clocks::RateOps;
use crate::config::CONFIG;
use crate::factors::min_divisor;
use crate::platform::ClockRegister;
use crate::ErrorCode;

register_bitfields![u32,
    AR100_CFG [
        DIV_SHIFT OFFSET(4) NUMBITS(2) [],
        DIV OFFSET(8) NUMBITS(5) [],
        CLK_SRC_SEL OFFSET(16) NUMBITS(2) [
            LOSC = 0,
            OSC24M = 1,
            PLL6 = 2,
            PLL6_2 = 3
        ]
    ]
];

/// Parents wired to `CLK_SRC_SEL`.
pub const AR100_MAX_PARENTS: usize = 4;

const SHIFT_MAX: u32 = 3;
const DIV_MAX: u32 = 32;

/// Shift and linear divider for the slowest rate not above `rate`.
///
/// The shift takes the powers of two out of the divisor first, as long as
/// that loses nothing. It only grows further while the remaining divider
/// does not fit, and the divider is then rounded up. Past `>> 3 / 32` the
/// slowest rate is used.
fn ar100_divs(rate: u32, parent_rate: u32) -> (u32, u32) {
    let wanted = min_divisor(parent_rate, rate);
    let mut shift = wanted.trailing_zeros().min(SHIFT_MAX);
    while wanted.div_ceil(1 << shift) > DIV_MAX && shift < SHIFT_MAX {
        shift += 1;
    }
    (shift, wanted.div_ceil(1 << shift).clamp(1, DIV_MAX))
}

pub struct Ar100<'a> {
    reg: &'a dyn ClockRegister,
}

impl<'a> Ar100<'a> {
    pub fn new(reg: &'a dyn ClockRegister) -> Self {
        Ar100 { reg }
    }
}

impl RateOps for Ar100<'_> {
    fn recalc_rate(&self, parent_rate: u32) -> Result<u32, ErrorCode> {
        let cfg = LocalRegisterCopy::<u32, AR100_CFG::Register>::new(self.reg.read());
        let shift = cfg.read(AR100_CFG::DIV_SHIFT);
        let div = cfg.read(AR100_CFG::DIV);
        Ok((parent_rate >> shift) / (div + 1))
    }

    fn round_rate(&self, rate: u32, parent_rate: u32) -> u32 {
        let (shift, div) = ar100_divs(rate, parent_rate);
        (parent_rate >> shift) / div
    }

    fn set_rate(&self, rate: u32, parent_rate: u32) -> Result<(), ErrorCode> {
        let (shift, div) = ar100_divs(rate, parent_rate);

        let mut cfg = LocalRegisterCopy::<u32, AR100_CFG::Register>::new(self.reg.read());
        cfg.modify(AR100_CFG::DIV_SHIFT.val(shift) + AR100_CFG::DIV.val(div - 1));
        self.reg.write(cfg.get());

        if CONFIG.trace_rate_changes {
            debug!("sunxi: ar100 {} Hz -> >> {} / {}", rate, shift, div);
        }
        Ok(())
    }
}
