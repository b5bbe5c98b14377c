// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Single-field dividers.

use log::debug;

use crate::bitfield::BitField;
use crate::clocks::RateOps;
use crate::config::CONFIG;
use crate::factors::{min_divisor, order_base_2};
use crate::platform::ClockRegister;
use crate::ErrorCode;

/// One stored code of a table divider and the divisor it selects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DivTableEntry {
    pub val: u32,
    pub div: u32,
}

/// How the stored field maps to a divisor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DividerKind {
    /// `div = val + 1`
    Linear,
    /// `div = 1 << val`
    PowerOfTwo,
    /// Explicit code/divisor pairs, sorted by non-decreasing divisor.
    Table(&'static [DivTableEntry]),
}

pub struct Divider<'a> {
    reg: &'a dyn ClockRegister,
    field: BitField,
    kind: DividerKind,
}

impl<'a> Divider<'a> {
    pub fn new(reg: &'a dyn ClockRegister, field: BitField, kind: DividerKind) -> Self {
        Divider { reg, field, kind }
    }

    fn divisor_for(&self, val: u32) -> Result<u32, ErrorCode> {
        match self.kind {
            DividerKind::Linear => Ok(val + 1),
            DividerKind::PowerOfTwo => 1u32.checked_shl(val).ok_or(ErrorCode::INVAL),
            DividerKind::Table(table) => table
                .iter()
                .find(|entry| entry.val == val)
                .map(|entry| entry.div)
                .ok_or(ErrorCode::INVAL),
        }
    }

    /// Stored code and divisor of the smallest divisor whose output does
    /// not exceed `rate`. Saturates at the largest divisor.
    fn best_divisor(&self, rate: u32, parent_rate: u32) -> (u32, u32) {
        let wanted = min_divisor(parent_rate, rate);
        match self.kind {
            DividerKind::Linear => {
                let div = wanted.clamp(1, self.field.max().saturating_add(1));
                (div - 1, div)
            }
            DividerKind::PowerOfTwo => {
                let val = order_base_2(wanted).min(self.field.max()).min(31);
                (val, 1 << val)
            }
            DividerKind::Table(table) => {
                let largest = table.last().map_or(1, |entry| entry.div);
                let wanted = wanted.min(largest);
                table
                    .iter()
                    .find(|entry| entry.div >= wanted)
                    .map_or((0, 1), |entry| (entry.val, entry.div))
            }
        }
    }
}

impl RateOps for Divider<'_> {
    fn recalc_rate(&self, parent_rate: u32) -> Result<u32, ErrorCode> {
        let val = self.field.extract(self.reg.read());
        let div = self.divisor_for(val)?;
        Ok(parent_rate / div.max(1))
    }

    fn round_rate(&self, rate: u32, parent_rate: u32) -> u32 {
        let (_, div) = self.best_divisor(rate, parent_rate);
        parent_rate / div.max(1)
    }

    fn set_rate(&self, rate: u32, parent_rate: u32) -> Result<(), ErrorCode> {
        let (val, div) = self.best_divisor(rate, parent_rate);
        self.reg.write(self.field.insert(self.reg.read(), val));
        if CONFIG.trace_rate_changes {
            debug!("sunxi: divider {} Hz -> /{}", rate, div);
        }
        Ok(())
    }
}
