// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Parent selector.
//!
//! The field normally stores the parent index itself. Some muxes skip codes
//! (the A20 GMAC one only knows codes 0 and 2); those carry a table mapping
//! each parent index to its code.

use log::debug;

use crate::bitfield::BitField;
use crate::config::CONFIG;
use crate::platform::ClockRegister;
use crate::ErrorCode;

pub struct Mux<'a> {
    reg: &'a dyn ClockRegister,
    field: BitField,
    table: Option<&'static [u32]>,
    num_parents: usize,
}

impl<'a> Mux<'a> {
    pub fn new(
        reg: &'a dyn ClockRegister,
        field: BitField,
        table: Option<&'static [u32]>,
        num_parents: usize,
    ) -> Self {
        Mux {
            reg,
            field,
            table,
            num_parents,
        }
    }

    pub fn num_parents(&self) -> usize {
        self.num_parents
    }

    pub fn get_parent(&self) -> Result<usize, ErrorCode> {
        let raw = self.field.extract(self.reg.read());
        let index = match self.table {
            Some(table) => table
                .iter()
                .position(|&code| code == raw)
                .ok_or(ErrorCode::INVAL)?,
            None => raw as usize,
        };
        if index >= self.num_parents {
            return Err(ErrorCode::INVAL);
        }
        Ok(index)
    }

    pub fn set_parent(&self, index: usize) -> Result<(), ErrorCode> {
        if index >= self.num_parents {
            return Err(ErrorCode::INVAL);
        }
        let code = match self.table {
            Some(table) => *table.get(index).ok_or(ErrorCode::INVAL)?,
            None => u32::try_from(index).map_err(|_| ErrorCode::INVAL)?,
        };
        if code > self.field.max() {
            return Err(ErrorCode::INVAL);
        }

        self.reg.write(self.field.insert(self.reg.read(), code));
        if CONFIG.trace_rate_changes {
            debug!("sunxi: mux -> parent {} (code {})", index, code);
        }
        Ok(())
    }
}
