// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Clock nodes.
//!
//! A clock is built from up to three independent stages living in the same or
//! in different registers:
//!
//! - a [`mux::Mux`] selecting the parent,
//! - a rate stage ([`RateOps`]) deriving the output rate from the parent rate,
//! - a [`gate::Gate`] switching the output on and off.
//!
//! [`composite::CompositeClock`] glues them together and is what ends up in the
//! registry. Standalone gates (the bus gate banks) are registered as they are.
//!
//! Clocks do not own their parents. They are handed the parent rate on every
//! rate operation and only report a parent *index*; resolving it to another
//! clock is the job of the [`crate::registry`].

pub mod ahb1;
pub mod ar100;
pub mod composite;
pub mod divider;
pub mod factor;
pub mod fixed;
pub mod gate;
pub mod mux;

use crate::ErrorCode;

/// Most parents a clock of this family can select from.
pub const MAX_PARENTS: usize = 5;

/// Operations of a stage that derives an output rate from its parent rate.
pub trait RateOps {
    /// Rate currently produced, as programmed in hardware.
    fn recalc_rate(&self, parent_rate: u32) -> Result<u32, ErrorCode>;

    /// Rate that `set_rate(rate, parent_rate)` would produce. Must not touch
    /// hardware.
    fn round_rate(&self, rate: u32, parent_rate: u32) -> u32;

    /// Program the hardware for the rate `round_rate` returns for `rate`.
    fn set_rate(&self, rate: u32, parent_rate: u32) -> Result<(), ErrorCode>;
}

/// Operations of a complete clock.
///
/// Rate operations behave as in [`RateOps`]. Parent operations work on
/// indices into the clock's parent list.
pub trait ClockOps {
    fn recalc_rate(&self, parent_rate: u32) -> Result<u32, ErrorCode>;
    fn round_rate(&self, rate: u32, parent_rate: u32) -> u32;
    fn set_rate(&self, rate: u32, parent_rate: u32) -> Result<(), ErrorCode>;

    /// Index of the selected parent.
    fn get_parent(&self) -> Result<usize, ErrorCode>;

    /// Select parent `index`. An out of range index fails with `INVAL` and
    /// leaves the hardware untouched.
    fn set_parent(&self, index: usize) -> Result<(), ErrorCode>;

    fn enable(&self);
    fn disable(&self);
    fn is_enabled(&self) -> bool;
}
