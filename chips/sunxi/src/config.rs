// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Compile-time configuration of the clock tree.
//!
//! As in the kernel crate, options live in one typed `const` object so that
//! every code path is type-checked whether an option is enabled or not, and
//! the disabled paths fold away after constant propagation. This file is the
//! only place in the crate where Cargo features are consulted.

/// Data structure holding compile-time configuration options.
pub(crate) struct Config {
    /// Whether building the clock tree should log every registered clock,
    /// with its parents and the stages it was composed of.
    pub(crate) debug_clk_setup: bool,

    /// Whether every `set_rate`/`set_parent` on a clock should be logged with
    /// the requested and achieved values.
    pub(crate) trace_rate_changes: bool,

    /// Time, in microseconds, the PLLs need to settle after their factors
    /// changed. Factor clocks wait this long after every write.
    pub(crate) pll_settle_us: u32,
}

/// The unique instance of `Config`.
pub(crate) const CONFIG: Config = Config {
    debug_clk_setup: cfg!(feature = "debug_clk_setup"),
    trace_rate_changes: cfg!(feature = "trace_rate_changes"),
    pll_settle_us: 500,
};
