// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Clock tree for the Allwinner (sunxi) family of SoCs.
//!
//! The clock controller of these chips is a set of 32-bit control registers.
//! Every PLL, divider, mux and gate is a bitfield somewhere in one of them.
//! This crate turns those bitfields into a tree of clocks:
//!
//! - [`bitfield`]: extract/insert helpers for N-bit fields.
//! - [`factors`]: the per-family `N * K >> P / M` algorithms.
//! - [`clocks`]: the clock nodes (factor clock, divider, mux, gate, fixed
//!   clocks) and the [`clocks::composite::CompositeClock`] that glues a mux, a
//!   rate stage and a gate into one clock.
//! - [`setup`]: the static per-family tables and the code building the tree.
//! - [`registry`]: named clocks, parent resolution and enable counting.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut registry: ClockRegistry<64> = ClockRegistry::new();
//! let failed = sunxi::setup::init_clocks(&nodes, &delay, &mut registry,
//!                                        sunxi::setup::SUN4I_A10_CRITICAL_CLOCKS);
//! let cpu = registry.lookup("cpu").unwrap();
//! registry.set_rate(registry.lookup("pll1").unwrap(), 1_008_000_000)?;
//! let cpu_hz = registry.get_rate(cpu)?;
//! ```

#![no_std]

pub mod bitfield;
pub mod clocks;
mod config;
pub mod errorcode;
pub mod factors;
pub mod platform;
pub mod registry;
pub mod setup;

#[cfg(test)]
mod test_util;

pub use crate::errorcode::ErrorCode;
