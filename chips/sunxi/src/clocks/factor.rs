// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Adjustable factor clock.
//!
//! Binds a [`FactorsFamily`] algorithm and its [`FactorsConfig`] field layout
//! to one control register.
//!
//! # Usage
//!
//! ```rust,ignore
//! let pll1 = FactorClock::new(reg, &SUN4I_PLL1_CONFIG, FactorsFamily::Sun4iPll1, &delay);
//! assert_eq!(pll1.round_rate(1_008_000_000, 24_000_000), 1_008_000_000);
//! pll1.set_rate(1_008_000_000, 24_000_000)?;
//! ```

use log::debug;

use crate::clocks::RateOps;
use crate::config::CONFIG;
use crate::factors::{rate_for_factors, FactorsConfig, FactorsFamily};
use crate::platform::{ClockRegister, Delay};
use crate::ErrorCode;

pub struct FactorClock<'a> {
    reg: &'a dyn ClockRegister,
    config: &'static FactorsConfig,
    family: FactorsFamily,
    delay: &'a dyn Delay,
}

impl<'a> FactorClock<'a> {
    pub fn new(
        reg: &'a dyn ClockRegister,
        config: &'static FactorsConfig,
        family: FactorsFamily,
        delay: &'a dyn Delay,
    ) -> Self {
        FactorClock {
            reg,
            config,
            family,
            delay,
        }
    }

    pub fn family(&self) -> FactorsFamily {
        self.family
    }
}

impl RateOps for FactorClock<'_> {
    fn recalc_rate(&self, parent_rate: u32) -> Result<u32, ErrorCode> {
        let factors = self.config.decode(self.reg.read());
        Ok(rate_for_factors(self.config, factors, parent_rate))
    }

    fn round_rate(&self, rate: u32, parent_rate: u32) -> u32 {
        self.family.round(self.config, rate, parent_rate)
    }

    /// Program the factors, then wait for the PLL to settle.
    ///
    /// There is no lock bit to poll on these chips, so the wait is a fixed
    /// busy-wait, done after every write whether the PLL is running or not.
    fn set_rate(&self, rate: u32, parent_rate: u32) -> Result<(), ErrorCode> {
        let factors = self.family.apply(self.config, rate, parent_rate);
        let reg = self.config.encode(self.reg.read(), factors);
        self.reg.write(reg);

        if CONFIG.trace_rate_changes {
            debug!(
                "sunxi: {:?} {} Hz -> {:?} ({} Hz)",
                self.family,
                rate,
                factors,
                rate_for_factors(self.config, factors, parent_rate)
            );
        }

        self.delay.delay_us(CONFIG.pll_settle_us);
        Ok(())
    }
}
