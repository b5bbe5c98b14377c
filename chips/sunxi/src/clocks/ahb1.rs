// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! A31 AHB1 rate stage.
//!
//! AHB1 divides its parent by a power of two. When it runs from PLL6 a second,
//! linear, pre-divider is inserted in front. Which parent is selected is read
//! from the mux field of the same register, so the stage only works together
//! with the AHB1 mux (see `setup::SUN6I_A31_AHB1_MUX_DATA`).

use log::debug;
use tock_registers::{register_bitfields, LocalRegisterCopy};

use crate::clocks::RateOps;
use crate::config::CONFIG;
use crate::factors::min_divisor;
use crate::platform::ClockRegister;
use crate::ErrorCode;

register_bitfields![u32,
    AHB1_CFG [
        /// Power of two divider
        AHB1_CLK_DIV_RATIO OFFSET(4) NUMBITS(2) [],
        /// Linear pre-divider, only used with PLL6
        AHB1_PRE_DIV OFFSET(6) NUMBITS(2) [],
        AHB1_CLK_SRC_SEL OFFSET(12) NUMBITS(2) [
            LOSC = 0,
            OSC24M = 1,
            AXI = 2,
            PLL6 = 3
        ]
    ]
];

const PRE_DIV_MAX: u32 = 4;
const DIV_RATIO_MAX: u32 = 3;

/// Divider settings for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Ahb1Divs {
    /// `AHB1_CLK_DIV_RATIO`
    p: u32,
    /// Pre-divider, not the stored code
    m: u32,
    rate: u32,
}

fn ahb1_divs(rate: u32, parent_rate: u32, from_pll6: bool) -> Ahb1Divs {
    let rate = rate.min(parent_rate);
    let div = min_divisor(parent_rate, rate);

    let (p, m) = if from_pll6 {
        let p = if div < 4 {
            0
        } else if div / 2 < 4 {
            1
        } else if div / 4 < 4 {
            2
        } else {
            3
        };
        (p, div.div_ceil(1 << p).min(PRE_DIV_MAX))
    } else {
        // Power of two only: round the divider up to the next one
        let p = (u32::BITS - div.saturating_sub(1).leading_zeros()).min(DIV_RATIO_MAX);
        (p, 1)
    };

    Ahb1Divs {
        p,
        m,
        rate: (parent_rate / m) >> p,
    }
}

pub struct Ahb1<'a> {
    reg: &'a dyn ClockRegister,
}

impl<'a> Ahb1<'a> {
    pub fn new(reg: &'a dyn ClockRegister) -> Self {
        Ahb1 { reg }
    }

    fn cfg(&self) -> LocalRegisterCopy<u32, AHB1_CFG::Register> {
        LocalRegisterCopy::new(self.reg.read())
    }

    fn from_pll6(cfg: &LocalRegisterCopy<u32, AHB1_CFG::Register>) -> bool {
        cfg.matches_all(AHB1_CFG::AHB1_CLK_SRC_SEL::PLL6)
    }
}

impl RateOps for Ahb1<'_> {
    fn recalc_rate(&self, parent_rate: u32) -> Result<u32, ErrorCode> {
        let cfg = self.cfg();
        let mut rate = parent_rate;
        if Self::from_pll6(&cfg) {
            rate /= cfg.read(AHB1_CFG::AHB1_PRE_DIV) + 1;
        }
        Ok(rate >> cfg.read(AHB1_CFG::AHB1_CLK_DIV_RATIO))
    }

    fn round_rate(&self, rate: u32, parent_rate: u32) -> u32 {
        ahb1_divs(rate, parent_rate, Self::from_pll6(&self.cfg())).rate
    }

    fn set_rate(&self, rate: u32, parent_rate: u32) -> Result<(), ErrorCode> {
        let mut cfg = self.cfg();
        let divs = ahb1_divs(rate, parent_rate, Self::from_pll6(&cfg));

        cfg.modify(
            AHB1_CFG::AHB1_CLK_DIV_RATIO.val(divs.p) + AHB1_CFG::AHB1_PRE_DIV.val(divs.m - 1),
        );
        self.reg.write(cfg.get());

        if CONFIG.trace_rate_changes {
            debug!("sunxi: ahb1 {} Hz -> {:?}", rate, divs);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::FakeRegister;

    const PLL6: u32 = 600_000_000;
    const SRC_PLL6: u32 = 3 << 12;
    const SRC_AXI: u32 = 2 << 12;

    #[test]
    fn recalc_applies_pre_divider_only_on_pll6() {
        // Pre-divider code 2 (/3), ratio 1 (/2)
        let reg = FakeRegister::new(SRC_PLL6 | (2 << 6) | (1 << 4));
        let ahb1 = Ahb1::new(&reg);
        assert_eq!(ahb1.recalc_rate(PLL6), Ok(100_000_000));

        reg.write(SRC_AXI | (2 << 6) | (1 << 4));
        assert_eq!(ahb1.recalc_rate(300_000_000), Ok(150_000_000));
    }

    #[test]
    fn pll6_divide_by_24() {
        let divs = ahb1_divs(PLL6 / 24, PLL6, true);
        assert_eq!(divs.p, 3);
        assert_eq!(divs.m, 3);
        assert_eq!(divs.rate, 25_000_000);

        let reg = FakeRegister::new(SRC_PLL6);
        let ahb1 = Ahb1::new(&reg);
        assert_eq!(ahb1.round_rate(25_000_000, PLL6), 25_000_000);
        assert_eq!(ahb1.set_rate(25_000_000, PLL6), Ok(()));
        assert_eq!(reg.value(), SRC_PLL6 | (2 << 6) | (3 << 4));
        assert_eq!(ahb1.recalc_rate(PLL6), Ok(25_000_000));
    }

    #[test]
    fn round_rate_reports_the_achievable_rate() {
        let reg = FakeRegister::new(SRC_PLL6);
        let ahb1 = Ahb1::new(&reg);
        // /3 from PLL6
        assert_eq!(ahb1.round_rate(200_000_000, PLL6), 200_000_000);
        // /5 is not possible: /6 = pre-divider 3, ratio 1
        assert_eq!(ahb1.round_rate(120_000_000, PLL6), 100_000_000);
        assert_eq!(reg.writes(), 0);
    }

    #[test]
    fn other_parents_use_powers_of_two() {
        let reg = FakeRegister::new(SRC_AXI | (3 << 6));
        let ahb1 = Ahb1::new(&reg);
        // /3 is not possible without PLL6: /4
        assert_eq!(ahb1.round_rate(100_000_000, 300_000_000), 75_000_000);
        assert_eq!(ahb1.set_rate(100_000_000, 300_000_000), Ok(()));
        // Pre-divider cleared, ratio 2
        assert_eq!(reg.value(), SRC_AXI | (2 << 4));
        // Saturates at /8
        assert_eq!(ahb1.round_rate(1, 24_000_000), 3_000_000);
    }

    #[test]
    fn never_above_the_parent() {
        let reg = FakeRegister::new(SRC_PLL6);
        let ahb1 = Ahb1::new(&reg);
        assert_eq!(ahb1.round_rate(1_000_000_000, PLL6), PLL6);
    }
}
