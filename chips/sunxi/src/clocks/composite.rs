// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Composite clock: optional mux, optional rate stage, optional gate.
//!
//! Every operation is routed to the stage that owns it. A missing stage
//! falls back to the neutral behaviour:
//!
//! | operation                  | no mux              | no rate stage        | no gate   |
//! |----------------------------|---------------------|----------------------|-----------|
//! | `get_parent`/`set_parent`  | parent 0 only       |                      |           |
//! | `recalc_rate`/`round_rate` |                     | parent rate          |           |
//! | `set_rate`                 |                     | accepted, no write   |           |
//! | `enable`/`disable`         |                     |                      | no-op     |
//!
//! A composite needs at least a mux or a rate stage: a lone gate is
//! registered as a [`Gate`] instead.

use heapless::Vec;

use crate::clocks::ahb1::Ahb1;
use crate::clocks::ar100::Ar100;
use crate::clocks::divider::Divider;
use crate::clocks::factor::FactorClock;
use crate::clocks::fixed::{FixedFactor, FixedRate};
use crate::clocks::gate::Gate;
use crate::clocks::mux::Mux;
use crate::clocks::{ClockOps, RateOps, MAX_PARENTS};
use crate::ErrorCode;

/// The rate stages a composite can be built from.
pub enum RateStage<'a> {
    Factor(FactorClock<'a>),
    Divider(Divider<'a>),
    FixedRate(FixedRate),
    FixedFactor(FixedFactor),
    Ahb1(Ahb1<'a>),
    Ar100(Ar100<'a>),
}

impl<'a> RateStage<'a> {
    fn ops(&self) -> &dyn RateOps {
        match self {
            RateStage::Factor(stage) => stage,
            RateStage::Divider(stage) => stage,
            RateStage::FixedRate(stage) => stage,
            RateStage::FixedFactor(stage) => stage,
            RateStage::Ahb1(stage) => stage,
            RateStage::Ar100(stage) => stage,
        }
    }
}

pub struct CompositeClock<'a> {
    name: &'a str,
    parents: Vec<&'a str, MAX_PARENTS>,
    mux: Option<Mux<'a>>,
    rate: Option<RateStage<'a>>,
    gate: Option<Gate<'a>>,
}

impl<'a> CompositeClock<'a> {
    /// Assemble a composite.
    ///
    /// Fails with `SIZE` for more than [`MAX_PARENTS`] parents and with
    /// `INVAL` if there is neither a mux nor a rate stage. The stages are
    /// dropped on failure.
    pub fn new(
        name: &'a str,
        parents: &[&'a str],
        mux: Option<Mux<'a>>,
        rate: Option<RateStage<'a>>,
        gate: Option<Gate<'a>>,
    ) -> Result<Self, ErrorCode> {
        if mux.is_none() && rate.is_none() {
            return Err(ErrorCode::INVAL);
        }
        let parents = Vec::from_slice(parents).map_err(|_| ErrorCode::SIZE)?;
        Ok(CompositeClock {
            name,
            parents,
            mux,
            rate,
            gate,
        })
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn parents(&self) -> &[&'a str] {
        &self.parents
    }

    pub fn has_gate(&self) -> bool {
        self.gate.is_some()
    }
}

impl ClockOps for CompositeClock<'_> {
    fn recalc_rate(&self, parent_rate: u32) -> Result<u32, ErrorCode> {
        match &self.rate {
            Some(stage) => stage.ops().recalc_rate(parent_rate),
            None => Ok(parent_rate),
        }
    }

    fn round_rate(&self, rate: u32, parent_rate: u32) -> u32 {
        match &self.rate {
            Some(stage) => stage.ops().round_rate(rate, parent_rate),
            None => parent_rate,
        }
    }

    fn set_rate(&self, rate: u32, parent_rate: u32) -> Result<(), ErrorCode> {
        match &self.rate {
            Some(stage) => stage.ops().set_rate(rate, parent_rate),
            None => Ok(()),
        }
    }

    fn get_parent(&self) -> Result<usize, ErrorCode> {
        match &self.mux {
            Some(mux) => mux.get_parent(),
            None if self.parents.is_empty() => Err(ErrorCode::NODEVICE),
            None => Ok(0),
        }
    }

    fn set_parent(&self, index: usize) -> Result<(), ErrorCode> {
        match &self.mux {
            Some(mux) => mux.set_parent(index),
            None if self.parents.is_empty() => Err(ErrorCode::NODEVICE),
            None if index == 0 => Ok(()),
            None => Err(ErrorCode::INVAL),
        }
    }

    fn enable(&self) {
        if let Some(gate) = &self.gate {
            gate.enable();
        }
    }

    fn disable(&self) {
        if let Some(gate) = &self.gate {
            gate.disable();
        }
    }

    fn is_enabled(&self) -> bool {
        self.gate.as_ref().map_or(true, |gate| gate.is_enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitfield::BitField;
    use crate::clocks::divider::DividerKind;
    use crate::factors::FactorsFamily;
    use crate::setup::{SUN4I_APB1_CONFIG, SUN4I_PLL1_CONFIG, SUN7I_A20_GMAC_MUX_TABLE};
    use crate::test_util::{FakeDelay, FakeRegister};

    const OSC24M: u32 = 24_000_000;

    #[test]
    fn needs_mux_or_rate() {
        let reg = FakeRegister::new(0);
        let gate = Gate::new(&reg, 0);
        assert_eq!(
            CompositeClock::new("lonely", &["osc24M"], None, None, Some(gate)).err(),
            Some(ErrorCode::INVAL)
        );
    }

    #[test]
    fn too_many_parents() {
        let reg = FakeRegister::new(0);
        let mux = Mux::new(&reg, BitField::new(0, 3), None, 6);
        let parents = ["a", "b", "c", "d", "e", "f"];
        assert_eq!(
            CompositeClock::new("wide", &parents, Some(mux), None, None).err(),
            Some(ErrorCode::SIZE)
        );
        assert_eq!(reg.writes(), 0);
    }

    #[test]
    fn factor_mux_gate() {
        // A10 APB1: mux @24, M @0, P @16, no gate
        let reg = FakeRegister::new(0x0100_0000);
        let delay = FakeDelay::new();
        let apb1 = CompositeClock::new(
            "apb1",
            &["osc24M", "pll6", "osc32k"],
            Some(Mux::new(&reg, BitField::new(24, 2), None, 3)),
            Some(RateStage::Factor(FactorClock::new(
                &reg,
                &SUN4I_APB1_CONFIG,
                FactorsFamily::Sun4iApb1,
                &delay,
            ))),
            None,
        )
        .unwrap();

        assert_eq!(apb1.get_parent(), Ok(1));
        assert_eq!(apb1.set_parent(0), Ok(()));
        assert_eq!(apb1.set_parent(3), Err(ErrorCode::INVAL));
        assert_eq!(apb1.get_parent(), Ok(0));

        assert_eq!(apb1.set_rate(12_000_000, OSC24M), Ok(()));
        assert_eq!(apb1.recalc_rate(OSC24M), Ok(12_000_000));
        assert_eq!(reg.value(), 0x0000_0001);

        // No gate: enable state is always on and disable does nothing
        let writes = reg.writes();
        apb1.disable();
        assert!(apb1.is_enabled());
        assert_eq!(reg.writes(), writes);
    }

    #[test]
    fn mux_and_gate_without_rate_stage() {
        // A20 GMAC
        let reg = FakeRegister::new(0x2);
        let gmac = CompositeClock::new(
            "gmac_tx",
            &["mii_phy_tx", "gmac_int_tx"],
            Some(Mux::new(&reg, BitField::new(0, 2), Some(SUN7I_A20_GMAC_MUX_TABLE), 2)),
            None,
            Some(Gate::new(&reg, 2)),
        )
        .unwrap();

        assert_eq!(gmac.get_parent(), Ok(1));
        assert_eq!(gmac.recalc_rate(125_000_000), Ok(125_000_000));
        assert_eq!(gmac.round_rate(1, 125_000_000), 125_000_000);
        assert_eq!(gmac.set_rate(1, 125_000_000), Ok(()));
        assert_eq!(reg.writes(), 0);

        assert!(!gmac.is_enabled());
        gmac.enable();
        assert!(gmac.is_enabled());
        assert_eq!(reg.value(), 0x6);
        gmac.disable();
        assert_eq!(reg.value(), 0x2);
    }

    #[test]
    fn rate_without_mux() {
        // A10 AXI divider, one fixed parent
        let reg = FakeRegister::new(0);
        let axi = CompositeClock::new(
            "axi",
            &["cpu"],
            None,
            Some(RateStage::Divider(Divider::new(
                &reg,
                BitField::new(0, 2),
                DividerKind::Linear,
            ))),
            None,
        )
        .unwrap();
        assert_eq!(axi.get_parent(), Ok(0));
        assert_eq!(axi.set_parent(0), Ok(()));
        assert_eq!(axi.set_parent(1), Err(ErrorCode::INVAL));
        assert_eq!(axi.round_rate(300_000_000, 1_008_000_000), 252_000_000);
    }

    #[test]
    fn root_clock_has_no_parent() {
        // A10 oscillator
        let reg = FakeRegister::new(0x1);
        let osc = CompositeClock::new(
            "osc24M",
            &[],
            None,
            Some(RateStage::FixedRate(FixedRate::new(OSC24M))),
            Some(Gate::new(&reg, 0)),
        )
        .unwrap();
        assert_eq!(osc.get_parent(), Err(ErrorCode::NODEVICE));
        assert_eq!(osc.set_parent(0), Err(ErrorCode::NODEVICE));
        assert_eq!(osc.recalc_rate(0), Ok(OSC24M));
        assert!(osc.is_enabled());
    }

    #[test]
    fn set_then_recalc_matches_round() {
        let reg = FakeRegister::new(0x8000_0000);
        let delay = FakeDelay::new();
        let pll1 = CompositeClock::new(
            "pll1",
            &["osc24M"],
            None,
            Some(RateStage::Factor(FactorClock::new(
                &reg,
                &SUN4I_PLL1_CONFIG,
                FactorsFamily::Sun4iPll1,
                &delay,
            ))),
            Some(Gate::new(&reg, 31)),
        )
        .unwrap();

        for target in [60_000_000, 384_000_000, 1_008_000_000] {
            let rounded = pll1.round_rate(target, OSC24M);
            assert_eq!(pll1.set_rate(target, OSC24M), Ok(()));
            assert_eq!(pll1.recalc_rate(OSC24M), Ok(rounded));
            assert!(pll1.is_enabled());
        }
    }
}
