// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Named clocks and the relations between them.
//!
//! Clocks only know the *names* of their parents. The registry resolves them,
//! walks the tree to compute rates, and keeps one enable count per clock so
//! that a clock shared by several consumers is only gated off once the last
//! of them lets go of it.
//!
//! The registry has a fixed capacity and never allocates. Everything after
//! registration works on `&self`.

use core::cell::Cell;
use core::slice;

use heapless::Vec;
use log::{debug, warn};

use crate::clocks::composite::CompositeClock;
use crate::clocks::gate::Gate;
use crate::clocks::ClockOps;
use crate::config::CONFIG;
use crate::ErrorCode;

/// Deepest parent chain walked before the tree is considered broken.
pub const MAX_DEPTH: usize = 16;

/// Handle on a registered clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockId(usize);

impl ClockId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A clock as stored in the registry.
pub enum ClockEntry<'a> {
    Composite(CompositeClock<'a>),
    /// A standalone gate, passing the rate of its only parent through.
    Gate {
        name: &'a str,
        parent: &'a str,
        gate: Gate<'a>,
    },
}

impl<'a> ClockEntry<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            ClockEntry::Composite(clock) => clock.name(),
            ClockEntry::Gate { name, .. } => *name,
        }
    }

    pub fn parents(&self) -> &[&'a str] {
        match self {
            ClockEntry::Composite(clock) => clock.parents(),
            ClockEntry::Gate { parent, .. } => slice::from_ref(parent),
        }
    }

    pub fn ops(&self) -> &dyn ClockOps {
        match self {
            ClockEntry::Composite(clock) => clock,
            ClockEntry::Gate { gate, .. } => gate,
        }
    }
}

struct Slot<'a> {
    entry: ClockEntry<'a>,
    enable_count: Cell<usize>,
    /// Holds a reference from `protect_critical` that is never released.
    critical: Cell<bool>,
}

pub struct ClockRegistry<'a, const N: usize> {
    clocks: Vec<Slot<'a>, N>,
}

impl<'a, const N: usize> ClockRegistry<'a, N> {
    pub const fn new() -> Self {
        ClockRegistry { clocks: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.clocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clocks.is_empty()
    }

    /// Add a clock under its own name.
    ///
    /// Fails with `ALREADY` if the name is taken and with `NOMEM` if the
    /// registry is full. The entry is dropped on failure.
    pub fn register(&mut self, entry: ClockEntry<'a>) -> Result<ClockId, ErrorCode> {
        let name = entry.name();
        if self.lookup(name).is_some() {
            return Err(ErrorCode::ALREADY);
        }

        let id = ClockId(self.clocks.len());
        self.clocks
            .push(Slot {
                entry,
                enable_count: Cell::new(0),
                critical: Cell::new(false),
            })
            .map_err(|_| ErrorCode::NOMEM)?;

        if CONFIG.debug_clk_setup {
            debug!(
                "sunxi: registered {} ({:?}) parents {:?}",
                name,
                id,
                self.clocks[id.0].entry.parents()
            );
        }
        Ok(id)
    }

    pub fn lookup(&self, name: &str) -> Option<ClockId> {
        self.clocks
            .iter()
            .position(|slot| slot.entry.name() == name)
            .map(ClockId)
    }

    pub fn name(&self, id: ClockId) -> Option<&'a str> {
        self.clocks.get(id.0).map(|slot| slot.entry.name())
    }

    pub fn entry(&self, id: ClockId) -> Option<&ClockEntry<'a>> {
        self.clocks.get(id.0).map(|slot| &slot.entry)
    }

    fn slot(&self, id: ClockId) -> Result<&Slot<'a>, ErrorCode> {
        self.clocks.get(id.0).ok_or(ErrorCode::NODEVICE)
    }

    fn parent_by_index(&self, id: ClockId, index: usize) -> Result<ClockId, ErrorCode> {
        let name = self
            .slot(id)?
            .entry
            .parents()
            .get(index)
            .ok_or(ErrorCode::INVAL)?;
        self.lookup(name).ok_or(ErrorCode::NODEVICE)
    }

    /// Currently selected parent, `None` for a root clock.
    ///
    /// A parent that was never registered is reported as `NODEVICE`.
    pub fn get_parent(&self, id: ClockId) -> Result<Option<ClockId>, ErrorCode> {
        let slot = self.slot(id)?;
        if slot.entry.parents().is_empty() {
            return Ok(None);
        }
        let index = slot.entry.ops().get_parent()?;
        self.parent_by_index(id, index).map(Some)
    }

    /// Select parent `index` of `id`.
    ///
    /// An enabled clock keeps its enable reference on whichever parent it
    /// runs from: the new parent is enabled before the switch and the old
    /// one released after it.
    pub fn set_parent(&self, id: ClockId, index: usize) -> Result<(), ErrorCode> {
        let slot = self.slot(id)?;
        let new_parent = self.parent_by_index(id, index)?;
        let old_parent = self.get_parent(id).ok().flatten();
        let enabled = slot.enable_count.get() > 0;

        if enabled {
            self.enable(new_parent)?;
        }
        if let Err(err) = slot.entry.ops().set_parent(index) {
            if enabled {
                self.disable(new_parent)?;
            }
            return Err(err);
        }
        if enabled {
            if let Some(old_parent) = old_parent {
                self.disable(old_parent)?;
            }
        }

        if CONFIG.trace_rate_changes {
            debug!(
                "sunxi: {} -> parent {:?}",
                slot.entry.name(),
                self.name(new_parent)
            );
        }
        Ok(())
    }

    fn parent_rate(&self, id: ClockId, depth: usize) -> Result<u32, ErrorCode> {
        match self.get_parent(id)? {
            Some(parent) => self.rate_at(parent, depth + 1),
            None => Ok(0),
        }
    }

    fn rate_at(&self, id: ClockId, depth: usize) -> Result<u32, ErrorCode> {
        if depth > MAX_DEPTH {
            return Err(ErrorCode::FAIL);
        }
        let parent_rate = self.parent_rate(id, depth)?;
        self.slot(id)?.entry.ops().recalc_rate(parent_rate)
    }

    /// Current rate of `id`, computed from the hardware all the way up to
    /// the root.
    pub fn get_rate(&self, id: ClockId) -> Result<u32, ErrorCode> {
        self.rate_at(id, 0)
    }

    /// Rate `set_rate(id, rate)` would produce with the current parent rate.
    pub fn round_rate(&self, id: ClockId, rate: u32) -> Result<u32, ErrorCode> {
        let parent_rate = self.parent_rate(id, 0)?;
        Ok(self.slot(id)?.entry.ops().round_rate(rate, parent_rate))
    }

    /// Program `id` as close as possible to `rate`. Parents are left alone.
    pub fn set_rate(&self, id: ClockId, rate: u32) -> Result<(), ErrorCode> {
        let parent_rate = self.parent_rate(id, 0)?;
        let slot = self.slot(id)?;
        slot.entry.ops().set_rate(rate, parent_rate)?;

        if CONFIG.trace_rate_changes {
            debug!(
                "sunxi: {} set to {} Hz (asked {} Hz)",
                slot.entry.name(),
                slot.entry.ops().recalc_rate(parent_rate).unwrap_or(0),
                rate
            );
        }
        Ok(())
    }

    fn enable_at(&self, id: ClockId, depth: usize) -> Result<(), ErrorCode> {
        if depth > MAX_DEPTH {
            return Err(ErrorCode::FAIL);
        }
        let slot = self.slot(id)?;
        let count = slot.enable_count.get();
        if count == 0 {
            if let Some(parent) = self.get_parent(id)? {
                self.enable_at(parent, depth + 1)?;
            }
            slot.entry.ops().enable();
        }
        slot.enable_count.set(count + 1);
        Ok(())
    }

    fn disable_at(&self, id: ClockId, depth: usize) -> Result<(), ErrorCode> {
        if depth > MAX_DEPTH {
            return Err(ErrorCode::FAIL);
        }
        let slot = self.slot(id)?;
        let count = slot.enable_count.get();
        if count == 0 || (count == 1 && slot.critical.get()) {
            return Err(ErrorCode::ALREADY);
        }
        if count > 1 {
            slot.enable_count.set(count - 1);
            return Ok(());
        }

        // Resolve the parent first so that a failure leaves the clock as it was
        let parent = self.get_parent(id)?;
        slot.enable_count.set(0);
        slot.entry.ops().disable();
        if let Some(parent) = parent {
            self.disable_at(parent, depth + 1)?;
        }
        Ok(())
    }

    /// Take an enable reference on `id`. The first one ungates the parent
    /// chain, then the clock itself.
    pub fn enable(&self, id: ClockId) -> Result<(), ErrorCode> {
        self.enable_at(id, 0)
    }

    /// Drop an enable reference on `id`. The last one gates the clock, then
    /// releases its parent. Disabling a clock nobody enabled, or dropping the
    /// reference a critical clock was protected with, fails with `ALREADY`.
    pub fn disable(&self, id: ClockId) -> Result<(), ErrorCode> {
        self.disable_at(id, 0)
    }

    pub fn enable_count(&self, id: ClockId) -> Result<usize, ErrorCode> {
        Ok(self.slot(id)?.enable_count.get())
    }

    pub fn is_enabled(&self, id: ClockId) -> Result<bool, ErrorCode> {
        Ok(self.slot(id)?.entry.ops().is_enabled())
    }

    /// Keep the named clocks running forever by taking an enable reference
    /// nobody can drop. Returns how many were protected.
    ///
    /// Protecting a clock twice takes a single reference.
    pub fn protect_critical(&self, names: &[&str]) -> usize {
        let mut protected = 0;
        for name in names {
            let Some(id) = self.lookup(name) else {
                warn!("sunxi: critical clock {} not found", name);
                continue;
            };
            let Ok(slot) = self.slot(id) else {
                continue;
            };
            if slot.critical.get() {
                protected += 1;
                continue;
            }
            match self.enable(id) {
                Ok(()) => {
                    slot.critical.set(true);
                    protected += 1;
                }
                Err(err) => warn!("sunxi: cannot enable critical clock {}: {:?}", name, err),
            }
        }
        protected
    }
}

impl<const N: usize> Default for ClockRegistry<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitfield::BitField;
    use crate::clocks::composite::RateStage;
    use crate::clocks::divider::{Divider, DividerKind};
    use crate::clocks::factor::FactorClock;
    use crate::clocks::fixed::{FixedFactor, FixedRate};
    use crate::clocks::mux::Mux;
    use crate::factors::FactorsFamily;
    use crate::platform::ClockRegister;
    use crate::setup::SUN4I_PLL1_CONFIG;
    use crate::test_util::{FakeDelay, FakeRegister};
    use tock_registers::interfaces::Readable;
    use tock_registers::registers::InMemoryRegister;

    const OSC24M: u32 = 24_000_000;

    struct Regs {
        osc: FakeRegister,
        pll1: FakeRegister,
        cpu: FakeRegister,
        gates: FakeRegister,
    }

    impl Regs {
        fn new() -> Self {
            Regs {
                osc: FakeRegister::new(0),
                // PLL1 enabled at 1008MHz
                pll1: FakeRegister::new(0x8000_1510),
                // CPU on PLL1, AXI /3
                cpu: FakeRegister::new(0x0002_0002),
                gates: FakeRegister::new(0),
            }
        }
    }

    fn build<'a>(regs: &'a Regs, delay: &'a FakeDelay) -> ClockRegistry<'a, 8> {
        let mut registry = ClockRegistry::new();
        let osc = CompositeClock::new(
            "osc24M",
            &[],
            None,
            Some(RateStage::FixedRate(FixedRate::new(OSC24M))),
            Some(Gate::new(&regs.osc, 0)),
        )
        .unwrap();
        let pll1 = CompositeClock::new(
            "pll1",
            &["osc24M"],
            None,
            Some(RateStage::Factor(FactorClock::new(
                &regs.pll1,
                &SUN4I_PLL1_CONFIG,
                FactorsFamily::Sun4iPll1,
                delay,
            ))),
            Some(Gate::new(&regs.pll1, 31)),
        )
        .unwrap();
        let cpu = CompositeClock::new(
            "cpu",
            &["osc32k", "osc24M", "pll1"],
            Some(Mux::new(&regs.cpu, BitField::new(16, 2), None, 3)),
            None,
            None,
        )
        .unwrap();
        let axi = CompositeClock::new(
            "axi",
            &["cpu"],
            None,
            Some(RateStage::Divider(Divider::new(
                &regs.cpu,
                BitField::new(0, 2),
                DividerKind::Linear,
            ))),
            None,
        )
        .unwrap();

        registry.register(ClockEntry::Composite(osc)).unwrap();
        registry.register(ClockEntry::Composite(pll1)).unwrap();
        registry.register(ClockEntry::Composite(cpu)).unwrap();
        registry.register(ClockEntry::Composite(axi)).unwrap();
        for (name, bit) in [("axi_dram", 0), ("ahb_sdram", 1)] {
            registry
                .register(ClockEntry::Gate {
                    name,
                    parent: "axi",
                    gate: Gate::new(&regs.gates, bit),
                })
                .unwrap();
        }
        registry
    }

    #[test]
    fn rates_follow_the_tree() {
        let regs = Regs::new();
        let delay = FakeDelay::new();
        let registry = build(&regs, &delay);

        let pll1 = registry.lookup("pll1").unwrap();
        let axi = registry.lookup("axi").unwrap();
        let dram = registry.lookup("axi_dram").unwrap();
        assert_eq!(registry.get_rate(registry.lookup("osc24M").unwrap()), Ok(OSC24M));
        assert_eq!(registry.get_rate(pll1), Ok(1_008_000_000));
        assert_eq!(registry.get_rate(axi), Ok(336_000_000));
        assert_eq!(registry.get_rate(dram), Ok(336_000_000));

        assert_eq!(registry.round_rate(pll1, 384_000_000), Ok(384_000_000));
        assert_eq!(registry.set_rate(pll1, 384_000_000), Ok(()));
        assert_eq!(registry.get_rate(axi), Ok(128_000_000));
        assert_eq!(delay.calls(), 1);
    }

    #[test]
    fn reparenting_updates_rates() {
        let regs = Regs::new();
        let delay = FakeDelay::new();
        let registry = build(&regs, &delay);

        let cpu = registry.lookup("cpu").unwrap();
        let osc = registry.lookup("osc24M").unwrap();
        assert_eq!(registry.get_parent(cpu), Ok(registry.lookup("pll1")));

        assert_eq!(registry.set_parent(cpu, 1), Ok(()));
        assert_eq!(registry.get_parent(cpu), Ok(Some(osc)));
        assert_eq!(registry.get_rate(cpu), Ok(OSC24M));

        // osc32k was never registered
        assert_eq!(registry.set_parent(cpu, 0), Err(ErrorCode::NODEVICE));
        assert_eq!(registry.set_parent(cpu, 3), Err(ErrorCode::INVAL));
        assert_eq!(registry.get_parent(cpu), Ok(Some(osc)));

        regs.cpu.write(0);
        assert_eq!(registry.get_parent(cpu), Err(ErrorCode::NODEVICE));
        assert_eq!(registry.get_rate(cpu), Err(ErrorCode::NODEVICE));
    }

    #[test]
    fn enable_is_reference_counted() {
        let regs = Regs::new();
        let delay = FakeDelay::new();
        let registry = build(&regs, &delay);

        let dram = registry.lookup("axi_dram").unwrap();
        let sdram = registry.lookup("ahb_sdram").unwrap();
        let osc = registry.lookup("osc24M").unwrap();
        let axi = registry.lookup("axi").unwrap();

        assert_eq!(registry.enable(dram), Ok(()));
        assert_eq!(registry.enable(sdram), Ok(()));
        assert_eq!(registry.enable(dram), Ok(()));
        assert_eq!(regs.gates.value(), 0x3);
        // The whole chain up to the oscillator is held once per child
        assert_eq!(registry.enable_count(axi), Ok(2));
        assert_eq!(registry.enable_count(osc), Ok(1));
        assert_eq!(regs.osc.value(), 0x1);

        assert_eq!(registry.disable(dram), Ok(()));
        assert_eq!(regs.gates.value(), 0x3);
        assert_eq!(registry.disable(dram), Ok(()));
        assert_eq!(regs.gates.value(), 0x2);
        assert_eq!(registry.disable(sdram), Ok(()));
        assert_eq!(regs.gates.value(), 0x0);
        assert_eq!(registry.enable_count(osc), Ok(0));
        assert_eq!(regs.osc.value(), 0x0);

        assert_eq!(registry.disable(sdram), Err(ErrorCode::ALREADY));
    }

    #[test]
    fn enabled_clock_moves_its_reference() {
        let regs = Regs::new();
        let delay = FakeDelay::new();
        let registry = build(&regs, &delay);

        let cpu = registry.lookup("cpu").unwrap();
        let pll1 = registry.lookup("pll1").unwrap();
        let osc = registry.lookup("osc24M").unwrap();
        assert_eq!(registry.enable(cpu), Ok(()));
        assert_eq!(registry.enable_count(pll1), Ok(1));

        assert_eq!(registry.set_parent(cpu, 1), Ok(()));
        assert_eq!(registry.enable_count(pll1), Ok(0));
        // Only the CPU holds the oscillator now
        assert_eq!(registry.enable_count(osc), Ok(1));
        assert!(!registry.is_enabled(pll1).unwrap());
    }

    #[test]
    fn critical_clocks_survive_disable() {
        let regs = Regs::new();
        let delay = FakeDelay::new();
        let registry = build(&regs, &delay);

        assert_eq!(registry.protect_critical(&["ahb_sdram", "pll5_ddr"]), 1);
        let sdram = registry.lookup("ahb_sdram").unwrap();
        assert!(registry.is_enabled(sdram).unwrap());

        assert_eq!(registry.enable(sdram), Ok(()));
        assert_eq!(registry.disable(sdram), Ok(()));
        assert!(registry.is_enabled(sdram).unwrap());
        assert_eq!(registry.enable_count(sdram), Ok(1));
    }

    #[test]
    fn critical_reference_cannot_be_dropped() {
        let regs = Regs::new();
        let delay = FakeDelay::new();
        let registry = build(&regs, &delay);

        assert_eq!(registry.protect_critical(&["ahb_sdram"]), 1);
        let sdram = registry.lookup("ahb_sdram").unwrap();
        let axi = registry.lookup("axi").unwrap();

        // A consumer disabling what it never enabled
        assert_eq!(registry.disable(sdram), Err(ErrorCode::ALREADY));
        assert_eq!(registry.enable_count(sdram), Ok(1));
        assert!(registry.is_enabled(sdram).unwrap());
        assert_eq!(registry.enable_count(axi), Ok(1));
        assert_eq!(regs.gates.value(), 0x2);

        // Protecting again does not stack another reference
        assert_eq!(registry.protect_critical(&["ahb_sdram"]), 1);
        assert_eq!(registry.enable_count(sdram), Ok(1));
    }

    #[test]
    fn failed_disable_leaves_the_clock_enabled() {
        let regs = Regs::new();
        let delay = FakeDelay::new();
        let registry = build(&regs, &delay);

        let cpu = registry.lookup("cpu").unwrap();
        let pll1 = registry.lookup("pll1").unwrap();
        assert_eq!(registry.enable(cpu), Ok(()));

        // Mux moved behind the registry's back to osc32k, never registered
        regs.cpu.write(0);
        assert_eq!(registry.disable(cpu), Err(ErrorCode::NODEVICE));
        assert_eq!(registry.enable_count(cpu), Ok(1));
        assert_eq!(registry.enable_count(pll1), Ok(1));

        regs.cpu.write(0x0002_0002);
        assert_eq!(registry.disable(cpu), Ok(()));
        assert_eq!(registry.enable_count(cpu), Ok(0));
        assert_eq!(registry.enable_count(pll1), Ok(0));
        assert!(!registry.is_enabled(pll1).unwrap());
    }

    #[test]
    fn register_rejects_duplicates_and_overflow() {
        let regs = Regs::new();
        let delay = FakeDelay::new();
        let mut registry = build(&regs, &delay);
        assert_eq!(registry.len(), 6);

        let twin = ClockEntry::Gate {
            name: "axi_dram",
            parent: "axi",
            gate: Gate::new(&regs.gates, 5),
        };
        assert_eq!(registry.register(twin), Err(ErrorCode::ALREADY));

        for name in ["g6", "g7"] {
            let entry = ClockEntry::Gate {
                name,
                parent: "axi",
                gate: Gate::new(&regs.gates, 6),
            };
            assert!(registry.register(entry).is_ok());
        }
        let entry = ClockEntry::Gate {
            name: "g8",
            parent: "axi",
            gate: Gate::new(&regs.gates, 8),
        };
        assert_eq!(registry.register(entry), Err(ErrorCode::NOMEM));
        assert_eq!(registry.lookup("g8"), None);
        assert_eq!(registry.len(), 8);
        assert_eq!(regs.gates.writes(), 0);
    }

    #[test]
    fn cycles_are_detected() {
        let mut registry: ClockRegistry<4> = ClockRegistry::new();
        for (name, parent) in [("a", "b"), ("b", "a")] {
            let clock = CompositeClock::new(
                name,
                &[parent],
                None,
                Some(RateStage::FixedFactor(FixedFactor::new(1, 1))),
                None,
            )
            .unwrap();
            registry.register(ClockEntry::Composite(clock)).unwrap();
        }
        let a = registry.lookup("a").unwrap();
        assert_eq!(registry.get_rate(a), Err(ErrorCode::FAIL));
        assert_eq!(registry.enable(a), Err(ErrorCode::FAIL));
    }

    #[test]
    fn works_on_plain_registers() {
        let reg: InMemoryRegister<u32> = InMemoryRegister::new(0);
        let mut registry: ClockRegistry<2> = ClockRegistry::new();
        let osc = CompositeClock::new(
            "osc24M",
            &[],
            None,
            Some(RateStage::FixedRate(FixedRate::new(OSC24M))),
            Some(Gate::new(&reg, 0)),
        )
        .unwrap();
        let id = registry.register(ClockEntry::Composite(osc)).unwrap();
        assert_eq!(registry.name(id), Some("osc24M"));
        assert_eq!(registry.enable(id), Ok(()));
        assert_eq!(reg.get(), 1);
        assert_eq!(registry.get_rate(id), Ok(OSC24M));
    }
}
