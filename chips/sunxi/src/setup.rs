// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Per-family clock tables and the code building the clock tree from them.
//!
//! The board describes every clock node it has (what the device tree would
//! say) as a [`ClockNode`]: a `compatible` string, parent names, output
//! names and register words. [`init_clocks`] turns those into registered
//! clocks, using the tables of this file to know which fields live where.
//!
//! Building happens in a fixed order: divided outputs, factor clocks,
//! dividers, muxes, gate banks, then the single-purpose clocks (oscillator,
//! GMAC, AHB1, AR100). Parents are resolved by name on use, so a node may
//! name a parent that is set up later.
//!
//! # Usage
//!
//! ```rust,ignore
//! static mut REGISTRY: ClockRegistry<'static, 96> = ClockRegistry::new();
//!
//! let nodes = [
//!     ClockNode {
//!         name: "clk@01c20000",
//!         compatible: "allwinner,sun4i-a10-pll1-clk",
//!         parents: &["osc24M"],
//!         output_names: &["pll1"],
//!         frequency: None,
//!         regs: unsafe { mmio_registers(0x01c2_0000, 1) },
//!     },
//!     // ...
//! ];
//! let failed = init_clocks(&nodes, &DELAY, registry, SUN4I_A10_CRITICAL_CLOCKS);
//! ```

use log::{debug, error, warn};

use crate::bitfield::BitField;
use crate::clocks::ahb1::Ahb1;
use crate::clocks::ar100::{Ar100, AR100_MAX_PARENTS};
use crate::clocks::composite::{CompositeClock, RateStage};
use crate::clocks::divider::{DivTableEntry, Divider, DividerKind};
use crate::clocks::factor::FactorClock;
use crate::clocks::fixed::{FixedFactor, FixedRate};
use crate::clocks::gate::Gate;
use crate::clocks::mux::Mux;
use crate::clocks::MAX_PARENTS;
use crate::config::CONFIG;
use crate::factors::{FactorsConfig, FactorsFamily};
use crate::platform::{ClockRegister, Delay};
use crate::registry::{ClockEntry, ClockId, ClockRegistry};
use crate::ErrorCode;

/// Width of every mux field of the family.
const MUX_WIDTH: u8 = 2;
/// Width of the divided outputs of PLL5 and PLL6.
const DIVISOR_WIDTH: u8 = 2;
/// Parents of the A31 AHB1 mux.
const AHB1_MAX_PARENTS: usize = 4;

const fn field(shift: u8, width: u8) -> Option<BitField> {
    Some(BitField::new(shift, width))
}

// Factor layouts

pub const SUN4I_PLL1_CONFIG: FactorsConfig = FactorsConfig {
    n: field(8, 5),
    k: field(4, 2),
    m: field(0, 2),
    p: field(16, 2),
    n_start: 0,
};

pub const SUN6I_A31_PLL1_CONFIG: FactorsConfig = FactorsConfig {
    n: field(8, 5),
    k: field(4, 2),
    m: field(0, 2),
    p: None,
    n_start: 1,
};

pub const SUN8I_A23_PLL1_CONFIG: FactorsConfig = FactorsConfig {
    n: field(8, 5),
    k: field(4, 2),
    m: field(0, 2),
    p: field(16, 2),
    n_start: 1,
};

pub const SUN4I_PLL5_CONFIG: FactorsConfig = FactorsConfig {
    n: field(8, 5),
    k: field(4, 2),
    m: None,
    p: None,
    n_start: 0,
};

pub const SUN6I_A31_PLL6_CONFIG: FactorsConfig = FactorsConfig {
    n: field(8, 5),
    k: field(4, 2),
    m: None,
    p: None,
    n_start: 1,
};

pub const SUN5I_A13_AHB_CONFIG: FactorsConfig = FactorsConfig {
    n: None,
    k: None,
    m: None,
    p: field(4, 2),
    n_start: 0,
};

pub const SUN4I_APB1_CONFIG: FactorsConfig = FactorsConfig {
    n: None,
    k: None,
    m: field(0, 5),
    p: field(16, 2),
    n_start: 0,
};

/// The user manual calls P "N" for this one.
pub const SUN7I_A20_OUT_CONFIG: FactorsConfig = FactorsConfig {
    n: None,
    k: None,
    m: field(8, 5),
    p: field(20, 2),
    n_start: 0,
};

// Divider tables

/// Codes 0 and 1 both divide by 2.
pub const SUN4I_APB0_TABLE: &[DivTableEntry] = &[
    DivTableEntry { val: 0, div: 2 },
    DivTableEntry { val: 1, div: 2 },
    DivTableEntry { val: 2, div: 4 },
    DivTableEntry { val: 3, div: 8 },
];

pub const SUN6I_A31_APB0_TABLE: &[DivTableEntry] = SUN4I_APB0_TABLE;

pub const SUN8I_A23_AXI_TABLE: &[DivTableEntry] = &[
    DivTableEntry { val: 0, div: 1 },
    DivTableEntry { val: 1, div: 2 },
    DivTableEntry { val: 2, div: 3 },
    DivTableEntry { val: 3, div: 4 },
    DivTableEntry { val: 4, div: 4 },
    DivTableEntry { val: 5, div: 4 },
    DivTableEntry { val: 6, div: 4 },
    DivTableEntry { val: 7, div: 4 },
];

pub const SUN4I_PLL6_SATA_TABLE: &[DivTableEntry] = &[
    DivTableEntry { val: 0, div: 6 },
    DivTableEntry { val: 1, div: 12 },
    DivTableEntry { val: 2, div: 18 },
    DivTableEntry { val: 3, div: 24 },
];

/// mii_phy_tx_clk is code 0, gmac_int_tx_clk is code 2.
pub const SUN7I_A20_GMAC_MUX_TABLE: &[u32] = &[0x00, 0x02];
const SUN7I_A20_GMAC_GPIT: u8 = 2;

const SUNXI_OSC24M_GATE: u8 = 0;

// Setup descriptions

/// A factor clock, optionally muxed and gated through the same register.
#[derive(Clone, Copy, Debug)]
pub struct FactorsData {
    /// Gate bit.
    pub enable: Option<u8>,
    /// Shift of the parent selector.
    pub mux: Option<u8>,
    pub config: &'static FactorsConfig,
    pub family: FactorsFamily,
    /// Fixed clock name, for factor clocks feeding divided outputs.
    pub name: Option<&'static str>,
}

#[derive(Clone, Copy, Debug)]
pub struct DivData {
    pub field: BitField,
    pub kind: DividerKind,
}

/// One output of a PLL with several outputs.
#[derive(Clone, Copy, Debug)]
pub enum DivOutput {
    /// The factor clock itself.
    Base,
    /// `pll / n`
    Fixed(u32),
    /// Programmable divider, independently gateable or not.
    Divider {
        field: BitField,
        kind: DividerKind,
        gate: Option<u8>,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct DivsData {
    pub factors: &'static FactorsData,
    pub outputs: &'static [DivOutput],
}

#[derive(Clone, Copy, Debug)]
pub struct MuxData {
    pub shift: u8,
}

/// Which bits of a gate bank have a gate. Bit `i` lives in register word
/// `i / 32`.
#[derive(Clone, Copy, Debug)]
pub struct GatesData {
    pub mask: &'static [u32],
}

pub const SUN4I_PLL1_DATA: FactorsData = FactorsData {
    enable: Some(31),
    mux: None,
    config: &SUN4I_PLL1_CONFIG,
    family: FactorsFamily::Sun4iPll1,
    name: None,
};

pub const SUN6I_A31_PLL1_DATA: FactorsData = FactorsData {
    enable: Some(31),
    mux: None,
    config: &SUN6I_A31_PLL1_CONFIG,
    family: FactorsFamily::Sun6iA31Pll1,
    name: None,
};

pub const SUN8I_A23_PLL1_DATA: FactorsData = FactorsData {
    enable: Some(31),
    mux: None,
    config: &SUN8I_A23_PLL1_CONFIG,
    family: FactorsFamily::Sun8iA23Pll1,
    name: None,
};

pub const SUN7I_A20_PLL4_DATA: FactorsData = FactorsData {
    enable: Some(31),
    mux: None,
    config: &SUN4I_PLL5_CONFIG,
    family: FactorsFamily::Sun4iPll5,
    name: None,
};

pub const SUN4I_PLL5_DATA: FactorsData = FactorsData {
    enable: Some(31),
    mux: None,
    config: &SUN4I_PLL5_CONFIG,
    family: FactorsFamily::Sun4iPll5,
    name: Some("pll5"),
};

pub const SUN4I_PLL6_DATA: FactorsData = FactorsData {
    enable: Some(31),
    mux: None,
    config: &SUN4I_PLL5_CONFIG,
    family: FactorsFamily::Sun4iPll5,
    name: Some("pll6"),
};

pub const SUN6I_A31_PLL6_DATA: FactorsData = FactorsData {
    enable: Some(31),
    mux: None,
    config: &SUN6I_A31_PLL6_CONFIG,
    family: FactorsFamily::Sun6iA31Pll6,
    name: Some("pll6x2"),
};

pub const SUN5I_A13_AHB_DATA: FactorsData = FactorsData {
    enable: None,
    mux: Some(6),
    config: &SUN5I_A13_AHB_CONFIG,
    family: FactorsFamily::Sun5iA13Ahb,
    name: None,
};

pub const SUN4I_APB1_DATA: FactorsData = FactorsData {
    enable: None,
    mux: Some(24),
    config: &SUN4I_APB1_CONFIG,
    family: FactorsFamily::Sun4iApb1,
    name: None,
};

pub const SUN7I_A20_OUT_DATA: FactorsData = FactorsData {
    enable: Some(31),
    mux: Some(24),
    config: &SUN7I_A20_OUT_CONFIG,
    family: FactorsFamily::Sun7iA20Out,
    name: None,
};

pub const SUN4I_AXI_DATA: DivData = DivData {
    field: BitField::new(0, 2),
    kind: DividerKind::Linear,
};

pub const SUN8I_A23_AXI_DATA: DivData = DivData {
    field: BitField::new(0, 3),
    kind: DividerKind::Table(SUN8I_A23_AXI_TABLE),
};

pub const SUN4I_AHB_DATA: DivData = DivData {
    field: BitField::new(4, 2),
    kind: DividerKind::PowerOfTwo,
};

pub const SUN4I_APB0_DATA: DivData = DivData {
    field: BitField::new(8, 2),
    kind: DividerKind::Table(SUN4I_APB0_TABLE),
};

/// A31 APB0 in the PRCM block.
pub const SUN6I_A31_APB0_DATA: DivData = DivData {
    field: BitField::new(0, 2),
    kind: DividerKind::Table(SUN6I_A31_APB0_TABLE),
};

/// A23 APB0 in the PRCM block.
pub const SUN8I_A23_APB0_DATA: DivData = DivData {
    field: BitField::new(0, 2),
    kind: DividerKind::PowerOfTwo,
};

/// PLL5: DDR output (M) and "other" output (P). The base clock has no
/// output of its own.
pub const SUN4I_PLL5_DIVS_DATA: DivsData = DivsData {
    factors: &SUN4I_PLL5_DATA,
    outputs: &[
        DivOutput::Divider {
            field: BitField::new(0, DIVISOR_WIDTH),
            kind: DividerKind::Linear,
            gate: None,
        },
        DivOutput::Divider {
            field: BitField::new(16, DIVISOR_WIDTH),
            kind: DividerKind::PowerOfTwo,
            gate: None,
        },
    ],
};

/// PLL6: SATA, other (/2), the 2x base clock and /4 (AHB input).
pub const SUN4I_PLL6_DIVS_DATA: DivsData = DivsData {
    factors: &SUN4I_PLL6_DATA,
    outputs: &[
        DivOutput::Divider {
            field: BitField::new(0, DIVISOR_WIDTH),
            kind: DividerKind::Table(SUN4I_PLL6_SATA_TABLE),
            gate: Some(14),
        },
        DivOutput::Fixed(2),
        DivOutput::Base,
        DivOutput::Fixed(4),
    ],
};

pub const SUN6I_A31_PLL6_DIVS_DATA: DivsData = DivsData {
    factors: &SUN6I_A31_PLL6_DATA,
    outputs: &[DivOutput::Fixed(2), DivOutput::Base],
};

pub const SUN4I_CPU_MUX_DATA: MuxData = MuxData { shift: 16 };
pub const SUN6I_A31_AHB1_MUX_DATA: MuxData = MuxData { shift: 12 };

pub const SUN4I_AXI_GATES_DATA: GatesData = GatesData { mask: &[1] };
pub const SUN4I_AHB_GATES_DATA: GatesData = GatesData {
    mask: &[0x7F77FFF, 0x14FB3F],
};
pub const SUN5I_A10S_AHB_GATES_DATA: GatesData = GatesData {
    mask: &[0x147667e7, 0x185915],
};
pub const SUN5I_A13_AHB_GATES_DATA: GatesData = GatesData {
    mask: &[0x107067e7, 0x185111],
};
pub const SUN6I_A31_AHB1_GATES_DATA: GatesData = GatesData {
    mask: &[0xEDFE7F62, 0x794F931],
};
pub const SUN7I_A20_AHB_GATES_DATA: GatesData = GatesData {
    mask: &[0x12f77fff, 0x16ff3f],
};
pub const SUN8I_A23_AHB1_GATES_DATA: GatesData = GatesData {
    mask: &[0x25386742, 0x2505111],
};
pub const SUN9I_A80_AHB0_GATES_DATA: GatesData = GatesData { mask: &[0xF5F12B] };
pub const SUN9I_A80_AHB1_GATES_DATA: GatesData = GatesData { mask: &[0x1E20003] };
pub const SUN9I_A80_AHB2_GATES_DATA: GatesData = GatesData { mask: &[0x9B7] };
pub const SUN4I_APB0_GATES_DATA: GatesData = GatesData { mask: &[0x4EF] };
pub const SUN5I_A10S_APB0_GATES_DATA: GatesData = GatesData { mask: &[0x469] };
pub const SUN5I_A13_APB0_GATES_DATA: GatesData = GatesData { mask: &[0x61] };
pub const SUN7I_A20_APB0_GATES_DATA: GatesData = GatesData { mask: &[0x4ff] };
pub const SUN9I_A80_APB0_GATES_DATA: GatesData = GatesData { mask: &[0xEB822] };
pub const SUN4I_APB1_GATES_DATA: GatesData = GatesData { mask: &[0xFF00F7] };
pub const SUN5I_A10S_APB1_GATES_DATA: GatesData = GatesData { mask: &[0xf0007] };
pub const SUN5I_A13_APB1_GATES_DATA: GatesData = GatesData { mask: &[0xa0007] };
pub const SUN6I_A31_APB1_GATES_DATA: GatesData = GatesData { mask: &[0x3031] };
pub const SUN8I_A23_APB1_GATES_DATA: GatesData = GatesData { mask: &[0x3021] };
pub const SUN6I_A31_APB2_GATES_DATA: GatesData = GatesData { mask: &[0x3F000F] };
pub const SUN7I_A20_APB1_GATES_DATA: GatesData = GatesData { mask: &[0xff80ff] };
pub const SUN9I_A80_APB1_GATES_DATA: GatesData = GatesData { mask: &[0x3F001F] };
pub const SUN8I_A23_APB2_GATES_DATA: GatesData = GatesData { mask: &[0x1F0007] };
/// PRCM APB0 gates.
pub const SUN6I_A31_APB0_GATES_DATA: GatesData = GatesData { mask: &[0x7F] };
/// PRCM APB0 gates.
pub const SUN8I_A23_APB0_GATES_DATA: GatesData = GatesData { mask: &[0x5D] };

// Critical clocks

pub const SUN4I_A10_CRITICAL_CLOCKS: &[&str] = &["pll5_ddr", "ahb_sdram"];
pub const SUN5I_CRITICAL_CLOCKS: &[&str] = &["cpu", "pll5_ddr", "ahb_sdram"];
pub const SUN6I_CRITICAL_CLOCKS: &[&str] = &["cpu"];
pub const SUN9I_CRITICAL_CLOCKS: &[&str] = &[];

/// Clocks that must never be turned off on the SoC with the given
/// top-level compatible string.
pub fn critical_clocks(soc_compatible: &str) -> Option<&'static [&'static str]> {
    match soc_compatible {
        "allwinner,sun4i-a10" => Some(SUN4I_A10_CRITICAL_CLOCKS),
        "allwinner,sun5i-a10s"
        | "allwinner,sun5i-a13"
        | "allwinner,sun5i-r8"
        | "allwinner,sun7i-a20" => Some(SUN5I_CRITICAL_CLOCKS),
        "allwinner,sun6i-a31" | "allwinner,sun6i-a31s" | "allwinner,sun8i-a23" => {
            Some(SUN6I_CRITICAL_CLOCKS)
        }
        "allwinner,sun9i-a80" => Some(SUN9I_CRITICAL_CLOCKS),
        _ => None,
    }
}

/// How a node is turned into clocks.
#[derive(Clone, Copy, Debug)]
pub enum ClockSetup {
    Divs(&'static DivsData),
    Factors(&'static FactorsData),
    Divider(&'static DivData),
    Mux(&'static MuxData),
    Gates(&'static GatesData),
    /// Fixed-rate oscillator with an enable bit.
    Osc,
    /// GMAC TX clock: remapped mux and a gate.
    Gmac,
    /// AHB1 mux with its custom divider.
    Ahb1,
    /// AR100 mux with its custom divider.
    Ar100,
}

impl ClockSetup {
    /// Position in the build order.
    fn phase(&self) -> usize {
        match self {
            ClockSetup::Divs(_) => 0,
            ClockSetup::Factors(_) => 1,
            ClockSetup::Divider(_) => 2,
            ClockSetup::Mux(_) => 3,
            ClockSetup::Gates(_) => 4,
            ClockSetup::Osc | ClockSetup::Gmac | ClockSetup::Ahb1 | ClockSetup::Ar100 => 5,
        }
    }
}

const PHASES: usize = 6;

/// Every clock node the tables know about, one per `compatible` string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockFamily {
    Sun4iA10Pll5,
    Sun4iA10Pll6,
    Sun6iA31Pll6,
    Sun4iA10Pll1,
    Sun6iA31Pll1,
    Sun8iA23Pll1,
    Sun7iA20Pll4,
    Sun5iA13Ahb,
    Sun4iA10Apb1,
    Sun7iA20Out,
    Sun4iA10Axi,
    Sun8iA23Axi,
    Sun4iA10Ahb,
    Sun4iA10Apb0,
    Sun6iA31Apb0,
    Sun8iA23Apb0,
    Sun4iA10Cpu,
    Sun6iA31Ahb1Mux,
    Sun4iA10AxiGates,
    Sun4iA10AhbGates,
    Sun5iA10sAhbGates,
    Sun5iA13AhbGates,
    Sun6iA31Ahb1Gates,
    Sun7iA20AhbGates,
    Sun8iA23Ahb1Gates,
    Sun9iA80Ahb0Gates,
    Sun9iA80Ahb1Gates,
    Sun9iA80Ahb2Gates,
    Sun4iA10Apb0Gates,
    Sun5iA10sApb0Gates,
    Sun5iA13Apb0Gates,
    Sun7iA20Apb0Gates,
    Sun9iA80Apb0Gates,
    Sun4iA10Apb1Gates,
    Sun5iA10sApb1Gates,
    Sun5iA13Apb1Gates,
    Sun6iA31Apb1Gates,
    Sun7iA20Apb1Gates,
    Sun8iA23Apb1Gates,
    Sun9iA80Apb1Gates,
    Sun6iA31Apb2Gates,
    Sun8iA23Apb2Gates,
    Sun6iA31PrcmApb0Gates,
    Sun8iA23PrcmApb0Gates,
    Sun4iA10Osc,
    Sun7iA20Gmac,
    Sun6iA31Ahb1,
    Sun6iA31Ar100,
}

const COMPATIBLES: &[(&str, ClockFamily)] = &[
    ("allwinner,sun4i-a10-pll5-clk", ClockFamily::Sun4iA10Pll5),
    ("allwinner,sun4i-a10-pll6-clk", ClockFamily::Sun4iA10Pll6),
    ("allwinner,sun6i-a31-pll6-clk", ClockFamily::Sun6iA31Pll6),
    ("allwinner,sun4i-a10-pll1-clk", ClockFamily::Sun4iA10Pll1),
    ("allwinner,sun6i-a31-pll1-clk", ClockFamily::Sun6iA31Pll1),
    ("allwinner,sun8i-a23-pll1-clk", ClockFamily::Sun8iA23Pll1),
    ("allwinner,sun7i-a20-pll4-clk", ClockFamily::Sun7iA20Pll4),
    ("allwinner,sun5i-a13-ahb-clk", ClockFamily::Sun5iA13Ahb),
    ("allwinner,sun4i-a10-apb1-clk", ClockFamily::Sun4iA10Apb1),
    ("allwinner,sun7i-a20-out-clk", ClockFamily::Sun7iA20Out),
    ("allwinner,sun4i-a10-axi-clk", ClockFamily::Sun4iA10Axi),
    ("allwinner,sun8i-a23-axi-clk", ClockFamily::Sun8iA23Axi),
    ("allwinner,sun4i-a10-ahb-clk", ClockFamily::Sun4iA10Ahb),
    ("allwinner,sun4i-a10-apb0-clk", ClockFamily::Sun4iA10Apb0),
    ("allwinner,sun6i-a31-apb0-clk", ClockFamily::Sun6iA31Apb0),
    ("allwinner,sun8i-a23-apb0-clk", ClockFamily::Sun8iA23Apb0),
    ("allwinner,sun4i-a10-cpu-clk", ClockFamily::Sun4iA10Cpu),
    ("allwinner,sun6i-a31-ahb1-mux-clk", ClockFamily::Sun6iA31Ahb1Mux),
    ("allwinner,sun4i-a10-axi-gates-clk", ClockFamily::Sun4iA10AxiGates),
    ("allwinner,sun4i-a10-ahb-gates-clk", ClockFamily::Sun4iA10AhbGates),
    ("allwinner,sun5i-a10s-ahb-gates-clk", ClockFamily::Sun5iA10sAhbGates),
    ("allwinner,sun5i-a13-ahb-gates-clk", ClockFamily::Sun5iA13AhbGates),
    ("allwinner,sun6i-a31-ahb1-gates-clk", ClockFamily::Sun6iA31Ahb1Gates),
    ("allwinner,sun7i-a20-ahb-gates-clk", ClockFamily::Sun7iA20AhbGates),
    ("allwinner,sun8i-a23-ahb1-gates-clk", ClockFamily::Sun8iA23Ahb1Gates),
    ("allwinner,sun9i-a80-ahb0-gates-clk", ClockFamily::Sun9iA80Ahb0Gates),
    ("allwinner,sun9i-a80-ahb1-gates-clk", ClockFamily::Sun9iA80Ahb1Gates),
    ("allwinner,sun9i-a80-ahb2-gates-clk", ClockFamily::Sun9iA80Ahb2Gates),
    ("allwinner,sun4i-a10-apb0-gates-clk", ClockFamily::Sun4iA10Apb0Gates),
    ("allwinner,sun5i-a10s-apb0-gates-clk", ClockFamily::Sun5iA10sApb0Gates),
    ("allwinner,sun5i-a13-apb0-gates-clk", ClockFamily::Sun5iA13Apb0Gates),
    ("allwinner,sun7i-a20-apb0-gates-clk", ClockFamily::Sun7iA20Apb0Gates),
    ("allwinner,sun9i-a80-apb0-gates-clk", ClockFamily::Sun9iA80Apb0Gates),
    ("allwinner,sun4i-a10-apb1-gates-clk", ClockFamily::Sun4iA10Apb1Gates),
    ("allwinner,sun5i-a10s-apb1-gates-clk", ClockFamily::Sun5iA10sApb1Gates),
    ("allwinner,sun5i-a13-apb1-gates-clk", ClockFamily::Sun5iA13Apb1Gates),
    ("allwinner,sun6i-a31-apb1-gates-clk", ClockFamily::Sun6iA31Apb1Gates),
    ("allwinner,sun7i-a20-apb1-gates-clk", ClockFamily::Sun7iA20Apb1Gates),
    ("allwinner,sun8i-a23-apb1-gates-clk", ClockFamily::Sun8iA23Apb1Gates),
    ("allwinner,sun9i-a80-apb1-gates-clk", ClockFamily::Sun9iA80Apb1Gates),
    ("allwinner,sun6i-a31-apb2-gates-clk", ClockFamily::Sun6iA31Apb2Gates),
    ("allwinner,sun8i-a23-apb2-gates-clk", ClockFamily::Sun8iA23Apb2Gates),
    ("allwinner,sun6i-a31-apb0-gates-clk", ClockFamily::Sun6iA31PrcmApb0Gates),
    ("allwinner,sun8i-a23-apb0-gates-clk", ClockFamily::Sun8iA23PrcmApb0Gates),
    ("allwinner,sun4i-a10-osc-clk", ClockFamily::Sun4iA10Osc),
    ("allwinner,sun7i-a20-gmac-clk", ClockFamily::Sun7iA20Gmac),
    ("allwinner,sun6i-a31-ahb1-clk", ClockFamily::Sun6iA31Ahb1),
    ("allwinner,sun6i-a31-ar100-clk", ClockFamily::Sun6iA31Ar100),
];

impl ClockFamily {
    pub fn from_compatible(compatible: &str) -> Option<ClockFamily> {
        COMPATIBLES
            .iter()
            .find(|(name, _)| *name == compatible)
            .map(|&(_, family)| family)
    }

    pub fn compatible(self) -> &'static str {
        COMPATIBLES
            .iter()
            .find(|(_, family)| *family == self)
            .map_or("", |&(name, _)| name)
    }

    pub fn setup(self) -> ClockSetup {
        match self {
            ClockFamily::Sun4iA10Pll5 => ClockSetup::Divs(&SUN4I_PLL5_DIVS_DATA),
            ClockFamily::Sun4iA10Pll6 => ClockSetup::Divs(&SUN4I_PLL6_DIVS_DATA),
            ClockFamily::Sun6iA31Pll6 => ClockSetup::Divs(&SUN6I_A31_PLL6_DIVS_DATA),
            ClockFamily::Sun4iA10Pll1 => ClockSetup::Factors(&SUN4I_PLL1_DATA),
            ClockFamily::Sun6iA31Pll1 => ClockSetup::Factors(&SUN6I_A31_PLL1_DATA),
            ClockFamily::Sun8iA23Pll1 => ClockSetup::Factors(&SUN8I_A23_PLL1_DATA),
            ClockFamily::Sun7iA20Pll4 => ClockSetup::Factors(&SUN7I_A20_PLL4_DATA),
            ClockFamily::Sun5iA13Ahb => ClockSetup::Factors(&SUN5I_A13_AHB_DATA),
            ClockFamily::Sun4iA10Apb1 => ClockSetup::Factors(&SUN4I_APB1_DATA),
            ClockFamily::Sun7iA20Out => ClockSetup::Factors(&SUN7I_A20_OUT_DATA),
            ClockFamily::Sun4iA10Axi => ClockSetup::Divider(&SUN4I_AXI_DATA),
            ClockFamily::Sun8iA23Axi => ClockSetup::Divider(&SUN8I_A23_AXI_DATA),
            ClockFamily::Sun4iA10Ahb => ClockSetup::Divider(&SUN4I_AHB_DATA),
            ClockFamily::Sun4iA10Apb0 => ClockSetup::Divider(&SUN4I_APB0_DATA),
            ClockFamily::Sun6iA31Apb0 => ClockSetup::Divider(&SUN6I_A31_APB0_DATA),
            ClockFamily::Sun8iA23Apb0 => ClockSetup::Divider(&SUN8I_A23_APB0_DATA),
            ClockFamily::Sun4iA10Cpu => ClockSetup::Mux(&SUN4I_CPU_MUX_DATA),
            ClockFamily::Sun6iA31Ahb1Mux => ClockSetup::Mux(&SUN6I_A31_AHB1_MUX_DATA),
            ClockFamily::Sun4iA10AxiGates => ClockSetup::Gates(&SUN4I_AXI_GATES_DATA),
            ClockFamily::Sun4iA10AhbGates => ClockSetup::Gates(&SUN4I_AHB_GATES_DATA),
            ClockFamily::Sun5iA10sAhbGates => ClockSetup::Gates(&SUN5I_A10S_AHB_GATES_DATA),
            ClockFamily::Sun5iA13AhbGates => ClockSetup::Gates(&SUN5I_A13_AHB_GATES_DATA),
            ClockFamily::Sun6iA31Ahb1Gates => ClockSetup::Gates(&SUN6I_A31_AHB1_GATES_DATA),
            ClockFamily::Sun7iA20AhbGates => ClockSetup::Gates(&SUN7I_A20_AHB_GATES_DATA),
            ClockFamily::Sun8iA23Ahb1Gates => ClockSetup::Gates(&SUN8I_A23_AHB1_GATES_DATA),
            ClockFamily::Sun9iA80Ahb0Gates => ClockSetup::Gates(&SUN9I_A80_AHB0_GATES_DATA),
            ClockFamily::Sun9iA80Ahb1Gates => ClockSetup::Gates(&SUN9I_A80_AHB1_GATES_DATA),
            ClockFamily::Sun9iA80Ahb2Gates => ClockSetup::Gates(&SUN9I_A80_AHB2_GATES_DATA),
            ClockFamily::Sun4iA10Apb0Gates => ClockSetup::Gates(&SUN4I_APB0_GATES_DATA),
            ClockFamily::Sun5iA10sApb0Gates => ClockSetup::Gates(&SUN5I_A10S_APB0_GATES_DATA),
            ClockFamily::Sun5iA13Apb0Gates => ClockSetup::Gates(&SUN5I_A13_APB0_GATES_DATA),
            ClockFamily::Sun7iA20Apb0Gates => ClockSetup::Gates(&SUN7I_A20_APB0_GATES_DATA),
            ClockFamily::Sun9iA80Apb0Gates => ClockSetup::Gates(&SUN9I_A80_APB0_GATES_DATA),
            ClockFamily::Sun4iA10Apb1Gates => ClockSetup::Gates(&SUN4I_APB1_GATES_DATA),
            ClockFamily::Sun5iA10sApb1Gates => ClockSetup::Gates(&SUN5I_A10S_APB1_GATES_DATA),
            ClockFamily::Sun5iA13Apb1Gates => ClockSetup::Gates(&SUN5I_A13_APB1_GATES_DATA),
            ClockFamily::Sun6iA31Apb1Gates => ClockSetup::Gates(&SUN6I_A31_APB1_GATES_DATA),
            ClockFamily::Sun7iA20Apb1Gates => ClockSetup::Gates(&SUN7I_A20_APB1_GATES_DATA),
            ClockFamily::Sun8iA23Apb1Gates => ClockSetup::Gates(&SUN8I_A23_APB1_GATES_DATA),
            ClockFamily::Sun9iA80Apb1Gates => ClockSetup::Gates(&SUN9I_A80_APB1_GATES_DATA),
            ClockFamily::Sun6iA31Apb2Gates => ClockSetup::Gates(&SUN6I_A31_APB2_GATES_DATA),
            ClockFamily::Sun8iA23Apb2Gates => ClockSetup::Gates(&SUN8I_A23_APB2_GATES_DATA),
            ClockFamily::Sun6iA31PrcmApb0Gates => ClockSetup::Gates(&SUN6I_A31_APB0_GATES_DATA),
            ClockFamily::Sun8iA23PrcmApb0Gates => ClockSetup::Gates(&SUN8I_A23_APB0_GATES_DATA),
            ClockFamily::Sun4iA10Osc => ClockSetup::Osc,
            ClockFamily::Sun7iA20Gmac => ClockSetup::Gmac,
            ClockFamily::Sun6iA31Ahb1 => ClockSetup::Ahb1,
            ClockFamily::Sun6iA31Ar100 => ClockSetup::Ar100,
        }
    }
}

/// One clock node of the board, as the device tree describes it.
pub struct ClockNode<'a, R: ClockRegister> {
    /// Node name, also the clock name when there are no output names.
    pub name: &'a str,
    pub compatible: &'a str,
    pub parents: &'a [&'a str],
    pub output_names: &'a [&'a str],
    /// `clock-frequency`, for fixed-rate clocks.
    pub frequency: Option<u32>,
    /// The node's control registers, consecutive 32-bit words.
    pub regs: &'a [R],
}

impl<'a, R: ClockRegister> ClockNode<'a, R> {
    fn reg(&self, word: usize) -> Result<&'a dyn ClockRegister, ErrorCode> {
        let regs: &'a [R] = self.regs;
        match regs.get(word) {
            Some(reg) => Ok(reg),
            None => Err(ErrorCode::NODEVICE),
        }
    }

    /// Parents, capped at what a mux of the family can select.
    fn parents_up_to(&self, max: usize) -> &'a [&'a str] {
        let parents: &'a [&'a str] = self.parents;
        &parents[..parents.len().min(max)]
    }

    fn first_parent(&self) -> Result<&'a str, ErrorCode> {
        self.parents.first().copied().ok_or(ErrorCode::INVAL)
    }

    /// First output name if there is one, else the node name.
    fn clock_name(&self) -> &'a str {
        self.output_names.first().copied().unwrap_or(self.name)
    }
}

fn register_composite<'a, const N: usize>(
    registry: &mut ClockRegistry<'a, N>,
    clock: CompositeClock<'a>,
) -> Result<ClockId, ErrorCode> {
    registry.register(ClockEntry::Composite(clock))
}

fn factors_clk_setup<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    data: &'static FactorsData,
    delay: &'a dyn Delay,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<ClockId, ErrorCode> {
    let reg = node.reg(0)?;
    let parents = node.parents_up_to(MAX_PARENTS);
    let name: &'a str = match data.name {
        Some(name) => name,
        None => node.clock_name(),
    };

    let gate = data.enable.map(|bit| Gate::new(reg, bit));
    let mux = data
        .mux
        .map(|shift| Mux::new(reg, BitField::new(shift, MUX_WIDTH), None, parents.len()));
    let rate = RateStage::Factor(FactorClock::new(reg, data.config, data.family, delay));

    let clock = CompositeClock::new(name, parents, mux, Some(rate), gate)?;
    register_composite(registry, clock)
}

fn divs_clk_setup<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    data: &'static DivsData,
    delay: &'a dyn Delay,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<usize, ErrorCode> {
    let base = factors_clk_setup(node, data.factors, delay, registry)?;
    let parent = registry.name(base).ok_or(ErrorCode::FAIL)?;
    let reg = node.reg(0)?;
    let mut registered = 1;

    for (output, &name) in data.outputs.iter().zip(node.output_names.iter()) {
        let (rate, gate) = match *output {
            DivOutput::Base => continue,
            DivOutput::Fixed(div) => (RateStage::FixedFactor(FixedFactor::new(1, div)), None),
            DivOutput::Divider { field, kind, gate } => (
                RateStage::Divider(Divider::new(reg, field, kind)),
                gate.map(|bit| Gate::new(reg, bit)),
            ),
        };
        let clock = CompositeClock::new(name, &[parent], None, Some(rate), gate)?;
        register_composite(registry, clock)?;
        registered += 1;
    }

    // Every output needs a name, as for gate banks; the named ones stay
    if node.output_names.len() < data.outputs.len() {
        return Err(ErrorCode::INVAL);
    }
    Ok(registered)
}

fn divider_clk_setup<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    data: &'static DivData,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<ClockId, ErrorCode> {
    let reg = node.reg(0)?;
    let parent = node.first_parent()?;
    let rate = RateStage::Divider(Divider::new(reg, data.field, data.kind));
    let clock = CompositeClock::new(node.clock_name(), &[parent], None, Some(rate), None)?;
    register_composite(registry, clock)
}

fn mux_clk_setup<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    data: &'static MuxData,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<ClockId, ErrorCode> {
    let reg = node.reg(0)?;
    let parents = node.parents_up_to(MAX_PARENTS);
    let mux = Mux::new(reg, BitField::new(data.shift, MUX_WIDTH), None, parents.len());
    let clock = CompositeClock::new(node.clock_name(), parents, Some(mux), None, None)?;
    register_composite(registry, clock)
}

/// Register one gate per set bit of the mask, named after the output names
/// in order.
fn gates_clk_setup<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    data: &'static GatesData,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<usize, ErrorCode> {
    let parent = node.first_parent()?;
    let mut names = node.output_names.iter().copied();
    let mut registered = 0;

    for (word, &mask) in data.mask.iter().enumerate() {
        let reg = node.reg(word)?;
        for bit in (0..32u8).filter(|bit| mask & (1 << bit) != 0) {
            let name = names.next().ok_or(ErrorCode::INVAL)?;
            registry.register(ClockEntry::Gate {
                name,
                parent,
                gate: Gate::new(reg, bit),
            })?;
            registered += 1;
        }
    }
    Ok(registered)
}

fn osc_clk_setup<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<ClockId, ErrorCode> {
    let rate = node.frequency.ok_or(ErrorCode::INVAL)?;
    let reg = node.reg(0)?;
    let clock = CompositeClock::new(
        node.clock_name(),
        &[],
        None,
        Some(RateStage::FixedRate(FixedRate::new(rate))),
        Some(Gate::new(reg, SUNXI_OSC24M_GATE)),
    )?;
    register_composite(registry, clock)
}

fn gmac_clk_setup<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<ClockId, ErrorCode> {
    let name = node.output_names.first().copied().ok_or(ErrorCode::INVAL)?;
    let reg = node.reg(0)?;
    let num_parents = SUN7I_A20_GMAC_MUX_TABLE.len();
    // One parent per mux code
    if node.parents.len() < num_parents {
        return Err(ErrorCode::INVAL);
    }
    let mux = Mux::new(
        reg,
        BitField::new(0, MUX_WIDTH),
        Some(SUN7I_A20_GMAC_MUX_TABLE),
        num_parents,
    );
    let clock = CompositeClock::new(
        name,
        node.parents_up_to(num_parents),
        Some(mux),
        None,
        Some(Gate::new(reg, SUN7I_A20_GMAC_GPIT)),
    )?;
    register_composite(registry, clock)
}

fn ahb1_clk_setup<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<ClockId, ErrorCode> {
    let reg = node.reg(0)?;
    let parents = node.parents_up_to(AHB1_MAX_PARENTS);
    let mux = Mux::new(
        reg,
        BitField::new(SUN6I_A31_AHB1_MUX_DATA.shift, MUX_WIDTH),
        None,
        parents.len(),
    );
    let clock = CompositeClock::new(
        node.clock_name(),
        parents,
        Some(mux),
        Some(RateStage::Ahb1(Ahb1::new(reg))),
        None,
    )?;
    register_composite(registry, clock)
}

fn ar100_clk_setup<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<ClockId, ErrorCode> {
    let reg = node.reg(0)?;
    let parents = node.parents_up_to(AR100_MAX_PARENTS);
    let mux = Mux::new(reg, BitField::new(16, MUX_WIDTH), None, parents.len());
    let clock = CompositeClock::new(
        node.clock_name(),
        parents,
        Some(mux),
        Some(RateStage::Ar100(Ar100::new(reg))),
        None,
    )?;
    register_composite(registry, clock)
}

/// Build the clocks of one node. Returns how many were registered.
pub fn setup_node<'a, R: ClockRegister, const N: usize>(
    node: &ClockNode<'a, R>,
    setup: ClockSetup,
    delay: &'a dyn Delay,
    registry: &mut ClockRegistry<'a, N>,
) -> Result<usize, ErrorCode> {
    match setup {
        ClockSetup::Divs(data) => divs_clk_setup(node, data, delay, registry),
        ClockSetup::Factors(data) => factors_clk_setup(node, data, delay, registry).map(|_| 1),
        ClockSetup::Divider(data) => divider_clk_setup(node, data, registry).map(|_| 1),
        ClockSetup::Mux(data) => mux_clk_setup(node, data, registry).map(|_| 1),
        ClockSetup::Gates(data) => gates_clk_setup(node, data, registry),
        ClockSetup::Osc => osc_clk_setup(node, registry).map(|_| 1),
        ClockSetup::Gmac => gmac_clk_setup(node, registry).map(|_| 1),
        ClockSetup::Ahb1 => ahb1_clk_setup(node, registry).map(|_| 1),
        ClockSetup::Ar100 => ar100_clk_setup(node, registry).map(|_| 1),
    }
}

/// Build the whole clock tree, then protect the `critical` clocks.
///
/// A node that fails is logged and skipped; the others are still built. A
/// gate bank or a PLL with divided outputs keeps the clocks it registered
/// before failing. Nodes with an unknown `compatible` are ignored. Returns
/// the number of nodes that failed.
pub fn init_clocks<'a, R: ClockRegister, const N: usize>(
    nodes: &[ClockNode<'a, R>],
    delay: &'a dyn Delay,
    registry: &mut ClockRegistry<'a, N>,
    critical: &[&str],
) -> usize {
    let mut failed = 0;

    for phase in 0..PHASES {
        for node in nodes {
            let Some(family) = ClockFamily::from_compatible(node.compatible) else {
                if phase == 0 {
                    warn!("sunxi: {}: unknown clock {}", node.name, node.compatible);
                }
                continue;
            };
            let setup = family.setup();
            if setup.phase() != phase {
                continue;
            }

            match setup_node(node, setup, delay, registry) {
                Ok(count) => {
                    if CONFIG.debug_clk_setup {
                        debug!("sunxi: {}: {:?}, {} clock(s)", node.name, family, count);
                    }
                }
                Err(err) => {
                    error!("sunxi: {}: setup failed: {:?}", node.name, err);
                    failed += 1;
                }
            }
        }
    }

    registry.protect_critical(critical);
    failed
}
