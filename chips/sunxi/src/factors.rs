// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Factor algorithms for the adjustable clocks of the sunxi family.
//!
//! Every PLL and most bus dividers of these chips follow the same formula:
//!
//! ```text
//! rate = (parent_rate * (N + n_start) * (K + 1) >> P) / (M + 1)
//! ```
//!
//! Which of N, K, M and P exist, where they live in the register and how a
//! target rate is turned into factors is family specific. The field layout is
//! a [`FactorsConfig`] and the algorithm a [`FactorsFamily`].
//!
//! A family answers two questions that must agree with each other:
//!
//! - [`FactorsFamily::round`]: which rate is achievable for a target rate,
//! - [`FactorsFamily::apply`]: which factors produce that rate.
//!
//! Both run the same pure computation, and the achievable rate is always the
//! formula evaluated on the factors, so `round` never promises a rate that
//! `apply` cannot program.
//!
//! None of the algorithms fail. Requests outside of what the hardware can do
//! saturate at the closest boundary: these run during early boot where nobody
//! could handle an error anyway.

use crate::bitfield::BitField;

/// One set of factors, as stored in the register fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Factors {
    pub n: u8,
    pub k: u8,
    pub m: u8,
    pub p: u8,
}

/// Layout of the factor fields of one clock register.
///
/// `None` marks a factor the family does not have. It is never read from nor
/// written to the register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FactorsConfig {
    pub n: Option<BitField>,
    pub k: Option<BitField>,
    pub m: Option<BitField>,
    pub p: Option<BitField>,
    /// Offset added to the stored N before it is used as a multiplier.
    pub n_start: u8,
}

fn field_max(field: Option<BitField>) -> u8 {
    field.map_or(0, |f| saturate(f.max()))
}

fn saturate(value: u32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

impl FactorsConfig {
    /// Decode the factors stored in `reg`. Absent factors read as 0.
    pub fn decode(&self, reg: u32) -> Factors {
        let get = |field: Option<BitField>| field.map_or(0, |f| saturate(f.extract(reg)));
        Factors {
            n: get(self.n),
            k: get(self.k),
            m: get(self.m),
            p: get(self.p),
        }
    }

    /// Store `factors` into `reg`, leaving absent fields and every other bit
    /// untouched.
    pub fn encode(&self, reg: u32, factors: Factors) -> u32 {
        let set = |reg: u32, field: Option<BitField>, value: u8| {
            field.map_or(reg, |f| f.insert(reg, u32::from(value)))
        };
        let reg = set(reg, self.n, factors.n);
        let reg = set(reg, self.k, factors.k);
        let reg = set(reg, self.m, factors.m);
        set(reg, self.p, factors.p)
    }

    /// Limit each factor to what its field can hold. Absent factors become 0.
    pub fn clamp(&self, factors: Factors) -> Factors {
        Factors {
            n: factors.n.min(field_max(self.n)),
            k: factors.k.min(field_max(self.k)),
            m: factors.m.min(field_max(self.m)),
            p: factors.p.min(field_max(self.p)),
        }
    }

    /// Largest multiplier `N + n_start` the N field can express.
    fn n_limit(&self) -> u32 {
        u32::from(field_max(self.n)) + u32::from(self.n_start)
    }
}

/// Evaluate the factor formula.
///
/// An absent N counts as a multiplier of 1, absent K, M and P count as 0.
/// The computation is done on 64 bits and saturates to `u32::MAX`.
pub fn rate_for_factors(config: &FactorsConfig, factors: Factors, parent_rate: u32) -> u32 {
    let n = match config.n {
        Some(_) => u64::from(factors.n) + u64::from(config.n_start),
        None => 1,
    };
    let k = config.k.map_or(0, |_| u64::from(factors.k));
    let m = config.m.map_or(0, |_| u64::from(factors.m));
    let p = config.p.map_or(0, |_| u32::from(factors.p));

    let rate = ((u64::from(parent_rate) * n * (k + 1)) >> p) / (m + 1);
    u32::try_from(rate).unwrap_or(u32::MAX)
}

/// Smallest divisor `d` such that `parent_rate / d` (rounded down, as the
/// hardware does) is not above `rate`.
pub(crate) fn min_divisor(parent_rate: u32, rate: u32) -> u32 {
    let d = u64::from(parent_rate) / (u64::from(rate) + 1) + 1;
    u32::try_from(d).unwrap_or(u32::MAX)
}

/// `ceil(log2(n))`, with `order_base_2(0) == order_base_2(1) == 0`.
pub(crate) fn order_base_2(n: u32) -> u32 {
    if n <= 1 {
        0
    } else {
        32 - (n - 1).leading_zeros()
    }
}

/// The factor algorithms, one per clock family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactorsFamily {
    /// A10/A13/A20 PLL1: `rate = parent * N * (K + 1) >> P / (M + 1)`.
    Sun4iPll1,
    /// A31 PLL1: `rate = parent * (N + 1) * (K + 1) / (M + 1)`.
    Sun6iA31Pll1,
    /// A23 PLL1: `rate = parent * (N + 1) * (K + 1) >> P / (M + 1)`.
    Sun8iA23Pll1,
    /// A10 PLL5/PLL6 and A20 PLL4: `rate = parent * N * (K + 1)`.
    Sun4iPll5,
    /// A31 PLL6 (2x output): `rate = parent * (N + 1) * (K + 1)`.
    Sun6iA31Pll6,
    /// A13 AHB: `rate = parent >> P`.
    Sun5iA13Ahb,
    /// A10 APB1: `rate = (parent >> P) / (M + 1)`.
    Sun4iApb1,
    /// A20 CLK_OUT_A/B: `rate = (parent >> P) / (M + 1)`.
    Sun7iA20Out,
}

impl FactorsFamily {
    /// Whether the family can only divide its parent.
    pub fn is_divide_only(self) -> bool {
        matches!(
            self,
            FactorsFamily::Sun5iA13Ahb | FactorsFamily::Sun4iApb1 | FactorsFamily::Sun7iA20Out
        )
    }

    /// Factors to program for `rate`. Never touches hardware.
    pub fn apply(self, config: &FactorsConfig, rate: u32, parent_rate: u32) -> Factors {
        let factors = match self {
            FactorsFamily::Sun4iPll1 => sun4i_pll1(rate),
            FactorsFamily::Sun6iA31Pll1 => sun6i_a31_pll1(rate, parent_rate),
            FactorsFamily::Sun8iA23Pll1 => sun8i_a23_pll1(rate),
            FactorsFamily::Sun4iPll5 | FactorsFamily::Sun6iA31Pll6 => {
                pll_nk(config, rate, parent_rate)
            }
            FactorsFamily::Sun5iA13Ahb => sun5i_a13_ahb(rate, parent_rate),
            FactorsFamily::Sun4iApb1 => sun4i_apb1(rate, parent_rate),
            FactorsFamily::Sun7iA20Out => sun7i_a20_out(config, rate, parent_rate),
        };
        config.clamp(factors)
    }

    /// Rate the clock would run at if asked for `rate`.
    pub fn round(self, config: &FactorsConfig, rate: u32, parent_rate: u32) -> u32 {
        rate_for_factors(config, self.apply(config, rate, parent_rate), parent_rate)
    }
}

// PLL1 of the A10 only runs from the 24MHz oscillator, so the algorithm works
// on multiples of 6MHz and ignores the parent rate.
fn sun4i_pll1(rate: u32) -> Factors {
    let div = (rate / 6_000_000).max(1);
    let freq = 6_000_000 * div;

    // K is only needed for the fastest rates, and for two slow ones that
    // cannot be reached otherwise.
    let k = if freq >= 768_000_000 || freq == 42_000_000 || freq == 54_000_000 {
        1
    } else {
        0
    };

    let p = if div < 10 {
        3
    } else if div < 20 || (div < 32 && div & 1 != 0) {
        2
    } else if div < 40 || (div < 64 && div & 2 != 0) {
        1
    } else {
        0
    };

    let n = ((div << p) / (k + 1)) / 4;

    Factors {
        n: saturate(n),
        k: saturate(k),
        m: 0,
        p: saturate(p),
    }
}

// Same as the A10, except that P stops at 2 and N is stored minus one.
fn sun8i_a23_pll1(rate: u32) -> Factors {
    let div = (rate / 6_000_000).max(1);
    let freq = 6_000_000 * div;

    let k = if freq >= 768_000_000 || freq == 42_000_000 || freq == 54_000_000 {
        1
    } else {
        0
    };

    let p = if div < 20 || (div < 32 && div & 1 != 0) {
        2
    } else if div < 40 || (div < 64 && div & 2 != 0) {
        1
    } else {
        0
    };

    let n = (((div << p) / (k + 1)) / 4).saturating_sub(1);

    Factors {
        n: saturate(n),
        k: saturate(k),
        m: 0,
        p: saturate(p),
    }
}

// The A31 PLL1 has no P. The target is rounded down to a multiple of 6 or
// 16MHz, whichever is closer, and the factors are derived in MHz.
fn sun6i_a31_pll1(rate: u32, parent_rate: u32) -> Factors {
    let parent_mhz = (parent_rate / 1_000_000).max(1);
    let freq_mhz = rate / 1_000_000;

    let round_6 = freq_mhz - freq_mhz % 6;
    let round_16 = freq_mhz - freq_mhz % 16;
    // 6MHz is the slowest rate (N = 0, K = 0, M = 3)
    let freq_mhz = round_6.max(round_16).max(6);

    let k = if freq_mhz % 32 == 0 {
        3
    } else if freq_mhz % 9 == 0 {
        2
    } else if freq_mhz % 8 == 0 {
        1
    } else {
        0
    };

    let mut m = if freq_mhz % 6 == 2 || freq_mhz % 6 == 4 {
        2
    } else if (freq_mhz / 6) & 1 != 0 {
        3
    } else {
        1
    };

    let mut n = freq_mhz * (m + 1) / ((k + 1) * parent_mhz);

    // N overflows: trade some M for it while M can still shrink.
    if n > 31 && m + 1 > 1 {
        n /= 2;
        m = (m + 1) / 2 - 1;
    }

    Factors {
        n: saturate(n.saturating_sub(1)),
        k: saturate(k),
        m: saturate(m),
        p: 0,
    }
}

// Integer multiple of the parent: pick the smallest K that keeps N within its
// field, so that the programmed rate is as close to the target as possible.
fn pll_nk(config: &FactorsConfig, rate: u32, parent_rate: u32) -> Factors {
    let div = (rate / parent_rate.max(1)).max(1);
    let n_limit = config.n_limit().max(1);
    let k_max = u32::from(field_max(config.k));

    let mut k = 0;
    while k < k_max && div.div_ceil(k + 1) > n_limit {
        k += 1;
    }
    let n = div.div_ceil(k + 1).min(n_limit);

    Factors {
        n: saturate(n.saturating_sub(u32::from(config.n_start))),
        k: saturate(k),
        m: 0,
        p: 0,
    }
}

fn sun5i_a13_ahb(rate: u32, parent_rate: u32) -> Factors {
    // The user manual says 8kHz to 276MHz, but the bus runs fine up to 300MHz
    // once it is reparented to PLL6.
    let freq = rate.min(parent_rate).clamp(8_000, 300_000_000);
    let p = order_base_2(min_divisor(parent_rate, freq)).min(3);

    Factors {
        p: saturate(p),
        ..Factors::default()
    }
}

fn sun4i_apb1(rate: u32, parent_rate: u32) -> Factors {
    let freq = rate.min(parent_rate);
    let div = min_divisor(parent_rate, freq).clamp(1, 32);

    let p = if div <= 4 {
        0
    } else if div <= 8 {
        1
    } else if div <= 16 {
        2
    } else {
        3
    };
    let m = div.div_ceil(1 << p) - 1;

    Factors {
        m: saturate(m),
        p: saturate(p),
        ..Factors::default()
    }
}

fn sun7i_a20_out(config: &FactorsConfig, rate: u32, parent_rate: u32) -> Factors {
    let freq = rate.min(parent_rate);
    let div = min_divisor(parent_rate, freq);

    let p = if div < 32 {
        0
    } else if div / 2 < 32 {
        1
    } else if div / 4 < 32 {
        2
    } else {
        3
    };
    let m_limit = u32::from(field_max(config.m)) + 1;
    let m = div.div_ceil(1 << p).min(m_limit) - 1;

    Factors {
        m: saturate(m),
        p: saturate(p),
        ..Factors::default()
    }
}
