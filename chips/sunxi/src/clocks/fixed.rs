// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Rate stages that cannot be programmed.

use crate::clocks::RateOps;
use crate::ErrorCode;

/// A clock of constant rate, ignoring its parent (the 24MHz oscillator).
pub struct FixedRate {
    rate: u32,
}

impl FixedRate {
    pub const fn new(rate: u32) -> Self {
        FixedRate { rate }
    }
}

impl RateOps for FixedRate {
    fn recalc_rate(&self, _parent_rate: u32) -> Result<u32, ErrorCode> {
        Ok(self.rate)
    }

    fn round_rate(&self, _rate: u32, _parent_rate: u32) -> u32 {
        self.rate
    }

    fn set_rate(&self, rate: u32, _parent_rate: u32) -> Result<(), ErrorCode> {
        if rate == self.rate {
            Ok(())
        } else {
            Err(ErrorCode::NOSUPPORT)
        }
    }
}

/// `parent * mult / div`, for the fixed outputs of PLL6.
pub struct FixedFactor {
    mult: u32,
    div: u32,
}

impl FixedFactor {
    pub const fn new(mult: u32, div: u32) -> Self {
        FixedFactor { mult, div }
    }

    fn rate(&self, parent_rate: u32) -> u32 {
        let rate = u64::from(parent_rate) * u64::from(self.mult) / u64::from(self.div.max(1));
        u32::try_from(rate).unwrap_or(u32::MAX)
    }
}

impl RateOps for FixedFactor {
    fn recalc_rate(&self, parent_rate: u32) -> Result<u32, ErrorCode> {
        Ok(self.rate(parent_rate))
    }

    fn round_rate(&self, _rate: u32, parent_rate: u32) -> u32 {
        self.rate(parent_rate)
    }

    fn set_rate(&self, rate: u32, parent_rate: u32) -> Result<(), ErrorCode> {
        if rate == self.rate(parent_rate) {
            Ok(())
        } else {
            Err(ErrorCode::NOSUPPORT)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rate_ignores_parent() {
        let osc = FixedRate::new(24_000_000);
        assert_eq!(osc.recalc_rate(0), Ok(24_000_000));
        assert_eq!(osc.round_rate(32_768, 0), 24_000_000);
        assert_eq!(osc.set_rate(24_000_000, 0), Ok(()));
        assert_eq!(osc.set_rate(12_000_000, 0), Err(ErrorCode::NOSUPPORT));
    }

    #[test]
    fn fixed_factor() {
        let half = FixedFactor::new(1, 2);
        assert_eq!(half.recalc_rate(1_200_000_000), Ok(600_000_000));
        assert_eq!(half.round_rate(1, 1_200_000_000), 600_000_000);
        assert_eq!(half.set_rate(600_000_000, 1_200_000_000), Ok(()));
        assert_eq!(half.set_rate(300_000_000, 1_200_000_000), Err(ErrorCode::NOSUPPORT));

        let quarter = FixedFactor::new(1, 4);
        assert_eq!(quarter.recalc_rate(600_000_000), Ok(150_000_000));
    }
}
