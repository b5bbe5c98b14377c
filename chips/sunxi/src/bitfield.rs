// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! N-bit fields inside 32-bit register values.
//!
//! The clock tables describe their fields as `(shift, width)` pairs known at
//! build time rather than through `register_bitfields!`, so this module builds
//! `tock_registers` [`Field`]s on the fly. None of these functions touch
//! hardware: the caller owns the read-modify-write sequence.

use tock_registers::fields::Field;

/// Position of a field inside a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitField {
    pub shift: u8,
    pub width: u8,
}

impl BitField {
    pub const fn new(shift: u8, width: u8) -> Self {
        BitField { shift, width }
    }

    /// Largest value the field can hold.
    pub const fn max(&self) -> u32 {
        mask(self.width)
    }

    pub fn extract(&self, value: u32) -> u32 {
        extract(value, self.width, self.shift)
    }

    pub fn insert(&self, value: u32, field: u32) -> u32 {
        insert(value, self.width, self.shift, field)
    }
}

const fn mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

fn field(width: u8, shift: u8) -> Field<u32, ()> {
    Field::<u32, ()>::new(mask(width), shift as usize)
}

/// Read the `width`-bit field at `shift` out of `value`.
///
/// A zero-width field always reads as 0.
pub fn extract(value: u32, width: u8, shift: u8) -> u32 {
    if width == 0 || shift >= 32 {
        return 0;
    }
    field(width, shift).read(value)
}

/// Return `value` with the `width`-bit field at `shift` replaced by `field`.
///
/// Bits of `field` above `width` are dropped rather than spilling into the
/// neighbouring fields. A zero-width field leaves `value` untouched.
pub fn insert(value: u32, width: u8, shift: u8, field_value: u32) -> u32 {
    if width == 0 || shift >= 32 {
        return value;
    }
    field(width, shift).val(field_value).modify(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_reads_only_the_field() {
        // PLL1 style register: enable, P = 2, N = 21, K = 1, M = 0
        let reg = 0x8002_1510;
        assert_eq!(extract(reg, 5, 8), 21);
        assert_eq!(extract(reg, 2, 4), 1);
        assert_eq!(extract(reg, 2, 0), 0);
        assert_eq!(extract(reg, 2, 16), 2);
        assert_eq!(extract(reg, 1, 31), 1);
    }

    #[test]
    fn insert_round_trips() {
        let layouts = [(1, 31), (2, 0), (2, 4), (5, 8), (2, 16), (3, 0), (32, 0)];
        let values = [0x0000_0000, 0xFFFF_FFFF, 0xA5A5_5A5A];
        for &(width, shift) in layouts.iter() {
            let max = BitField::new(shift, width).max();
            for &reg in values.iter() {
                for f in [0, 1, max / 2, max] {
                    let written = insert(reg, width, shift, f);
                    assert_eq!(extract(written, width, shift), f);
                }
            }
        }
    }

    #[test]
    fn insert_leaves_other_bits_alone() {
        let reg = 0xFFFF_FFFF;
        assert_eq!(insert(reg, 5, 8, 0), 0xFFFF_E0FF);
        assert_eq!(insert(0, 2, 16, 3), 0x0003_0000);
        // Too wide for the field: only the low bits land in the register
        assert_eq!(insert(0, 2, 4, 0x7), 0x0000_0030);
    }

    #[test]
    fn zero_width_is_a_no_op() {
        assert_eq!(insert(0x1234_5678, 0, 8, 0x1F), 0x1234_5678);
        assert_eq!(extract(0x1234_5678, 0, 8), 0);
        assert_eq!(BitField::new(0, 0).max(), 0);
    }
}
