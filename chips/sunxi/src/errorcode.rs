// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2025.

//! Standard error enum for clock operations.

/// Errors returned by clock-tree construction and by clock operations.
///
/// The numbering follows the kernel `ErrorCode`, so a board can forward these
/// values to userspace unchanged. Keep the discriminants in sync with
/// `kernel::ErrorCode` in `kernel/src/errorcode.rs`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ErrorCode {
    /// Generic failure condition
    FAIL = 0,
    /// The state requested is already set
    ALREADY = 2,
    /// An invalid parameter was passed
    INVAL = 5,
    /// Parameter passed was too large
    SIZE = 6,
    /// Memory required not available
    NOMEM = 8,
    /// Operation or command is unsupported
    NOSUPPORT = 9,
    /// Clock does not exist
    NODEVICE = 10,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}
