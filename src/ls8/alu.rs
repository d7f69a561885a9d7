// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use num::traits::{CheckedDiv, WrappingAdd, WrappingMul, WrappingSub};
use std::cmp::Ordering;

/// Arithmetic operations that write their result back to a register.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AluOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// Applies an arithmetic operation to two register values. Results wrap
/// around at the width of the register. Division is floor division and returns
/// `None` when dividing by zero.
pub fn apply<T>(op: AluOp, a: T, b: T) -> Option<T>
    where T: WrappingAdd + WrappingSub + WrappingMul + CheckedDiv
{
    match op {
        AluOp::Add => Some(a.wrapping_add(&b)),
        AluOp::Sub => Some(a.wrapping_sub(&b)),
        AluOp::Mul => Some(a.wrapping_mul(&b)),
        AluOp::Div => a.checked_div(&b),
    }
}

/// Orders the left register value against the right one, as consumed by the
/// flag register.
#[inline(always)]
pub fn compare<T: Ord>(a: T, b: T) -> Ordering {
    a.cmp(&b)
}
