//! The primitive function registry.
//!
//! Every genotype node that is not a module call invokes one function from a
//! fixed set of binary operations on two reals. Evaluation is total: no
//! function fails on any numeric input, and non-finite results propagate like
//! any other value.

use serde::{Deserialize, Serialize};

/// A set of primitive binary functions selectable per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionSet {
    /// Add, subtract, multiply, protected divide.
    Arithmetic,
    /// Bitwise-style logic over thresholded reals: and, or, nand, nor, xor, not-a.
    Boolean,
    /// Arithmetic plus comparisons and min/max.
    Extended,
}

impl FunctionSet {
    /// Number of functions in this set. Function ids run `0..count`.
    #[must_use]
    pub fn count(self) -> usize {
        match self {
            Self::Arithmetic => 4,
            Self::Boolean => 6,
            Self::Extended => 8,
        }
    }

    /// Apply function `id` to `a` and `b`.
    ///
    /// Ids outside `0..count` wrap around, so a registry call can never fail;
    /// mutation only ever draws valid ids.
    #[must_use]
    pub fn apply(self, id: usize, a: f64, b: f64) -> f64 {
        match self {
            Self::Arithmetic => match id % 4 {
                0 => a + b,
                1 => a - b,
                2 => a * b,
                _ => protected_div(a, b),
            },
            Self::Boolean => {
                let x = a >= 0.5;
                let y = b >= 0.5;
                let bit = match id % 6 {
                    0 => x && y,
                    1 => x || y,
                    2 => !(x && y),
                    3 => !(x || y),
                    4 => x != y,
                    _ => !x,
                };
                if bit { 1.0 } else { 0.0 }
            }
            Self::Extended => match id % 8 {
                0 => a + b,
                1 => a - b,
                2 => a * b,
                3 => protected_div(a, b),
                4 => {
                    if a > b {
                        1.0
                    } else {
                        0.0
                    }
                }
                5 => {
                    if a < b {
                        1.0
                    } else {
                        0.0
                    }
                }
                6 => a.min(b),
                _ => a.max(b),
            },
        }
    }
}

/// Division that maps a zero divisor to zero instead of trapping.
fn protected_div(a: f64, b: f64) -> f64 {
    if b == 0.0 { 0.0 } else { a / b }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_ops() {
        let set = FunctionSet::Arithmetic;
        assert!((set.apply(0, 2.0, 3.0) - 5.0).abs() < f64::EPSILON);
        assert!((set.apply(1, 2.0, 3.0) + 1.0).abs() < f64::EPSILON);
        assert!((set.apply(2, 2.0, 3.0) - 6.0).abs() < f64::EPSILON);
        assert!(set.apply(3, 2.0, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_boolean_outputs_are_bits() {
        let set = FunctionSet::Boolean;
        for id in 0..set.count() {
            for a in [0.0, 1.0] {
                for b in [0.0, 1.0] {
                    let out = set.apply(id, a, b);
                    assert!(out == 0.0 || out == 1.0);
                }
            }
        }
    }

    #[test]
    fn test_total_on_nonfinite_inputs() {
        for set in [
            FunctionSet::Arithmetic,
            FunctionSet::Boolean,
            FunctionSet::Extended,
        ] {
            for id in 0..set.count() {
                // Must not panic; non-finite results are fine.
                let _ = set.apply(id, f64::NAN, f64::INFINITY);
            }
        }
    }
}
