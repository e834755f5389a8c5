//! CLI command implementations.

pub(crate) mod inspect;
pub(crate) mod run;

use clap::ValueEnum;
use ecgp::FunctionSet;

/// Function set selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum FunctionSetArg {
    /// Add, subtract, multiply, protected divide.
    Arithmetic,
    /// Logic over thresholded reals.
    Boolean,
    /// Arithmetic plus comparisons and min/max.
    Extended,
}

impl From<FunctionSetArg> for FunctionSet {
    fn from(arg: FunctionSetArg) -> Self {
        match arg {
            FunctionSetArg::Arithmetic => Self::Arithmetic,
            FunctionSetArg::Boolean => Self::Boolean,
            FunctionSetArg::Extended => Self::Extended,
        }
    }
}
