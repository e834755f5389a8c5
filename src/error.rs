//! Error types for the evolution engine.
//!
//! Invariant violations signal operator bugs and are never recovered locally.
//! Configuration errors are recoverable at the point of a single mutation
//! attempt but fatal when surfaced during seeding. Timeouts abort the run.

use std::fmt;

/// Errors surfaced by the evolution engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A write-once field (fitness, used-nodes mask) was assigned twice.
    AlreadySet(&'static str),
    /// A write-once field was read before it was assigned.
    NotSet(&'static str),
    /// A node or output referenced a module id absent from the library.
    UnknownModule(usize),
    /// A module with this id is already present in the library.
    DuplicateModule(usize),
    /// An address resolved outside the valid range.
    AddressOutOfRange {
        /// The offending address.
        address: usize,
        /// One past the largest valid address.
        limit: usize,
    },
    /// An input vector length disagreed with the declared input count.
    InputArity {
        /// Declared input count.
        expected: usize,
        /// Length of the vector supplied.
        actual: usize,
    },
    /// Selection requested more survivors than the pool holds.
    SelectionOverdraw {
        /// Number of survivors requested.
        requested: usize,
        /// Number of individuals available.
        available: usize,
    },
    /// The run configuration or dataset cannot support a run.
    Config(String),
    /// The output arity has no decode rule.
    UnsupportedArity(usize),
    /// A component of an arity-4 output was not exactly 0 or 1.
    NonBinaryOutput(f64),
    /// A generation exceeded its wall-clock budget.
    GenerationTimeout {
        /// Generation that overran.
        generation: usize,
        /// Budget in seconds.
        budget_secs: u64,
    },
    /// File I/O error during persistence.
    Io(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadySet(field) => write!(f, "write-once field {field} assigned twice"),
            Self::NotSet(field) => write!(f, "write-once field {field} read before assignment"),
            Self::UnknownModule(id) => write!(f, "module id {id} not present in library"),
            Self::DuplicateModule(id) => write!(f, "module id {id} already in library"),
            Self::AddressOutOfRange { address, limit } => {
                write!(f, "address {address} outside valid range 0..{limit}")
            }
            Self::InputArity { expected, actual } => {
                write!(f, "input vector length {actual} does not match declared {expected}")
            }
            Self::SelectionOverdraw {
                requested,
                available,
            } => write!(f, "selection of {requested} from a pool of {available}"),
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::UnsupportedArity(arity) => {
                write!(f, "no decode rule for output arity {arity}")
            }
            Self::NonBinaryOutput(value) => {
                write!(f, "arity-4 decode requires components in {{0,1}}, got {value}")
            }
            Self::GenerationTimeout {
                generation,
                budget_secs,
            } => write!(f, "generation {generation} exceeded {budget_secs}s wall-clock budget"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
