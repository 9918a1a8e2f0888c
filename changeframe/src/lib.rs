//! Idiomatic Rust representations of the primitives of computational campanology: bells, rows,
//! changes, permutation groups and the falseness between leads.

#![deny(clippy::all)]

mod bell;
pub mod change;
mod falseness;
mod group;
mod method;
mod parity;
pub mod row;
mod stage;
mod touch;
mod utils;

// Re-export useful data types into the top level of the crate
pub use bell::{Bell, SymbolTableError, MAX_BELLS};
pub use change::{Change, InvalidNotation, PnBlock, PnBlockParseError};
pub use falseness::{FalsenessFlags, FalsenessTable};
pub use group::Group;
pub use method::Method;
pub use parity::Parity;
pub use row::{InvalidRowError, Row, RowAccumulator, RowBuf};
pub use stage::{IncompatibleStages, Stage, ZeroStageError};
pub use touch::Touch;
