//! Permutations of [`Bell`](crate::Bell)s, in borrowed ([`Row`]) and owned ([`RowBuf`]) forms.

mod accumulator;
mod borrowed; // Contains `Row`
mod errors;
mod owned; // Contains `RowBuf`

pub use accumulator::RowAccumulator;
pub use borrowed::{BellIter, Row};
pub use errors::InvalidRowError;
pub use owned::RowBuf;
