use std::fmt::{Display, Formatter};

use crate::{stage::ZeroStageError, Bell, Stage};

/// All the possible ways that a [`Row`](crate::Row) could be invalid.
///
/// Note that by the Pigeon Hole Principle, we do not need to check explicitly for missing
/// [`Bell`]s, because if a [`Row`](crate::Row) has no duplicate or out-of-stage [`Bell`]s then
/// it must contain every [`Bell`].  Only [`RowBuf::parse_with_stage`](crate::RowBuf::parse_with_stage)
/// (which fills in cover bells) can report [`InvalidRowError::MissingBell`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum InvalidRowError {
    /// The row contained no bells
    NoBells,
    /// The row contained more bells than can be represented
    TooManyBells(usize),
    /// A [`Bell`] would appear twice in the new [`Row`](crate::Row)
    DuplicateBell(Bell),
    /// A [`Bell`] is not within the range of the [`Stage`] of the new [`Row`](crate::Row)
    BellOutOfStage(Bell, Stage),
    /// A given [`Bell`] would be missing from the [`Row`](crate::Row)
    MissingBell(Bell),
}

impl Display for InvalidRowError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            InvalidRowError::NoBells => write!(f, "Row would contain no bells"),
            InvalidRowError::TooManyBells(n) => write!(f, "Row would contain {} bells", n),
            InvalidRowError::DuplicateBell(bell) => {
                write!(f, "Bell '{}' would appear twice", bell)
            }
            InvalidRowError::BellOutOfStage(bell, stage) => {
                write!(f, "Bell '{}' is not within stage {}", bell, stage)
            }
            InvalidRowError::MissingBell(bell) => {
                write!(f, "Bell '{}' would be missing", bell)
            }
        }
    }
}

impl std::error::Error for InvalidRowError {}

impl From<ZeroStageError> for InvalidRowError {
    fn from(_: ZeroStageError) -> Self {
        InvalidRowError::NoBells
    }
}
