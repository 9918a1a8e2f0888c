//! Error types for the different ways that building a search can fail.

use std::fmt::{Display, Formatter};

use changeframe::{Change, IncompatibleStages, RowBuf};

#[allow(unused_imports)] // Only used for doc comments
use crate::{MultTab, TableSearch};

/// Alias for `Result<T, tabsearch::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// The different ways that building a [`MultTab`] or a [`TableSearch`] can fail.  Once a
/// [`TableSearch`] has been built, searching it can't fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Some rows, calls or groups were on different [`Stage`](changeframe::Stage)s
    IncompatibleStages(IncompatibleStages),

    /* MULTIPLICATION TABLE ERRORS */
    /// The rows given to a [`MultTab`] aren't a union of cosets of its group(s), so the table
    /// can't be quotiented
    NotUnionOfCosets {
        num_rows: usize,
        num_classes: usize,
        group_size: usize,
    },
    /// A pre-multiplication column was requested for a row which doesn't commute with the table's
    /// part ends, so the column wouldn't be well-defined on cosets
    NonCommutingPremultiplier(RowBuf),
    /// A post-multiplication column was requested for a row which doesn't commute with the
    /// table's post group
    NonCommutingPostmultiplier(RowBuf),
    /// Multiplying some row of a [`MultTab`] gave a row which isn't in the table
    RowNotInTable(RowBuf),

    /* SEARCH BUILD ERRORS */
    /// A call has the same lead end as the plain lead or another call, so they can't be told
    /// apart in the results
    DuplicateCall(Change),
}

impl From<IncompatibleStages> for Error {
    fn from(e: IncompatibleStages) -> Self {
        Error::IncompatibleStages(e)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::IncompatibleStages(e) => write!(f, "{}", e),

            /* MULTIPLICATION TABLE ERRORS */
            Error::NotUnionOfCosets {
                num_rows,
                num_classes,
                group_size,
            } => write!(
                f,
                "{} rows don't split into cosets: found {} classes of a group of size {}",
                num_rows, num_classes, group_size
            ),
            Error::NonCommutingPremultiplier(row) => write!(
                f,
                "Can't pre-multiply by {}: it doesn't commute with the part ends",
                row
            ),
            Error::NonCommutingPostmultiplier(row) => write!(
                f,
                "Can't post-multiply by {}: it doesn't commute with the post group",
                row
            ),
            Error::RowNotInTable(row) => {
                write!(f, "Row {} isn't in the multiplication table", row)
            }

            /* SEARCH BUILD ERRORS */
            Error::DuplicateCall(change) => write!(
                f,
                "Lead end {} is used more than once (including the plain lead)",
                change
            ),
        }
    }
}

impl std::error::Error for Error {}
