use std::{
    borrow::Borrow,
    fmt::{Debug, Display, Formatter},
    ops::{Deref, DerefMut},
    str::FromStr,
};

use crate::{bell::MAX_BELLS, Bell, InvalidRowError, Stage};

use super::{borrowed::Row, BellIter};

/// An owned, heap-allocated [`Row`].  `RowBuf` is to [`Row`] what [`String`] is to [`str`].
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct RowBuf {
    /// Always a permutation of the first `bell_vec.len()` bells
    pub(super) bell_vec: Vec<Bell>,
}

impl RowBuf {
    /// Parses a `RowBuf`, ignoring any [`char`]s which aren't [`Bell`] names.  The [`Stage`] is
    /// the number of bells found.
    ///
    /// ```
    /// use changeframe::{Bell, InvalidRowError, RowBuf};
    ///
    /// assert_eq!(RowBuf::parse("4321 [65 78]")?.to_string(), "43216578");
    /// assert_eq!(
    ///     RowBuf::parse("112345"),
    ///     Err(InvalidRowError::DuplicateBell(Bell::from_number(1).unwrap()))
    /// );
    /// # Ok::<(), InvalidRowError>(())
    /// ```
    pub fn parse(s: &str) -> Result<Self, InvalidRowError> {
        Self::from_vec(s.chars().filter_map(Bell::from_name).collect())
    }

    /// Parses a `RowBuf` of a known [`Stage`], filling in any missing cover bells.  So
    /// `"231"` becomes `"231456"` on six bells.
    pub fn parse_with_stage(s: &str, stage: Stage) -> Result<Self, InvalidRowError> {
        Self::from_vec_with_stage(s.chars().filter_map(Bell::from_name).collect(), stage)
    }

    pub fn rounds(stage: Stage) -> Self {
        Self {
            bell_vec: stage.bells().collect(),
        }
    }

    pub fn backrounds(stage: Stage) -> Self {
        Self {
            bell_vec: stage.bells().rev().collect(),
        }
    }

    /// Creates a `RowBuf` from its [`Bell`]s, checking that they form a valid [`Row`].
    pub fn from_vec(bells: Vec<Bell>) -> Result<RowBuf, InvalidRowError> {
        if bells.len() > MAX_BELLS {
            return Err(InvalidRowError::TooManyBells(bells.len()));
        }
        let stage = Stage::try_from(bells.len() as u8)?;
        crate::utils::check_duplicate_or_out_of_stage(bells.iter().copied(), stage)?;
        Ok(Self { bell_vec: bells })
    }

    /// Creates a `RowBuf` from its [`Bell`]s without any checks.
    ///
    /// # Safety
    ///
    /// Safe if `bells` contains each of the first `bells.len()` [`Bell`]s exactly once.
    #[inline]
    pub unsafe fn from_vec_unchecked(bells: Vec<Bell>) -> RowBuf {
        RowBuf { bell_vec: bells }
    }

    fn from_vec_with_stage(mut bells: Vec<Bell>, stage: Stage) -> Result<Self, InvalidRowError> {
        let mut seen = vec![false; stage.num_bells()];
        for &b in &bells {
            match seen.get_mut(b.index()) {
                None => return Err(InvalidRowError::BellOutOfStage(b, stage)),
                Some(&mut true) => return Err(InvalidRowError::DuplicateBell(b)),
                Some(x) => *x = true,
            }
        }
        // Fewer bells than `stage` are allowed, but only if they're a prefix of the bells.  Any
        // gap below the largest bell given is a missing bell.
        let largest = bells.iter().max().map_or(0, |b| b.index() + 1);
        if let Some(idx) = seen[..largest].iter().position(|s| !s) {
            return Err(InvalidRowError::MissingBell(Bell::from_index(idx as u8)));
        }
        bells.extend(stage.bells().skip(bells.len()));
        Ok(Self { bell_vec: bells })
    }

    #[inline]
    pub fn as_row(&self) -> &Row {
        // SAFETY: `RowBuf` and `Row` share the same invariant
        unsafe { Row::from_slice_unchecked(&self.bell_vec) }
    }

    #[inline]
    pub fn as_mut_row(&mut self) -> &mut Row {
        // SAFETY: `RowBuf` and `Row` share the same invariant
        unsafe { Row::from_mut_slice_unchecked(&mut self.bell_vec) }
    }

    /// Adds cover bells to the back of `self` until it has a given [`Stage`].  Does nothing if
    /// `self` is already at least that long.
    pub fn extend_to_stage(&mut self, stage: Stage) {
        self.bell_vec
            .extend(stage.bells().skip(self.bell_vec.len()));
    }

    /// Embeds `row` in the [`Stage`] one larger, with a new treble fixed in front.  So `"213"`
    /// becomes `"1324"`.
    pub fn with_fixed_treble(row: &Row) -> RowBuf {
        let bell_vec = std::iter::once(Bell::TREBLE)
            .chain(row.bell_iter().map(|b| Bell::from_index(b.index_u8() + 1)))
            .collect();
        Self { bell_vec }
    }
}

impl Deref for RowBuf {
    type Target = Row;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_row()
    }
}

impl DerefMut for RowBuf {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_row()
    }
}

impl Borrow<Row> for RowBuf {
    #[inline]
    fn borrow(&self) -> &Row {
        self.as_row()
    }
}

impl ToOwned for Row {
    type Owned = RowBuf;

    #[inline]
    fn to_owned(&self) -> Self::Owned {
        RowBuf {
            bell_vec: self.bell_iter().collect(),
        }
    }
}

impl Debug for RowBuf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RowBuf({})", self)
    }
}

impl Display for RowBuf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self.as_row(), f)
    }
}

impl<'row> IntoIterator for &'row RowBuf {
    type Item = Bell;
    type IntoIter = BellIter<'row>;

    fn into_iter(self) -> Self::IntoIter {
        self.bell_iter()
    }
}

impl FromStr for RowBuf {
    type Err = InvalidRowError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq<Row> for RowBuf {
    fn eq(&self, other: &Row) -> bool {
        self.as_row() == other
    }
}

impl PartialEq<RowBuf> for Row {
    fn eq(&self, other: &RowBuf) -> bool {
        self == other.as_row()
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for RowBuf {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        use quickcheck::Arbitrary;

        let num_bells = usize::arbitrary(g) % 9 + 1;
        let mut bell_vec = Stage::new(num_bells as u8).bells().collect::<Vec<_>>();
        // Fisher-Yates shuffle
        for i in (1..num_bells).rev() {
            let j = usize::arbitrary(g) % (i + 1);
            bell_vec.swap(i, j);
        }
        Self { bell_vec }
    }
}
