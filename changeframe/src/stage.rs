//! The number of bells in a [`Row`], along with the traditional names for each stage.

use std::fmt::{Debug, Display, Formatter};

#[cfg(feature = "serde")]
use serde_crate::{
    de::{Error, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::{Bell, RowBuf};
// Imports used solely by doc comments
#[allow(unused_imports)]
use crate::Row;

/// A non-zero number of [`Bell`]s.
///
/// Small `Stage`s have constants named the way ringers name them, and are [`Display`]ed with
/// those names:
/// ```
/// use changeframe::Stage;
///
/// assert_eq!(Stage::MAJOR, Stage::new(8));
/// assert_eq!(Stage::MAXIMUS.to_string(), "Maximus");
/// assert_eq!(Stage::new(9).to_string(), "Caters");
/// assert_eq!(Stage::new(50).to_string(), "50 bells");
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Stage(u8);

/// Name and constant name of every named `Stage`, where `NAMES[i]` belongs to `Stage(i + 1)`
const NAMES: [(&str, &str); 22] = [
    ("One", "ONE"),
    ("Two", "TWO"),
    ("Singles", "SINGLES"),
    ("Minimus", "MINIMUS"),
    ("Doubles", "DOUBLES"),
    ("Minor", "MINOR"),
    ("Triples", "TRIPLES"),
    ("Major", "MAJOR"),
    ("Caters", "CATERS"),
    ("Royal", "ROYAL"),
    ("Cinques", "CINQUES"),
    ("Maximus", "MAXIMUS"),
    ("Sextuples", "SEXTUPLES"),
    ("Fourteen", "FOURTEEN"),
    ("Septuples", "SEPTUPLES"),
    ("Sixteen", "SIXTEEN"),
    ("Octuples", "OCTUPLES"),
    ("Eighteen", "EIGHTEEN"),
    ("Nonuples", "NONUPLES"),
    ("Twenty", "TWENTY"),
    ("Decuples", "DECUPLES"),
    ("Twenty-two", "TWENTY_TWO"),
];

impl Stage {
    pub const ONE: Stage = Stage(1);
    pub const TWO: Stage = Stage(2);
    pub const SINGLES: Stage = Stage(3);
    pub const MINIMUS: Stage = Stage(4);
    pub const DOUBLES: Stage = Stage(5);
    pub const MINOR: Stage = Stage(6);
    pub const TRIPLES: Stage = Stage(7);
    pub const MAJOR: Stage = Stage(8);
    pub const CATERS: Stage = Stage(9);
    pub const ROYAL: Stage = Stage(10);
    pub const CINQUES: Stage = Stage(11);
    pub const MAXIMUS: Stage = Stage(12);
    pub const SEXTUPLES: Stage = Stage(13);
    pub const FOURTEEN: Stage = Stage(14);
    pub const SEPTUPLES: Stage = Stage(15);
    pub const SIXTEEN: Stage = Stage(16);

    /// Creates a new `Stage` of `num_bells` bells.
    ///
    /// # Panics
    ///
    /// Panics if `num_bells` is zero.
    #[track_caller]
    pub fn new(num_bells: u8) -> Stage {
        match Self::try_from(num_bells) {
            Ok(stage) => stage,
            Err(e) => panic!("{}", e),
        }
    }

    /// The number of [`Bell`]s in this `Stage`.  Never zero.
    #[inline(always)]
    pub fn num_bells(self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub fn num_bells_u8(self) -> u8 {
        self.0
    }

    /// The [`Bell`]s of this `Stage`, treble first.
    pub fn bells(self) -> impl DoubleEndedIterator<Item = Bell> {
        (0..self.0).map(Bell::from_index)
    }

    #[inline(always)]
    pub fn is_even(self) -> bool {
        self.0 % 2 == 0
    }

    /// The name ringers give to this `Stage`, if it has one.
    ///
    /// ```
    /// use changeframe::Stage;
    ///
    /// assert_eq!(Stage::ROYAL.name(), Some("Royal"));
    /// assert_eq!(Stage::new(40).name(), None);
    /// ```
    pub fn name(self) -> Option<&'static str> {
        NAMES.get(self.num_bells() - 1).map(|(name, _)| *name)
    }

    /// Finds the `Stage` with a given name, ignoring case.
    pub fn from_name(name: &str) -> Option<Stage> {
        let idx = NAMES.iter().position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(Stage(idx as u8 + 1))
    }

    /// Removes `rhs` bells from this `Stage`, returning `None` if no bells would be left.
    pub fn checked_sub(self, rhs: u8) -> Option<Self> {
        Self::try_from(self.0.checked_sub(rhs)?).ok()
    }

    /// The number of [`Row`]s in the extent of this `Stage`, or `None` if that overflows a
    /// [`usize`].
    ///
    /// ```
    /// use changeframe::Stage;
    ///
    /// assert_eq!(Stage::MINOR.extent_size(), Some(720));
    /// assert_eq!(Stage::new(40).extent_size(), None);
    /// ```
    pub fn extent_size(self) -> Option<usize> {
        (2..=self.num_bells()).try_fold(1usize, |acc, n| acc.checked_mul(n))
    }

    /// Every [`Row`] of this `Stage`, in lexicographic order (so rounds comes first).
    pub fn extent(self) -> Vec<RowBuf> {
        let mut extent = Vec::with_capacity(self.extent_size().unwrap_or(0));
        let mut bells = self.bells().collect::<Vec<_>>();
        loop {
            // SAFETY: `bells` always holds a permutation of the bells of `self`
            extent.push(unsafe { RowBuf::from_vec_unchecked(bells.clone()) });
            if !next_permutation(&mut bells) {
                return extent;
            }
        }
    }
}

/// Rearranges `v` into the next lexicographically larger permutation, returning `false` (and
/// leaving `v` untouched) if `v` is already the largest.
fn next_permutation<T: Ord>(v: &mut [T]) -> bool {
    // Find the longest decreasing suffix; the element before it is the one to increase
    let Some(pivot) = (1..v.len()).rev().find(|&i| v[i - 1] < v[i]).map(|i| i - 1) else {
        return false;
    };
    // Swap it with the smallest larger element of the suffix, then make the suffix increasing
    let Some(successor) = (pivot + 1..v.len()).rev().find(|&i| v[i] > v[pivot]) else {
        return false;
    };
    v.swap(pivot, successor);
    v[pivot + 1..].reverse();
    true
}

impl Debug for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match NAMES.get(self.num_bells() - 1) {
            Some((_, const_name)) if self.0 <= 16 => write!(f, "Stage::{}", const_name),
            _ => write!(f, "Stage({})", self.0),
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "{} bells", self.0),
        }
    }
}

impl TryFrom<u8> for Stage {
    type Error = ZeroStageError;

    fn try_from(num_bells: u8) -> Result<Self, Self::Error> {
        match num_bells {
            0 => Err(ZeroStageError),
            _ => Ok(Stage(num_bells)),
        }
    }
}

/// An error created when attempting to create a [`Stage`] of zero [`Bell`]s.
#[derive(Debug, Clone, Copy)]
pub struct ZeroStageError;

impl Display for ZeroStageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Can't create a `Stage` of zero bells")
    }
}

impl std::error::Error for ZeroStageError {}

//////////////////////////
// `IncompatibleStages` //
//////////////////////////

/// An error created when two things which must have the same [`Stage`] don't
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct IncompatibleStages {
    pub(crate) lhs_stage: Stage,
    pub(crate) rhs_stage: Stage,
}

impl IncompatibleStages {
    /// Returns `Ok(())` if the two [`Stage`]s are equal, otherwise the corresponding
    /// `IncompatibleStages` error.
    pub fn test_err(lhs_stage: Stage, rhs_stage: Stage) -> Result<(), Self> {
        if lhs_stage == rhs_stage {
            Ok(())
        } else {
            Err(IncompatibleStages {
                lhs_stage,
                rhs_stage,
            })
        }
    }

    /// Like [`IncompatibleStages::test_err`], but sets `opt` to `stage` if it's `None`.  Used to
    /// check that a sequence of [`Row`]s all share a [`Stage`].
    pub fn test_err_opt(opt: &mut Option<Stage>, stage: Stage) -> Result<(), Self> {
        match *opt {
            None => {
                *opt = Some(stage);
                Ok(())
            }
            Some(s) => Self::test_err(s, stage),
        }
    }
}

impl Display for IncompatibleStages {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Incompatible stages: {} (lhs), {} (rhs)",
            self.lhs_stage, self.rhs_stage
        )
    }
}

impl std::error::Error for IncompatibleStages {}

///////////
// SERDE //
///////////

#[cfg(feature = "serde")]
impl Serialize for Stage {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

// Stages deserialise from either a number of bells or a name (like `"Major"`)
#[cfg(feature = "serde")]
struct StageVisitor;

#[cfg(feature = "serde")]
impl<'de> Visitor<'de> for StageVisitor {
    type Value = Stage;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a positive number of bells, or a stage name")
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let v = u64::try_from(v).map_err(|_| E::custom(format!("negative stage: {}", v)))?;
        self.visit_u64(v)
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let num_bells =
            u8::try_from(v).map_err(|_| E::custom(format!("stage is too large: {}", v)))?;
        Stage::try_from(num_bells).map_err(E::custom)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Stage::from_name(v).ok_or_else(|| E::custom(format!("'{}' is not a stage name", v)))
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Stage {
    fn deserialize<D>(deserializer: D) -> Result<Stage, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(StageVisitor)
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Stage {
    fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
        use quickcheck::Arbitrary;
        // Zero bells becomes one bell, slightly favouring `Stage::ONE`
        Self::new(u8::arbitrary(gen).max(1))
    }
}

#[cfg(test)]
mod tests {
    use crate::RowBuf;

    use super::Stage;

    #[test]
    #[rustfmt::skip]
    fn extent() {
        #[track_caller]
        fn check(stage: Stage, exp_extent: &[&str]) {
            let expected = exp_extent.iter().map(|s| RowBuf::parse(s).unwrap()).collect::<Vec<_>>();
            assert_eq!(stage.extent(), expected);
        }

        check(Stage::ONE, &["1"]);
        check(Stage::TWO, &["12", "21"]);
        check(Stage::SINGLES, &["123", "132", "213", "231", "312", "321"]);
        check(
            Stage::MINIMUS,
            &[
                "1234", "1243", "1324", "1342", "1423", "1432",
                "2134", "2143", "2314", "2341", "2413", "2431",
                "3124", "3142", "3214", "3241", "3412", "3421",
                "4123", "4132", "4213", "4231", "4312", "4321",
            ]
        );
    }

    #[test]
    fn extent_size() {
        for num_bells in 1..=7 {
            let stage = Stage::new(num_bells);
            assert_eq!(Some(stage.extent().len()), stage.extent_size());
        }
        assert_eq!(Stage::new(20).extent_size(), Some(2_432_902_008_176_640_000));
        assert_eq!(Stage::new(21).extent_size(), None);
    }

    #[test]
    fn names() {
        assert_eq!(Stage::from_name("major"), Some(Stage::MAJOR));
        assert_eq!(Stage::from_name("TWENTY-TWO"), Some(Stage::new(22)));
        assert_eq!(Stage::from_name("Bob"), None);
        assert_eq!(format!("{:?}", Stage::SEPTUPLES), "Stage::SEPTUPLES");
        assert_eq!(format!("{:?}", Stage::new(17)), "Stage(17)");
        assert_eq!(Stage::MINOR.checked_sub(5), Some(Stage::ONE));
        assert_eq!(Stage::MINOR.checked_sub(6), None);
        assert_eq!(Stage::MINOR.checked_sub(7), None);
    }
}
