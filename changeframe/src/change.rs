//! Single changes (permutations made of disjoint adjacent swaps) and blocks of them, parsed from
//! place notation.

use std::{
    fmt::{Debug, Display, Formatter},
    ops::{Mul, MulAssign, Range},
};

use itertools::Itertools;

use crate::{Bell, IncompatibleStages, Row, RowBuf, Stage};

/// The ways that a single piece of place notation can be invalid.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum InvalidNotation {
    PlaceOutOfStage { place: u8, stage: Stage },
    AmbiguousPlacesBetween { p: u8, q: u8 },
    DuplicatePlace(u8),
    PlacesOutOfOrder { prev: u8, next: u8 },
    UnknownSymbol(char),
    OddStageCross(Stage),
    NoPlacesGiven,
}

impl Display for InvalidNotation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidNotation::OddStageCross(stage) => {
                write!(
                    f,
                    "Cross notation isn't valid for odd stages (in this case {})",
                    stage
                )
            }
            InvalidNotation::PlaceOutOfStage { place, stage } => {
                write!(
                    f,
                    "Place '{}' is out of stage {}",
                    Bell::from_index(*place),
                    stage
                )
            }
            InvalidNotation::AmbiguousPlacesBetween { p, q } => write!(
                f,
                "Ambiguous gap of {} bells between places '{}' and '{}'.",
                q - p - 1,
                Bell::from_index(*p),
                Bell::from_index(*q)
            ),
            InvalidNotation::DuplicatePlace(p) => {
                write!(f, "Place '{}' is duplicated", Bell::from_index(*p))
            }
            InvalidNotation::PlacesOutOfOrder { prev, next } => write!(
                f,
                "Place '{}' is written after '{}'; places must be in ascending order",
                Bell::from_index(*next),
                Bell::from_index(*prev)
            ),
            InvalidNotation::UnknownSymbol(c) => write!(f, "Unknown symbol {:?}", c),
            InvalidNotation::NoPlacesGiven => {
                write!(f, "No places given.  Use 'x' or '-' for a cross.")
            }
        }
    }
}

impl std::error::Error for InvalidNotation {}

/// A single change on some [`Stage`]: a permutation made of disjoint swaps of adjacent bells.
#[derive(Clone, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Change {
    /// The [`Stage`] that this `Change` is intended to be used for.
    stage: Stage,
    /// The **0-indexed** positions `s` where the bells in places `s` and `s + 1` swap over.
    /// These are strictly increasing, and no two swaps share or adjoin a position (i.e. each
    /// swap is at least two greater than the previous one).
    swaps: Vec<u8>,
}

impl Change {
    /// Parse a string as a single `Change` of a given [`Stage`].  The places must be written in
    /// ascending order using bell names (or be one of `x`, `X` or `-` for a cross).  Implicit
    /// places are filled in wherever they are unambiguous.
    ///
    /// # Example
    /// ```
    /// use changeframe::{Change, InvalidNotation, Stage};
    ///
    /// assert_eq!(Change::parse("14", Stage::MAJOR)?.to_string(), "14");
    /// // Implicit places are expanded
    /// assert_eq!(Change::parse("4", Stage::MINOR)?.to_string(), "14");
    /// assert_eq!(Change::parse("3", Stage::MAJOR)?.to_string(), "38");
    /// assert_eq!(Change::parse("146", Stage::MAJOR)?.to_string(), "1456");
    /// assert_eq!(Change::parse("-", Stage::MAJOR)?.to_string(), "X");
    ///
    /// assert_eq!(
    ///     Change::parse("15", Stage::MAJOR).unwrap_err().to_string(),
    ///     "Ambiguous gap of 3 bells between places '1' and '5'."
    /// );
    /// assert_eq!(
    ///     Change::parse("41", Stage::MAJOR),
    ///     Err(InvalidNotation::PlacesOutOfOrder { prev: 3, next: 0 })
    /// );
    /// # Ok::<(), InvalidNotation>(())
    /// ```
    pub fn parse(s: &str, stage: Stage) -> Result<Self, InvalidNotation> {
        if matches!(s, "x" | "X" | "-") {
            return Self::cross(stage).ok_or(InvalidNotation::OddStageCross(stage));
        }
        let mut places = Vec::<u8>::with_capacity(s.len());
        for c in s.chars() {
            let place = Bell::from_name(c)
                .ok_or(InvalidNotation::UnknownSymbol(c))?
                .index_u8();
            if let Some(&prev) = places.last() {
                if place == prev {
                    return Err(InvalidNotation::DuplicatePlace(place));
                } else if place < prev {
                    return Err(InvalidNotation::PlacesOutOfOrder { prev, next: place });
                }
            }
            places.push(place);
        }
        Self::from_places(&mut places, stage)
    }

    /// Creates a `Change` from a slice of **0-indexed** places, given in any order.  Implicit
    /// places are expanded, and any ambiguity or out-of-stage place causes an error.
    pub fn from_places(input_places: &mut [u8], stage: Stage) -> Result<Self, InvalidNotation> {
        input_places.sort_unstable();
        let (lowest_place, highest_place) = match (input_places.first(), input_places.last()) {
            (Some(&l), Some(&h)) => (l, h),
            _ => return Err(InvalidNotation::NoPlacesGiven),
        };
        let num_bells = stage.num_bells_u8();
        if highest_place >= num_bells {
            return Err(InvalidNotation::PlaceOutOfStage {
                place: highest_place,
                stage,
            });
        }

        // Rebuild to a new Vec when adding places to avoid quadratic behaviour
        let mut places = Vec::with_capacity(input_places.len() + 5);
        // Implicit place in lead
        if lowest_place % 2 == 1 {
            places.push(0);
        }
        for (p, q) in input_places.iter().copied().tuple_windows() {
            places.push(p);
            let num_intermediate_places = (q - p)
                .checked_sub(1) // `p == q` underflows ...
                .ok_or(InvalidNotation::DuplicatePlace(p))?; // ... so report the duplicate
            if num_intermediate_places == 1 {
                places.push(p + 1);
            } else if num_intermediate_places % 2 == 1 {
                return Err(InvalidNotation::AmbiguousPlacesBetween { p, q });
            }
        }
        places.push(highest_place);
        // Implicit place at the back
        if (num_bells - highest_place) % 2 == 0 {
            places.push(num_bells - 1);
        }

        // Every gap between consecutive places is now even, so the non-places pair off into swaps
        let mut swaps = Vec::with_capacity(num_bells as usize / 2);
        let mut places = places.into_iter().peekable();
        let mut i = 0;
        while i < num_bells {
            if places.peek() == Some(&i) {
                places.next();
                i += 1;
            } else {
                swaps.push(i);
                i += 2;
            }
        }
        Ok(Change { stage, swaps })
    }

    /// Returns a new `Change` representing the 'cross' notation on a given stage.  This will
    /// fail if `stage` doesn't have an even number of bells.
    pub fn cross(stage: Stage) -> Option<Self> {
        stage.is_even().then(|| Change {
            stage,
            swaps: (0..stage.num_bells_u8()).step_by(2).collect(),
        })
    }

    /// Returns the `Change` which turns `r1` into `r2`, or `None` if the [`Row`]s are not
    /// adjacent.
    pub fn between(r1: &Row, r2: &Row) -> Option<Change> {
        if r1.stage() != r2.stage() {
            return None;
        }

        let mut swaps = Vec::<u8>::new();
        let mut bell_pair_iter = r1.bell_iter().zip_eq(r2.bell_iter()).enumerate();
        while let Some((place, (b1, b2))) = bell_pair_iter.next() {
            if b1 != b2 {
                // b1 and b2 must swap round in the next place
                if Some((place + 1, (b2, b1))) != bell_pair_iter.next() {
                    return None;
                }
                swaps.push(place as u8);
            }
        }
        Some(Change {
            stage: r1.stage(),
            swaps,
        })
    }

    /// Returns the [`Stage`] of this `Change`
    #[inline(always)]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The **0-indexed** swap positions of this `Change`, in ascending order
    #[inline(always)]
    pub fn swaps(&self) -> &[u8] {
        &self.swaps
    }

    /// The **0-indexed** places made (i.e. positions not swapped) by this `Change`, in ascending
    /// order.  Implicit places are included.
    pub fn places(&self) -> Vec<u8> {
        let mut places = Vec::new();
        let mut swaps = self.swaps.iter().copied().peekable();
        let mut i = 0;
        while i < self.stage.num_bells_u8() {
            if swaps.peek() == Some(&i) {
                swaps.next();
                i += 2;
            } else {
                places.push(i);
                i += 1;
            }
        }
        places
    }

    /// Checks if this `Change` swaps every pair of bells.
    ///
    /// # Example
    /// ```
    /// use changeframe::{Change, Stage};
    ///
    /// assert!(Change::parse("x", Stage::MAJOR)?.is_cross());
    /// assert!(!Change::parse("14", Stage::MAJOR)?.is_cross());
    /// assert!(!Change::parse("3", Stage::TRIPLES)?.is_cross());
    /// # Ok::<(), changeframe::InvalidNotation>(())
    /// ```
    #[inline(always)]
    pub fn is_cross(&self) -> bool {
        self.swaps.len() * 2 == self.stage.num_bells()
    }

    /// Returns a [`RowBuf`] representing the same permutation as this `Change`.
    pub fn transposition(&self) -> RowBuf {
        let mut row = RowBuf::rounds(self.stage);
        self.permute(&mut row);
        row
    }

    /// Uses this `Change` to permute a [`Row`] in-place.  Swaps beyond the end of `row` are
    /// ignored; to extend the row first, use `row *= &change`.
    #[inline]
    pub fn permute(&self, row: &mut Row) {
        let num_bells = row.stage().num_bells();
        for &s in &self.swaps {
            let s = s as usize;
            if s + 1 < num_bells {
                row.swap(s, s + 1);
            }
        }
    }
}

impl MulAssign<&Change> for RowBuf {
    /// Permutes this row by a [`Change`], first extending it with cover bells if the [`Change`]
    /// has a larger [`Stage`].
    fn mul_assign(&mut self, rhs: &Change) {
        self.extend_to_stage(rhs.stage);
        rhs.permute(self);
    }
}

impl Mul<&Change> for &Row {
    type Output = RowBuf;

    fn mul(self, rhs: &Change) -> Self::Output {
        let mut row = self.to_owned();
        row *= rhs;
        row
    }
}

impl Mul<&Change> for RowBuf {
    type Output = RowBuf;

    fn mul(mut self, rhs: &Change) -> Self::Output {
        self *= rhs;
        self
    }
}

impl Debug for Change {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Change({})", self)
    }
}

impl Display for Change {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_cross() {
            write!(f, "X")
        } else {
            for p in self.places() {
                write!(f, "{}", Bell::from_index(p))?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Change {
    fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
        use quickcheck::Arbitrary;

        // Keep to the bells which have the same name in every symbol table used by the tests
        let stage = Stage::new(u8::arbitrary(gen) % 12 + 1);
        let mut swaps = Vec::new();
        let mut i = 0;
        while i + 1 < stage.num_bells_u8() {
            if bool::arbitrary(gen) {
                swaps.push(i);
                i += 2;
            } else {
                i += 1;
            }
        }
        Self { stage, swaps }
    }
}

///////////////
// PN BLOCKS //
///////////////

/// The possible ways that parsing a block of place notations could fail
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum PnBlockParseError {
    /// A '+' or '&' was found somewhere other than the start of a section (e.g. in `16x16+16,12`).
    /// The argument refers to the byte index of the marker within the parse string.
    MarkerNotAtSectionStart(usize),
    /// One of the pieces of place notation was invalid.  The [`Range`] points to the byte range
    /// within the input string where the invalid place notation was found.
    PnError(Range<usize>, InvalidNotation),
    /// The string represents a block with no changes.
    EmptyBlock,
}

impl Display for PnBlockParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PnBlockParseError::EmptyBlock => write!(f, "Blocks of place notation can't be empty."),
            PnBlockParseError::PnError(range, err) => {
                write!(f, "Error parsing PN at index {}: {}", range.start, err)
            }
            PnBlockParseError::MarkerNotAtSectionStart(index) => {
                write!(f, "Marker at index {} is not at the start of a section.", index)
            }
        }
    }
}

impl std::error::Error for PnBlockParseError {}

/// The different ways a `PnBlock` could be found to be invalid
#[derive(Clone, Debug, Copy, Eq, PartialEq, Hash)]
pub enum InvalidPnBlockError {
    IncompatibleStages(usize, IncompatibleStages),
    EmptyBlock,
}

impl Display for InvalidPnBlockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidPnBlockError::IncompatibleStages(ind, e) => write!(
                f,
                "Incompatible stages: First change has stage {}, whereas the {}th has {}",
                e.lhs_stage, ind, e.rhs_stage
            ),
            InvalidPnBlockError::EmptyBlock => write!(f, "Blocks of place notation can't be empty."),
        }
    }
}

impl std::error::Error for InvalidPnBlockError {}

/// A non-empty, contiguous block of [`Change`]s, all of the same [`Stage`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PnBlock {
    changes: Vec<Change>,
}

// PnBlocks can't have zero length, so `is_empty` is unnecessary
#[allow(clippy::len_without_is_empty)]
impl PnBlock {
    /// Parse a string slice into a `PnBlock`, checking for ambiguity and correctness.  This
    /// expands symmetric sections and implicit places.
    ///
    /// - `,` separates sections.  A section starting with `&` is palindromic (so `&x1x2` becomes
    ///   `x1x2x1x`), and one starting with `+` is taken as written.  Unmarked sections are
    ///   palindromic if the string has more than one section.
    /// - `.` and whitespace separate changes; `x`, `X` and `-` are crosses and also separate.
    /// - Any other char which isn't a bell name is ignored.
    ///
    /// # Example
    /// ```
    /// use changeframe::{PnBlock, Stage};
    ///
    /// // Plain Bob Minor
    /// let block = PnBlock::parse("&-16-16-16,12", Stage::MINOR)?;
    /// assert_eq!(block.len(), 12);
    /// assert_eq!(block.to_string(), "X16X16X16X16X16X12");
    /// assert_eq!(block.transposition().to_string(), "135264");
    /// # Ok::<(), changeframe::PnBlockParseError>(())
    /// ```
    pub fn parse(s: &str, stage: Stage) -> Result<Self, PnBlockParseError> {
        let address_of_start_of_s = s.as_ptr() as usize;
        let mut changes: Vec<Change> = Vec::new();
        // Re-usable buffer for the unexpanded version of each section
        let mut section_buf: Vec<Change> = Vec::new();
        let is_single_section = !s.contains(',');
        for section in s.split(',') {
            let byte_offset = section.as_ptr() as usize - address_of_start_of_s;
            let symmetry =
                Self::parse_asymmetric_section(section, byte_offset, stage, &mut section_buf)?;

            let is_symmetric = match symmetry {
                Some(Symmetry::Palindrome) => true,
                Some(Symmetry::Asymmetric) => false,
                None => !is_single_section,
            };
            if is_symmetric {
                // Clone `section_buf` into `changes` in order, then move everything except the
                // last change back in reverse order
                changes.extend_from_slice(&section_buf);
                changes.extend(section_buf.drain(..).rev().skip(1));
            } else {
                changes.append(&mut section_buf);
            }
        }
        if changes.is_empty() {
            Err(PnBlockParseError::EmptyBlock)
        } else {
            Ok(PnBlock { changes })
        }
    }

    /// Parses one `,`-delimited section into `buf`, returning the symmetry marker found at its
    /// start (if any).
    fn parse_asymmetric_section(
        section: &str,
        section_start_offset: usize,
        stage: Stage,
        buf: &mut Vec<Change>,
    ) -> Result<Option<Symmetry>, PnBlockParseError> {
        debug_assert!(buf.is_empty());
        let mut tok_indices = section
            .char_indices()
            .map(|(i, c)| (i + section_start_offset, CharMeaning::from(c)))
            // A 'fake' delimiter at the end makes sure the last chunk of places is not ignored
            .chain(std::iter::once((
                section_start_offset + section.len(),
                CharMeaning::Delimiter,
            )))
            .peekable();

        // Skip meaningless chars at the left of the section
        while let Some((_i, CharMeaning::Delimiter | CharMeaning::Unknown)) = tok_indices.peek() {
            tok_indices.next();
        }
        // Consume a symmetry marker, if there is one
        let symmetry = match tok_indices.peek() {
            Some((_i, CharMeaning::Marker(s))) => Some(*s),
            _ => None,
        };
        if symmetry.is_some() {
            tok_indices.next();
        }

        let mut places: Vec<u8> = Vec::new();
        let mut current_pn_start_index = 0;
        for (i, m) in tok_indices {
            match m {
                CharMeaning::Bell(b) => {
                    if places.is_empty() {
                        current_pn_start_index = i;
                    }
                    places.push(b.index_u8());
                }
                CharMeaning::Cross | CharMeaning::Delimiter => {
                    if !places.is_empty() {
                        let change = Change::from_places(&mut places, stage).map_err(|e| {
                            PnBlockParseError::PnError(current_pn_start_index..i, e)
                        })?;
                        buf.push(change);
                        places.clear();
                    }
                }
                CharMeaning::Marker(_) => {
                    return Err(PnBlockParseError::MarkerNotAtSectionStart(i))
                }
                CharMeaning::Unknown => continue,
            }
            if m == CharMeaning::Cross {
                buf.push(
                    Change::cross(stage)
                        .ok_or(InvalidNotation::OddStageCross(stage))
                        .map_err(|e| PnBlockParseError::PnError(i..i + 1, e))?,
                );
            }
        }

        Ok(symmetry)
    }

    /// Creates a new `PnBlock` from a [`Vec`] of [`Change`]s, checking that all the stages
    /// match and the `PnBlock` contains at least one [`Change`].
    pub fn from_vec(changes: Vec<Change>) -> Result<Self, InvalidPnBlockError> {
        let first_stage = changes
            .first()
            .ok_or(InvalidPnBlockError::EmptyBlock)?
            .stage;
        for (i, ch) in changes.iter().enumerate().skip(1) {
            IncompatibleStages::test_err(first_stage, ch.stage)
                .map_err(|e| InvalidPnBlockError::IncompatibleStages(i, e))?;
        }
        Ok(PnBlock { changes })
    }

    /// The [`Change`]s contained in this `PnBlock`
    #[inline]
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// The [`Stage`] of this `PnBlock`.
    #[inline]
    pub fn stage(&self) -> Stage {
        // `self.changes` always has at least one element
        self.changes[0].stage
    }

    /// The number of [`Change`]s in this `PnBlock`.
    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// The last [`Change`] of this block.
    #[inline]
    pub fn last_change(&self) -> &Change {
        // `self.changes` is never empty
        &self.changes[self.changes.len() - 1]
    }

    /// Returns a copy of this block with the last [`Change`] replaced by `change`.
    pub fn with_last_change(&self, change: Change) -> Result<Self, IncompatibleStages> {
        IncompatibleStages::test_err(self.stage(), change.stage)?;
        let mut changes = self.changes.clone();
        let last_idx = changes.len() - 1;
        changes[last_idx] = change;
        Ok(PnBlock { changes })
    }

    /// The [`Row`]s generated by applying `self` to a given [`Row`].  The result has length one
    /// greater than that of `self`, because it starts with `start_row` and then adds one new
    /// [`Row`] per [`Change`].
    pub fn to_rows(&self, start_row: &Row) -> Vec<RowBuf> {
        let mut rows = Vec::with_capacity(self.len() + 1);
        let mut current_row = start_row.to_owned();
        rows.push(current_row.clone());
        for ch in &self.changes {
            current_row *= ch;
            rows.push(current_row.clone());
        }
        rows
    }

    /// The permutation made by the whole block (i.e. the row reached by starting in rounds).
    pub fn transposition(&self) -> RowBuf {
        let mut row = RowBuf::rounds(self.stage());
        for ch in &self.changes {
            ch.permute(&mut row);
        }
        row
    }
}

impl Display for PnBlock {
    /// Writes the changes in order, with `.` between two adjacent non-cross changes
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut last_was_places = false;
        for ch in &self.changes {
            let is_places = !ch.is_cross();
            if is_places && last_was_places {
                write!(f, ".")?;
            }
            write!(f, "{}", ch)?;
            last_was_places = is_places;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
enum Symmetry {
    Palindrome,
    Asymmetric,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
enum CharMeaning {
    Bell(Bell),
    Delimiter,
    Cross,
    Marker(Symmetry),
    Unknown,
}

impl From<char> for CharMeaning {
    fn from(c: char) -> Self {
        if let Some(b) = Bell::from_name(c) {
            return CharMeaning::Bell(b);
        }
        match c {
            '+' => CharMeaning::Marker(Symmetry::Asymmetric),
            '&' => CharMeaning::Marker(Symmetry::Palindrome),
            '.' => CharMeaning::Delimiter,
            'x' | 'X' | '-' => CharMeaning::Cross,
            c if c.is_whitespace() => CharMeaning::Delimiter,
            _ => CharMeaning::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::{InvalidNotation, PnBlockParseError};
    use crate::{Change, PnBlock, RowBuf, Stage};

    #[test]
    fn parse_ok() {
        #[track_caller]
        fn check(inp_string: &str, stage: Stage, exp_places: &[u8], exp_swaps: &[u8]) {
            let change = Change::parse(inp_string, stage).unwrap();
            assert_eq!(change.stage(), stage);
            assert_eq!(change.places(), exp_places);
            assert_eq!(change.swaps(), exp_swaps);
        }

        // No implict places
        check("14", Stage::MAJOR, &[0, 3], &[1, 4, 6]);
        check("1256", Stage::MINOR, &[0, 1, 4, 5], &[2]);
        check("127", Stage::TRIPLES, &[0, 1, 6], &[2, 4]);
        check("3", Stage::CATERS, &[2], &[0, 3, 5, 7]);
        // Implicit places in lead
        check("4", Stage::MINOR, &[0, 3], &[1, 4]);
        check("234", Stage::MINOR, &[0, 1, 2, 3], &[4]);
        check("470", Stage::ROYAL, &[0, 3, 6, 9], &[1, 4, 7]);
        check("2", Stage::TWO, &[0, 1], &[]);
        // Implicit places in lie
        check("3", Stage::MAJOR, &[2, 7], &[0, 3, 5]);
        check("12", Stage::DOUBLES, &[0, 1, 4], &[2]);
        check("1", Stage::TWO, &[0, 1], &[]);
        // Implicit places between two other places
        check("146", Stage::MAJOR, &[0, 3, 4, 5], &[1, 6]);
        check("135", Stage::TRIPLES, &[0, 1, 2, 3, 4], &[5]);
        // Implicit places in multiple places
        check("23", Stage::MAJOR, &[0, 1, 2, 7], &[3, 5]);
        check("46", Stage::CATERS, &[0, 3, 4, 5, 8], &[1, 6]);
        // Crosses
        check("x", Stage::MINOR, &[], &[0, 2, 4]);
        check("-", Stage::TWO, &[], &[0]);
    }

    #[test]
    fn parse_err() {
        #[track_caller]
        fn check(inp_string: &str, stage: Stage, exp_err: InvalidNotation) {
            assert_eq!(Change::parse(inp_string, stage), Err(exp_err));
        }

        check("", Stage::MINOR, InvalidNotation::NoPlacesGiven);
        check(
            "148",
            Stage::MINIMUS,
            InvalidNotation::PlaceOutOfStage {
                place: 7,
                stage: Stage::MINIMUS,
            },
        );
        check("15", Stage::MAJOR, InvalidNotation::AmbiguousPlacesBetween { p: 0, q: 4 });
        check("39", Stage::ROYAL, InvalidNotation::AmbiguousPlacesBetween { p: 2, q: 8 });
        check("1125", Stage::MINOR, InvalidNotation::DuplicatePlace(0));
        check("61", Stage::MINOR, InvalidNotation::PlacesOutOfOrder { prev: 5, next: 0 });
        check("1?", Stage::MINOR, InvalidNotation::UnknownSymbol('?'));
        check(" 14", Stage::MINOR, InvalidNotation::UnknownSymbol(' '));
        check("x14", Stage::MINOR, InvalidNotation::UnknownSymbol('x'));
    }

    #[test]
    fn parse_err_odd_bell_cross() {
        for num_bells in 1u8..=u8::MAX {
            let stage = Stage::new(num_bells);
            let exp_result = if num_bells % 2 == 0 {
                Ok(Change::cross(stage).unwrap())
            } else {
                Err(InvalidNotation::OddStageCross(stage))
            };
            for cross_not in &["x", "X", "-"] {
                assert_eq!(Change::parse(cross_not, stage), exp_result);
            }
        }
    }

    #[test]
    fn display() {
        #[track_caller]
        fn check(inp_string: &str, stage: Stage, exp_display: &str) {
            let change = Change::parse(inp_string, stage).unwrap();
            assert_eq!(change.to_string(), exp_display);
            // Printing then re-parsing gives the same change
            assert_eq!(Change::parse(&change.to_string(), stage), Ok(change));
        }

        check("18", Stage::MAJOR, "18");
        check("-", Stage::MAJOR, "X");
        check("x", Stage::TWO, "X");
        check("4", Stage::MINOR, "14");
        check("3", Stage::MAJOR, "38");
        check("146", Stage::MAJOR, "1456");
        check("5", Stage::DOUBLES, "5");
        check("1", Stage::ONE, "1");
    }

    #[quickcheck]
    fn display_parses_back(change: Change) -> bool {
        Change::parse(&change.to_string(), change.stage()).as_ref() == Ok(&change)
    }

    #[quickcheck]
    fn places_and_swaps_agree(change: Change) -> bool {
        // Crosses have no places to rebuild from
        change.is_cross()
            || Change::from_places(&mut change.places(), change.stage()).as_ref() == Ok(&change)
    }

    #[test]
    fn row_mul_change() {
        let rounds = RowBuf::rounds(Stage::DOUBLES);
        let three = Change::parse("3", Stage::DOUBLES).unwrap();
        assert_eq!(three.swaps(), &[0, 3]);
        assert_eq!(three.transposition().to_string(), "21354");

        // Repeated multiplication by a change comes back to rounds after `order` steps
        let order = three.transposition().order();
        assert_eq!(order, 2);
        let mut row = rounds.clone();
        for i in 1..=order {
            row *= &three;
            assert_eq!(row.is_rounds(), i == order);
        }

        // Changes of a larger stage extend the row
        let mut row = RowBuf::parse("21").unwrap();
        row *= &Change::parse("x", Stage::MINIMUS).unwrap();
        assert_eq!(row.to_string(), "1243");
        // Changes of a smaller stage leave the back bells alone
        let row = RowBuf::rounds(Stage::MINOR) * &Change::parse("x", Stage::MINIMUS).unwrap();
        assert_eq!(row.to_string(), "214356");
    }

    #[test]
    fn between() {
        #[track_caller]
        fn check(r1: &str, r2: &str, exp: Option<&str>) {
            let r1 = RowBuf::parse(r1).unwrap();
            let r2 = RowBuf::parse(r2).unwrap();
            let stage = r1.stage();
            let exp = exp.map(|s| Change::parse(s, stage).unwrap());
            assert_eq!(Change::between(&r1, &r2), exp);
        }

        check("123456", "214365", Some("x"));
        check("123456", "132546", Some("16"));
        check("12345678", "12345678", Some("12345678"));
        check("123456", "321456", None);
        check("1234", "123456", None);
    }

    #[test]
    fn parse_block_ok() {
        #[track_caller]
        fn check(stage: Stage, s1: &str, s2: &str, exp_len: usize) {
            let b1 = PnBlock::parse(s1, stage).unwrap();
            let b2 = PnBlock::parse(s2, stage).unwrap();
            assert_eq!(b1, b2);
            assert_eq!(b1.len(), exp_len);
        }

        check(Stage::SINGLES, "1.3", "1   .  3", 2);
        check(Stage::MINIMUS, "-4-3-1-..2", "x14x34x14x12", 8);
        check(Stage::MINIMUS, "x14x14,12", "-14-14-14-12", 8);
        check(Stage::MINIMUS, "&x14x14,12", "-14-14-14-12", 8);
        check(Stage::MINIMUS, "&x1x1", "x14x14x14x", 7);
        check(Stage::TRIPLES, "2.3", "2,3", 2);
        check(Stage::MAJOR, "x1,1x,x1,1x,x1,2", "-18-18-18-18,12", 16);
        check(Stage::MAJOR, "+x4x1,", "x14x18", 4);
        check(Stage::MINOR, "&-16-16-16,+12", "-16-16-16-16-16-12", 12);
        check(Stage::MAXIMUS, "xxx1", "---1T", 4);
        check(Stage::MAXIMUS, "x   -\tx1", "---1T", 4);
    }

    #[test]
    fn parse_block_err() {
        use PnBlockParseError as PE;

        #[track_caller]
        fn check(pn_str: &str, stage: Stage, exp_error: PnBlockParseError) {
            assert_eq!(PnBlock::parse(pn_str, stage), Err(exp_error));
        }

        check("", Stage::MAJOR, PE::EmptyBlock);
        check("  *!^\"£^%=", Stage::MAJOR, PE::EmptyBlock);
        check("5+,3+46.5", Stage::MAJOR, PE::MarkerNotAtSectionStart(1));
        check("+5,3&46.5", Stage::MAJOR, PE::MarkerNotAtSectionStart(4));
        check(
            "x5x4.5x5.36.4x4.5x4x1,9",
            Stage::MAJOR,
            PE::PnError(
                22..23,
                InvalidNotation::PlaceOutOfStage {
                    place: 8,
                    stage: Stage::MAJOR,
                },
            ),
        );
        check(
            "x5x4.5x5.13827.4x4.5x4x1,9",
            Stage::MAJOR,
            PE::PnError(9..14, InvalidNotation::AmbiguousPlacesBetween { p: 2, q: 6 }),
        );
        check(
            "x1x1",
            Stage::TRIPLES,
            PE::PnError(0..1, InvalidNotation::OddStageCross(Stage::TRIPLES)),
        );
    }

    #[test]
    fn block_to_rows() {
        let plain_bob_major_lead = [
            "12345678", "21436587", "24163857", "42618375", "46281735", "64827153", "68472513",
            "86745231", "87654321", "78563412", "75836142", "57381624", "53718264", "35172846",
            "31527486", "13254768", "13527486",
        ];

        let block = PnBlock::parse("x18x18x18x18,12", Stage::MAJOR).unwrap();
        let rows = block.to_rows(&RowBuf::rounds(Stage::MAJOR));
        let exp_rows = plain_bob_major_lead
            .iter()
            .map(|s| RowBuf::parse(s).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(rows, exp_rows);
        assert_eq!(block.transposition(), exp_rows[16]);

        let alnwick = PnBlock::parse("34-36.14-12-36.14-14.36,12", Stage::MINOR).unwrap();
        assert_eq!(alnwick.len(), 24);
        assert_eq!(alnwick.transposition().to_string(), "164523");
    }

    #[test]
    fn block_display_round_trips() {
        #[track_caller]
        fn check(pn: &str, stage: Stage, exp: &str) {
            let block = PnBlock::parse(pn, stage).unwrap();
            assert_eq!(block.to_string(), exp);
            assert_eq!(PnBlock::parse(exp, stage), Ok(block));
        }

        check("&-16-16-16,12", Stage::MINOR, "X16X16X16X16X16X12");
        check("3.1.5.1.5.1.5.1.5.1", Stage::DOUBLES, "3.1.5.1.5.1.5.1.5.1");
        check("+x4x1", Stage::MAJOR, "X14X18");
    }
}
