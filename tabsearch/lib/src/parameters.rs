//! Instructions for a [`TableSearch`](crate::TableSearch) about which touches should be
//! generated.

use std::ops::RangeInclusive;

/// Restrictions on the touches produced by a [`TableSearch`](crate::TableSearch)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SearchFlags {
    /// Only generate each touch once, rather than once per distinct rotation of its calling
    pub ignore_rotations: bool,
    /// In multi-part searches, accept touches whose part end generates any subgroup of the part
    /// ends.  Normally the part end has to generate all of them.
    pub mutually_true_parts: bool,
    /// The [`LengthRange`] is measured in changes rather than leads
    pub length_in_changes: bool,
    /// In multi-part searches, accept any part end other than rounds
    pub non_round_blocks: bool,
}

/// An inclusive range of touch lengths.  By default these are counted in leads, and a multi-part
/// touch counts the leads of every part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// A range containing only one length
    pub fn exactly(len: usize) -> Self {
        Self::new(len, len)
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn contains(&self, len: usize) -> bool {
        self.min <= len && len <= self.max
    }

    /// Converts a range of changes into the range of whole leads which fit inside it
    pub(crate) fn changes_to_leads(self, lead_len: usize) -> Self {
        Self {
            min: self.min.div_ceil(lead_len),
            max: self.max / lead_len,
        }
    }
}

impl Default for LengthRange {
    fn default() -> Self {
        Self::new(0, usize::MAX)
    }
}

impl From<RangeInclusive<usize>> for LengthRange {
    fn from(range: RangeInclusive<usize>) -> Self {
        Self::new(*range.start(), *range.end())
    }
}

#[cfg(test)]
mod tests {
    use super::LengthRange;

    #[track_caller]
    fn check(changes: LengthRange, lead_len: usize, leads: LengthRange) {
        assert_eq!(changes.changes_to_leads(lead_len), leads);
    }

    #[test]
    fn changes_to_leads() {
        check(LengthRange::new(360, 360), 12, LengthRange::exactly(30));
        check(LengthRange::new(350, 370), 12, LengthRange::new(30, 30));
        check(LengthRange::new(361, 371), 12, LengthRange::new(31, 30));
        check(LengthRange::new(0, 5000), 32, LengthRange::new(0, 156));
        assert!(LengthRange::new(361, 371).changes_to_leads(12).is_empty());
        assert!(!LengthRange::default().is_empty());
        assert!(LengthRange::from(3..=5).contains(5));
    }
}
