//! The falseness relation between leads of a method.

use itertools::Itertools;

use crate::{Bell, IncompatibleStages, Method, Parity, Row, RowBuf, Stage};

/// Restrictions on which pairs of rows contribute to a [`FalsenessTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FalsenessFlags {
    /// Only keep differences with even parity (i.e. falseness between in-course lead heads)
    pub in_course_only: bool,
    /// Only keep differences with odd parity.  Setting this and `in_course_only` leaves no
    /// differences.
    pub out_of_course_only: bool,
    /// Keep differences which move the treble.  Normally these are dropped, since leads starting
    /// with the treble leading can only be false against each other through differences which
    /// fix the treble.
    pub no_fixed_treble: bool,
    /// Only compare the first half of each lead
    pub half_lead_only: bool,
}

/// The set of non-trivial differences `a * b^-1` between the rows of some lead(s).
///
/// If a lead starting at row `x` contains row `x * a`, and a lead starting at `y` contains
/// `y * b`, then the two leads share a row exactly when `y = x * (a * b^-1)`.  So the lead heads
/// false against `x` are `x * d` for each difference `d` in the table.
///
/// # Example
/// ```
/// use changeframe::{FalsenessFlags, FalsenessTable, Method, Stage};
///
/// let plain_bob = Method::from_place_notation("Plain Bob".to_owned(), Stage::MINOR, "x16x16x16,12")?;
/// let table = FalsenessTable::from_method(&plain_bob, FalsenessFlags::default());
/// // Every difference fixes the treble, and rounds is never included
/// assert!(table.differences().iter().all(|d| !d.is_rounds() && d[0].index() == 0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FalsenessTable {
    /// Sorted and deduplicated.  Never contains rounds.
    differences: Vec<RowBuf>,
}

impl FalsenessTable {
    /// Computes the falseness between a lead and itself.
    pub fn from_lead(rows: &[RowBuf], flags: FalsenessFlags) -> Result<Self, IncompatibleStages> {
        Self::between(rows, rows, flags)
    }

    /// Computes the falseness of the first lead of a [`Method`].
    pub fn from_method(method: &Method, flags: FalsenessFlags) -> Self {
        Self::from_rows_unchecked(method.first_lead(), method.first_lead(), flags)
    }

    /// Computes the differences `a * b^-1` for every `a` in `a_rows` and `b` in `b_rows`, subject
    /// to the given [`FalsenessFlags`].  All rows must share a [`Stage`].
    pub fn between(
        a_rows: &[RowBuf],
        b_rows: &[RowBuf],
        flags: FalsenessFlags,
    ) -> Result<Self, IncompatibleStages> {
        let mut stage: Option<Stage> = None;
        for r in a_rows.iter().chain(b_rows) {
            IncompatibleStages::test_err_opt(&mut stage, r.stage())?;
        }
        Ok(Self::from_rows_unchecked(a_rows, b_rows, flags))
    }

    fn from_rows_unchecked(a_rows: &[RowBuf], b_rows: &[RowBuf], flags: FalsenessFlags) -> Self {
        let half = |rows: &'_ [RowBuf]| -> usize {
            if flags.half_lead_only {
                rows.len() / 2
            } else {
                rows.len()
            }
        };
        let a_rows = &a_rows[..half(a_rows)];
        let b_rows = &b_rows[..half(b_rows)];

        let b_invs = b_rows.iter().map(|b| b.inv()).collect_vec();
        let mut differences = Vec::new();
        let mut diff = RowBuf::rounds(Stage::ONE);
        for a in a_rows {
            for b_inv in &b_invs {
                a.mul_into(b_inv, &mut diff);
                if Self::is_kept(&diff, flags) {
                    differences.push(diff.clone());
                }
            }
        }
        differences.sort();
        differences.dedup();
        log::trace!(
            "{} rows against {} rows gives {} differences",
            a_rows.len(),
            b_rows.len(),
            differences.len()
        );
        Self { differences }
    }

    fn is_kept(diff: &Row, flags: FalsenessFlags) -> bool {
        if diff.is_rounds() {
            return false;
        }
        if !flags.no_fixed_treble && !diff.is_fixed(Bell::TREBLE) {
            return false;
        }
        let parity = diff.sign();
        if flags.in_course_only && parity != Parity::Even {
            return false;
        }
        if flags.out_of_course_only && parity != Parity::Odd {
            return false;
        }
        true
    }

    /// The differences, in sorted order
    #[inline]
    pub fn differences(&self) -> &[RowBuf] {
        &self.differences
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.differences.len()
    }

    /// `true` if the lead(s) are true against each other in every position
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    /// Returns `true` if `row` is one of the differences
    pub fn contains(&self, row: &Row) -> bool {
        self.differences
            .binary_search_by(|d| d.as_row().cmp(row))
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::{FalsenessFlags, FalsenessTable, Method, Parity, RowBuf, Stage};

    fn rows(strs: &[&str]) -> Vec<RowBuf> {
        strs.iter().map(|s| RowBuf::parse(s).unwrap()).collect_vec()
    }

    #[test]
    fn tiny_lead() {
        let lead = rows(&["123", "213"]);
        let no_fixed_treble = FalsenessFlags {
            no_fixed_treble: true,
            ..Default::default()
        };
        let table = FalsenessTable::from_lead(&lead, no_fixed_treble).unwrap();
        assert_eq!(table.differences(), rows(&["213"]).as_slice());
        // "213" moves the treble
        let table = FalsenessTable::from_lead(&lead, FalsenessFlags::default()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn stage_mismatch() {
        let a = rows(&["1234"]);
        let b = rows(&["123456"]);
        assert!(FalsenessTable::between(&a, &b, FalsenessFlags::default()).is_err());
    }

    #[test]
    fn plain_bob() {
        let method =
            Method::from_place_notation("Plain Bob".to_owned(), Stage::MINOR, "x16x16x16,12")
                .unwrap();
        let table = FalsenessTable::from_method(&method, FalsenessFlags::default());
        assert!(!table.is_empty());
        for d in table.differences() {
            assert!(!d.is_rounds());
            assert!(d.is_fixed(crate::Bell::TREBLE));
            // The table is closed under inversion, since `(a/b)^-1 = b/a`
            assert!(table.contains(&d.inv()));
        }
        assert!(table.differences().windows(2).all(|w| w[0] < w[1]));

        // Parity filters split the table in two
        let in_course = FalsenessTable::from_method(
            &method,
            FalsenessFlags {
                in_course_only: true,
                ..Default::default()
            },
        );
        let out_of_course = FalsenessTable::from_method(
            &method,
            FalsenessFlags {
                out_of_course_only: true,
                ..Default::default()
            },
        );
        assert!(in_course.differences().iter().all(|d| d.sign() == Parity::Even));
        assert!(out_of_course.differences().iter().all(|d| d.sign() == Parity::Odd));
        assert_eq!(in_course.len() + out_of_course.len(), table.len());

        // Half-leads are a subset of the whole lead
        let half = FalsenessTable::from_method(
            &method,
            FalsenessFlags {
                half_lead_only: true,
                ..Default::default()
            },
        );
        assert!(half.len() <= table.len());
        assert!(half.differences().iter().all(|d| table.contains(d)));
    }

    #[test]
    fn differences_relate_shared_rows() {
        // If leads starting at `x` and `x * d` share a row, then `d` is in the table
        let method = Method::from_place_notation("Bastow".to_owned(), Stage::MINIMUS, "x12,x14")
            .unwrap();
        let table = FalsenessTable::from_method(&method, FalsenessFlags::default());
        let lead = method.first_lead();
        for a in lead {
            for b in lead {
                let d = a / b;
                if !d.is_rounds() && d.is_fixed(crate::Bell::TREBLE) {
                    assert!(table.contains(&d));
                    // The lead starting at `d` contains `d * b = a`
                    assert_eq!(&(&d * b), a);
                }
            }
        }
    }
}
