//! Permutation groups of [`Row`]s, and the coset labels used to quotient by them.

use std::{
    collections::{HashSet, VecDeque},
    fmt::{Debug, Formatter},
    sync::OnceLock,
};

use factorial::Factorial;
use itertools::Itertools;

use crate::{Bell, IncompatibleStages, Row, RowBuf, Stage};

/// Groups at least this big use the direct algorithm for coset labels if they can.  Smaller
/// groups are quicker to search exhaustively.
const MIN_SIZE_FOR_DIRECT_LABELS: usize = 6;

/// A group of [`Row`]s: a set which contains rounds and is closed under multiplication and
/// inversion.
///
/// # Example
/// ```
/// use changeframe::{Group, RowBuf, Stage};
///
/// // The cyclic part heads on 8 bells
/// let group = Group::from_generators(Stage::MAJOR, [RowBuf::parse("18234567")?])?;
/// assert_eq!(group.len(), 7);
/// assert_eq!(group.invariants(), vec![changeframe::Bell::TREBLE]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct Group {
    stage: Stage,
    generators: Vec<RowBuf>,
    /// Every element of the group, sorted
    rows: Vec<RowBuf>,
    /// Computed on first use
    orbits: OnceLock<Orbits>,
}

/// The partition of bells into the orbits of a [`Group`].
#[derive(Debug, Clone)]
struct Orbits {
    /// Each orbit's bells, in ascending order.  Orbits are ordered by their smallest bell.
    orbits: Vec<Vec<Bell>>,
    /// `orbit_of[b]` is the index within `orbits` of the orbit containing bell `b`
    orbit_of: Vec<usize>,
    /// `true` if the group is the full symmetric group on every orbit
    is_symmetric_product: bool,
}

impl Group {
    /// Creates the trivial group (containing only rounds) on a given [`Stage`].
    pub fn trivial(stage: Stage) -> Self {
        Self::from_sorted_rows(stage, Vec::new(), vec![RowBuf::rounds(stage)])
    }

    /// Computes the smallest `Group` containing every one of the `generators`, by breadth-first
    /// closure.  No generators gives the trivial group.
    pub fn from_generators(
        stage: Stage,
        generators: impl IntoIterator<Item = RowBuf>,
    ) -> Result<Self, IncompatibleStages> {
        let generators = generators.into_iter().collect_vec();
        for g in &generators {
            IncompatibleStages::test_err(stage, g.stage())?;
        }

        let rounds = RowBuf::rounds(stage);
        let mut set = HashSet::<RowBuf>::new();
        let mut frontier = VecDeque::<RowBuf>::new();
        set.insert(rounds.clone());
        frontier.push_back(rounds);
        // Post-multiply every frontier row by each generator, queueing anything new.  This
        // terminates because the group is finite.  The closure under multiplication of a finite
        // set of permutations is also closed under inversion, since `g^-1 = g^(order - 1)`.
        while let Some(r) = frontier.pop_front() {
            for g in &generators {
                let new_row = &r * g;
                if !set.contains(&new_row) {
                    frontier.push_back(new_row.clone());
                    set.insert(new_row);
                }
            }
        }

        let mut rows = set.into_iter().collect_vec();
        rows.sort();
        log::trace!("Closed {} generators into a group of {}", generators.len(), rows.len());
        Ok(Self::from_sorted_rows(stage, generators, rows))
    }

    fn from_sorted_rows(stage: Stage, generators: Vec<RowBuf>, rows: Vec<RowBuf>) -> Self {
        Self {
            stage,
            generators,
            rows,
            orbits: OnceLock::new(),
        }
    }

    /// Returns the conjugate group `{ r^-1 * g * r : g in self }`.
    ///
    /// # Example
    /// ```
    /// use changeframe::{Group, RowBuf, Stage};
    ///
    /// let group = Group::from_generators(Stage::MINIMUS, [RowBuf::parse("2134")?])?;
    /// let conj = group.conjugate(&RowBuf::parse("3412")?)?;
    /// assert!(conj.contains(&RowBuf::parse("1243")?));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn conjugate(&self, r: &Row) -> Result<Self, IncompatibleStages> {
        IncompatibleStages::test_err(self.stage, r.stage())?;
        let r_inv = r.inv();
        let conj = |g: &RowBuf| &r_inv * &(g * r);
        let generators = self.generators.iter().map(conj).collect_vec();
        let mut rows = self.rows.iter().map(conj).collect_vec();
        rows.sort();
        Ok(Self::from_sorted_rows(self.stage, generators, rows))
    }

    /* GETTERS */

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// The number of elements in this group
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Groups always contain rounds, so are never empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns `true` if this group only contains rounds
    #[inline]
    pub fn is_trivial(&self) -> bool {
        self.rows.len() == 1
    }

    /// Every element of this group, in sorted order
    #[inline]
    pub fn rows(&self) -> &[RowBuf] {
        &self.rows
    }

    /// The generators which this group was built from
    #[inline]
    pub fn generators(&self) -> &[RowBuf] {
        &self.generators
    }

    /// Returns `true` if `row` is an element of this group
    pub fn contains(&self, row: &Row) -> bool {
        self.rows
            .binary_search_by(|r| r.as_row().cmp(row))
            .is_ok()
    }

    /* ORBITS */

    fn orbit_data(&self) -> &Orbits {
        self.orbits.get_or_init(|| {
            let num_bells = self.stage.num_bells();
            let mut orbit_of = vec![usize::MAX; num_bells];
            let mut orbits = Vec::<Vec<Bell>>::new();
            for place in 0..num_bells {
                if orbit_of[place] != usize::MAX {
                    continue;
                }
                // The orbit of a place is every bell which some element brings into that place
                let mut orbit = self.rows.iter().map(|r| r[place]).collect_vec();
                orbit.sort();
                orbit.dedup();
                for b in &orbit {
                    orbit_of[b.index()] = orbits.len();
                }
                orbits.push(orbit);
            }

            // A direct product of symmetric groups on the orbits has exactly this many elements
            let product_size = orbits.iter().try_fold(1u64, |acc, orbit| {
                (orbit.len() as u64)
                    .checked_factorial()
                    .and_then(|f| acc.checked_mul(f))
            });
            let is_symmetric_product = product_size == Some(self.rows.len() as u64);

            Orbits {
                orbits,
                orbit_of,
                is_symmetric_product,
            }
        })
    }

    /// The orbits of this group: the sets of bells which can be moved into each other's places.
    /// Every bell appears in exactly one orbit.
    pub fn orbits(&self) -> &[Vec<Bell>] {
        &self.orbit_data().orbits
    }

    /// The bells which are fixed by every element of this group.
    pub fn invariants(&self) -> Vec<Bell> {
        self.orbits()
            .iter()
            .filter(|orbit| orbit.len() == 1)
            .map(|orbit| orbit[0])
            .collect_vec()
    }

    /// Returns `true` if every element of this group fixes the given [`Bell`].
    pub fn fixes(&self, bell: Bell) -> bool {
        let data = self.orbit_data();
        match data.orbit_of.get(bell.index()) {
            Some(&idx) => data.orbits[idx].len() == 1,
            None => true, // Bells above the stage are never moved
        }
    }

    /// Returns `true` if this group is the direct product of the full symmetric groups on each of
    /// its orbits.
    pub fn is_symmetric_product(&self) -> bool {
        self.orbit_data().is_symmetric_product
    }

    /* COSET LABELS */

    /// Returns the smallest element of the right coset `{ g * r : g in self }`, which is the same
    /// for every row in that coset.  `r` is extended with cover bells if it is shorter than the
    /// group's [`Stage`].
    ///
    /// # Example
    /// ```
    /// use changeframe::{Group, RowBuf, Stage};
    ///
    /// // Every permutation of the first three bells
    /// let group = Group::from_generators(
    ///     Stage::MINOR,
    ///     [RowBuf::parse("213456")?, RowBuf::parse("231456")?],
    /// )?;
    /// assert_eq!(group.len(), 6);
    /// assert_eq!(group.rcoset_label(&RowBuf::parse("456321")?).to_string(), "456123");
    /// assert_eq!(group.rcoset_label(&RowBuf::parse("415263")?).to_string(), "415263");
    /// assert_eq!(group.rcoset_label(&RowBuf::parse("435261")?).to_string(), "415263");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn rcoset_label(&self, r: &Row) -> RowBuf {
        let mut r = r.to_owned();
        r.extend_to_stage(self.stage);
        if self.len() >= MIN_SIZE_FOR_DIRECT_LABELS && self.is_symmetric_product() {
            self.rcoset_label_direct(&r)
        } else {
            self.rcoset_label_exhaustive(&r)
        }
    }

    /// Finds the coset label by trying every element of the group
    fn rcoset_label_exhaustive(&self, r: &Row) -> RowBuf {
        let mut best = r.to_owned();
        let mut product = RowBuf::rounds(self.stage);
        for g in &self.rows {
            g.mul_into(r, &mut product);
            if product < best {
                best.clone_from(&product);
            }
        }
        best
    }

    /// Finds the coset label of a group which is the full symmetric group on each orbit.  Such a
    /// group can relabel the bells within each orbit however it likes, so the smallest label
    /// gives each orbit's bells (in ascending order) to that orbit's places in `r`.
    fn rcoset_label_direct(&self, r: &Row) -> RowBuf {
        let data = self.orbit_data();
        let mut next_in_orbit = vec![0usize; data.orbits.len()];
        let bells = r
            .bell_iter()
            .map(|b| match data.orbit_of.get(b.index()) {
                Some(&orbit_idx) => {
                    let new_bell = data.orbits[orbit_idx][next_in_orbit[orbit_idx]];
                    next_in_orbit[orbit_idx] += 1;
                    new_bell
                }
                None => b,
            })
            .collect_vec();
        // This unsafety is OK because each orbit's bells have been permuted amongst themselves
        unsafe { RowBuf::from_vec_unchecked(bells) }
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.stage == other.stage && self.rows == other.rows
    }
}

impl Eq for Group {}

impl Debug for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Group({}: [{}])", self.stage, self.rows.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;
    use quickcheck_macros::quickcheck;

    use crate::{Bell, Group, IncompatibleStages, RowBuf, Stage};

    fn group(stage: Stage, gens: &[&str]) -> Group {
        let gens = gens.iter().map(|s| RowBuf::parse(s).unwrap());
        Group::from_generators(stage, gens).unwrap()
    }

    /// Checks every group axiom by brute force
    #[track_caller]
    fn assert_is_group(g: &Group) {
        assert!(g.contains(&RowBuf::rounds(g.stage())));
        for a in g.rows() {
            assert!(g.contains(&a.inv()));
            for b in g.rows() {
                assert!(g.contains(&(a * b)));
            }
        }
    }

    #[test]
    fn closure() {
        #[track_caller]
        fn check(stage: Stage, gens: &[&str], exp_size: usize) {
            let g = group(stage, gens);
            assert_eq!(g.len(), exp_size);
            assert_is_group(&g);
            assert!(g.rows().windows(2).all(|w| w[0] < w[1]));
        }

        check(Stage::MAJOR, &[], 1);
        check(Stage::MAJOR, &["12345678"], 1);
        check(Stage::MAJOR, &["18234567"], 7);
        check(Stage::MINIMUS, &["2134", "1324"], 6);
        check(Stage::MINIMUS, &["2134", "2341"], 24);
        check(Stage::MINOR, &["214365"], 2);
        check(Stage::MINOR, &["213456", "123465"], 4);
        check(Stage::MAJOR, &["13527486", "12436587"], 14); // Plain Bob lead heads and backrounds
    }

    #[test]
    fn stage_mismatch() {
        let err = Group::from_generators(Stage::MAJOR, [RowBuf::parse("2134").unwrap()]);
        assert_eq!(
            err,
            Err(IncompatibleStages {
                lhs_stage: Stage::MAJOR,
                rhs_stage: Stage::MINIMUS,
            })
        );
    }

    #[test]
    fn orbits_and_invariants() {
        let bells = |s: &str| s.chars().map(|c| Bell::from_name(c).unwrap()).collect_vec();

        let g = group(Stage::MAJOR, &["18234567"]);
        assert_eq!(g.orbits(), &[bells("1"), bells("2345678")]);
        assert_eq!(g.invariants(), bells("1"));
        assert!(g.fixes(Bell::TREBLE));
        assert!(!g.fixes(Bell::from_index(1)));
        assert!(!g.is_symmetric_product());

        let g = group(Stage::MINOR, &["213456", "123465"]);
        assert_eq!(
            g.orbits(),
            &[bells("12"), bells("3"), bells("4"), bells("56")]
        );
        assert_eq!(g.invariants(), bells("34"));
        assert!(g.is_symmetric_product());

        let g = Group::trivial(Stage::SINGLES);
        assert_eq!(g.invariants(), bells("123"));
        assert!(g.is_trivial());
    }

    #[test]
    fn conjugate() {
        let g = group(Stage::MAJOR, &["18234567"]);
        let r = RowBuf::parse("21345678").unwrap();
        let conj = g.conjugate(&r).unwrap();
        assert_eq!(conj.len(), 7);
        assert_is_group(&conj);
        assert_eq!(conj.invariants(), vec![Bell::from_index(1)]);
        // Conjugating back gives the original group
        assert_eq!(conj.conjugate(&r.inv()).unwrap(), g);
    }

    #[test]
    fn coset_labels_agree() {
        // Every permutation of the front six, fixing 7 and 8
        let g = group(Stage::MAJOR, &["21345678", "23456178"]);
        assert_eq!(g.len(), 720);
        assert!(g.is_symmetric_product());

        for r in Stage::MAJOR.extent().iter().step_by(7) {
            let direct = g.rcoset_label_direct(r);
            let exhaustive = g.rcoset_label_exhaustive(r);
            assert_eq!(direct, exhaustive, "labels disagree for {}", r);
            assert_eq!(g.rcoset_label(r), direct);
        }
    }

    #[test]
    fn coset_labels_are_class_invariants() {
        let g = group(Stage::MINOR, &["154326", "123465"]);
        let r = RowBuf::parse("362415").unwrap();
        let label = g.rcoset_label(&r);
        for elem in g.rows() {
            assert_eq!(g.rcoset_label(&(elem * &r)), label);
        }
        // The label is itself a member of the coset
        assert!(g.rows().iter().any(|elem| elem * &r == label));
    }

    #[quickcheck]
    fn rounds_label_is_rounds(row: RowBuf) -> bool {
        let g = Group::from_generators(row.stage(), [row.clone()]).unwrap();
        g.rcoset_label(&row).is_rounds() && g.contains(&row.inv())
    }
}
