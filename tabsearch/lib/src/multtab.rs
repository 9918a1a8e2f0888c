//! Multiplication tables over sets of rows, quotiented by symmetry groups.

use std::{collections::HashMap, ops::Mul, time::Instant};

use changeframe::{Group, IncompatibleStages, Row, RowBuf, Stage};
use index_vec::IndexVec;
use itertools::Itertools;
use ringing_utils::BigNumInt;

use crate::{Error, Result};

index_vec::define_index_type! { pub struct RowIdx = u32; }
index_vec::define_index_type! { pub struct PreColIdx = usize; }
index_vec::define_index_type! { pub struct PostColIdx = usize; }
pub type RowVec<T> = IndexVec<RowIdx, T>;

/// Which side of a table row a column multiplies by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// `x * row`
    Pre,
    /// `row * x`
    Post,
}

/// A finite set of rows, reduced to equivalence classes and given dense [`RowIdx`]s, along with
/// any number of columns which map each row to its product with some fixed row.
///
/// Every row is quotiented by a group of 'part ends' `G` (acting on the left) and an optional
/// 'post group' `H` (acting on the right), so each [`RowIdx`] refers to the class
/// `{ g * r * h }`.  Each class is stored as its smallest member.
///
/// Finding a row's index is slow (it requires reducing the row and a binary search), but
/// following a column is a single array lookup.
#[derive(Debug, Clone)]
pub struct MultTab {
    stage: Stage,
    pends: Group,
    post_group: Group,
    /// Class representatives, in sorted order
    rows: RowVec<RowBuf>,

    pre_cols: IndexVec<PreColIdx, PreCol>,
    post_cols: IndexVec<PostColIdx, PostCol>,
    /// Maps each multiplier to the column which already stores it
    col_cache: HashMap<(RowBuf, Side), usize>,
}

impl MultTab {
    /// Creates a `MultTab` over some `rows`, quotiented by the left cosets of `pends`.  The rows
    /// must be a union of such cosets.
    pub fn new(rows: &[RowBuf], pends: Group) -> Result<Self> {
        let stage = pends.stage();
        Self::with_post_group(rows, pends, Group::trivial(stage))
    }

    /// Creates a `MultTab` over some `rows`, where each row `r` is identified with every row in
    /// `{ g * r * h }` for `g` in `pends` and `h` in `post_group`.  The rows must be a union of
    /// left cosets of `pends`.
    pub fn with_post_group(rows: &[RowBuf], pends: Group, post_group: Group) -> Result<Self> {
        let start = Instant::now();
        let stage = pends.stage();
        IncompatibleStages::test_err(stage, post_group.stage())?;
        for r in rows {
            IncompatibleStages::test_err(stage, r.stage())?;
        }

        // Every row must be in a coset which is entirely contained in `rows`, which is true
        // exactly when each coset label accounts for `|pends|` distinct rows
        let num_rows = rows.iter().unique().count();
        let num_classes = rows.iter().map(|r| pends.rcoset_label(r)).unique().count();
        if num_classes * pends.len() != num_rows {
            return Err(Error::NotUnionOfCosets {
                num_rows,
                num_classes,
                group_size: pends.len(),
            });
        }

        let mut table = Self {
            stage,
            pends,
            post_group,
            rows: RowVec::new(),

            pre_cols: IndexVec::new(),
            post_cols: IndexVec::new(),
            col_cache: HashMap::new(),
        };
        let mut reps = rows.iter().map(|r| table.reduce(r)).collect_vec();
        reps.sort();
        reps.dedup();
        table.rows = RowVec::from_vec(reps);

        log::debug!(
            "Multiplication table of {} classes built in {:.2?}",
            BigNumInt(table.rows.len()),
            start.elapsed()
        );
        Ok(table)
    }

    /// Reduces a [`Row`] to the representative of its class
    fn reduce(&self, r: &Row) -> RowBuf {
        if self.post_group.is_trivial() {
            return self.pends.rcoset_label(r);
        }
        self.post_group
            .rows()
            .iter()
            .map(|h| self.pends.rcoset_label(&(r * h)))
            .min()
            .unwrap_or_else(|| self.pends.rcoset_label(r))
    }

    /////////////
    // GETTERS //
    /////////////

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[inline]
    pub fn pends(&self) -> &Group {
        &self.pends
    }

    #[inline]
    pub fn post_group(&self) -> &Group {
        &self.post_group
    }

    /// The number of classes in this table
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The representative of the class with a given [`RowIdx`]
    #[inline]
    pub fn row(&self, idx: RowIdx) -> &Row {
        &self.rows[idx]
    }

    /// Every class representative, in sorted order
    #[inline]
    pub fn rows(&self) -> &RowVec<RowBuf> {
        &self.rows
    }

    /// Finds the [`RowIdx`] of the class containing some [`Row`], or `None` if that class isn't
    /// in the table.
    pub fn find(&self, row: &Row) -> Option<RowIdx> {
        if row.stage() != self.stage {
            return None;
        }
        let rep = self.reduce(row);
        self.rows
            .as_raw_slice()
            .binary_search(&rep)
            .ok()
            .map(RowIdx::new)
    }

    /////////////
    // COLUMNS //
    /////////////

    /// Adds a column containing `x * r` for each row `r`, returning its index.  If that column
    /// has already been computed, the existing index is returned.
    ///
    /// `x` must commute with every part end, otherwise the column would depend on which member
    /// of each class was multiplied.
    pub fn compute_pre_mult(&mut self, x: &Row) -> Result<PreColIdx> {
        IncompatibleStages::test_err(self.stage, x.stage())?;
        if let Some(&idx) = self.col_cache.get(&(x.to_owned(), Side::Pre)) {
            return Ok(PreColIdx::new(idx));
        }
        if !self.pends.generators().iter().all(|g| x.commutes_with(g)) {
            return Err(Error::NonCommutingPremultiplier(x.to_owned()));
        }

        let images = self.column(|r| x * r)?;
        let idx = self.pre_cols.push(PreCol {
            multiplier: x.to_owned(),
            images,
        });
        self.col_cache.insert((x.to_owned(), Side::Pre), idx.index());
        Ok(idx)
    }

    /// Adds a column containing `r * x` for each row `r`, returning its index.  If that column
    /// has already been computed, the existing index is returned.
    ///
    /// If the table has a non-trivial post group, `x` must commute with all of it.
    pub fn compute_post_mult(&mut self, x: &Row) -> Result<PostColIdx> {
        IncompatibleStages::test_err(self.stage, x.stage())?;
        if let Some(&idx) = self.col_cache.get(&(x.to_owned(), Side::Post)) {
            return Ok(PostColIdx::new(idx));
        }
        if !self.post_group.is_trivial()
            && !self.post_group.generators().iter().all(|h| x.commutes_with(h))
        {
            return Err(Error::NonCommutingPostmultiplier(x.to_owned()));
        }

        let images = self.column(|r| r * x)?;
        let idx = self.post_cols.push(PostCol {
            multiplier: x.to_owned(),
            images,
        });
        self.col_cache.insert((x.to_owned(), Side::Post), idx.index());
        Ok(idx)
    }

    /// Computes the image of every table row under some multiplication
    fn column(&self, mul: impl Fn(&Row) -> RowBuf) -> Result<RowVec<RowIdx>> {
        let start = Instant::now();
        let images = self
            .rows
            .iter()
            .map(|r| {
                let product = mul(r.as_row());
                self.find(&product).ok_or(Error::RowNotInTable(product))
            })
            .collect::<Result<RowVec<RowIdx>>>()?;
        log::trace!("Column built in {:.2?}", start.elapsed());
        Ok(images)
    }

    #[inline]
    pub fn pre_col(&self, idx: PreColIdx) -> &PreCol {
        &self.pre_cols[idx]
    }

    #[inline]
    pub fn post_col(&self, idx: PostColIdx) -> &PostCol {
        &self.post_cols[idx]
    }
}

/// A column of a [`MultTab`] which pre-multiplies each row by some fixed `x`.  Apply it with
/// `&col * row_idx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreCol {
    multiplier: RowBuf,
    images: RowVec<RowIdx>,
}

/// A column of a [`MultTab`] which post-multiplies each row by some fixed `x`.  Apply it with
/// `row_idx * &col`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCol {
    multiplier: RowBuf,
    images: RowVec<RowIdx>,
}

impl PreCol {
    #[inline]
    pub fn multiplier(&self) -> &Row {
        &self.multiplier
    }
}

impl PostCol {
    #[inline]
    pub fn multiplier(&self) -> &Row {
        &self.multiplier
    }
}

impl Mul<RowIdx> for &PreCol {
    type Output = RowIdx;

    #[inline(always)]
    fn mul(self, rhs: RowIdx) -> RowIdx {
        self.images[rhs]
    }
}

impl Mul<&PostCol> for RowIdx {
    type Output = RowIdx;

    #[inline(always)]
    fn mul(self, rhs: &PostCol) -> RowIdx {
        rhs.images[self]
    }
}

#[cfg(test)]
mod tests {
    use changeframe::{Group, RowBuf, Stage};

    use super::{MultTab, RowIdx};
    use crate::Error;

    fn row(s: &str) -> RowBuf {
        RowBuf::parse(s).unwrap()
    }

    fn group(stage: Stage, gens: &[&str]) -> Group {
        Group::from_generators(stage, gens.iter().map(|s| row(s))).unwrap()
    }

    #[test]
    fn find_inverts_row() {
        let extent = Stage::DOUBLES.extent();
        for pends in [
            Group::trivial(Stage::DOUBLES),
            group(Stage::DOUBLES, &["15234"]),
            group(Stage::DOUBLES, &["21345", "13245"]),
        ] {
            let table = MultTab::new(&extent, pends.clone()).unwrap();
            assert_eq!(table.len() * pends.len(), 120);
            for (idx, r) in table.rows().iter_enumerated() {
                assert_eq!(table.find(r), Some(idx));
                assert_eq!(table.row(idx), r.as_row());
            }
            // Representatives are stored in order
            assert!(table.rows().as_raw_slice().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn classes_share_an_index() {
        let pends = group(Stage::MINIMUS, &["1342"]);
        let table = MultTab::new(&Stage::MINIMUS.extent(), pends.clone()).unwrap();
        let r = row("2143");
        let idx = table.find(&r).unwrap();
        for g in pends.rows() {
            assert_eq!(table.find(&(g * &r)), Some(idx));
        }
        // Wrong stages are never in the table
        assert_eq!(table.find(&row("21435")), None);
    }

    #[test]
    fn not_union_of_cosets() {
        let pends = group(Stage::MINIMUS, &["2134"]);
        let rows = vec![row("1234"), row("2134"), row("1324")];
        assert_eq!(
            MultTab::new(&rows, pends.clone()).unwrap_err(),
            Error::NotUnionOfCosets {
                num_rows: 3,
                num_classes: 2,
                group_size: 2
            }
        );
        let rows = vec![row("1234"), row("2134"), row("1324"), row("2314")];
        assert_eq!(MultTab::new(&rows, pends).unwrap().len(), 2);
    }

    #[test]
    fn stage_mismatch() {
        let pends = Group::trivial(Stage::MINIMUS);
        let rows = vec![row("1234"), row("12345")];
        assert!(matches!(
            MultTab::new(&rows, pends),
            Err(Error::IncompatibleStages(_))
        ));
    }

    #[test]
    fn post_columns() {
        let pends = group(Stage::DOUBLES, &["12453"]);
        let mut table = MultTab::new(&Stage::DOUBLES.extent(), pends).unwrap();
        let x = row("21435");
        let col_idx = table.compute_post_mult(&x).unwrap();
        // Computing the same column again reuses it
        assert_eq!(table.compute_post_mult(&x).unwrap(), col_idx);

        let col = table.post_col(col_idx);
        assert_eq!(col.multiplier(), x.as_row());
        for (idx, r) in table.rows().iter_enumerated() {
            assert_eq!(idx * col, table.find(&(r * &x)).unwrap());
        }
        // Post-multiplying by rounds is the identity
        let id_col = table.compute_post_mult(&row("12345")).unwrap();
        for idx in (0..table.len()).map(RowIdx::new) {
            assert_eq!(idx * table.post_col(id_col), idx);
        }
    }

    #[test]
    fn pre_columns() {
        let pends = group(Stage::MINOR, &["213456"]);
        let mut table = MultTab::new(&Stage::MINOR.extent(), pends).unwrap();
        assert_eq!(
            table.compute_pre_mult(&row("132456")).unwrap_err(),
            Error::NonCommutingPremultiplier(row("132456"))
        );

        let x = row("124365");
        let col_idx = table.compute_pre_mult(&x).unwrap();
        let col = table.pre_col(col_idx);
        for (idx, r) in table.rows().iter_enumerated() {
            assert_eq!(col * idx, table.find(&(&x * r)).unwrap());
        }
        // Pre- and post-columns are cached separately
        assert_eq!(table.compute_post_mult(&x).unwrap().index(), 0);
    }

    #[test]
    fn post_group_reduction() {
        let pends = Group::trivial(Stage::MINIMUS);
        let post = group(Stage::MINIMUS, &["1243"]);
        let mut table =
            MultTab::with_post_group(&Stage::MINIMUS.extent(), pends, post).unwrap();
        assert_eq!(table.len(), 12);
        assert_eq!(table.find(&row("1243")), table.find(&row("1234")));
        // Post-multipliers have to commute with the post group
        assert!(table.compute_post_mult(&row("2134")).is_ok());
        assert_eq!(
            table.compute_post_mult(&row("1324")).unwrap_err(),
            Error::NonCommutingPostmultiplier(row("1324"))
        );
    }
}
