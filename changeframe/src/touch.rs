use std::{
    fmt::{Display, Formatter},
    sync::Arc,
};

use crate::{Change, PnBlock, Row, RowAccumulator, RowBuf};

/// A piece of ringing built up from blocks of place notation.  Leaves are shared, so the same
/// [`PnBlock`] (e.g. a plain or bobbed lead) can appear many times without being copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Touch {
    /// A single block of changes
    Block(Arc<PnBlock>),
    /// A sequence of sub-touches, each rung some number of times in a row
    Seq(Vec<(usize, Touch)>),
}

impl Touch {
    /// All the [`Change`]s of this `Touch`, in order.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use changeframe::{PnBlock, Stage, Touch};
    ///
    /// let lead = Arc::new(PnBlock::parse("x16x16x16,12", Stage::MINOR)?);
    /// let course = Touch::Seq(vec![(5, Touch::Block(lead))]);
    /// assert_eq!(course.len(), 60);
    /// assert_eq!(course.changes().len(), 60);
    /// assert!(course.end_row(&changeframe::RowBuf::rounds(Stage::MINOR)).is_rounds());
    /// # Ok::<(), changeframe::PnBlockParseError>(())
    /// ```
    pub fn changes(&self) -> Vec<&Change> {
        let mut changes = Vec::with_capacity(self.len());
        self.push_changes(&mut changes);
        changes
    }

    fn push_changes<'t>(&'t self, out: &mut Vec<&'t Change>) {
        match self {
            Touch::Block(block) => out.extend(block.changes()),
            Touch::Seq(children) => {
                for (count, child) in children {
                    for _ in 0..*count {
                        child.push_changes(out);
                    }
                }
            }
        }
    }

    /// The number of [`Change`]s in this `Touch`
    pub fn len(&self) -> usize {
        match self {
            Touch::Block(block) => block.len(),
            Touch::Seq(children) => children.iter().map(|(n, child)| n * child.len()).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The rows generated by ringing this `Touch` from `start`.  This has one more row than
    /// [`Touch::len`], since it includes both `start` and the row after the last change.
    pub fn rows(&self, start: &Row) -> Vec<RowBuf> {
        let changes = self.changes();
        let mut rows = Vec::with_capacity(changes.len() + 1);
        let mut row = start.to_owned();
        rows.push(row.clone());
        for ch in changes {
            row *= ch;
            rows.push(row.clone());
        }
        rows
    }

    /// The row reached by ringing this `Touch` from `start`.  Sub-touches are only expanded once,
    /// however many times they are repeated.
    pub fn end_row(&self, start: &Row) -> RowBuf {
        let mut acc = RowAccumulator::new(start.to_owned());
        self.accumulate(&mut acc);
        acc.into_total()
    }

    fn accumulate(&self, acc: &mut RowAccumulator) {
        match self {
            Touch::Block(block) => acc.post_accumulate(&block.transposition()),
            Touch::Seq(children) => {
                for (count, child) in children {
                    let mut child_acc = RowAccumulator::new(RowBuf::rounds(acc.total().stage()));
                    child.accumulate(&mut child_acc);
                    acc.post_accumulate(&child_acc.total().pow(*count));
                }
            }
        }
    }
}

impl Display for Touch {
    /// Blocks print as place notation; repeats print as `n*(...)`
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Touch::Block(block) => write!(f, "{}", block),
            Touch::Seq(children) => {
                for (i, (count, child)) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    match (count, child) {
                        (1, Touch::Block(_)) => write!(f, "{}", child)?,
                        _ => write!(f, "{}*({})", count, child)?,
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{PnBlock, RowBuf, Stage};

    use super::Touch;

    fn block(pn: &str) -> Arc<PnBlock> {
        Arc::new(PnBlock::parse(pn, Stage::MINOR).unwrap())
    }

    #[test]
    fn bob_course() {
        let plain = block("x16x16x16,12");
        let bob = block("x16x16x16,14");
        // The Plain Bob Minor course 'WH' style touch: P P P B, three times
        let part = Touch::Seq(vec![(3, Touch::Block(plain.clone())), (1, Touch::Block(bob))]);
        let touch = Touch::Seq(vec![(3, part)]);

        assert_eq!(touch.len(), 144);
        let rows = touch.rows(&RowBuf::rounds(Stage::MINOR));
        assert_eq!(rows.len(), 145);
        assert_eq!(rows[12].to_string(), "135264");
        assert_eq!(rows.last(), Some(&touch.end_row(&RowBuf::rounds(Stage::MINOR))));
        assert_eq!(
            touch.to_string(),
            "3*(3*(X16X16X16X16X16X12) X16X16X16X16X16X14)"
        );

        let empty = Touch::Seq(vec![]);
        assert!(empty.is_empty());
        assert_eq!(empty.rows(&RowBuf::rounds(Stage::MINOR)).len(), 1);
    }
}
