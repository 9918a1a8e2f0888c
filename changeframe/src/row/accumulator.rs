use crate::{Row, RowBuf, Stage};

/// A running product of [`Row`]s, which reuses its two allocations for every multiplication.
/// Used to find the end of a sequence of leads (or parts) without allocating a new [`RowBuf`]
/// per step.
#[derive(Debug, Clone)]
pub struct RowAccumulator {
    total: RowBuf,
    /// Scratch space for the next product
    scratch: RowBuf,
}

impl RowAccumulator {
    #[inline]
    pub fn rounds(stage: Stage) -> Self {
        Self::new(RowBuf::rounds(stage))
    }

    #[inline]
    pub fn new(start: RowBuf) -> Self {
        Self {
            scratch: RowBuf::rounds(start.stage()),
            total: start,
        }
    }

    /// Replaces the total `t` with `t * row`.  This is how a lead head is moved on by the
    /// transposition of the next lead.
    #[inline]
    pub fn post_accumulate(&mut self, row: &Row) {
        self.total.mul_into(row, &mut self.scratch);
        std::mem::swap(&mut self.total, &mut self.scratch);
    }

    #[inline]
    pub fn total(&self) -> &Row {
        &self.total
    }

    #[inline]
    pub fn into_total(self) -> RowBuf {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use crate::{RowBuf, Stage};

    use super::RowAccumulator;

    #[test]
    fn lead_heads() {
        // Three plain leads of Plain Bob Minor
        let plain_lead = RowBuf::parse("135264").unwrap();
        let mut acc = RowAccumulator::rounds(Stage::MINOR);
        let mut expected = vec!["135264", "156342", "164523"].into_iter();
        for _ in 0..3 {
            acc.post_accumulate(&plain_lead);
            assert_eq!(acc.total(), &*RowBuf::parse(expected.next().unwrap()).unwrap());
        }
    }

    #[test]
    fn mixed_stages() {
        let a = RowBuf::parse("2143").unwrap();
        let b = RowBuf::parse("132546").unwrap();
        let mut acc = RowAccumulator::rounds(Stage::MINIMUS);
        acc.post_accumulate(&a);
        acc.post_accumulate(&b);
        assert_eq!(acc.total(), &*(&a * &b));
        assert_eq!(acc.total().stage(), Stage::MINOR);
        assert_eq!(acc.into_total(), &a * &b);
    }
}
