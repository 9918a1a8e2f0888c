use crate::{Change, IncompatibleStages, PnBlock, PnBlockParseError, Row, RowBuf, Stage};

/// A named block of place notation which is rung as a repeating unit (a 'lead').  Calls are
/// applied by replacing the last [`Change`] of the lead (the lead end).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    name: String,
    block: PnBlock,
    /// The rows generated by ringing one lead from rounds.  This contains one more row than the
    /// lead; the extra row is the lead head.
    rows: Vec<RowBuf>,
}

impl Method {
    /// Creates a new `Method` from a name and a lead of place notation
    pub fn new(name: String, block: PnBlock) -> Self {
        let rows = block.to_rows(&RowBuf::rounds(block.stage()));
        Self { name, block, rows }
    }

    /// Parses a place notation string and creates a `Method` with that place notation.
    ///
    /// # Example
    /// ```
    /// use changeframe::{Method, Stage};
    ///
    /// let pb = Method::from_place_notation("Plain Bob".to_owned(), Stage::MAJOR, "x18x18x18x18,12")?;
    /// assert_eq!(pb.lead_len(), 16);
    /// assert_eq!(pb.lead_head().to_string(), "13527486");
    /// assert_eq!(pb.lead_end().to_string(), "13254768");
    /// assert_eq!(pb.lead_end_change().to_string(), "12");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_place_notation(
        name: String,
        stage: Stage,
        place_notation: &str,
    ) -> Result<Self, PnBlockParseError> {
        Ok(Self::new(name, PnBlock::parse(place_notation, stage)?))
    }

    /////////////
    // GETTERS //
    /////////////

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.block.stage()
    }

    /// The place notation of one lead
    #[inline]
    pub fn block(&self) -> &PnBlock {
        &self.block
    }

    /// How many [`Row`]s are in a single lead of this `Method`?
    #[inline]
    pub fn lead_len(&self) -> usize {
        self.block.len()
    }

    /// The rows of the first lead, starting with rounds.  The lead head is not included.
    #[inline]
    pub fn first_lead(&self) -> &[RowBuf] {
        &self.rows[..self.lead_len()]
    }

    /// The overall transposing effect of one lead of this `Method`.
    #[inline]
    pub fn lead_head(&self) -> &Row {
        // `rows` always has `lead_len + 1 >= 2` elements
        &self.rows[self.lead_len()]
    }

    /// The last [`Row`] of the [first lead](Self::first_lead).
    #[inline]
    pub fn lead_end(&self) -> &Row {
        &self.rows[self.lead_len() - 1]
    }

    /// The [`Change`] between the [lead end](Self::lead_end) and the [lead head](Self::lead_head)
    #[inline]
    pub fn lead_end_change(&self) -> &Change {
        self.block.last_change()
    }

    /// The [`Row`] at some index in the infinite plain course of this `Method`.
    pub fn row_in_plain_course(&self, idx: usize) -> RowBuf {
        let num_leads = idx / self.lead_len();
        let sub_lead_idx = idx % self.lead_len();
        self.lead_head().pow(num_leads) * &self.rows[sub_lead_idx]
    }

    /// The rows of the plain course, ending just before the return to rounds.
    pub fn plain_course(&self) -> Vec<RowBuf> {
        let num_leads = self.lead_head().order();
        (0..num_leads * self.lead_len())
            .map(|i| self.row_in_plain_course(i))
            .collect()
    }

    ///////////
    // CALLS //
    ///////////

    /// The lead of this `Method` with the lead end [`Change`] replaced by `call`.
    ///
    /// # Example
    /// ```
    /// use changeframe::{Change, Method, Stage};
    ///
    /// let pb = Method::from_place_notation("Plain Bob".to_owned(), Stage::MINOR, "x16x16x16,12")?;
    /// let bob = pb.with_lead_end(Change::parse("14", Stage::MINOR)?)?;
    /// assert_eq!(bob.transposition().to_string(), "123564");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn with_lead_end(&self, call: Change) -> Result<PnBlock, IncompatibleStages> {
        self.block.with_last_change(call)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Change, Method, RowBuf, Stage};

    #[test]
    fn plain_course() {
        let pb = Method::from_place_notation("Plain Bob".to_owned(), Stage::MINOR, "x16x16x16,12")
            .unwrap();
        assert_eq!(pb.name(), "Plain Bob");
        assert_eq!(pb.lead_head().to_string(), "135264");
        assert_eq!(pb.first_lead().len(), 12);
        assert!(pb.first_lead()[0].is_rounds());

        let course = pb.plain_course();
        assert_eq!(course.len(), 60);
        assert_eq!(course[12].as_row(), pb.lead_head());
        assert_eq!(course[13].to_string(), "312546");
        // A plain course is true
        let mut sorted = course.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 60);
    }

    #[test]
    fn calls() {
        let pb = Method::from_place_notation("Plain Bob".to_owned(), Stage::MINOR, "x16x16x16,12")
            .unwrap();
        let single = pb
            .with_lead_end(Change::parse("1234", Stage::MINOR).unwrap())
            .unwrap();
        assert_eq!(single.len(), 12);
        assert_eq!(single.transposition().to_string(), "132564");
        assert_eq!(
            single.to_rows(&RowBuf::rounds(Stage::MINOR))[11].as_row(),
            pb.lead_end()
        );
        // Calls must have the right stage
        assert!(pb
            .with_lead_end(Change::parse("14", Stage::MAJOR).unwrap())
            .is_err());
    }
}
