//! Exhaustive searches for touches, built on top of a [`MultTab`].

mod dfs;

use std::{sync::Arc, time::Instant};

use bit_vec::BitVec;
use changeframe::{
    Bell, Change, FalsenessFlags, FalsenessTable, Group, IncompatibleStages, Method, PnBlock,
    RowBuf, Touch,
};
use index_vec::IndexVec;
use itertools::Itertools;
use ringing_utils::BigNumInt;

use crate::{
    multtab::{PostColIdx, RowIdx},
    Error, LengthRange, MultTab, Result, SearchFlags,
};

index_vec::define_index_type! { pub struct CallIdx = usize; }
pub type CallVec<T> = IndexVec<CallIdx, T>;

/// A fully built search for touches of a single [`Method`].  This owns a [`MultTab`] over every
/// lead head the touches could reach, along with the columns which the search follows.
///
/// A `TableSearch` is immutable once built, so it can be searched any number of times (with
/// [`touch_search`] or [`touch_search_until`]).
#[derive(Debug, Clone)]
pub struct TableSearch {
    method: Method,
    /// The lead end [`Change`] of each call.  Index 0 is the plain lead.
    lead_ends: CallVec<Change>,
    /// The lead of each call, shared by every [`Touch`] generated by the search
    lead_blocks: CallVec<Arc<PnBlock>>,
    /// The lead head of each call, in the same order as `lead_blocks`
    lead_heads: CallVec<RowBuf>,

    part_ends: Group,
    table: MultTab,
    treble_fixed: bool,
    rounds: RowIdx,
    call_cols: CallVec<PostColIdx>,
    falseness_cols: Vec<PostColIdx>,
    /// Marks the rows whose lead is false against the same lead in another part.  Only
    /// populated for multi-part searches.
    self_false: BitVec,

    /// Always measured in leads, and counts every part of a multi-part touch
    lengths: LengthRange,
    /// The most leads any one part can have, given the fewest parts a touch could be split into
    max_part_len: usize,
    flags: SearchFlags,
    impossible: bool,
}

impl TableSearch {
    /// Builds a new `TableSearch`.  `calls` are given as the lead end [`Change`]s which replace
    /// the [`Method`]'s usual lead end, and `part_ends` is the group of part ends (use
    /// [`Group::trivial`] for single-part touches).
    pub fn new(
        method: Method,
        calls: Vec<Change>,
        part_ends: Group,
        lengths: LengthRange,
        flags: SearchFlags,
    ) -> Result<Self> {
        let start = Instant::now();
        let stage = method.stage();
        IncompatibleStages::test_err(stage, part_ends.stage())?;

        // Leads for each call, starting with the plain lead
        let mut lead_ends = CallVec::new();
        lead_ends.push(method.lead_end_change().clone());
        for call in calls {
            IncompatibleStages::test_err(stage, call.stage())?;
            if lead_ends.iter().any(|c| *c == call) {
                return Err(Error::DuplicateCall(call));
            }
            lead_ends.push(call);
        }
        let lead_blocks = lead_ends
            .iter()
            .map(|c| method.with_lead_end(c.clone()).map(Arc::new))
            .collect::<std::result::Result<CallVec<_>, _>>()?;
        let lead_heads = lead_blocks
            .iter()
            .map(|b| b.transposition())
            .collect::<CallVec<_>>();

        // If the treble is never moved by the lead heads, then only rows with the treble fixed
        // can ever be reached
        let treble_fixed = lead_heads.iter().all(|lh| lh.is_fixed(Bell::TREBLE))
            && part_ends.fixes(Bell::TREBLE);
        let extent = match stage.checked_sub(1) {
            Some(inner_stage) if treble_fixed => inner_stage
                .extent()
                .iter()
                .map(|r| RowBuf::with_fixed_treble(r))
                .collect_vec(),
            _ => stage.extent(),
        };

        let mut table = MultTab::new(&extent, part_ends.clone())?;
        let rounds = table
            .find(&RowBuf::rounds(stage))
            .ok_or_else(|| Error::RowNotInTable(RowBuf::rounds(stage)))?;
        let call_cols = lead_heads
            .iter()
            .map(|lh| table.compute_post_mult(lh))
            .collect::<Result<CallVec<_>>>()?;

        let falseness = FalsenessTable::from_method(
            &method,
            FalsenessFlags {
                no_fixed_treble: !treble_fixed,
                ..Default::default()
            },
        );
        let falseness_cols = falseness
            .differences()
            .iter()
            .map(|d| table.compute_post_mult(d))
            .collect::<Result<Vec<_>>>()?;

        let mut self_false = BitVec::new();
        if !part_ends.is_trivial() {
            self_false = BitVec::from_elem(table.len(), false);
            for col_idx in &falseness_cols {
                let col = table.post_col(*col_idx);
                for i in 0..table.len() {
                    let r = RowIdx::new(i);
                    if r * col == r {
                        self_false.set(i, true);
                    }
                }
            }
        }

        let lengths = if flags.length_in_changes {
            lengths.changes_to_leads(method.lead_len())
        } else {
            lengths
        };
        let false_in_own_part = falseness
            .differences()
            .iter()
            .find(|d| part_ends.contains(d));
        if let Some(d) = false_in_own_part {
            log::debug!("Every lead is false against itself in another part (by {})", d);
        }
        let impossible = false_in_own_part.is_some() || lengths.is_empty();
        let max_part_len = lengths.max / min_num_parts(&part_ends, flags);

        log::debug!(
            "Search of {} rows, {} calls and {} falseness columns built in {:.2?}",
            BigNumInt(table.len()),
            lead_ends.len() - 1,
            falseness_cols.len(),
            start.elapsed()
        );

        Ok(Self {
            method,
            lead_ends,
            lead_blocks,
            lead_heads,

            part_ends,
            table,
            treble_fixed,
            rounds,
            call_cols,
            falseness_cols,
            self_false,

            lengths,
            max_part_len,
            flags,
            impossible,
        })
    }

    /////////////
    // GETTERS //
    /////////////

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn part_ends(&self) -> &Group {
        &self.part_ends
    }

    #[inline]
    pub fn table(&self) -> &MultTab {
        &self.table
    }

    #[inline]
    pub fn flags(&self) -> SearchFlags {
        self.flags
    }

    /// The range of lengths (in leads) of the generated touches
    #[inline]
    pub fn lengths(&self) -> LengthRange {
        self.lengths
    }

    /// The most leads which can appear in one part of a touch
    #[inline]
    pub fn max_part_len(&self) -> usize {
        self.max_part_len
    }

    /// The number of distinct lead ends, including the plain lead
    #[inline]
    pub fn num_calls(&self) -> usize {
        self.lead_ends.len()
    }

    /// The lead end [`Change`] of some call.  [`CallIdx`] 0 is the plain lead.
    #[inline]
    pub fn lead_end(&self, call: CallIdx) -> &Change {
        &self.lead_ends[call]
    }

    /// The lead produced by some call.  [`CallIdx`] 0 is the plain lead.
    #[inline]
    pub fn lead_block(&self, call: CallIdx) -> &Arc<PnBlock> {
        &self.lead_blocks[call]
    }

    #[inline]
    pub fn is_multipart(&self) -> bool {
        !self.part_ends.is_trivial()
    }

    /// `true` if the table only contains rows where the treble is fixed
    #[inline]
    pub fn is_treble_fixed(&self) -> bool {
        self.treble_fixed
    }

    /// `true` if this search can be shown to produce no touches without searching
    #[inline]
    pub fn is_impossible(&self) -> bool {
        self.impossible
    }

    /// The number of falseness columns
    #[inline]
    pub fn num_falseness_cols(&self) -> usize {
        self.falseness_cols.len()
    }

    /////////////
    // TOUCHES //
    /////////////

    /// Creates a [`Touch`] from a sequence of calls.  Runs of the same call are collapsed into a
    /// single repeated child.
    pub fn touch(&self, calls: &[CallIdx]) -> Touch {
        let children = calls
            .iter()
            .dedup_with_count()
            .map(|(count, call)| (count, Touch::Block(self.lead_blocks[*call].clone())))
            .collect_vec();
        Touch::Seq(children)
    }

    /// Recovers the sequence of calls which makes up some [`Touch`], returning `None` if any of
    /// its leads didn't come from this `TableSearch`.  Leads are recognised by identity, not by
    /// their contents.
    pub fn calling(&self, touch: &Touch) -> Option<Vec<CallIdx>> {
        let mut calls = Vec::new();
        self.push_calls(touch, &mut calls)?;
        Some(calls)
    }

    fn push_calls(&self, touch: &Touch, out: &mut Vec<CallIdx>) -> Option<()> {
        match touch {
            Touch::Block(block) => {
                let idx = self
                    .lead_blocks
                    .iter()
                    .position(|b| Arc::ptr_eq(b, block))?;
                out.push(CallIdx::new(idx));
            }
            Touch::Seq(children) => {
                for (count, child) in children {
                    for _ in 0..*count {
                        self.push_calls(child, out)?;
                    }
                }
            }
        }
        Some(())
    }
}

/// The fewest parts that an accepted touch can have.  A part end of order `n` splits a touch into
/// `n` parts.
fn min_num_parts(part_ends: &Group, flags: SearchFlags) -> usize {
    if part_ends.is_trivial() || flags.mutually_true_parts {
        1 // Rounds is always a valid part end
    } else if flags.non_round_blocks {
        2
    } else {
        part_ends.len()
    }
}

/// Something which receives the [`Touch`]es found by a search
pub trait ResultSink {
    /// Called once per [`Touch`], in the order they're found.  Returning `true` stops the search.
    fn on_touch(&mut self, touch: &Touch) -> bool;
}

impl<F: FnMut(&Touch) -> bool> ResultSink for F {
    fn on_touch(&mut self, touch: &Touch) -> bool {
        self(touch)
    }
}

/// Collects every [`Touch`]
impl ResultSink for Vec<Touch> {
    fn on_touch(&mut self, touch: &Touch) -> bool {
        self.push(touch.clone());
        false
    }
}

/// How far a search has got.  This is passed to the `until` predicate of
/// [`touch_search_until`] before every node is expanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// How many nodes have been visited, including the current one
    pub nodes: usize,
    /// How many touches have been generated so far
    pub touches: usize,
    /// The number of leads in the current prefix
    pub depth: usize,
}

/// A summary of a completed (or halted) search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub nodes: usize,
    pub touches: usize,
    /// `true` if the search was stopped early, either by the [`ResultSink`] or by the `until`
    /// predicate
    pub halted: bool,
    /// `true` if the search was skipped because no touches are possible
    pub impossible: bool,
}

/// Runs a [`TableSearch`] to completion (or until the [`ResultSink`] halts it).
pub fn touch_search(search: &TableSearch, sink: &mut impl ResultSink) -> Outcome {
    touch_search_until(search, sink, |_| false)
}

/// Runs a [`TableSearch`] until either it completes, the [`ResultSink`] halts it or `until`
/// returns `true`.  `until` is checked once per node, so can be used to implement node or time
/// limits.
pub fn touch_search_until(
    search: &TableSearch,
    sink: &mut impl ResultSink,
    until: impl FnMut(&Progress) -> bool,
) -> Outcome {
    if search.impossible {
        log::debug!("Search is impossible; not searching");
        return Outcome {
            impossible: true,
            ..Outcome::default()
        };
    }

    let start = Instant::now();
    let outcome = dfs::Context::new(search, sink, until).run();
    log::debug!(
        "Search visited {} nodes and found {} touches in {:.2?}{}",
        BigNumInt(outcome.nodes),
        BigNumInt(outcome.touches),
        start.elapsed(),
        if outcome.halted { " (halted)" } else { "" }
    );
    outcome
}
