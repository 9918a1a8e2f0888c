//! The depth-first search which runs a [`TableSearch`].

use std::cmp::Ordering;

use bit_vec::BitVec;
use changeframe::{RowAccumulator, Touch};

use crate::multtab::RowIdx;

use super::{CallIdx, Outcome, Progress, ResultSink, TableSearch};

/// A node in the search tree which is currently being expanded
#[derive(Debug, Clone, Copy)]
struct Frame {
    row: RowIdx,
    /// Period of the call sequence up to and including this node, used to detect whether it's
    /// the smallest of its rotations
    cur: usize,
    /// The next call to try from this node
    next_call: CallIdx,
}

/// What to do after visiting a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    /// Expand the node's children, passing on the new value of `cur`
    Expand(usize),
    /// Don't expand this node
    Prune,
    /// Stop the search immediately
    Halt,
}

/// Mutable state for one run of a [`TableSearch`]
pub(super) struct Context<'s, S, U> {
    search: &'s TableSearch,
    sink: &'s mut S,
    until: U,

    /// The calls which make up the current prefix
    calls: Vec<CallIdx>,
    /// `live[r]` is set if the lead head `r` is already in the current prefix
    live: BitVec,
    nodes: usize,
    touches: usize,
}

impl<'s, S: ResultSink, U: FnMut(&Progress) -> bool> Context<'s, S, U> {
    pub fn new(search: &'s TableSearch, sink: &'s mut S, until: U) -> Self {
        Self {
            search,
            sink,
            until,

            calls: Vec::with_capacity(search.max_part_len.min(search.table.len()) + 1),
            live: BitVec::from_elem(search.table.len(), false),
            nodes: 0,
            touches: 0,
        }
    }

    pub fn run(mut self) -> Outcome {
        let halted = self.dfs();
        Outcome {
            nodes: self.nodes,
            touches: self.touches,
            halted,
            impossible: false,
        }
    }

    /// Runs the search, returning `true` if it was halted
    fn dfs(&mut self) -> bool {
        let search = self.search;
        let mut stack = Vec::<Frame>::new();
        match self.visit(search.rounds, 0) {
            Visit::Expand(cur) => self.push_frame(&mut stack, search.rounds, cur),
            Visit::Prune => return false,
            Visit::Halt => return true,
        }

        while let Some(frame) = stack.last_mut() {
            // Once every call has been tried, backtrack
            if frame.next_call.index() == search.num_calls() {
                self.live.set(frame.row.index(), false);
                stack.pop();
                self.calls.pop(); // The call which led to this frame (nothing for the root)
                continue;
            }

            let call = frame.next_call;
            frame.next_call += 1;
            let Frame { row, cur, .. } = *frame;

            let child = row * search.table.post_col(search.call_cols[call]);
            self.calls.push(call);
            match self.visit(child, cur) {
                Visit::Expand(cur) => self.push_frame(&mut stack, child, cur),
                Visit::Prune => {
                    self.calls.pop();
                }
                Visit::Halt => return true,
            }
        }
        false
    }

    fn push_frame(&mut self, stack: &mut Vec<Frame>, row: RowIdx, cur: usize) {
        self.live.set(row.index(), true);
        stack.push(Frame {
            row,
            cur,
            next_call: CallIdx::new(0),
        });
    }

    /// Visits the node reached by the calls in `self.calls`, which has lead head `row`.  `cur`
    /// is the period of the parent node's call sequence.
    fn visit(&mut self, row: RowIdx, mut cur: usize) -> Visit {
        self.nodes += 1;
        let progress = Progress {
            nodes: self.nodes,
            touches: self.touches,
            depth: self.calls.len(),
        };
        if (self.until)(&progress) {
            return Visit::Halt;
        }

        let len = self.calls.len();
        if !self.search.is_multipart() {
            // Abandon any prefix which can't be the smallest rotation of a touch
            if len <= 1 {
                cur = len;
            } else {
                match self.calls[len - 1].cmp(&self.calls[len - 1 - cur]) {
                    Ordering::Greater => cur = len,
                    Ordering::Less => return Visit::Prune,
                    Ordering::Equal => {}
                }
            }
        }

        if self.is_row_false(row) {
            let comes_round = row == self.search.rounds && self.is_really_canonical(cur);
            if comes_round && self.emit(cur) {
                return Visit::Halt;
            }
            return Visit::Prune;
        }

        if len < self.search.max_part_len {
            Visit::Expand(cur)
        } else {
            Visit::Prune
        }
    }

    /// Returns `true` if the lead starting at `row` shares a row with any lead in the current
    /// prefix (including itself in other parts)
    fn is_row_false(&self, row: RowIdx) -> bool {
        let search = self.search;
        if self.live[row.index()] {
            return true;
        }
        let false_against_prefix = search
            .falseness_cols
            .iter()
            .any(|col| self.live[(row * search.table.post_col(*col)).index()]);
        false_against_prefix || (search.is_multipart() && search.self_false[row.index()])
    }

    fn is_really_canonical(&self, cur: usize) -> bool {
        self.search.is_multipart() || self.calls.len() % cur == 0
    }

    /// Sends the current calling (and maybe its rotations) to the sink, returning `true` if the
    /// sink wants to halt.
    fn emit(&mut self, cur: usize) -> bool {
        let search = self.search;
        if search.is_multipart() {
            return self.emit_multipart();
        }

        if !search.lengths.contains(self.calls.len()) {
            return false;
        }
        if self.send(search.touch(&self.calls)) {
            return true;
        }
        if !search.flags.ignore_rotations {
            let len = self.calls.len();
            for i in 1..cur {
                let rotation = (0..len)
                    .map(|j| self.calls[(i + j) % len])
                    .collect::<Vec<_>>();
                if self.send(search.touch(&rotation)) {
                    return true;
                }
            }
        }
        false
    }

    /// Emits a multi-part touch, made of the current calling repeated once per part.  Part ends
    /// which don't generate the right parts are skipped, as are touches whose total length
    /// (over every part) is out of range.
    fn emit_multipart(&mut self) -> bool {
        let search = self.search;
        let mut acc = RowAccumulator::rounds(search.method.stage());
        for &call in &self.calls {
            acc.post_accumulate(&search.lead_heads[call]);
        }
        let part_end = acc.total();

        let accepted = if search.flags.mutually_true_parts {
            search.part_ends.contains(part_end)
        } else if search.flags.non_round_blocks {
            !part_end.is_rounds()
        } else {
            part_end.order() == search.part_ends.len()
        };
        let num_parts = part_end.order();
        if !accepted || !search.lengths.contains(self.calls.len() * num_parts) {
            return false;
        }

        let part = search.touch(&self.calls);
        let touch = match num_parts {
            1 => part,
            num_parts => Touch::Seq(vec![(num_parts, part)]),
        };
        self.send(touch)
    }

    fn send(&mut self, touch: Touch) -> bool {
        self.touches += 1;
        self.sink.on_touch(&touch)
    }
}
