//! `tabsearch` is an exhaustive search engine for touches of a single method.
//!
//! A touch is a sequence of leads, each ended by either the method's usual lead end or a call,
//! which comes back to rounds without repeating any rows.  `tabsearch` finds every such touch
//! (within some range of lengths) by a depth-first search over lead heads.  Every lead head is
//! reduced to a dense index in a [`MultTab`], so moving to a new lead or checking its truth
//! against the rest of the touch is just a few array lookups.
//!
//! Touches which are rotations of each other are only searched once; the search then emits every
//! distinct rotation, unless [`SearchFlags::ignore_rotations`] is set.  Multi-part touches are
//! found by quotienting the table by the group of part ends, so that each part is searched only
//! once.
//!
//! # Example
//! ```
//! use changeframe::{Change, Group, Method, Stage, Touch};
//! use tabsearch::{touch_search, LengthRange, SearchFlags, TableSearch};
//!
//! let plain_bob = Method::from_place_notation("Plain Bob".to_owned(), Stage::MINOR, "x16x16x16,12")?;
//! let bob = Change::parse("14", Stage::MINOR)?;
//! let search = TableSearch::new(
//!     plain_bob,
//!     vec![bob],
//!     Group::trivial(Stage::MINOR),
//!     LengthRange::exactly(5),
//!     SearchFlags::default(),
//! )?;
//!
//! let mut touches = Vec::<Touch>::new();
//! let outcome = touch_search(&search, &mut touches);
//! // Only the plain course is 5 leads long
//! assert_eq!(outcome.touches, 1);
//! assert_eq!(touches[0].len(), 60);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links, rustdoc::private_intra_doc_links)]

mod error;
pub mod multtab;
mod parameters;
mod search;

pub use error::{Error, Result};
pub use multtab::MultTab;
pub use parameters::{LengthRange, SearchFlags};
pub use search::{
    touch_search, touch_search_until, CallIdx, CallVec, Outcome, Progress, ResultSink,
    TableSearch,
};
