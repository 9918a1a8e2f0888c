//! Crate for loading and running `tabsearch`'s input files.  The CLI itself is a very thin wrapper
//! around this, parsing CLI args and immediately calling into [`run`].  This crate is also used by
//! the demo tests, making sure that they run in exactly the same way as the CLI itself.

#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod args;
pub mod logging;
pub mod toml_file;
pub mod utils;

use std::{
    path::Path,
    str::FromStr,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use args::Options;
use changeframe::{FalsenessFlags, FalsenessTable, Touch};
use log::LevelFilter;
use logging::TouchPrinter;
use ringing_utils::BigNumInt;
use simple_logger::SimpleLogger;
use tabsearch::{touch_search_until, CallIdx, Outcome, Progress, TableSearch};
use toml_file::TomlFile;

/// How many nodes are visited between each progress update in the log
const NODES_BETWEEN_PROGRESS_UPDATES: usize = 1_000_000;

pub fn init_logging(log_level: LevelFilter) {
    let result = SimpleLogger::new()
        .without_timestamps()
        .with_colors(true)
        .with_level(log_level)
        .init();
    if let Err(e) = result {
        eprintln!("Can't initialise logging: {}", e);
    }
}

/// Load a search file, build the search it describes and run it.  Returns `None` if a
/// [`DebugOption`] stopped the run before the search started.  If `abort_flag` is given, setting
/// it will cleanly stop the search.
pub fn run(
    toml_path: &Path,
    options: &Options,
    abort_flag: Option<&AtomicBool>,
) -> anyhow::Result<Option<SearchResult>> {
    /// If the user specifies a [`DebugOption`] flag with e.g. `-D table`, then debug print the
    /// corresponding value and exit.
    macro_rules! debug_print {
        ($variant: ident, $val: expr) => {
            if options.debug_option == Some(DebugOption::$variant) {
                dbg!($val);
                return Ok(None);
            }
        };
    }

    let start_time = Instant::now();

    // Parse the TOML file
    let toml_file = TomlFile::new(toml_path)?;
    debug_print!(Toml, toml_file);

    // Build the search
    debug_print!(Group, toml_file.part_ends()?);
    let search = toml_file.to_search()?;
    debug_print!(
        Falseness,
        FalsenessTable::from_method(
            search.method(),
            FalsenessFlags {
                no_fixed_treble: !search.is_treble_fixed(),
                ..Default::default()
            },
        )
    );
    log::info!(
        "Searching {} with {} calls over {} lead heads",
        search.method().name(),
        search.num_calls() - 1,
        BigNumInt(search.table().len())
    );
    debug_print!(Table, search.table());
    if options.debug_option == Some(DebugOption::StopBeforeSearch) {
        return Ok(None);
    }
    if search.is_impossible() {
        log::warn!("No touches are possible with these parameters");
    }

    // Run the search, printing touches as they're generated
    let node_limit = options.node_limit.or(toml_file.node_limit());
    let num_touches = toml_file.num_touches();
    let mut printer = TouchPrinter::new(&search, toml_file.call_symbols());
    let mut touches = Vec::new();
    let mut sink = |touch: &Touch| {
        let found = FoundTouch::new(&search, touch.clone());
        printer.print(&found);
        touches.push(found);
        num_touches.is_some_and(|n| touches.len() >= n)
    };
    let until = |progress: &Progress| {
        if progress.nodes % NODES_BETWEEN_PROGRESS_UPDATES == 0 {
            log::debug!(
                "{} nodes, {} touches, depth {}",
                BigNumInt(progress.nodes),
                BigNumInt(progress.touches),
                progress.depth
            );
        }
        let aborted = abort_flag.is_some_and(|f| f.load(Ordering::Relaxed));
        aborted || node_limit.is_some_and(|limit| progress.nodes >= limit)
    };
    let outcome = touch_search_until(&search, &mut sink, until);

    Ok(Some(SearchResult {
        touches,
        outcome,
        duration: start_time.elapsed(),
    }))
}

/// A [`Touch`] generated by a search, along with the calling used to generate it
#[derive(Debug, Clone)]
pub struct FoundTouch {
    pub touch: Touch,
    /// The call at the end of every lead of the touch
    pub calling: Vec<CallIdx>,
    /// How many times `calling` repeats to make the full touch
    pub num_parts: usize,
}

impl FoundTouch {
    fn new(search: &TableSearch, touch: Touch) -> Self {
        // Multi-part touches are generated as `n` repeats of a single part
        let num_parts = match &touch {
            Touch::Seq(children) if search.is_multipart() && children.len() == 1 => {
                match &children[0] {
                    (n, Touch::Seq(_)) => *n,
                    _ => 1,
                }
            }
            _ => 1,
        };
        let calling = search.calling(&touch).unwrap_or_default();
        Self {
            touch,
            calling,
            num_parts,
        }
    }

    /// The calls which make up a single part of this touch
    pub fn part_calling(&self) -> &[CallIdx] {
        &self.calling[..self.calling.len() / self.num_parts]
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub touches: Vec<FoundTouch>,
    pub outcome: Outcome,
    pub duration: Duration,
}

impl SearchResult {
    pub fn print(&self) {
        let status = if self.outcome.impossible {
            " (impossible)"
        } else if self.outcome.halted {
            " (halted)"
        } else {
            ""
        };
        println!(
            "Search completed in {:.2?}{}: {} touches from {} nodes",
            self.duration,
            status,
            BigNumInt(self.touches.len()),
            BigNumInt(self.outcome.nodes),
        );
    }
}

/// What item should be debug printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugOption {
    Toml,
    Group,
    Falseness,
    Table,
    /// Stop just before the search starts, to let the user see what's been printed out without
    /// scrolling
    StopBeforeSearch,
}

impl FromStr for DebugOption {
    type Err = String;

    fn from_str(v: &str) -> Result<Self, String> {
        Ok(match v.to_lowercase().as_str() {
            "toml" => Self::Toml,
            "group" => Self::Group,
            "falseness" => Self::Falseness,
            "table" => Self::Table,
            "no-search" => Self::StopBeforeSearch,
            _ => {
                return Err(format!(
                    "Unknown value {:?}. Expected `toml`, `group`, `falseness`, `table` or `no-search`.",
                    v
                ))
            }
        })
    }
}
