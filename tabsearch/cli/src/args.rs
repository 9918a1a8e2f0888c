use std::path::PathBuf;

use log::LevelFilter;
use structopt::StructOpt;

use crate::DebugOption;

/// A struct storing the CLI args taken by `tabsearch`.  `StructOpt` will generate the argument
/// parsing/help code for us.
#[derive(Debug, Clone, StructOpt)]
#[structopt(name = "tabsearch", about = "Exhaustive touch search for a single method")]
pub struct CliArgs {
    /// The name of the search file (`*.toml`)
    #[structopt(parse(from_os_str))]
    pub input_file: PathBuf,

    #[structopt(flatten)]
    pub options: Options,

    /// Makes `tabsearch` print more output (`-vv` will produce all output).
    #[structopt(short, long = "verbose", parse(from_occurrences))]
    pub verbosity: usize,
    /// Makes `tabsearch` print less output (`-qq` will only produce errors).
    #[structopt(short, long = "quiet", parse(from_occurrences))]
    pub quietness: usize,
}

// Parameters passed directly into `tabsearch_cli::run`.  This isn't a doc-comment because doc
// comments override `#[structopt(about = "...")]`.
#[derive(Default, Debug, Clone, StructOpt)]
pub struct Options {
    /// The maximum number of nodes that the search will visit before giving up.  Accepts
    /// suffixes like `10M`.  Overrides `node_limit` in the search file.
    #[structopt(long, parse(try_from_str = parse_big_int))]
    pub node_limit: Option<usize>,

    /// Debug options.  `toml`, `group`, `falseness` and `table` print the corresponding data
    /// structures.  `no-search` will run as normal but stop just before starting the search.
    #[structopt(short = "D", long = "debug")]
    pub debug_option: Option<DebugOption>,
}

impl CliArgs {
    /// Parse the `-q`/`-v` args into the [`LevelFilter`] to give to the `log` library
    pub fn log_level(&self) -> LevelFilter {
        match self.verbosity as isize - self.quietness as isize {
            x if x < -2 => LevelFilter::Off, // -qqq (or more `q`s)
            -2 => LevelFilter::Error,        // -qq
            -1 => LevelFilter::Warn,         // -q
            0 => LevelFilter::Info,          // <none of -q or -v>
            1 => LevelFilter::Debug,         // -v
            _ => LevelFilter::Trace,         // -vv (or more `v`s)
        }
    }
}

/// Parse a big integer like '100' or '140M'
fn parse_big_int(s: &str) -> anyhow::Result<usize> {
    let (last_char_idx, last_char) = s
        .char_indices()
        .last()
        .ok_or_else(|| anyhow::Error::msg("Expected a number"))?;
    let mut number_string = &s[..last_char_idx];
    let mut multiplier = 1usize;
    match last_char {
        'k' | 'K' => multiplier = 1_000,
        'm' | 'M' => multiplier = 1_000_000,
        'g' | 'G' => multiplier = 1_000_000_000,
        't' | 'T' => multiplier = 1_000_000_000_000,
        '0'..='9' => number_string = s, // Part of the number
        _ => {
            return Err(anyhow::Error::msg(
                "Expected number with a multiplier from [KMGT]",
            ));
        }
    }
    Ok(number_string.parse::<usize>()? * multiplier)
}
