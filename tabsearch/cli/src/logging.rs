//! Code for printing the touches generated by a search, as a table which grows as the search
//! progresses.

use std::fmt::Write;

use colored::Colorize;
use itertools::Itertools;
use log::log_enabled;
use tabsearch::TableSearch;

use crate::FoundTouch;

/// How many touches are printed between repeats of the column headers
const TOUCHES_BETWEEN_HEADERS: usize = 50;

#[derive(Debug, Clone)]
pub struct TouchPrinter {
    /// The symbol printed for each lead end, indexed by [`tabsearch::CallIdx`]
    call_symbols: Vec<String>,
    /// Counter which records how many touches have been printed so far
    touches_printed: usize,

    /* COLUMN WIDTH INFORMATION */
    /// The width of the touch count column
    count_width: usize,
    /// The maximum width of a touch's length in changes
    length_width: usize,
    /// `true` if the number of parts should be displayed
    print_parts: bool,
}

impl TouchPrinter {
    pub fn new(search: &TableSearch, call_symbols: Vec<String>) -> Self {
        let max_part_len = search.max_part_len().min(search.table().len());
        let max_leads = search
            .lengths()
            .max
            .min(max_part_len * search.part_ends().len());
        let max_length = max_leads * search.method().lead_len();
        Self {
            call_symbols,
            touches_printed: 0,

            count_width: 5,
            length_width: max_length.to_string().len().max(3),
            print_parts: search.is_multipart(),
        }
    }

    /// Print a [`FoundTouch`] to stdout, along with column headers if needed.  Nothing is printed
    /// if the log level is below `Info`.
    pub fn print(&mut self, touch: &FoundTouch) {
        if log_enabled!(log::Level::Info) {
            println!("{}", self.touch_string_with_possible_headers(touch));
        }
        self.touches_printed += 1;
    }

    /// Create some lines which summarise the given [`FoundTouch`].  This may include additional
    /// lines for the column headers, depending on how many touches have been printed so far.
    pub fn touch_string_with_possible_headers(&self, touch: &FoundTouch) -> String {
        let mut s = String::new();
        if self.touches_printed % TOUCHES_BETWEEN_HEADERS == 0 {
            if self.touches_printed > 0 {
                s.push('\n');
            }
            s.push_str(&self.header().bold().to_string());
            s.push('\n');
            s.push_str(&self.ruleoff());
            s.push('\n');
        }
        s.push_str(&self.touch_string(touch));
        s
    }

    fn ruleoff(&self) -> String {
        // Ruleoff is the same as header, but with every non-'|' char replaced with '-'
        self.header()
            .chars()
            .map(|c| if c == '|' { '|' } else { '-' })
            .collect::<String>()
            + "---"
    }

    fn header(&self) -> String {
        let mut s = String::new();
        write_centered_text(&mut s, "#", self.count_width);
        s.push_str(" | ");
        write_centered_text(&mut s, "len", self.length_width);
        s.push_str(" | ");
        if self.print_parts {
            s.push_str("parts | ");
        }
        s.push_str("calling");
        s
    }

    fn touch_string(&self, touch: &FoundTouch) -> String {
        let mut s = String::new();
        let _ = write!(
            s,
            "{:>cw$} | {:>lw$} | ",
            self.touches_printed + 1,
            touch.touch.len(),
            cw = self.count_width,
            lw = self.length_width
        );
        if self.print_parts {
            let _ = write!(s, "{:>5} | ", touch.num_parts);
        }
        s.push_str(&self.calling_string(touch));
        s
    }

    /// The calling of one part of a touch, with one symbol per lead
    fn calling_string(&self, touch: &FoundTouch) -> String {
        touch
            .part_calling()
            .iter()
            .map(|call| {
                let symbol = self.call_symbols[call.index()].as_str();
                if call.index() == 0 {
                    symbol.normal()
                } else {
                    symbol.bright_yellow()
                }
            })
            .join("")
    }
}

/// Write some `string` to `out`, centering it among `width` spaces (rounding to the right).
fn write_centered_text(out: &mut String, text: &str, width: usize) {
    let w = width.saturating_sub(text.len());
    out.push_str(&" ".repeat(w - (w / 2)));
    out.push_str(text);
    out.push_str(&" ".repeat(w / 2));
}
