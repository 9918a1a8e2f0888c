use std::{fmt::Write, path::Path};

use anyhow::Context;
use changeframe::{Change, Group, Method, PnBlockParseError, RowBuf, Stage};
use colored::Colorize;
use itertools::Itertools;
use serde::Deserialize;
use tabsearch::{LengthRange, SearchFlags, TableSearch};

use self::length::Length;

/// A touch search, as read from a TOML file.  The [`TomlFile`] type is parsed directly from the
/// `TOML`, and can be thought of as an AST representation of the TOML file.  Like ASTs, this
/// specifies a superset of valid searches, so building a [`TableSearch`] can also fail.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlFile {
    /* GENERAL */
    /// The range of lengths of touch which are allowed.  Measured in leads, unless
    /// `length_in_changes` is set
    length: Length,
    /// If `true`, `length` is measured in changes rather than leads
    #[serde(default)]
    length_in_changes: bool,
    /// Stop the search after this many touches have been generated
    num_touches: Option<usize>,
    /// Stop the search after visiting this many nodes.  Overridden by `--node-limit`
    node_limit: Option<usize>,

    /* METHOD & CALLS */
    /// The method who's touches we are after
    method: TomlMethod,
    /// Which calls can replace the method's lead end
    #[serde(default)]
    calls: Vec<TomlCall>,
    /// How plain leads are displayed in callings
    #[serde(default = "default_plain_symbol")]
    plain_symbol: String,

    /* PARTS */
    /// Rows which generate the group of part ends.  Empty for single-part touches
    #[serde(default)]
    part_ends: Vec<String>,
    /// Accept any part end, even if it doesn't generate all of the `part_ends`
    #[serde(default)]
    mutually_true_parts: bool,
    /// Accept any part end other than rounds
    #[serde(default)]
    non_round_blocks: bool,

    /* ROTATIONS */
    /// Only generate each touch once, rather than once per distinct rotation
    #[serde(default)]
    ignore_rotations: bool,
}

impl TomlFile {
    /// Load and parse a `TomlFile` structure from a TOML file
    pub fn new(toml_path: &Path) -> anyhow::Result<Self> {
        let toml_buf = crate::utils::read_file_to_string(toml_path)?;
        crate::utils::parse_toml(&toml_buf)
    }

    /// The [`Method`] being searched
    pub fn method(&self) -> anyhow::Result<Method> {
        let m = &self.method;
        Method::from_place_notation(m.name.clone(), m.stage, &m.place_notation)
            .map_err(|e| anyhow::Error::msg(pn_parse_err_msg(&m.name, &m.place_notation, e)))
    }

    /// The lead end [`Change`] of every call, in the order given in the file
    pub fn calls(&self) -> anyhow::Result<Vec<Change>> {
        let stage = self.method.stage;
        self.calls
            .iter()
            .map(|c| {
                Change::parse(&c.place_notation, stage).with_context(|| {
                    format!(
                        "Can't parse place notation {:?} for call {:?}",
                        c.place_notation, c.symbol
                    )
                })
            })
            .collect()
    }

    /// The group generated by the `part_ends`
    pub fn part_ends(&self) -> anyhow::Result<Group> {
        let stage = self.method.stage;
        let generators = self
            .part_ends
            .iter()
            .map(|s| parse_row("part end", s, stage))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Group::from_generators(stage, generators)?)
    }

    pub fn flags(&self) -> SearchFlags {
        SearchFlags {
            ignore_rotations: self.ignore_rotations,
            mutually_true_parts: self.mutually_true_parts,
            length_in_changes: self.length_in_changes,
            non_round_blocks: self.non_round_blocks,
        }
    }

    /// Build the [`TableSearch`] described by this `TomlFile`
    pub fn to_search(&self) -> anyhow::Result<TableSearch> {
        log::debug!("Building search");
        let search = TableSearch::new(
            self.method()?,
            self.calls()?,
            self.part_ends()?,
            self.length.range,
            self.flags(),
        )?;
        Ok(search)
    }

    /// The symbol used for each lead in a calling, starting with the plain lead
    pub fn call_symbols(&self) -> Vec<String> {
        std::iter::once(self.plain_symbol.clone())
            .chain(self.calls.iter().map(|c| c.symbol.clone()))
            .collect_vec()
    }

    pub fn num_touches(&self) -> Option<usize> {
        self.num_touches
    }

    pub fn node_limit(&self) -> Option<usize> {
        self.node_limit
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlMethod {
    name: String,
    place_notation: String,
    stage: Stage,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlCall {
    symbol: String,
    place_notation: String,
}

fn parse_row(name: &str, s: &str, stage: Stage) -> anyhow::Result<RowBuf> {
    RowBuf::parse_with_stage(s, stage)
        .with_context(|| format!("Can't parse {} {:?}", name, s))
}

mod length {
    use std::fmt;

    use serde::{
        de::{Error, MapAccess, Visitor},
        Deserialize, Deserializer,
    };
    use tabsearch::LengthRange;

    /// A new-typed range with human-friendly deserialisation
    #[derive(Debug, Clone)]
    #[repr(transparent)]
    pub(super) struct Length {
        pub(super) range: LengthRange,
    }

    /////////////
    // PARSING //
    /////////////

    struct LengthVisitor;

    impl<'de> Visitor<'de> for LengthVisitor {
        type Value = Length;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a positive integer or a 'min/max' range")
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            if v >= 0 {
                self.visit_u64(v as u64)
            } else {
                Err(E::custom(format!("negative length: {}", v)))
            }
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(Length {
                range: LengthRange::exactly(v as usize),
            })
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            #[derive(Deserialize)]
            #[serde(field_identifier, rename_all = "lowercase", deny_unknown_fields)]
            enum Fields {
                Min,
                Max,
            }

            // If we are deserialising a map, we expect the form `{ min: _, max: _ }`
            let mut min: Option<usize> = None;
            let mut max: Option<usize> = None;
            while let Some(key) = map.next_key()? {
                match key {
                    Fields::Min => {
                        if min.is_some() {
                            return Err(Error::duplicate_field("min"));
                        }
                        min = Some(map.next_value()?);
                    }
                    Fields::Max => {
                        if max.is_some() {
                            return Err(Error::duplicate_field("max"));
                        }
                        max = Some(map.next_value()?);
                    }
                }
            }
            let default = LengthRange::default();
            Ok(Length {
                range: LengthRange::new(min.unwrap_or(default.min), max.unwrap_or(default.max)),
            })
        }
    }

    impl<'de> Deserialize<'de> for Length {
        fn deserialize<D>(deserializer: D) -> Result<Length, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(LengthVisitor)
        }
    }
}

////////////////////
// ERROR MESSAGES //
////////////////////

/// Construct a human-friendly error message for a PN parse error, like:
/// ```text
/// Can't parse place notation for method "{name}":
///       {method place notation}
///             ^^^^ {error message}
/// ```
fn pn_parse_err_msg(name: &str, pn_str: &str, error: PnBlockParseError) -> String {
    let (region, message) = match error {
        PnBlockParseError::EmptyBlock => {
            return format!(
                "Can't have empty place notation block for method {:?}",
                name
            );
        }
        PnBlockParseError::MarkerNotAtSectionStart(idx) => (
            idx..idx + 1,
            "`&` and `+` must only go at the start of a section (i.e. at the start or directly after a `,`)"
                .to_owned(),
        ),
        PnBlockParseError::PnError(range, err) => (range, err.to_string()),
    };

    let pn_before_error = &pn_str[..region.start];
    let pn_error = &pn_str[region.clone()];
    let pn_after_error = &pn_str[region.end..];
    // Given that we're labelling `region` with some `message`, construct the full string.
    let mut msg = format!("Can't parse place notation for method {:?}:\n", name);
    // Write the place notation string, with the offending 'region' bold.  Also use 5 spaces of
    // margin, plus one `"`
    let _ = writeln!(
        msg,
        "     \"{}{}{}\"",
        pn_before_error,
        pn_error.bright_red().bold(),
        pn_after_error
    );
    // Add the error message, with carets under the offending region
    let chars_before_error = pn_before_error.chars().count();
    let caret_string = "^"
        .repeat(pn_error.chars().count())
        .bright_red()
        .bold();
    msg.push_str(&" ".repeat(6 + chars_before_error)); // 6 extra for the margin
    let _ = write!(msg, "{} {}", caret_string, message.bright_red().bold());
    msg
}

/////////////
// HELPERS //
/////////////

fn default_plain_symbol() -> String {
    "p".to_owned()
}

#[cfg(test)]
mod tests {
    use tabsearch::LengthRange;

    use super::TomlFile;

    #[track_caller]
    fn parse(s: &str) -> TomlFile {
        crate::utils::parse_toml(s).unwrap()
    }

    const METHOD: &str = r#"
method = { name = "Plain Bob", place_notation = "x16x16x16,12", stage = 6 }
calls = [{ symbol = "b", place_notation = "14" }, { symbol = "s", place_notation = "1234" }]
"#;

    #[test]
    fn lengths() {
        let f = parse(&format!("length = 30\n{}", METHOD));
        assert_eq!(f.length.range, LengthRange::exactly(30));
        let f = parse(&format!("length = {{ min = 3, max = 12 }}\n{}", METHOD));
        assert_eq!(f.length.range, LengthRange::new(3, 12));
        let f = parse(&format!("length = {{ max = 12 }}\n{}", METHOD));
        assert_eq!(f.length.range, LengthRange::new(0, 12));
        assert!(crate::utils::parse_toml::<TomlFile>(&format!("length = -3\n{}", METHOD)).is_err());
    }

    #[test]
    fn unknown_fields() {
        let s = format!("length = 30\nbobs_only = true\n{}", METHOD);
        assert!(crate::utils::parse_toml::<TomlFile>(&s).is_err());
    }

    #[test]
    fn build_search() {
        let f = parse(&format!(
            "length = 5\npart_ends = [\"134256\"]\n{}",
            METHOD
        ));
        assert_eq!(f.call_symbols(), vec!["p", "b", "s"]);
        assert_eq!(f.calls().unwrap().len(), 2);
        assert_eq!(f.part_ends().unwrap().len(), 3);
        let search = f.to_search().unwrap();
        assert!(search.is_multipart());
        assert_eq!(search.num_calls(), 3);
    }

    #[test]
    fn bad_place_notation() {
        let f = parse(
            r#"
length = 5
method = { name = "Broken", place_notation = "x16x17,12", stage = 6 }
"#,
        );
        let err = f.method().unwrap_err().to_string();
        assert!(err.contains("Broken"));

        let f = parse(&format!(
            "length = 5\ncalls = [{{ symbol = \"b\", place_notation = \"19\" }}]\n{}",
            r#"method = { name = "Plain Bob", place_notation = "x16x16x16,12", stage = 6 }"#
        ));
        assert!(f.calls().is_err());
    }
}
