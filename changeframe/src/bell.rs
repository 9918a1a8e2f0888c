//! A type-safe representation of a bell, and the global table of symbols used to display them.

use std::{
    borrow::Cow,
    fmt::{Debug, Display, Formatter},
    sync::{RwLock, RwLockReadGuard},
};

#[cfg(feature = "serde")]
use serde_crate::{
    de::{Error, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::Stage;

/// The default symbols for the bells, in order.
// Letters missing from the alphabet sequence
// - E, T stand for 11 and 12
// - I could be confused with 1
// - O could be confused with 0 and Q
// - X is not a valid bell name to avoid confusion with 'x' as place notation
const DEFAULT_SYMBOLS: &[char] = &[
    '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'E', 'T', 'A', 'B', 'C', 'D', 'F', 'G', 'H',
    'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'U', 'V', 'W', 'Y', 'Z',
];

/// Characters which have a meaning in place notation, and so can't be used as bell symbols
const RESERVED_CHARS: &[char] = &['x', 'X', '-', '&', '+', ',', '.', '<', '>'];

/// The symbol table currently used to name [`Bell`]s.  Swapped with [`Bell::set_symbols`].
static SYMBOLS: RwLock<Cow<'static, [char]>> = RwLock::new(Cow::Borrowed(DEFAULT_SYMBOLS));

fn symbols() -> RwLockReadGuard<'static, Cow<'static, [char]>> {
    // The table is only ever replaced wholesale, so a poisoned lock still holds a valid table
    SYMBOLS.read().unwrap_or_else(|e| e.into_inner())
}

/// The largest number of [`Bell`]s which can be represented
pub const MAX_BELLS: usize = 255;

/// A type-safe representation of a 'bell', which adds things like conversions to and from
/// commonly-used bell names.  Each `Bell` takes a single byte in memory.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Bell {
    /// A zero-indexed number representing the `Bell`.  I.e the treble is always
    /// `Bell { index: 0 }`, and the 12th is `Bell { index: 11 }` but would be
    /// [`Display`](std::fmt::Display)ed as `T`.
    index: u8,
}

impl Bell {
    /// Creates a `Bell` from a [`char`] containing a bell name (e.g. `'4'` or `'T'`).  If the name
    /// is not in the current symbol table, then this fails and returns [`None`].
    ///
    /// # Example
    /// ```
    /// use changeframe::Bell;
    ///
    /// assert_eq!(Bell::from_name('1'), Some(Bell::TREBLE));
    /// assert_eq!(Bell::from_name('T'), Some(Bell::from_index(11)));
    /// // Lower case letters aren't bell names
    /// assert_eq!(Bell::from_name('t'), None);
    /// assert_eq!(Bell::from_name('\r'), None);
    /// ```
    pub fn from_name(c: char) -> Option<Bell> {
        symbols()
            .iter()
            .position(|&x| x == c)
            .filter(|&idx| idx < MAX_BELLS)
            .map(|idx| Bell::from_index(idx as u8))
    }

    /// Creates a `Bell` from a 0-indexed integer.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not smaller than [`MAX_BELLS`] (a `Bell` with index 255 would imply a
    /// [`Stage`] of 256, which cannot be created).
    #[inline]
    #[track_caller]
    pub fn from_index(index: u8) -> Bell {
        assert!(
            (index as usize) < MAX_BELLS,
            "`Bell`s with index {} can't be created.",
            index
        );
        Bell { index }
    }

    /// Creates a `Bell` from a 1-indexed integer, returning `None` for `0`.
    ///
    /// # Example
    /// ```
    /// use changeframe::Bell;
    ///
    /// assert_eq!(Bell::from_number(12).map(|b| b.name()), Some("T".to_owned()));
    /// assert_eq!(Bell::from_number(0), None);
    /// ```
    pub fn from_number(number: u8) -> Option<Bell> {
        number.checked_sub(1).map(Bell::from_index)
    }

    /// Creates the `Bell` representing the tenor or heaviest bell on a given [`Stage`].
    pub fn tenor(stage: Stage) -> Bell {
        Self::from_index(stage.num_bells_u8() - 1)
    }

    /// A [`Bell`] representing the 'treble' on any stage.
    pub const TREBLE: Bell = Bell { index: 0 };

    /// Converts this `Bell` into the [`char`] that it should be displayed as.  If the `Bell` is
    /// too big to have a symbol in the current table, then [`None`] is returned.
    pub fn to_char(self) -> Option<char> {
        symbols().get(self.index()).copied()
    }

    /// Returns the 0-indexed representation of this `Bell`.
    #[inline]
    pub fn index(self) -> usize {
        self.index as usize
    }

    /// Returns the 0-indexed representation of this `Bell`, as a [`u8`].
    #[inline]
    pub fn index_u8(self) -> u8 {
        self.index
    }

    /// Returns the 1-indexed representation of this `Bell`.
    #[inline]
    pub fn number(self) -> u8 {
        self.index + 1 // Can't overflow because `index < MAX_BELLS`
    }

    /// Converts this `Bell` into a [`String`] that it should be displayed as.  Unlike
    /// [`to_char`](Bell::to_char), this does not fail if the `Bell` is to big to have a name.
    /// Instead, it returns the 1-indexed ['number'](Bell::number) of the `Bell` in angle brackets.
    ///
    /// # Example
    /// ```
    /// use changeframe::Bell;
    ///
    /// assert_eq!(Bell::from_index(9).name(), "0");
    /// assert_eq!(Bell::from_index(15).name(), "D");
    /// assert_eq!(Bell::from_index(99).name(), "<100>");
    /// ```
    pub fn name(self) -> String {
        match self.to_char() {
            None => format!("<{}>", self.number()),
            Some(c) => c.to_string(),
        }
    }

    /////////////////////
    // SYMBOL HANDLING //
    /////////////////////

    /// Replaces the global table of bell symbols.  The `n`th char of `symbols` becomes the name
    /// of the `n`th bell.  This affects every subsequent parse and display of [`Bell`]s, rows and
    /// place notation in the whole process.
    pub fn set_symbols(symbols: &str) -> Result<(), SymbolTableError> {
        let new_symbols: Vec<char> = symbols.chars().collect();
        if new_symbols.is_empty() {
            return Err(SymbolTableError::Empty);
        }
        for (i, &c) in new_symbols.iter().enumerate() {
            if c.is_whitespace() || RESERVED_CHARS.contains(&c) {
                return Err(SymbolTableError::ReservedChar(c));
            }
            if new_symbols[..i].contains(&c) {
                return Err(SymbolTableError::DuplicateSymbol(c));
            }
        }
        *SYMBOLS.write().unwrap_or_else(|e| e.into_inner()) = Cow::Owned(new_symbols);
        Ok(())
    }

    /// Restores the default bell symbols (`1234567890ET...`).
    pub fn reset_symbols() {
        *SYMBOLS.write().unwrap_or_else(|e| e.into_inner()) = Cow::Borrowed(DEFAULT_SYMBOLS);
    }
}

impl Debug for Bell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bell({})", self)
    }
}

impl Display for Bell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_char() {
            Some(c) => write!(f, "{}", c),
            None => write!(f, "<{}>", self.number()),
        }
    }
}

/// The ways that [`Bell::set_symbols`] can reject a symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolTableError {
    Empty,
    DuplicateSymbol(char),
    ReservedChar(char),
}

impl Display for SymbolTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SymbolTableError::Empty => write!(f, "Bell symbol table can't be empty"),
            SymbolTableError::DuplicateSymbol(c) => {
                write!(f, "Symbol {:?} is used for more than one bell", c)
            }
            SymbolTableError::ReservedChar(c) => {
                write!(f, "{:?} has a meaning in place notation", c)
            }
        }
    }
}

impl std::error::Error for SymbolTableError {}

///////////
// SERDE //
///////////

#[cfg(feature = "serde")]
struct BellVisitor;

#[cfg(feature = "serde")]
impl<'de> Visitor<'de> for BellVisitor {
    type Value = Bell;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a positive integer, or a bell name")
    }

    fn visit_u64<E>(self, val: u64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        match val {
            1..=255 => Ok(Bell::from_index(val as u8 - 1)),
            _ => Err(E::custom(format!("invalid Bell number: {}", val))),
        }
    }

    fn visit_i64<E>(self, val: i64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let val = u64::try_from(val).map_err(|_| E::custom("negative Bell number"))?;
        self.visit_u64(val)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        let mut chars = v.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                Bell::from_name(c).ok_or_else(|| E::custom(format!("'{}' is not a bell name", v)))
            }
            _ => Err(E::custom(format!("'{}' is not a bell name", v))),
        }
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Bell {
    fn deserialize<D>(deserializer: D) -> Result<Bell, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BellVisitor)
    }
}

// Serialise as a 1-indexed number
#[cfg(feature = "serde")]
impl Serialize for Bell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(self.number() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::{Bell, SymbolTableError, DEFAULT_SYMBOLS};

    #[test]
    #[should_panic]
    fn from_index_panic() {
        Bell::from_index(255);
    }

    #[test]
    fn names_round_trip() {
        for (i, &c) in DEFAULT_SYMBOLS.iter().enumerate().take(12) {
            let bell = Bell::from_index(i as u8);
            assert_eq!(bell.to_char(), Some(c));
            assert_eq!(Bell::from_name(c), Some(bell));
        }
    }

    #[test]
    fn bad_symbol_tables() {
        #[track_caller]
        fn check(symbols: &str, exp_err: SymbolTableError) {
            assert_eq!(Bell::set_symbols(symbols), Err(exp_err));
        }

        check("", SymbolTableError::Empty);
        check("12341", SymbolTableError::DuplicateSymbol('1'));
        check("123x", SymbolTableError::ReservedChar('x'));
        check("12 3", SymbolTableError::ReservedChar(' '));
        check("1-2", SymbolTableError::ReservedChar('-'));
    }

    #[test]
    fn swap_symbols() {
        // Only the names of bells above the 12th change, so other tests running at the same time
        // still see the symbols they expect
        Bell::set_symbols("1234567890ETabcd").unwrap();
        assert_eq!(Bell::from_index(12).name(), "a");
        assert_eq!(Bell::from_name('d'), Some(Bell::from_index(15)));
        assert_eq!(Bell::from_index(16).name(), "<17>");
        Bell::reset_symbols();
        assert_eq!(Bell::from_index(12).name(), "A");
        assert_eq!(Bell::from_name('d'), None);
    }
}
