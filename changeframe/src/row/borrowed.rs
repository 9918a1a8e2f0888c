use std::{
    fmt::{Debug, Display, Formatter},
    ops::{Div, Index, Mul, MulAssign, Not},
};

use gcd::Gcd;

use crate::{Bell, Parity, RowBuf, Stage};

pub type BellIter<'a> = std::iter::Cloned<std::slice::Iter<'a, Bell>>;

/// A borrowed permutation of the [`Bell`]s of some [`Stage`], as a [`str`] is a borrowed
/// [`String`].  Row `r` maps place `i` to the bell `r[i]`, and multiplication composes these maps
/// so that `(a * b)[i] == a[b[i]]`.
///
/// Every `Row` contains each [`Bell`] of its [`Stage`] exactly once.  This is checked when rows
/// are created, and then relied on (including by `unsafe` code) everywhere else.
///
/// ```
/// use changeframe::{RowBuf, Stage};
///
/// let queens = RowBuf::parse("13579 | 24680")?;
/// assert_eq!(queens.stage(), Stage::ROYAL);
/// assert_eq!(queens.to_string(), "1357924680");
/// assert_eq!(&queens * &queens.inv(), RowBuf::rounds(Stage::ROYAL));
/// # Ok::<(), changeframe::InvalidRowError>(())
/// ```
#[derive(Eq, PartialEq, PartialOrd, Ord, Hash)]
#[repr(transparent)] // Required so we can safely cast between &[Bell] and &Row
pub struct Row {
    bell_slice: [Bell],
}

impl Row {
    /// Returns the [`Stage`] of this `Row`.
    #[inline]
    pub fn stage(&self) -> Stage {
        Stage::new(self.bell_slice.len() as u8)
    }

    /// Returns an iterator over the [`Bell`]s in this `Row`.
    #[inline]
    pub fn bell_iter(&self) -> BellIter {
        self.bell_slice.iter().cloned()
    }

    /// Equivalent to `self == RowBuf::rounds(self.stage())`, without allocating.
    pub fn is_rounds(&self) -> bool {
        self.bell_iter().enumerate().all(|(i, b)| b.index() == i)
    }

    /// Swaps the bells in two places.  This keeps `self` a valid `Row`.
    #[inline]
    pub fn swap(&mut self, a: usize, b: usize) {
        self.bell_slice.swap(a, b);
    }

    /// Returns `true` if the given [`Bell`] is in its home position in this `Row`.
    pub fn is_fixed(&self, bell: Bell) -> bool {
        self.bell_slice.get(bell.index()) == Some(&bell)
    }

    /// The [`Bell`]s which are in their home places, trebles first.
    pub fn fixed_bells(&self) -> impl Iterator<Item = Bell> + '_ {
        self.bell_slice
            .iter()
            .enumerate()
            .filter(|&(idx, bell)| idx == bell.index())
            .map(|(_idx, bell)| *bell)
    }

    /* PERMUTATION ARITHMETIC */

    /// The [`Bell`] at a given place, treating `self` as though it were extended with cover bells
    /// up to any [`Stage`].
    #[inline]
    fn extended_bell(&self, place: usize) -> Bell {
        match self.bell_slice.get(place) {
            Some(&b) => b,
            None => Bell::from_index(place as u8),
        }
    }

    /// Multiply two `Row`s (i.e. use the RHS to permute the LHS), storing the result in an
    /// existing [`RowBuf`] to reuse its allocation.  If the [`Stage`]s differ, the shorter `Row`
    /// is treated as though it were extended with fixed cover bells, so the result has the larger
    /// of the two [`Stage`]s.
    pub fn mul_into(&self, rhs: &Row, out: &mut RowBuf) {
        let num_bells = self.bell_slice.len().max(rhs.bell_slice.len());
        out.bell_vec.clear();
        out.bell_vec
            .extend((0..num_bells).map(|i| self.extended_bell(rhs.extended_bell(i).index())));
    }

    /// The `Row` which undoes `self`, so that `self * self.inv()` is rounds.  Also available as
    /// the `!` operator.
    ///
    /// ```
    /// use changeframe::{RowBuf, Stage};
    ///
    /// // Queens and Tittums undo each other
    /// assert_eq!(RowBuf::parse("135246")?.inv(), RowBuf::parse("142536")?);
    /// assert_eq!(RowBuf::backrounds(Stage::MAJOR).inv(), RowBuf::backrounds(Stage::MAJOR));
    /// # Ok::<(), changeframe::InvalidRowError>(())
    /// ```
    pub fn inv(&self) -> RowBuf {
        let mut inv_bells = vec![Bell::TREBLE; self.stage().num_bells()];
        for (i, b) in self.bell_slice.iter().enumerate() {
            inv_bells[b.index()] = Bell::from_index(i as u8);
        }
        // SAFETY: the inverse of a permutation is a permutation of the same bells
        unsafe { RowBuf::from_vec_unchecked(inv_bells) }
    }

    /// Raises `self` to some positive `exponent`, by repeated squaring.
    pub fn pow(&self, mut exponent: usize) -> RowBuf {
        let mut result = RowBuf::rounds(self.stage());
        let mut square = self.to_owned();
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = &result * &square;
            }
            square = &square * &square;
            exponent >>= 1;
        }
        result
    }

    /// Returns `true` if `self * other == other * self`.
    pub fn commutes_with(&self, other: &Row) -> bool {
        self * other == other * self
    }

    /* CYCLES */

    /// The disjoint cycles of this `Row`, each one a list of places.  Cycles are listed in order
    /// of their smallest place, and each cycle starts from that place and follows `i -> row[i]`.
    /// Fixed places appear as cycles of length 1.
    pub fn cycle_places(&self) -> Vec<Vec<usize>> {
        let mut visited = vec![false; self.bell_slice.len()];
        let mut cycles = Vec::new();
        for start in 0..self.bell_slice.len() {
            if visited[start] {
                continue;
            }
            let mut cycle = Vec::new();
            let mut place = start;
            while !visited[place] {
                visited[place] = true;
                cycle.push(place);
                place = self.bell_slice[place].index();
            }
            cycles.push(cycle);
        }
        cycles
    }

    /// The disjoint cycles of this `Row`, formatted as a string of bracketed groups (e.g.
    /// `"(123)(45)"`).  See [`Row::cycle_places`] for the order of the cycles.
    ///
    /// # Example
    /// ```
    /// use changeframe::RowBuf;
    ///
    /// assert_eq!(RowBuf::parse("23154")?.cycles(), "(123)(45)");
    /// assert_eq!(RowBuf::parse("1342")?.cycles(), "(1)(234)");
    /// assert_eq!(RowBuf::parse("4321")?.cycles(), "(14)(23)");
    /// # Ok::<(), changeframe::InvalidRowError>(())
    /// ```
    pub fn cycles(&self) -> String {
        let mut s = String::new();
        for cycle in self.cycle_places() {
            s.push('(');
            for place in cycle {
                s.push_str(&Bell::from_index(place as u8).name());
            }
            s.push(')');
        }
        s
    }

    /// Gets the smallest non-zero number `n` such that `self.pow(n).is_rounds()`.  This is the
    /// lowest common multiple of the lengths of the `Row`'s cycles.
    pub fn order(&self) -> usize {
        self.cycle_places()
            .iter()
            .map(Vec::len)
            .fold(1, |acc, len| acc / acc.gcd(len) * len)
    }

    /// Returns the [`Parity`] of this [`Row`].  A cycle of length `n` is made of `n - 1`
    /// transpositions, so the parity is that of `stage - number of cycles`.
    ///
    /// # Example
    /// ```
    /// use changeframe::{Parity, RowBuf};
    ///
    /// assert_eq!(RowBuf::parse("12345")?.sign(), Parity::Even);
    /// assert_eq!(RowBuf::parse("21345")?.sign(), Parity::Odd);
    /// assert_eq!(RowBuf::parse("23145")?.sign(), Parity::Even);
    /// # Ok::<(), changeframe::InvalidRowError>(())
    /// ```
    pub fn sign(&self) -> Parity {
        let num_cycles = self.cycle_places().len();
        Parity::from_number(self.bell_slice.len() - num_cycles)
    }

    /// Creates a `&Row` from a `&[Bell]`, **without** checking that that slice forms a valid
    /// [`Row`].
    ///
    /// # Safety
    ///
    /// This is safe if the [`Bell`]s in `slice` form a valid [`Row`].
    #[inline]
    pub unsafe fn from_slice_unchecked(slice: &[Bell]) -> &Row {
        // SAFETY: `Row` is `#[repr(transparent)]` over `[Bell]`, and the lifetime is unchanged
        &*(slice as *const [Bell] as *const Row)
    }

    /// Creates a `&mut Row` from a `&mut [Bell]`, **without** checking that the slice forms a
    /// valid [`Row`].
    ///
    /// # Safety
    ///
    /// This is safe if the [`Bell`]s in `slice` form a valid [`Row`].
    #[inline]
    pub unsafe fn from_mut_slice_unchecked(slice: &mut [Bell]) -> &mut Row {
        &mut *(slice as *mut [Bell] as *mut Row)
    }
}

impl Index<usize> for Row {
    type Output = Bell;

    /// `row[n]` gets the `n`th bell in `row` (0-indexed).
    ///
    /// # Panics
    ///
    /// Panics if `n >= row.stage().num_bells()`
    fn index(&self, index: usize) -> &Bell {
        &self.bell_slice[index]
    }
}

impl Not for &Row {
    type Output = RowBuf;

    /// Find the inverse of a [`Row`].
    fn not(self) -> Self::Output {
        self.inv()
    }
}

impl Not for &RowBuf {
    type Output = RowBuf;

    fn not(self) -> Self::Output {
        self.inv()
    }
}

impl Not for RowBuf {
    type Output = RowBuf;

    fn not(self) -> Self::Output {
        self.inv()
    }
}

impl Mul for &Row {
    type Output = RowBuf;

    /// Uses the RHS to permute the LHS without consuming either argument.  `Row`s of different
    /// [`Stage`]s are multiplied as though the shorter one were extended with cover bells.
    ///
    /// # Example
    /// ```
    /// use changeframe::RowBuf;
    ///
    /// assert_eq!(
    ///     &RowBuf::parse("13425678")? * &RowBuf::parse("43217568")?,
    ///     RowBuf::parse("24317568")?
    /// );
    /// // Mixed stages are extended
    /// assert_eq!(
    ///     &RowBuf::parse("13425678")? * &RowBuf::parse("4321")?,
    ///     RowBuf::parse("24315678")?
    /// );
    /// # Ok::<(), changeframe::InvalidRowError>(())
    /// ```
    #[inline]
    fn mul(self, rhs: &Row) -> Self::Output {
        let mut out = RowBuf::rounds(Stage::ONE);
        self.mul_into(rhs, &mut out);
        out
    }
}

impl Div for &Row {
    type Output = RowBuf;

    /// `a / b` is `a * b.inv()`: the `Row` which must be applied after `b` to reach `a`.
    #[inline]
    fn div(self, rhs: &Row) -> Self::Output {
        self * &rhs.inv()
    }
}

macro_rules! op_impl {
    ($lhs: ty, $rhs: ty) => {
        impl Mul<$rhs> for $lhs {
            type Output = RowBuf;

            /// Uses the RHS to permute the LHS without consuming either argument.
            #[inline]
            fn mul(self, rhs: $rhs) -> Self::Output {
                let lhs: &Row = &self;
                let rhs: &Row = &rhs;
                lhs * rhs
            }
        }

        impl Div<$rhs> for $lhs {
            type Output = RowBuf;

            #[inline]
            fn div(self, rhs: $rhs) -> Self::Output {
                let lhs: &Row = &self;
                let rhs: &Row = &rhs;
                lhs / rhs
            }
        }
    };
}

// Add impl for every pair within `RowBuf`, `&RowBuf` and `&Row` (except `&Row * &Row`, which we've
// explicitly implemented)
op_impl!(RowBuf, RowBuf);
op_impl!(RowBuf, &RowBuf);
op_impl!(RowBuf, &Row);
op_impl!(&RowBuf, RowBuf);
op_impl!(&RowBuf, &RowBuf);
op_impl!(&RowBuf, &Row);
op_impl!(&Row, RowBuf);
op_impl!(&Row, &RowBuf);

impl MulAssign<&Row> for RowBuf {
    fn mul_assign(&mut self, rhs: &Row) {
        *self = &*self * rhs;
    }
}

impl MulAssign<&RowBuf> for RowBuf {
    fn mul_assign(&mut self, rhs: &RowBuf) {
        *self *= rhs.as_row();
    }
}

impl<'row> IntoIterator for &'row Row {
    type Item = Bell;
    type IntoIter = BellIter<'row>;

    fn into_iter(self) -> Self::IntoIter {
        self.bell_iter()
    }
}

////////////////
// FORMATTING //
////////////////

impl Debug for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Row({})", self)
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for b in self.bell_iter() {
            write!(f, "{}", b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use crate::{Bell, Parity, RowBuf, Stage};

    #[test]
    fn order() {
        #[track_caller]
        fn check(row: &str, exp_order: usize) {
            assert_eq!(RowBuf::parse(row).unwrap().order(), exp_order);
        }

        check("1", 1);
        check("1234", 1);
        check("123456789", 1);
        check("21", 2);
        check("2134", 2);
        check("2143", 2);
        check("23145", 3);
        check("23451", 5);
        check("23154", 6);
        check("231564", 3);
        check("1452367890", 2);
    }

    #[test]
    fn cycles() {
        #[track_caller]
        fn check(row: &str, exp_cycles: &str, exp_sign: Parity) {
            let row = RowBuf::parse(row).unwrap();
            assert_eq!(row.cycles(), exp_cycles);
            assert_eq!(row.sign(), exp_sign);
        }

        check("1", "(1)", Parity::Even);
        check("12345", "(1)(2)(3)(4)(5)", Parity::Even);
        check("21", "(12)", Parity::Odd);
        check("23154", "(123)(45)", Parity::Odd);
        check("15263748", "(1)(253)(467)(8)", Parity::Even);
        check("234561", "(123456)", Parity::Odd);
        check("2143658709", "(12)(34)(56)(78)(90)", Parity::Odd);
    }

    #[test]
    fn mixed_stage_mul() {
        #[track_caller]
        fn check(lhs: &str, rhs: &str, exp: &str) {
            let lhs = RowBuf::parse(lhs).unwrap();
            let rhs = RowBuf::parse(rhs).unwrap();
            assert_eq!((&lhs * &rhs).to_string(), exp);
        }

        check("21", "1324", "2314");
        check("1324", "21", "3124");
        check("4321", "123456", "432156");
        check("2314", "2314", "3124");
    }

    #[test]
    fn division() {
        let a = RowBuf::parse("15263748").unwrap();
        let b = RowBuf::parse("18234567").unwrap();
        let q = &a / &b;
        assert_eq!(q * &b, a);
        assert!((&a / &a).is_rounds());
    }

    #[test]
    fn fixed_bells() {
        let row = RowBuf::parse("13245768").unwrap();
        let fixed = row.fixed_bells().map(|b| b.to_string()).collect::<String>();
        assert_eq!(fixed, "1458");
        assert!(row.is_fixed(Bell::TREBLE));
        assert!(!row.is_fixed(Bell::from_name('2').unwrap()));
        // Bells beyond the stage are never fixed
        assert!(!row.is_fixed(Bell::from_name('9').unwrap()));
        assert!(row.commutes_with(&RowBuf::parse("12354678").unwrap()));
        assert!(!row.commutes_with(&RowBuf::parse("21345678").unwrap()));
    }

    #[test]
    fn pow() {
        let row = RowBuf::parse("23154").unwrap();
        assert_eq!(row.pow(0), RowBuf::rounds(Stage::DOUBLES));
        assert_eq!(row.pow(1), row);
        assert_eq!(row.pow(2), &row * &row);
        assert!(row.pow(6).is_rounds());
        assert!(!row.pow(3).is_rounds());
    }

    #[quickcheck]
    fn inverse_is_involution(row: RowBuf) -> bool {
        row.inv().inv() == row
    }

    #[quickcheck]
    fn mul_by_inverse_is_rounds(row: RowBuf) -> bool {
        (&row * &row.inv()).is_rounds() && (&row.inv() * &row).is_rounds()
    }

    #[quickcheck]
    fn order_matches_repeated_mul(row: RowBuf) -> bool {
        let order = row.order();
        let mut acc = row.clone();
        for _ in 1..order {
            if acc.is_rounds() {
                return false;
            }
            acc = &acc * &row;
        }
        acc.is_rounds()
    }

    #[quickcheck]
    fn sign_is_multiplicative(a: RowBuf, b: RowBuf) -> bool {
        let product = &a * &b;
        product.sign() == a.sign() * b.sign()
    }
}
