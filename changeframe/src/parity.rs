use std::ops::{Mul, Not};

/// Whether a [`Row`](crate::Row) is made of an even or odd number of swaps.  Rows with even
/// parity are 'in-course'; rows with odd parity are 'out-of-course'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parity {
    Even = 0,
    Odd = 1,
}

impl Parity {
    /// The `Parity` of some number of swaps.
    #[inline]
    pub fn from_number(n: usize) -> Parity {
        match n % 2 {
            0 => Parity::Even,
            _ => Parity::Odd,
        }
    }

    /// `+1` for [`Parity::Even`], `-1` for [`Parity::Odd`]
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Parity::Even => 1,
            Parity::Odd => -1,
        }
    }
}

impl Not for Parity {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        match self {
            Parity::Even => Parity::Odd,
            Parity::Odd => Parity::Even,
        }
    }
}

impl Mul for Parity {
    type Output = Self;

    /// Combines two `Parity`s in the same way as multiplying the [`Row`](crate::Row)s which have
    /// them.
    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Parity::from_number(self as usize + rhs as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::Parity;

    #[test]
    fn mul() {
        assert_eq!(Parity::Even * Parity::Even, Parity::Even);
        assert_eq!(Parity::Even * Parity::Odd, Parity::Odd);
        assert_eq!(Parity::Odd * Parity::Even, Parity::Odd);
        assert_eq!(Parity::Odd * Parity::Odd, Parity::Even);
        assert_eq!(!Parity::Odd, Parity::Even);
        assert_eq!(Parity::Odd.sign(), -1);
    }
}
