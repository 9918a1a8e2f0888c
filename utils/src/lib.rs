use std::fmt::{Display, Formatter};

use number_prefix::NumberPrefix;

/// Wrapper which displays big integers with an SI prefix, so `1_234_567` is displayed as `1.23M`.
/// Numbers under 1,000 are displayed exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigNumInt(pub usize);

impl Display for BigNumInt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match NumberPrefix::decimal(self.0 as f64) {
            NumberPrefix::Standalone(_) => write!(f, "{}", self.0),
            NumberPrefix::Prefixed(prefix, n) => write!(f, "{:.2}{}", n, prefix.symbol()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BigNumInt;

    #[track_caller]
    fn check(n: usize, expected: &str) {
        assert_eq!(BigNumInt(n).to_string(), expected);
    }

    #[test]
    fn big_nums() {
        check(0, "0");
        check(999, "999");
        check(1_000, "1.00k");
        check(40_320, "40.32k");
        check(1_234_567, "1.23M");
    }
}
