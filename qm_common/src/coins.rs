use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;

use crate::op;

//--------------------------------------       Coins        ----------------------------------------------------------
/// The in-game currency. Whole coins only; the game economy has no fractional denomination.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Coins(i64);

op!(binary Coins, Add, add);
op!(binary Coins, Sub, sub);
op!(inplace Coins, SubAssign, sub_assign);
op!(unary Coins, Neg, neg);

impl Sum for Coins {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for Coins {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Coins {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Coins {}

impl Display for Coins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} coins", self.0)
    }
}

impl Coins {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Overflow-checked multiplication. Order totals are `price × quantity` with a
    /// caller-supplied quantity, so the product must not be allowed to wrap.
    pub fn checked_mul(self, rhs: i64) -> Option<Self> {
        self.0.checked_mul(rhs).map(Self)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Coins::from(100);
        let b = Coins::from(30);
        assert_eq!(a - b, Coins::from(70));
        assert_eq!(a + b, Coins::from(130));
        assert_eq!(a.checked_mul(3), Some(Coins::from(300)));
        assert_eq!(-b, Coins::from(-30));
    }

    #[test]
    fn multiplication_never_wraps() {
        let price = Coins::from(50);
        assert_eq!(price.checked_mul(i64::MAX / 50 + 1), None);
        assert_eq!(Coins::from(i64::MIN).checked_mul(-1), None);
    }

    #[test]
    fn sums_and_display() {
        let total: Coins = [10, 20, 30].into_iter().map(Coins::from).sum();
        assert_eq!(total, Coins::from(60));
        assert_eq!(total.to_string(), "60 coins");
    }
}
