//! Checked arithmetic for counters and balances.
//!
//! Every counter and balance in the records goes through these traits.
//! Overflow and underflow surface as [`BankError::ArithmeticOverflow`].

use crate::error::{BankError, BankResult};

pub trait TryAdd: Sized {
    fn try_add(self, rhs: Self) -> BankResult<Self>;
    fn try_add_assign(&mut self, rhs: Self) -> BankResult<()>;
}

pub trait TrySub: Sized {
    fn try_sub(self, rhs: Self) -> BankResult<Self>;
    fn try_sub_assign(&mut self, rhs: Self) -> BankResult<()>;
}

macro_rules! try_math {
    ($t:ty) => {
        impl TryAdd for $t {
            fn try_add(self, rhs: Self) -> BankResult<Self> {
                self.checked_add(rhs).ok_or(BankError::ArithmeticOverflow)
            }
            fn try_add_assign(&mut self, rhs: Self) -> BankResult<()> {
                *self = self.try_add(rhs)?;
                Ok(())
            }
        }

        impl TrySub for $t {
            fn try_sub(self, rhs: Self) -> BankResult<Self> {
                self.checked_sub(rhs).ok_or(BankError::ArithmeticOverflow)
            }
            fn try_sub_assign(&mut self, rhs: Self) -> BankResult<()> {
                *self = self.try_sub(rhs)?;
                Ok(())
            }
        }
    };
}

try_math!(u32);
try_math!(u64);
