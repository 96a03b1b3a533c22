/// Capacity, party size, or item quantity: at least one.
#[derive(Debug, Clone, Copy)]
pub struct PositiveCount(i32);

impl PositiveCount {
    const MAX: i32 = 1000;

    pub fn parse(n: i32, what: &str) -> std::result::Result<PositiveCount, String> {
        if n < 1 {
            Err(format!("{} must be at least 1.", what))
        } else if n > Self::MAX {
            Err(format!("{} must be at most {}.", what, Self::MAX))
        } else {
            Ok(Self(n))
        }
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Price(i64);

impl Price {
    pub fn parse(amount: i64) -> std::result::Result<Price, String> {
        if amount < 0 {
            Err(format!("{} is not a valid price.", amount))
        } else {
            Ok(Self(amount))
        }
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}
