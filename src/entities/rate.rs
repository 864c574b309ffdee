//! Project and activity rates

/// What a rate applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateScope {
    Project(i64),
    Activity(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rate {
    pub id: Option<i64>,
    pub scope: RateScope,
    /// `None` applies the rate to every user
    pub user_id: Option<i64>,
    pub rate: f64,
    /// Fixed rates are charged per record instead of per hour
    pub fixed: bool,
}

impl Rate {
    pub fn hourly(scope: RateScope, rate: f64, user_id: Option<i64>) -> Self {
        Self {
            id: None,
            scope,
            user_id,
            rate,
            fixed: false,
        }
    }

    pub fn fixed(scope: RateScope, rate: f64) -> Self {
        Self {
            id: None,
            scope,
            user_id: None,
            rate,
            fixed: true,
        }
    }
}
