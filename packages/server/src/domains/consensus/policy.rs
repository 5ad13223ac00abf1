//! Majority arithmetic for consensus ballots.
//!
//! The denominator is always the ballot pool frozen at creation time, never
//! the live admin count.

use serde::Serialize;

use crate::common::{DomainError, DomainResult};

/// Default fraction of the ballot pool a side must exceed to win.
pub const DEFAULT_MAJORITY: f64 = 0.51;

/// Ballot counts for one consensus
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct Tally {
    pub pool_size: i64,
    pub yes: i64,
    pub no: i64,
}

impl Tally {
    pub fn pending(&self) -> i64 {
        self.pool_size - self.yes - self.no
    }

    pub fn all_cast(&self) -> bool {
        self.pool_size > 0 && self.pending() == 0
    }
}

/// What the ballots say right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Yes side exceeds the majority: execute the action
    Carry,
    /// No side exceeds the majority, or every ballot is in without a winner
    Reject,
    /// Ballots outstanding and no side over the line
    Pending,
    /// No ballots left to count
    Empty,
}

/// Majority rule injected into the engine through `ServerDeps`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VotingPolicy {
    majority: f64,
}

impl Default for VotingPolicy {
    fn default() -> Self {
        Self {
            majority: DEFAULT_MAJORITY,
        }
    }
}

impl VotingPolicy {
    /// Below one half both sides could win at once; at one a side can never
    /// strictly exceed it.
    pub fn new(majority: f64) -> DomainResult<Self> {
        if !(0.5..1.0).contains(&majority) {
            return Err(DomainError::validation(format!(
                "voting majority must be in [0.5, 1.0), got {}",
                majority
            )));
        }
        Ok(Self { majority })
    }

    pub fn majority(&self) -> f64 {
        self.majority
    }

    pub fn decide(&self, tally: &Tally) -> Decision {
        if tally.pool_size <= 0 {
            return Decision::Empty;
        }

        let split = VoteSplit::from_tally(tally);
        if split.yes_fraction > self.majority {
            Decision::Carry
        } else if split.no_fraction > self.majority || tally.all_cast() {
            // Every ballot cast without either side over the line is a
            // deadlock no further vote can break.
            Decision::Reject
        } else {
            Decision::Pending
        }
    }
}

/// Yes/no shares of the ballot pool, for display and decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoteSplit {
    pub pool_size: i64,
    pub yes: i64,
    pub no: i64,
    pub pending: i64,
    pub yes_fraction: f64,
    pub no_fraction: f64,
}

impl VoteSplit {
    pub fn from_tally(tally: &Tally) -> Self {
        let (yes_fraction, no_fraction) = if tally.pool_size > 0 {
            let pool = tally.pool_size as f64;
            (tally.yes as f64 / pool, tally.no as f64 / pool)
        } else {
            (0.0, 0.0)
        };

        Self {
            pool_size: tally.pool_size,
            yes: tally.yes,
            no: tally.no,
            pending: tally.pending(),
            yes_fraction,
            no_fraction,
        }
    }

    /// "Yes: 66% | No: 33%" (percentages truncated)
    pub fn readable(&self) -> String {
        format!(
            "Yes: {}% | No: {}%",
            (self.yes_fraction * 100.0) as i64,
            (self.no_fraction * 100.0) as i64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(pool_size: i64, yes: i64, no: i64) -> Tally {
        Tally { pool_size, yes, no }
    }

    #[test]
    fn test_sole_admin_carries_immediately() {
        let policy = VotingPolicy::default();
        assert_eq!(policy.decide(&tally(1, 1, 0)), Decision::Carry);
    }

    #[test]
    fn test_two_thirds_carries() {
        let policy = VotingPolicy::default();
        assert_eq!(policy.decide(&tally(3, 2, 0)), Decision::Carry);
        assert_eq!(policy.decide(&tally(3, 1, 0)), Decision::Pending);
    }

    #[test]
    fn test_even_split_with_all_cast_is_rejected() {
        let policy = VotingPolicy::default();
        assert_eq!(policy.decide(&tally(2, 1, 1)), Decision::Reject);
        assert_eq!(policy.decide(&tally(4, 2, 2)), Decision::Reject);
    }

    #[test]
    fn test_exact_half_is_not_a_majority() {
        let policy = VotingPolicy::default();
        assert_eq!(policy.decide(&tally(4, 2, 1)), Decision::Pending);
        assert_eq!(policy.decide(&tally(4, 1, 2)), Decision::Pending);
    }

    #[test]
    fn test_no_majority_rejects_before_all_cast() {
        let policy = VotingPolicy::default();
        assert_eq!(policy.decide(&tally(3, 0, 2)), Decision::Reject);
    }

    #[test]
    fn test_empty_pool() {
        let policy = VotingPolicy::default();
        assert_eq!(policy.decide(&tally(0, 0, 0)), Decision::Empty);
    }

    #[test]
    fn test_higher_threshold() {
        let policy = VotingPolicy::new(0.75).unwrap();
        assert_eq!(policy.decide(&tally(4, 3, 0)), Decision::Pending);
        assert_eq!(policy.decide(&tally(4, 3, 1)), Decision::Reject);
        assert_eq!(policy.decide(&tally(5, 4, 0)), Decision::Carry);
    }

    #[test]
    fn test_policy_bounds() {
        assert!(VotingPolicy::new(0.5).is_ok());
        assert!(VotingPolicy::new(0.49).is_err());
        assert!(VotingPolicy::new(1.0).is_err());
        assert!(VotingPolicy::new(f64::NAN).is_err());
    }

    #[test]
    fn test_readable_split() {
        let split = VoteSplit::from_tally(&tally(3, 2, 1));
        assert_eq!(split.readable(), "Yes: 66% | No: 33%");
        assert_eq!(split.pending, 0);

        let empty = VoteSplit::from_tally(&tally(0, 0, 0));
        assert_eq!(empty.readable(), "Yes: 0% | No: 0%");
    }
}
