//! Consensus activities - every mutation runs in one transaction that holds
//! the kennel row lock.

mod create;
mod queries;
mod recheck;
mod vote;
mod withdraw;

pub use create::{create_consensus, Proposal};
pub use queries::{
    consensus_summary, list_ballots_for_voter, list_open_for_admin, vote_split, ConsensusSummary,
};
pub use recheck::recheck_club;
pub use vote::cast_vote;
pub use withdraw::withdraw_consensus;
