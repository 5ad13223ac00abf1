//! Admin voting on kennel changes.
//!
//! A consensus stays open until its ballots decide it; whatever the result,
//! the row is deleted and the caller gets an `Outcome`.

pub mod activities;
pub(crate) mod engine;
mod executors;
pub mod models;
pub mod outcome;
pub mod policy;

pub use models::{
    Ballot, Consensus, ConsensusAction, ConsensusTarget, ConsensusView, ConsensusVote,
};
pub use outcome::{ActionEffect, ConsensusOutcome, Outcome, SkipReason, VoidReason};
pub use policy::{VoteSplit, VotingPolicy};
