pub mod consensus;
pub mod consensus_vote;

pub use consensus::{Consensus, ConsensusAction, ConsensusTarget, ConsensusView, TargetKind};
pub use consensus_vote::{Ballot, ConsensusVote};
