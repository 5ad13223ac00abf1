// PackTrack - kennel membership, longevity and admin consensus
//
// Domains own their models (sqlx row types) and activities (transactional
// operations taking `&ServerDeps`). The consensus engine is the only place
// kennel state changes by vote.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
