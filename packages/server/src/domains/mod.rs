// Business domains
pub mod consensus;
pub mod events;
pub mod kennels;
